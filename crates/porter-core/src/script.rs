//! Script parts decorated by runners and assembled into `job.script`.

use crate::job::Job;
use porter_exec::{quote, quote_join};

/// Pieces of a job script.
///
/// Runners append to `header` and `pre`; several participants may
/// contribute, so existing text is never replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptParts {
    /// Scheduler directives
    pub header: String,
    /// Shell preamble run before the command
    pub pre: String,
    /// Command tokens
    pub command: Vec<String>,
    /// Redirect stdout/stderr into the job directory
    pub saveoe: bool,
}

impl Default for ScriptParts {
    fn default() -> Self {
        Self {
            header: String::new(),
            pre: String::new(),
            command: Vec::new(),
            saveoe: true,
        }
    }
}

impl ScriptParts {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    /// Assemble the final script text.
    pub fn render(&self, job: &Job) -> String {
        let mut script = String::from("#!/usr/bin/env bash\n");
        for block in [&self.header, &self.pre] {
            if block.trim().is_empty() {
                continue;
            }
            script.push_str(block.trim_start_matches('\n'));
            if !block.ends_with('\n') {
                script.push('\n');
            }
        }

        if !self.command.is_empty() {
            script.push('\n');
            script.push_str(&quote_join(&self.command));
            if self.saveoe {
                script.push_str(&format!(
                    " > {} 2> {}",
                    quote(job.stdout_path().as_str()),
                    quote(job.stderr_path().as_str())
                ));
            }
            script.push('\n');
        }

        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessDefinition;
    use std::sync::Arc;

    fn job() -> Job {
        let proc = Arc::new(ProcessDefinition::new("pTest"));
        Job::new(0, "/work/0", &proc)
    }

    #[test]
    fn test_render_with_capture() {
        let parts = ScriptParts::new(vec!["echo".into(), "hello world".into()]);
        assert_eq!(
            parts.render(&job()),
            "#!/usr/bin/env bash\n\necho 'hello world' > /work/0/job.stdout 2> /work/0/job.stderr\n"
        );
    }

    #[test]
    fn test_render_header_and_pre() {
        let mut parts = ScriptParts::new(vec!["true".into()]);
        parts.header.push_str("#SBATCH -J x\n");
        parts.pre.push_str("\ncd /work");
        parts.saveoe = false;
        assert_eq!(
            parts.render(&job()),
            "#!/usr/bin/env bash\n#SBATCH -J x\ncd /work\n\ntrue\n"
        );
    }

    #[test]
    fn test_render_without_command() {
        let mut parts = ScriptParts::default();
        parts.pre.push_str("touch a\n");
        assert_eq!(parts.render(&job()), "#!/usr/bin/env bash\ntouch a\n");
    }
}
