//! Job ID extraction from scheduler submission output.
//!
//! Both functions return `None` when the expected token is missing; the
//! caller must treat that as a failed submission even on exit code 0.

use once_cell::sync::Lazy;
use regex::Regex;

/// `Your job 6556149 ("name") has been submitted`
static SGE_JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s(\d+)\s").unwrap());

/// `Submitted batch job 42`
static SLURM_JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s(\d+)$").unwrap());

/// First standalone integer token in qsub output.
pub fn parse_sge_job_id(stdout: &str) -> Option<String> {
    SGE_JOB_ID
        .captures(stdout.trim())
        .map(|caps| caps[1].to_string())
}

/// Trailing integer token of sbatch output.
pub fn parse_slurm_job_id(stdout: &str) -> Option<String> {
    SLURM_JOB_ID
        .captures(stdout.trim())
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sge_job_id() {
        assert_eq!(
            parse_sge_job_id("Your job 6556149 (\"foo\") has been submitted\n"),
            Some("6556149".to_string())
        );
        assert_eq!(parse_sge_job_id("Your job has been submitted"), None);
        // The ID must be surrounded by whitespace
        assert_eq!(parse_sge_job_id("job6556149 submitted"), None);
        assert_eq!(parse_sge_job_id(""), None);
    }

    #[test]
    fn test_parse_slurm_job_id() {
        assert_eq!(
            parse_slurm_job_id("Submitted batch job 42\n"),
            Some("42".to_string())
        );
        assert_eq!(parse_slurm_job_id("job 42 queued"), None);
        assert_eq!(parse_slurm_job_id("Submitted batch job"), None);
    }
}
