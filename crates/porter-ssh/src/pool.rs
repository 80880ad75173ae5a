//! Live server pool and health checks.

use futures::future::join_all;
use indexmap::IndexMap;
use porter_core::RemoteTarget;
use porter_exec::{CommandSpec, ProcessExecutor};
use std::time::Duration;

/// Health check timeout unless `ssh_timeout` says otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Check whether `server` accepts a non-interactive login.
///
/// Runs `true` remotely with batch mode and a single connection attempt.
/// Timeouts, spawn failures and non-zero exits all count as dead.
pub async fn is_server_alive(
    executor: &dyn ProcessExecutor,
    ssh: &CommandSpec,
    server: &str,
    key: Option<&str>,
    timeout: Duration,
) -> bool {
    let cmd = ssh
        .clone()
        .opt("-i", key)
        .args(["-o", "BatchMode=yes", "-o", "ConnectionAttempts=1"])
        .arg(server)
        .arg("true")
        .timeout(timeout);

    match executor.run(&cmd).await {
        Ok(output) if output.success() => true,
        Ok(output) => {
            tracing::debug!(
                "Server {} check exited with {}: {}",
                server,
                output.return_code,
                output.stderr.trim()
            );
            false
        }
        Err(e) => {
            tracing::debug!("Server {} check failed: {}", server, e);
            false
        }
    }
}

/// Reachable servers and their login keys, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshServerPool {
    servers: IndexMap<String, Option<String>>,
}

impl SshServerPool {
    /// Health-check `servers` and keep the live ones.
    ///
    /// Keys pair with servers by position; a missing key means keyless
    /// login. Checks run concurrently but the pool keeps configured order.
    pub async fn check(
        executor: &dyn ProcessExecutor,
        ssh: &CommandSpec,
        servers: &[String],
        keys: &[Option<String>],
        timeout: Duration,
    ) -> Self {
        let checks = servers.iter().enumerate().map(|(i, server)| {
            let key = keys.get(i).cloned().flatten();
            async move {
                let alive = is_server_alive(executor, ssh, server, key.as_deref(), timeout).await;
                (server, key, alive)
            }
        });

        let mut pool = Self::default();
        for (server, key, alive) in join_all(checks).await {
            if alive {
                pool.servers.entry(server.clone()).or_insert(key);
            } else {
                tracing::warn!("Server {} is not reachable, skipping", server);
            }
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn servers(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }

    /// Server for the job at `index`: round-robin over the live servers.
    pub fn select(&self, index: usize) -> Option<RemoteTarget> {
        if self.servers.is_empty() {
            return None;
        }
        let (server, key) = self.servers.get_index(index % self.servers.len())?;
        Some(RemoteTarget {
            server: server.clone(),
            key: key.clone(),
        })
    }
}

impl FromIterator<(String, Option<String>)> for SshServerPool {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            servers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porter_core::testing::{Response, ScriptedExecutor};

    fn servers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_health_check_command() {
        let executor = ScriptedExecutor::new();
        let ssh = CommandSpec::new("ssh");
        assert!(is_server_alive(&executor, &ssh, "node1", Some("~/.ssh/id_a"), DEFAULT_TIMEOUT).await);

        let calls = executor.calls();
        assert_eq!(
            calls[0].to_shell_line(),
            "ssh -i '~/.ssh/id_a' -o BatchMode=yes -o ConnectionAttempts=1 node1 true"
        );
        assert_eq!(calls[0].get_timeout(), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_dead_servers_are_excluded() {
        let executor = ScriptedExecutor::new()
            .on("node2", Response::Timeout)
            .on("node3", Response::exit(255, "Permission denied (publickey)"))
            .on("node5", Response::NotFound);
        let ssh = CommandSpec::new("ssh");
        let keys = vec![None, None, None, Some("key4".to_string())];

        let pool = SshServerPool::check(
            &executor,
            &ssh,
            &servers(&["node1", "node2", "node3", "node4", "node5"]),
            &keys,
            DEFAULT_TIMEOUT,
        )
        .await;

        assert_eq!(pool.servers().collect::<Vec<_>>(), ["node1", "node4"]);
        assert_eq!(pool.select(1).unwrap().key.as_deref(), Some("key4"));
        assert_eq!(executor.calls().len(), 5);
    }

    #[test]
    fn test_round_robin_over_pool_order() {
        let pool: SshServerPool = [
            ("b".to_string(), None),
            ("a".to_string(), Some("k".to_string())),
            ("c".to_string(), None),
        ]
        .into_iter()
        .collect();

        let picks: Vec<String> = (0..7).map(|i| pool.select(i).unwrap().server).collect();
        assert_eq!(picks, ["b", "a", "c", "b", "a", "c", "b"]);
        // Repeatable
        assert_eq!(pool.select(4), pool.select(4));
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        assert!(SshServerPool::default().select(0).is_none());
    }
}
