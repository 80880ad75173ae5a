//! SSH integration for porter.
//!
//! Run job scripts on remote hosts that share this machine's filesystem,
//! spreading jobs over the servers that answered a health check.

pub mod pool;
pub mod runner;

pub use pool::{DEFAULT_TIMEOUT, SshServerPool, is_server_alive};
pub use runner::SshRunner;
