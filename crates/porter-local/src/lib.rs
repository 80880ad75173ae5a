//! Local execution for porter.
//!
//! The local runner launches job scripts as background processes on this
//! machine; the dry runner reuses it to materialize empty outputs instead
//! of doing real work.

pub mod dry;
pub mod local;
pub mod process;

pub use dry::{BACKDATE, DryRunner};
pub use local::LocalRunner;
pub use process::{kill_tree_script, liveness_script};
