//! Grid Engine integration for porter.
//!
//! Submit jobs with qsub, poll with qstat, cancel with qdel.

pub mod runner;

pub use runner::{SGE_HEADER, SgeRunner};
