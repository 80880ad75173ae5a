//! SLURM integration for porter.
//!
//! Submit jobs with sbatch, poll with squeue, cancel with scancel.

pub mod runner;

pub use runner::{SLURM_HEADER, SlurmRunner};
