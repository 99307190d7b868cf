//! Background maintenance jobs.

mod scheduler;

pub use scheduler::{Scheduler, SchedulerConfig, register_maintenance_jobs};
