//! Background job scheduler and job implementations.

mod lending_gauges;
mod reminders;
mod scheduler;

pub use lending_gauges::LendingGaugesJob;
pub use reminders::{dispatch_digest, AcknowledgeReminderJob, ReturnReminderJob};
pub use scheduler::{Job, JobFrequency, JobScheduler};
