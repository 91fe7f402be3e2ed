//! Interval scheduler for the background jobs (reminder digests, gauges).

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::middleware::metrics::record_job_run;

/// How often a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
}

impl JobFrequency {
    /// Get the duration between job executions.
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
        }
    }
}

/// Trait for implementing background jobs.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging).
    fn name(&self) -> &'static str;

    /// The frequency at which this job should run.
    fn frequency(&self) -> JobFrequency;

    /// Execute the job. Returns Ok(()) on success, Err with message on failure.
    async fn execute(&self) -> Result<(), String>;
}

/// Background job scheduler.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Create a new job scheduler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true when no job is registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Register a job with the scheduler.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Start all registered jobs.
    pub fn start(&mut self) {
        info!("Starting job scheduler with {} jobs", self.jobs.len());

        let handles: Vec<_> = self
            .jobs
            .iter()
            .map(|job| spawn_schedule(Arc::clone(job), self.shutdown_rx.clone()))
            .collect();
        self.handles.extend(handles);
    }

    /// Initiate graceful shutdown of all jobs.
    /// Returns immediately after signaling shutdown.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all jobs to complete with timeout.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        info!("Waiting for jobs to complete (timeout: {:?})", timeout);

        let shutdown_future = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, shutdown_future).await {
            Ok(()) => info!("All jobs completed gracefully"),
            Err(_) => warn!("Job shutdown timed out after {:?}", timeout),
        }
    }
}

/// Drives one job on its interval until shutdown is signalled.
fn spawn_schedule(job: Arc<dyn Job>, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = job.name();
        let frequency = job.frequency();
        let mut interval = tokio::time::interval(frequency.duration());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // First tick fires immediately
        interval.tick().await;
        info!(job = name, frequency = ?frequency, "Job scheduled");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    run_once(job.as_ref()).await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!(job = name, "Job shutting down");
                        break;
                    }
                }
            }
        }
    })
}

/// Runs one execution of `job`, logging and counting its outcome. Failures
/// never stop the schedule.
pub(crate) async fn run_once(job: &dyn Job) -> bool {
    let name = job.name();
    let start = Instant::now();
    debug!(job = name, "Job starting");

    let result = job.execute().await;
    let elapsed = start.elapsed();
    record_job_run(name, result.is_ok(), elapsed);

    match result {
        Ok(()) => {
            info!(
                job = name,
                elapsed_ms = elapsed.as_millis() as u64,
                "Job completed"
            );
            true
        }
        Err(e) => {
            error!(
                job = name,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Job failed"
            );
            false
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestJob {
        run_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Job for TestJob {
        fn name(&self) -> &'static str {
            "test_job"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(1)
        }

        async fn execute(&self) -> Result<(), String> {
            self.run_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err("Test failure".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn test_job(should_fail: bool) -> (TestJob, Arc<AtomicUsize>) {
        let run_count = Arc::new(AtomicUsize::new(0));
        (
            TestJob {
                run_count: Arc::clone(&run_count),
                should_fail,
            },
            run_count,
        )
    }

    #[test]
    fn test_job_frequency_duration() {
        assert_eq!(JobFrequency::Seconds(30).duration(), Duration::from_secs(30));
        assert_eq!(JobFrequency::Minutes(15).duration(), Duration::from_secs(900));
    }

    #[test]
    fn test_scheduler_register() {
        let mut scheduler = JobScheduler::default();
        assert!(scheduler.is_empty());

        scheduler.register(test_job(false).0);
        assert_eq!(scheduler.len(), 1);
    }

    #[tokio::test]
    async fn test_run_once_reports_outcome() {
        let (ok_job, ok_runs) = test_job(false);
        let (failing_job, failing_runs) = test_job(true);

        assert!(run_once(&ok_job).await);
        assert!(!run_once(&failing_job).await);
        assert_eq!(ok_runs.load(Ordering::SeqCst), 1);
        assert_eq!(failing_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scheduler_shutdown_before_first_tick() {
        let mut scheduler = JobScheduler::new();
        let (job, run_count) = test_job(false);
        scheduler.register(job);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(100)).await;

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        // The first tick is skipped, so a one second job has not run yet.
        assert_eq!(run_count.load(Ordering::SeqCst), 0);
    }
}
