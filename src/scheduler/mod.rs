pub mod tasks;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

/// Work to run once, later.
pub type DeferredTask = BoxFuture<'static, ()>;

/// Runs a task once after a delay. There is no cancellation: tasks are
/// expected to check whether they still have anything to do when they fire.
#[async_trait]
pub trait DeferredRunner: Send + Sync {
    async fn run_after(&self, name: &str, delay: Duration, task: DeferredTask) -> Result<()>;
}

/// Wrapper around tokio-cron-scheduler for background tasks.
/// Clones share the same underlying job scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    /// Create a new scheduler
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner })
    }

    /// Add a recurring cron job
    pub async fn add_cron_job<F>(&self, cron_expr: &str, name: &str, task: F) -> Result<()>
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let job_name = name.to_string();
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let name = job_name.clone();
            let fut = task();
            Box::pin(async move {
                debug!("Running scheduled task: {}", name);
                fut.await;
            })
        })
        .with_context(|| format!("Failed to create cron job: {}", name))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        info!("Scheduled task '{}' with cron: {}", name, cron_expr);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

#[async_trait]
impl DeferredRunner for Scheduler {
    async fn run_after(&self, name: &str, delay: Duration, task: DeferredTask) -> Result<()> {
        // The job callback is FnMut but a one-shot job only ever fires once.
        let slot = Arc::new(Mutex::new(Some(task)));
        let job_name = name.to_string();
        let job = Job::new_one_shot_async(delay, move |_uuid, _lock| {
            let task = slot.lock().ok().and_then(|mut slot| slot.take());
            let name = job_name.clone();
            Box::pin(async move {
                match task {
                    Some(task) => {
                        debug!("Running deferred task: {}", name);
                        task.await;
                    }
                    None => debug!("Deferred task '{}' already ran", name),
                }
            })
        })
        .with_context(|| format!("Failed to create one-shot job: {}", name))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        debug!("Deferred task '{}' due in {}s", name, delay.as_secs());
        Ok(())
    }
}
