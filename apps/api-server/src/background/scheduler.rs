//! Cron-style job scheduler using tokio-cron-scheduler.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::state::AppState;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Cron expression (with seconds) for the reset-token purge.
    pub purge_schedule: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            purge_schedule: "0 0 * * * *".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: crate::config::flag("SCHEDULER_ENABLED", true),
            purge_schedule: std::env::var("RESET_PURGE_SCHEDULE")
                .unwrap_or_else(|_| Self::default().purge_schedule),
        }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Add a cron job.
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

/// Register the recurring maintenance jobs against `state`.
pub async fn register_maintenance_jobs(
    scheduler: &Scheduler,
    state: &AppState,
) -> Result<(), JobSchedulerError> {
    let accounts = state.accounts.clone();
    scheduler
        .add_cron(&scheduler.config().purge_schedule, move || {
            let accounts = accounts.clone();
            async move {
                match accounts.purge_expired_reset_tokens().await {
                    Ok(0) => tracing::debug!("No expired reset tokens"),
                    Ok(cleared) => tracing::info!(cleared, "Purged expired reset tokens"),
                    Err(e) => tracing::error!(error = %e, "Reset token purge failed"),
                }
            }
        })
        .await?;

    #[cfg(feature = "rate-limit")]
    if let Some(limiter) = state.limiter_store.clone() {
        scheduler
            .add_cron("0 */10 * * * *", move || {
                let limiter = limiter.clone();
                async move {
                    limiter.prune();
                    tracing::debug!("Pruned idle rate limiter keys");
                }
            })
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registers_maintenance_jobs() {
        let scheduler = Scheduler::new(SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        })
        .await
        .unwrap();

        register_maintenance_jobs(&scheduler, &AppState::for_tests())
            .await
            .unwrap();
        scheduler.start().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_bad_cron_expression() {
        let scheduler = Scheduler::new(SchedulerConfig::default()).await.unwrap();

        let result = scheduler.add_cron("not a schedule", || async {}).await;

        assert!(result.is_err());
    }
}
