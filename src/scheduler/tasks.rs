use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::scheduler::Scheduler;
use crate::service::GiveawayService;

/// Register built-in background tasks
pub async fn register_builtin_tasks(
    scheduler: &Scheduler,
    service: Arc<GiveawayService>,
    config: &Config,
) -> anyhow::Result<()> {
    // Heartbeat — log that the bot is alive and what it is tracking
    let heartbeat_service = service.clone();
    scheduler
        .add_cron_job(&config.scheduler.heartbeat_cron, "heartbeat", move || {
            let service = heartbeat_service.clone();
            Box::pin(async move {
                let stats = service.registry().stats().await;
                info!(
                    "Heartbeat: bot is alive, {} open / {} closed giveaway(s)",
                    stats.open, stats.closed
                );
            })
        })
        .await?;

    let Some(retention) = config.giveaway.retention() else {
        info!("Closed giveaways are kept for the lifetime of the process");
        return Ok(());
    };

    scheduler
        .add_cron_job(
            &config.scheduler.housekeeping_cron,
            "housekeeping",
            move || {
                let service = service.clone();
                Box::pin(async move {
                    let pruned = service.prune_closed(retention).await;
                    if pruned > 0 {
                        info!("Housekeeping: pruned {} closed giveaway(s)", pruned);
                    }
                })
            },
        )
        .await?;

    Ok(())
}
