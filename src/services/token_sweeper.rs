use crate::auth::auth_repository::VerificationRepository;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Hourly sweep of expired email-verification tokens and password-reset
/// OTPs. Expiry is already enforced at read time; this just keeps the
/// tables from growing unbounded.
pub async fn start_token_sweeper(
    verification_repo: VerificationRepository,
) -> anyhow::Result<()> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
        let repo = verification_repo.clone();

        Box::pin(async move {
            match repo.delete_expired().await {
                Ok(swept) if swept > 0 => info!("Swept {} expired tokens", swept),
                Ok(_) => {}
                Err(e) => error!("Error sweeping expired tokens: {:?}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Token sweeper started");
    Ok(())
}
