//! Pool and control plane readiness

use crate::domain::ports::{PoolDirectory, VolumeDirectory};
use crate::error::Result;
use crate::reconcile::poll::{poll_until, Observation, PollSettings};
use tracing::info;

/// Wait until every pool reports the online state
pub async fn wait_for_pools_online<D>(directory: &D, settings: &PollSettings) -> Result<()>
where
    D: PoolDirectory + ?Sized,
{
    poll_until("all pools online", settings, || async move {
        let online = directory.vocabulary().pool_state_online();
        let pools = directory.list_pools().await?;
        let offline: Vec<String> = pools
            .iter()
            .filter(|p| p.status.state != online)
            .map(|p| format!("{}={}", p.name, p.status.state))
            .collect();

        Ok(if pools.is_empty() {
            Observation::Pending("no pools".into())
        } else if offline.is_empty() {
            Observation::Converged(())
        } else {
            Observation::Pending(offline.join(", "))
        })
    })
    .await?;
    info!("All pools are online");
    Ok(())
}

/// Wait until the control plane answers a volume listing
pub async fn wait_for_control_plane<D>(directory: &D, settings: &PollSettings) -> Result<()>
where
    D: VolumeDirectory + ?Sized,
{
    poll_until("control plane ready", settings, || async move {
        directory.list_volumes().await?;
        Ok(Observation::Converged(()))
    })
    .await?;
    info!("Control plane {} is answering", directory.backend_name());
    Ok(())
}
