//! Volume convergence helpers

use crate::domain::ports::VolumeDirectory;
use crate::error::Result;
use crate::reconcile::nexus::{observe_children, ChildCounts};
use crate::reconcile::poll::{poll_until, Observation, PollSettings};
use tracing::info;

/// Classify one volume state reading against the target state
fn classify_volume_state<D>(directory: &D, state: String, target: &str) -> Observation<()>
where
    D: VolumeDirectory + ?Sized,
{
    let vocabulary = directory.vocabulary();
    if state == target {
        Observation::Converged(())
    } else if state.is_empty() {
        Observation::Pending("pending".into())
    } else if state == vocabulary.vol_state_healthy()
        || state == vocabulary.vol_state_degraded()
        || state == vocabulary.vol_state_faulted()
    {
        Observation::Pending(state)
    } else {
        Observation::Unexpected(state)
    }
}

/// Wait until the volume reports `state`
pub async fn wait_for_volume_state<D>(
    directory: &D,
    uuid: &str,
    state: &str,
    settings: &PollSettings,
) -> Result<()>
where
    D: VolumeDirectory + ?Sized,
{
    let what = format!("volume {} state {}", uuid, state);
    poll_until(&what, settings, || async move {
        let current = directory.get_volume_state(uuid).await?;
        Ok(classify_volume_state(directory, current, state))
    })
    .await?;
    info!("Volume {} reached state {}", uuid, state);
    Ok(())
}

pub async fn wait_for_volume_healthy<D>(directory: &D, uuid: &str, settings: &PollSettings) -> Result<()>
where
    D: VolumeDirectory + ?Sized,
{
    let healthy = directory.vocabulary().vol_state_healthy();
    wait_for_volume_state(directory, uuid, healthy, settings).await
}

pub async fn wait_for_volume_degraded<D>(directory: &D, uuid: &str, settings: &PollSettings) -> Result<()>
where
    D: VolumeDirectory + ?Sized,
{
    let degraded = directory.vocabulary().vol_state_degraded();
    wait_for_volume_state(directory, uuid, degraded, settings).await
}

/// Wait until the backend positively reports the volume as absent
pub async fn wait_for_volume_deleted<D>(directory: &D, uuid: &str, settings: &PollSettings) -> Result<()>
where
    D: VolumeDirectory + ?Sized,
{
    let what = format!("volume {} deletion", uuid);
    poll_until(&what, settings, || async move {
        Ok(if directory.is_volume_deleted(uuid).await? {
            Observation::Converged(())
        } else {
            Observation::Pending("present".into())
        })
    })
    .await
}

/// Wait until the nexus has `replicas` online children and nothing else,
/// for example after a rebuild completes
pub async fn wait_for_replica_count<D>(
    directory: &D,
    uuid: &str,
    replicas: usize,
    settings: &PollSettings,
) -> Result<ChildCounts>
where
    D: VolumeDirectory + ?Sized,
{
    let what = format!("volume {} with {} online replicas", uuid, replicas);
    poll_until(&what, settings, || {
        observe_children(directory, uuid, move |c| {
            c.online == replicas && c.degraded == 0 && c.faulted == 0 && c.other == 0
        })
    })
    .await
}
