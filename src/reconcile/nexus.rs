//! Nexus child convergence and local replica exclusion

use crate::domain::model::{NexusChild, NEXUS_LOCAL_SCHEME};
use crate::domain::ports::VolumeDirectory;
use crate::domain::vocabulary::StateVocabulary;
use crate::error::{Error, Result};
use crate::grpc::StorageNodeClient;
use crate::reconcile::poll::{poll_until, Observation, PollSettings};
use crate::reconcile::volume::{wait_for_volume_degraded, wait_for_volume_healthy};
use std::fmt;
use tracing::info;

// =============================================================================
// Child Counts
// =============================================================================

/// Nexus children tallied by state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildCounts {
    pub online: usize,
    pub degraded: usize,
    pub faulted: usize,
    /// Any state outside online, degraded and faulted
    pub other: usize,
}

impl ChildCounts {
    pub fn tally(children: &[NexusChild], vocabulary: &StateVocabulary) -> Self {
        let mut counts = Self::default();
        for child in children {
            let state = child.state.as_str();
            if state == vocabulary.child_state_online() {
                counts.online += 1;
            } else if state == vocabulary.child_state_degraded() {
                counts.degraded += 1;
            } else if state == vocabulary.child_state_faulted() {
                counts.faulted += 1;
            } else {
                counts.other += 1;
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.online + self.degraded + self.faulted + self.other
    }
}

impl fmt::Display for ChildCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "online={} degraded={} faulted={} other={}",
            self.online, self.degraded, self.faulted, self.other
        )
    }
}

/// Converged once `accept` holds; children in unrecognised states are
/// reported as unexpected
pub(crate) async fn observe_children<D, F>(
    directory: &D,
    uuid: &str,
    accept: F,
) -> Result<Observation<ChildCounts>>
where
    D: VolumeDirectory + ?Sized,
    F: Fn(&ChildCounts) -> bool,
{
    let children = directory.get_nexus_children(uuid).await?;
    let counts = ChildCounts::tally(&children, directory.vocabulary());
    Ok(if accept(&counts) {
        Observation::Converged(counts)
    } else if counts.other > 0 {
        Observation::Unexpected(counts.to_string())
    } else {
        Observation::Pending(counts.to_string())
    })
}

/// Wait until exactly `faulted` children are faulted and the rest online
pub async fn wait_for_nexus_children<D>(
    directory: &D,
    uuid: &str,
    faulted: usize,
    settings: &PollSettings,
) -> Result<ChildCounts>
where
    D: VolumeDirectory + ?Sized,
{
    let what = format!("volume {} nexus children with {} faulted", uuid, faulted);
    poll_until(&what, settings, || {
        observe_children(directory, uuid, move |c| {
            c.faulted == faulted && c.degraded == 0 && c.other == 0 && c.online > 0
        })
    })
    .await
}

// =============================================================================
// Local Replica Exclusion
// =============================================================================

/// Fault the nexus-local child of a volume and wait for it to be rebuilt
/// elsewhere.
///
/// Returns `false` when the nexus has no local child, `true` once the
/// volume went degraded and then healthy again.
pub async fn exclude_nexus_replica<D>(
    directory: &D,
    grpc: &StorageNodeClient,
    nexus_address: &str,
    uuid: &str,
    settings: &PollSettings,
) -> Result<bool>
where
    D: VolumeDirectory + ?Sized,
{
    let nexuses = grpc.list_nexuses(nexus_address).await?;
    if nexuses.is_empty() {
        return Err(Error::EmptyResponse {
            operation: "ListNexusV2".into(),
            target: nexus_address.to_string(),
        });
    }
    let nexus = nexuses
        .iter()
        .find(|n| n.uuid == uuid)
        .ok_or_else(|| Error::not_found("nexus", uuid))?;

    let local: Vec<&str> = nexus
        .children
        .iter()
        .map(|c| c.uri.as_str())
        .filter(|uri| uri.starts_with(NEXUS_LOCAL_SCHEME))
        .collect();

    let child = match local.as_slice() {
        [] => {
            info!(uuid, "nexus has no local child, nothing to exclude");
            return Ok(false);
        }
        [child] => *child,
        many => {
            return Err(Error::Internal(format!(
                "nexus {} has {} nexus-local children",
                uuid,
                many.len()
            )))
        }
    };

    grpc.fault_nexus_child(nexus_address, uuid, child).await?;
    wait_for_volume_degraded(directory, uuid, settings).await?;
    wait_for_volume_healthy(directory, uuid, settings).await?;
    info!("Volume {} rebuilt without its nexus-local replica", uuid);
    Ok(true)
}
