//! Failover Query
//!
//! Every control-plane request is addressed to one node of the cluster, and
//! any node may be down (rebooting, crashed pod, partitioned). The query
//! walks the candidate addresses in order and returns the first success.

use crate::error::{Error, Result};
use std::future::Future;
use tracing::{debug, warn};

/// Run `op` against each address in turn until one succeeds.
///
/// - returns the first successful result, later addresses are not tried
/// - a failed attempt is logged and the next address is tried
/// - when every address fails, the last error is returned
/// - an empty candidate list fails with [`Error::NodesNotFound`] without
///   invoking `op`
pub async fn query<T, F, Fut>(operation: &str, addresses: &[String], mut op: F) -> Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for address in addresses {
        match op(address.clone()).await {
            Ok(result) => {
                debug!(operation, address = %address, "query succeeded");
                return Ok(result);
            }
            Err(e) => {
                warn!(operation, address = %address, error = %e, "query failed, trying next node");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(Error::NodesNotFound))
}
