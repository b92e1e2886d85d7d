use std::{sync::Arc, time::Duration};

use shared::{
    domain::{find_group, find_site, GroupId, GroupWithSites, Site, SiteId},
    protocol::SitePatch,
};
use tracing::{error, info};

use crate::{error::SortError, with_timeout, NavigationBackend};

const TRANSFER_OPERATION: &str = "site transfer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub site_id: SiteId,
    pub source_group: GroupId,
    pub target_group: GroupId,
}

/// Builds the reassignment write from the authoritative tree.
///
/// The moved site always lands at rank 0 of the target group.
pub fn prepare_transfer(
    groups: &[GroupWithSites],
    request: TransferRequest,
) -> Result<(Site, SitePatch), SortError> {
    if request.source_group == request.target_group {
        return Err(SortError::validation(format!(
            "site {} is already in group {}",
            request.site_id, request.target_group
        )));
    }
    if find_group(groups, request.target_group).is_none() {
        return Err(SortError::validation(format!(
            "target group {} does not exist",
            request.target_group
        )));
    }
    let site = find_site(groups, request.site_id).ok_or_else(|| {
        SortError::validation(format!("site {} to move was not found", request.site_id))
    })?;
    if site.group_id != request.source_group {
        return Err(SortError::validation(format!(
            "site {} belongs to group {}, not {}",
            request.site_id, site.group_id, request.source_group
        )));
    }

    let mut moved = site.clone();
    moved.group_id = request.target_group;
    moved.order_num = 0;
    let patch = SitePatch::from_site(&moved);
    Ok((moved, patch))
}

pub struct CrossGroupTransfer {
    backend: Arc<dyn NavigationBackend>,
    timeout: Option<Duration>,
}

impl CrossGroupTransfer {
    pub fn new(backend: Arc<dyn NavigationBackend>, timeout: Option<Duration>) -> Self {
        Self { backend, timeout }
    }

    /// Issues a single `update_site`. Nothing is inserted locally.
    pub async fn execute(
        &self,
        groups: &[GroupWithSites],
        request: TransferRequest,
    ) -> Result<Site, SortError> {
        let (moved, patch) = prepare_transfer(groups, request)?;
        let updated = with_timeout(
            self.timeout,
            TRANSFER_OPERATION,
            self.backend.update_site(request.site_id, &patch),
        )
        .await
        .map_err(|err| {
            error!(
                site_id = request.site_id.0,
                target_group = request.target_group.0,
                "transfer: update failed: {err:#}"
            );
            SortError::persistence(TRANSFER_OPERATION, err)
        })?;
        info!(
            site_id = request.site_id.0,
            site = %moved.name,
            source_group = request.source_group.0,
            target_group = request.target_group.0,
            "transfer: site reassigned"
        );
        Ok(updated)
    }
}
