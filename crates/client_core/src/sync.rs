//! Reload-after-every-mutation policy.

use std::{future::Future, sync::Arc, time::Duration};

use shared::{
    domain::{find_group, Group, GroupId, GroupWithSites, Site, SiteId},
    protocol::{GroupPatch, NewGroup, NewSite, SitePatch},
};
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

use crate::{error::SortError, with_timeout, NavigationBackend, Notification};

const RELOAD_OPERATION: &str = "reload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Reloaded,
    /// The mutation succeeded but the follow-up reload failed.
    Stale,
}

/// Authoritative snapshot. A failed reload never rolls the mutation back.
pub struct DataSync {
    backend: Arc<dyn NavigationBackend>,
    timeout: Option<Duration>,
    snapshot: RwLock<Arc<Vec<GroupWithSites>>>,
    events: broadcast::Sender<Notification>,
}

impl DataSync {
    pub fn new(backend: Arc<dyn NavigationBackend>, timeout: Option<Duration>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            timeout,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            events,
        })
    }

    pub fn backend(&self) -> Arc<dyn NavigationBackend> {
        Arc::clone(&self.backend)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    pub fn notify(&self, notification: Notification) {
        // No subscribers is fine; notifications are transient.
        let _ = self.events.send(notification);
    }

    pub fn notify_error(&self, err: &SortError) {
        self.notify(Notification::from_error(err));
    }

    /// Last successfully loaded tree.
    pub async fn snapshot(&self) -> Arc<Vec<GroupWithSites>> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Fetches every group with its sites and replaces the snapshot.
    pub async fn reload(&self) -> Result<Arc<Vec<GroupWithSites>>, SortError> {
        let groups = with_timeout(
            self.timeout,
            RELOAD_OPERATION,
            self.backend.get_groups_with_sites(),
        )
        .await
        .map_err(|err| {
            error!("sync: reload failed: {err:#}");
            SortError::sync(RELOAD_OPERATION, err)
        })?;
        let groups = Arc::new(groups);
        *self.snapshot.write().await = Arc::clone(&groups);
        info!(groups = groups.len(), "sync: snapshot replaced");
        Ok(groups)
    }

    /// Mandatory reload following a successful mutation.
    pub async fn reload_after(&self, operation: &'static str) -> SyncOutcome {
        match self.reload().await {
            Ok(_) => SyncOutcome::Reloaded,
            Err(err) => {
                let err = match err {
                    SortError::Sync { message, .. } => SortError::Sync { operation, message },
                    other => other,
                };
                warn!(operation, "sync: view is stale until the next successful reload");
                self.notify_error(&err);
                SyncOutcome::Stale
            }
        }
    }

    async fn mutate<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<(T, SyncOutcome), SortError> {
        let value = with_timeout(self.timeout, operation, call)
            .await
            .map_err(|err| {
                error!(operation, "sync: mutation failed: {err:#}");
                let err = SortError::persistence(operation, err);
                self.notify_error(&err);
                err
            })?;
        let outcome = self.reload_after(operation).await;
        Ok((value, outcome))
    }

    /// Creates a group at the end of the current list.
    pub async fn create_group(
        &self,
        name: &str,
        is_public: bool,
    ) -> Result<(Group, SyncOutcome), SortError> {
        let name = name.trim();
        if name.is_empty() {
            return self.reject("group name must not be empty");
        }
        let order_num = self.snapshot().await.len() as i64;
        let group = NewGroup {
            name: name.to_string(),
            order_num,
            is_public,
        };
        self.mutate("create group", self.backend.create_group(&group))
            .await
    }

    pub async fn update_group(
        &self,
        group_id: GroupId,
        patch: &GroupPatch,
    ) -> Result<(Group, SyncOutcome), SortError> {
        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return self.reject("group name must not be empty");
        }
        self.mutate("update group", self.backend.update_group(group_id, patch))
            .await
    }

    pub async fn delete_group(&self, group_id: GroupId) -> Result<SyncOutcome, SortError> {
        let (deleted, outcome) = self
            .mutate("delete group", self.backend.delete_group(group_id))
            .await?;
        if !deleted {
            return self.reject_persistence(
                "delete group",
                format!("group {group_id} was not deleted"),
            );
        }
        Ok(outcome)
    }

    /// Creates a site after the last site of its group.
    pub async fn create_site(&self, mut site: NewSite) -> Result<(Site, SyncOutcome), SortError> {
        if site.name.trim().is_empty() || site.url.trim().is_empty() {
            return self.reject("site name and url must not be empty");
        }
        let snapshot = self.snapshot().await;
        let Some(group) = find_group(&snapshot, site.group_id) else {
            return self.reject(format!("group {} does not exist", site.group_id));
        };
        site.order_num = next_site_rank(group);
        self.mutate("create site", self.backend.create_site(&site))
            .await
    }

    pub async fn update_site(
        &self,
        site_id: SiteId,
        patch: &SitePatch,
    ) -> Result<(Site, SyncOutcome), SortError> {
        self.mutate("update site", self.backend.update_site(site_id, patch))
            .await
    }

    pub async fn delete_site(&self, site_id: SiteId) -> Result<SyncOutcome, SortError> {
        let (deleted, outcome) = self
            .mutate("delete site", self.backend.delete_site(site_id))
            .await?;
        if !deleted {
            return self.reject_persistence(
                "delete site",
                format!("site {site_id} was not deleted"),
            );
        }
        Ok(outcome)
    }

    fn reject<T>(&self, message: impl Into<String>) -> Result<T, SortError> {
        let err = SortError::validation(message);
        warn!("sync: {err}");
        self.notify_error(&err);
        Err(err)
    }

    fn reject_persistence<T>(
        &self,
        operation: &'static str,
        message: String,
    ) -> Result<T, SortError> {
        let err = SortError::Persistence { operation, message };
        self.notify_error(&err);
        Err(err)
    }
}

/// One past the highest rank in the group, or 0 when it is empty.
pub fn next_site_rank(group: &GroupWithSites) -> i64 {
    group
        .sites
        .iter()
        .map(|site| site.order_num)
        .max()
        .map_or(0, |max| max + 1)
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
