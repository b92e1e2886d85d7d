use std::{future::Future, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    domain::{Group, GroupId, GroupWithSites, Site, SiteId},
    protocol::{GroupOrderEntry, GroupPatch, NewGroup, NewSite, SiteOrderEntry, SitePatch},
};

pub mod commit;
pub mod controller;
pub mod drag;
pub mod error;
pub mod http;
pub mod memory;
pub mod session;
pub mod sync;
pub mod transfer;

pub use controller::{DropOutcome, SortController};
pub use error::{ErrorCategory, SortError};
pub use http::HttpNavigationClient;
pub use memory::InMemoryNavigationBackend;
pub use session::{SortMode, SortSession, WorkingOrder};
pub use sync::{DataSync, SyncOutcome};

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Data-access contract of the navigation backend.
///
/// Order writes are idempotent full-list writes; `false` means the backend
/// rejected the whole list.
#[async_trait]
pub trait NavigationBackend: Send + Sync {
    async fn get_groups_with_sites(&self) -> Result<Vec<GroupWithSites>>;
    async fn update_group_order(&self, entries: &[GroupOrderEntry]) -> Result<bool>;
    async fn update_site_order(&self, entries: &[SiteOrderEntry]) -> Result<bool>;
    async fn update_site(&self, site_id: SiteId, patch: &SitePatch) -> Result<Site>;
    async fn create_group(&self, group: &NewGroup) -> Result<Group>;
    async fn update_group(&self, group_id: GroupId, patch: &GroupPatch) -> Result<Group>;
    async fn delete_group(&self, group_id: GroupId) -> Result<bool>;
    async fn create_site(&self, site: &NewSite) -> Result<Site>;
    async fn delete_site(&self, site_id: SiteId) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient, dismissible message for the user.
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: Option<ErrorCategory>,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            category: None,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn from_error(err: &SortError) -> Self {
        Self {
            level: NotificationLevel::Error,
            category: Some(err.category()),
            message: err.to_string(),
            raised_at: Utc::now(),
        }
    }
}

/// Runs a backend call under the optional operation timeout.
pub(crate) async fn with_timeout<T>(
    limit: Option<Duration>,
    operation: &'static str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| anyhow!("{operation} timed out after {}ms", limit.as_millis()))?,
        None => call.await,
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
