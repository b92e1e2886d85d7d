use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Group, GroupId, GroupWithSites, Site, SiteId},
    protocol::{GroupOrderEntry, GroupPatch, NewGroup, NewSite, SiteOrderEntry, SitePatch},
};
use tokio::sync::{Mutex, Notify};

use crate::{InMemoryNavigationBackend, NavigationBackend};

pub(crate) fn site(id: i64, group_id: i64, order_num: i64) -> Site {
    Site {
        id: SiteId(id),
        group_id: GroupId(group_id),
        name: format!("site-{id}"),
        url: format!("https://site-{id}.example"),
        icon: String::new(),
        description: String::new(),
        notes: String::new(),
        order_num,
        is_public: true,
    }
}

pub(crate) fn group(id: i64, order_num: i64, site_ids: &[i64]) -> GroupWithSites {
    GroupWithSites {
        group: Group {
            id: GroupId(id),
            name: format!("group-{id}"),
            order_num,
            is_public: true,
        },
        sites: site_ids
            .iter()
            .enumerate()
            .map(|(index, site_id)| site(*site_id, id, index as i64))
            .collect(),
    }
}

/// G1 = [11, 12, 13], G2 = [21, 22], G3 = [31].
pub(crate) fn sample_tree() -> Vec<GroupWithSites> {
    vec![
        group(1, 0, &[11, 12, 13]),
        group(2, 1, &[21, 22]),
        group(3, 2, &[31]),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Load,
    GroupOrder(Vec<GroupOrderEntry>),
    SiteOrder(Vec<SiteOrderEntry>),
    UpdateSite(SiteId, SitePatch),
    CreateGroup(NewGroup),
    UpdateGroup(GroupId, GroupPatch),
    DeleteGroup(GroupId),
    CreateSite(NewSite),
    DeleteSite(SiteId),
}

/// In-memory backend that records every call and can be told to misbehave.
pub(crate) struct RecordingBackend {
    inner: InMemoryNavigationBackend,
    pub(crate) calls: Arc<Mutex<Vec<Call>>>,
    pub(crate) fail_loads: Arc<Mutex<bool>>,
    pub(crate) fail_writes: Arc<Mutex<Option<String>>>,
    pub(crate) reject_orders: Arc<Mutex<bool>>,
    pub(crate) write_gate: Arc<Mutex<Option<Arc<Notify>>>>,
    pub(crate) write_delay: Arc<Mutex<Option<Duration>>>,
}

impl RecordingBackend {
    pub(crate) fn new(tree: Vec<GroupWithSites>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryNavigationBackend::seeded(tree),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_loads: Arc::new(Mutex::new(false)),
            fail_writes: Arc::new(Mutex::new(None)),
            reject_orders: Arc::new(Mutex::new(false)),
            write_gate: Arc::new(Mutex::new(None)),
            write_delay: Arc::new(Mutex::new(None)),
        })
    }

    pub(crate) async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn writes(&self) -> Vec<Call> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| *call != Call::Load)
            .collect()
    }

    pub(crate) async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Holds every write until the returned handle is notified.
    pub(crate) async fn hold_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.write_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    async fn write(&self, call: Call) -> Result<()> {
        self.calls.lock().await.push(call);
        let gate = self.write_gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let delay = *self.write_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.fail_writes.lock().await.clone() {
            return Err(anyhow!(err));
        }
        Ok(())
    }
}

#[async_trait]
impl NavigationBackend for RecordingBackend {
    async fn get_groups_with_sites(&self) -> Result<Vec<GroupWithSites>> {
        self.calls.lock().await.push(Call::Load);
        if *self.fail_loads.lock().await {
            return Err(anyhow!("connection reset while loading"));
        }
        self.inner.get_groups_with_sites().await
    }

    async fn update_group_order(&self, entries: &[GroupOrderEntry]) -> Result<bool> {
        self.write(Call::GroupOrder(entries.to_vec())).await?;
        if *self.reject_orders.lock().await {
            return Ok(false);
        }
        self.inner.update_group_order(entries).await
    }

    async fn update_site_order(&self, entries: &[SiteOrderEntry]) -> Result<bool> {
        self.write(Call::SiteOrder(entries.to_vec())).await?;
        if *self.reject_orders.lock().await {
            return Ok(false);
        }
        self.inner.update_site_order(entries).await
    }

    async fn update_site(&self, site_id: SiteId, patch: &SitePatch) -> Result<Site> {
        self.write(Call::UpdateSite(site_id, patch.clone())).await?;
        self.inner.update_site(site_id, patch).await
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        self.write(Call::CreateGroup(group.clone())).await?;
        self.inner.create_group(group).await
    }

    async fn update_group(&self, group_id: GroupId, patch: &GroupPatch) -> Result<Group> {
        self.write(Call::UpdateGroup(group_id, patch.clone())).await?;
        self.inner.update_group(group_id, patch).await
    }

    async fn delete_group(&self, group_id: GroupId) -> Result<bool> {
        self.write(Call::DeleteGroup(group_id)).await?;
        self.inner.delete_group(group_id).await
    }

    async fn create_site(&self, site: &NewSite) -> Result<Site> {
        self.write(Call::CreateSite(site.clone())).await?;
        self.inner.create_site(site).await
    }

    async fn delete_site(&self, site_id: SiteId) -> Result<bool> {
        self.write(Call::DeleteSite(site_id)).await?;
        self.inner.delete_site(site_id).await
    }
}
