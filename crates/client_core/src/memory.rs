use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{Group, GroupId, GroupWithSites, Site, SiteId},
    error::{ApiException, ErrorCode},
    protocol::{GroupOrderEntry, GroupPatch, NewGroup, NewSite, SiteOrderEntry, SitePatch},
};
use tokio::sync::RwLock;

use crate::NavigationBackend;

#[derive(Default)]
struct MemoryState {
    groups: Vec<Group>,
    sites: Vec<Site>,
    next_group_id: i64,
    next_site_id: i64,
}

impl MemoryState {
    fn tree(&self) -> Vec<GroupWithSites> {
        let mut groups = self.groups.clone();
        groups.sort_by_key(|group| (group.order_num, group.id));
        groups
            .into_iter()
            .map(|group| {
                let mut sites: Vec<Site> = self
                    .sites
                    .iter()
                    .filter(|site| site.group_id == group.id)
                    .cloned()
                    .collect();
                sites.sort_by_key(|site| (site.order_num, site.id));
                GroupWithSites { group, sites }
            })
            .collect()
    }

    fn has_group(&self, group_id: GroupId) -> bool {
        self.groups.iter().any(|group| group.id == group_id)
    }
}

fn not_found(what: &str, id: i64) -> anyhow::Error {
    ApiException::new(ErrorCode::NotFound, format!("{what} {id} not found")).into()
}

/// Keeps groups and sites in memory and orders reads by `(order_num, id)`.
#[derive(Default)]
pub struct InMemoryNavigationBackend {
    state: RwLock<MemoryState>,
}

impl InMemoryNavigationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the backend with an existing tree. Ids are kept as given.
    pub fn seeded(tree: Vec<GroupWithSites>) -> Self {
        let mut state = MemoryState::default();
        for GroupWithSites { group, sites } in tree {
            state.next_group_id = state.next_group_id.max(group.id.0);
            for site in sites {
                state.next_site_id = state.next_site_id.max(site.id.0);
                state.sites.push(site);
            }
            state.groups.push(group);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// A small sample dashboard.
    pub fn demo() -> Self {
        let entries: [(&str, &[(&str, &str)]); 3] = [
            (
                "Daily",
                &[
                    ("Mail", "https://mail.example.com"),
                    ("Calendar", "https://calendar.example.com"),
                    ("News", "https://news.example.com"),
                ],
            ),
            (
                "Development",
                &[
                    ("Docs", "https://docs.rs"),
                    ("Crates", "https://crates.io"),
                ],
            ),
            ("Media", &[("Music", "https://music.example.com")]),
        ];
        let mut tree = Vec::new();
        let mut site_id = 0;
        for (group_index, (name, sites)) in entries.iter().enumerate() {
            let group_id = GroupId(group_index as i64 + 1);
            let sites = sites
                .iter()
                .enumerate()
                .map(|(site_index, (site_name, url))| {
                    site_id += 1;
                    Site {
                        id: SiteId(site_id),
                        group_id,
                        name: site_name.to_string(),
                        url: url.to_string(),
                        icon: String::new(),
                        description: String::new(),
                        notes: String::new(),
                        order_num: site_index as i64,
                        is_public: true,
                    }
                })
                .collect();
            tree.push(GroupWithSites {
                group: Group {
                    id: group_id,
                    name: name.to_string(),
                    order_num: group_index as i64,
                    is_public: true,
                },
                sites,
            });
        }
        Self::seeded(tree)
    }
}

#[async_trait]
impl NavigationBackend for InMemoryNavigationBackend {
    async fn get_groups_with_sites(&self) -> Result<Vec<GroupWithSites>> {
        Ok(self.state.read().await.tree())
    }

    async fn update_group_order(&self, entries: &[GroupOrderEntry]) -> Result<bool> {
        let mut state = self.state.write().await;
        let known: HashSet<GroupId> = state.groups.iter().map(|group| group.id).collect();
        if entries.iter().any(|entry| !known.contains(&entry.id)) {
            return Ok(false);
        }
        for entry in entries {
            if let Some(group) = state.groups.iter_mut().find(|group| group.id == entry.id) {
                group.order_num = entry.order_num;
            }
        }
        Ok(true)
    }

    async fn update_site_order(&self, entries: &[SiteOrderEntry]) -> Result<bool> {
        let mut state = self.state.write().await;
        let known: HashSet<SiteId> = state.sites.iter().map(|site| site.id).collect();
        if entries.iter().any(|entry| !known.contains(&entry.id)) {
            return Ok(false);
        }
        for entry in entries {
            if let Some(site) = state.sites.iter_mut().find(|site| site.id == entry.id) {
                site.order_num = entry.order_num;
            }
        }
        Ok(true)
    }

    async fn update_site(&self, site_id: SiteId, patch: &SitePatch) -> Result<Site> {
        let mut state = self.state.write().await;
        if let Some(group_id) = patch.group_id {
            if !state.has_group(group_id) {
                return Err(not_found("group", group_id.0));
            }
        }
        let site = state
            .sites
            .iter_mut()
            .find(|site| site.id == site_id)
            .ok_or_else(|| not_found("site", site_id.0))?;
        patch.apply_to(site);
        Ok(site.clone())
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;
        state.next_group_id += 1;
        let created = Group {
            id: GroupId(state.next_group_id),
            name: group.name.clone(),
            order_num: group.order_num,
            is_public: group.is_public,
        };
        state.groups.push(created.clone());
        Ok(created)
    }

    async fn update_group(&self, group_id: GroupId, patch: &GroupPatch) -> Result<Group> {
        let mut state = self.state.write().await;
        let group = state
            .groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| not_found("group", group_id.0))?;
        if let Some(name) = &patch.name {
            group.name = name.clone();
        }
        if let Some(order_num) = patch.order_num {
            group.order_num = order_num;
        }
        if let Some(is_public) = patch.is_public {
            group.is_public = is_public;
        }
        Ok(group.clone())
    }

    async fn delete_group(&self, group_id: GroupId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.groups.len();
        state.groups.retain(|group| group.id != group_id);
        if state.groups.len() == before {
            return Ok(false);
        }
        state.sites.retain(|site| site.group_id != group_id);
        Ok(true)
    }

    async fn create_site(&self, site: &NewSite) -> Result<Site> {
        let mut state = self.state.write().await;
        if !state.has_group(site.group_id) {
            return Err(not_found("group", site.group_id.0));
        }
        state.next_site_id += 1;
        let created = Site {
            id: SiteId(state.next_site_id),
            group_id: site.group_id,
            name: site.name.clone(),
            url: site.url.clone(),
            icon: site.icon.clone(),
            description: site.description.clone(),
            notes: site.notes.clone(),
            order_num: site.order_num,
            is_public: site.is_public,
        };
        state.sites.push(created.clone());
        Ok(created)
    }

    async fn delete_site(&self, site_id: SiteId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.sites.len();
        state.sites.retain(|site| site.id != site_id);
        Ok(state.sites.len() != before)
    }
}
