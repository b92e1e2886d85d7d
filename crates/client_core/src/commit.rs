use std::{sync::Arc, time::Duration};

use shared::{
    domain::GroupId,
    protocol::{GroupOrderEntry, OrderEntry, SiteOrderEntry},
};
use tracing::{error, info};

use crate::{error::SortError, session::WorkingOrder, with_timeout, NavigationBackend};

/// Ranks every id by its position, moved or not.
pub fn rank_entries<Id: Copy>(ids: &[Id]) -> Vec<OrderEntry<Id>> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| OrderEntry {
            id: *id,
            order_num: index as i64,
        })
        .collect()
}

/// The complete payload for one list. Never a subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderCommit {
    Groups(Vec<GroupOrderEntry>),
    Sites {
        group_id: GroupId,
        entries: Vec<SiteOrderEntry>,
    },
}

impl OrderCommit {
    pub fn from_working(working: &WorkingOrder) -> Result<Self, SortError> {
        match working {
            WorkingOrder::Empty => Err(SortError::NotSorting),
            WorkingOrder::Groups(ids) => Ok(Self::Groups(rank_entries(ids))),
            WorkingOrder::Sites { group_id, sites } => Ok(Self::Sites {
                group_id: *group_id,
                entries: rank_entries(sites),
            }),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Groups(_) => "group order commit",
            Self::Sites { .. } => "site order commit",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Groups(entries) => entries.len(),
            Self::Sites { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ReorderCommitter {
    backend: Arc<dyn NavigationBackend>,
    timeout: Option<Duration>,
}

impl ReorderCommitter {
    pub fn new(backend: Arc<dyn NavigationBackend>, timeout: Option<Duration>) -> Self {
        Self { backend, timeout }
    }

    /// Issues exactly one bulk write. A `false` reply is a persistence failure.
    pub async fn submit(&self, commit: &OrderCommit) -> Result<(), SortError> {
        let operation = commit.operation();
        let accepted = match commit {
            OrderCommit::Groups(entries) => {
                with_timeout(
                    self.timeout,
                    operation,
                    self.backend.update_group_order(entries),
                )
                .await
            }
            OrderCommit::Sites { entries, .. } => {
                with_timeout(
                    self.timeout,
                    operation,
                    self.backend.update_site_order(entries),
                )
                .await
            }
        }
        .map_err(|err| {
            error!(operation, entries = commit.len(), "order: write failed: {err:#}");
            SortError::persistence(operation, err)
        })?;

        if !accepted {
            error!(operation, entries = commit.len(), "order: backend rejected write");
            return Err(SortError::Persistence {
                operation,
                message: "backend rejected the order update".to_string(),
            });
        }
        info!(operation, entries = commit.len(), "order: committed");
        Ok(())
    }
}
