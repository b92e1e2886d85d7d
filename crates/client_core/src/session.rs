use shared::domain::{find_group, GroupId, GroupWithSites, SiteId};

use crate::error::SortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Idle,
    GroupReorder,
    SiteReorder(GroupId),
}

impl SortMode {
    pub fn is_sorting(self) -> bool {
        self != Self::Idle
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::GroupReorder => "group_reorder",
            Self::SiteReorder(_) => "site_reorder",
        }
    }
}

/// Ids of the list being sorted, in their current visual order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkingOrder {
    #[default]
    Empty,
    Groups(Vec<GroupId>),
    Sites {
        group_id: GroupId,
        sites: Vec<SiteId>,
    },
}

impl WorkingOrder {
    fn groups_of(groups: &[GroupWithSites]) -> Self {
        Self::Groups(groups.iter().map(GroupWithSites::id).collect())
    }

    fn sites_of(group: &GroupWithSites) -> Self {
        Self::Sites {
            group_id: group.id(),
            sites: group.sites.iter().map(|site| site.id).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Groups(ids) => ids.len(),
            Self::Sites { sites, .. } => sites.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of a raw item id in the working list.
    pub fn position_of(&self, raw_id: i64) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::Groups(ids) => ids.iter().position(|id| id.0 == raw_id),
            Self::Sites { sites, .. } => sites.iter().position(|id| id.0 == raw_id),
        }
    }

    fn move_item(&mut self, from: usize, to: usize) {
        match self {
            Self::Empty => {}
            Self::Groups(ids) => array_move(ids, from, to),
            Self::Sites { sites, .. } => array_move(sites, from, to),
        }
    }
}

/// Removes the element at `from` and reinserts it at `to`.
fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSession {
    mode: SortMode,
    hover_target: Option<GroupId>,
    working: WorkingOrder,
    in_flight: bool,
}

impl SortSession {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    /// Foreign group currently highlighted as a transfer target.
    pub fn hover_target(&self) -> Option<GroupId> {
        self.hover_target
    }

    pub fn working(&self) -> &WorkingOrder {
        &self.working
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Commit is reachable only while sorting and with nothing pending.
    pub fn can_commit(&self) -> bool {
        self.mode.is_sorting() && !self.in_flight
    }

    pub fn can_cancel(&self) -> bool {
        !self.in_flight
    }

    fn ensure_not_in_flight(&self) -> Result<(), SortError> {
        if self.in_flight {
            return Err(SortError::Busy);
        }
        Ok(())
    }

    pub fn start_group_sort(&self, groups: &[GroupWithSites]) -> Result<Self, SortError> {
        self.ensure_not_in_flight()?;
        Ok(Self {
            mode: SortMode::GroupReorder,
            hover_target: None,
            working: WorkingOrder::groups_of(groups),
            in_flight: false,
        })
    }

    pub fn start_site_sort(
        &self,
        groups: &[GroupWithSites],
        group_id: GroupId,
    ) -> Result<Self, SortError> {
        self.ensure_not_in_flight()?;
        let group = find_group(groups, group_id)
            .ok_or_else(|| SortError::validation(format!("group {group_id} does not exist")))?;
        Ok(Self {
            mode: SortMode::SiteReorder(group_id),
            hover_target: None,
            working: WorkingOrder::sites_of(group),
            in_flight: false,
        })
    }

    /// Drops the working order and hover mark without touching the backend.
    pub fn cancel(&self) -> Result<Self, SortError> {
        self.ensure_not_in_flight()?;
        Ok(Self::idle())
    }

    /// Applies a local, uncommitted move inside the working list.
    pub fn move_item(&self, from: usize, to: usize) -> Result<Self, SortError> {
        if !self.mode.is_sorting() {
            return Err(SortError::NotSorting);
        }
        self.ensure_not_in_flight()?;
        let len = self.working.len();
        if from >= len || to >= len {
            return Err(SortError::validation(format!(
                "move {from} -> {to} is outside a list of {len} items"
            )));
        }
        let mut next = self.clone();
        next.working.move_item(from, to);
        Ok(next)
    }

    pub fn with_hover(&self, target: Option<GroupId>) -> Self {
        Self {
            hover_target: target,
            ..self.clone()
        }
    }

    /// Marks a commit or transfer as issued. Hover is cleared at the same time.
    pub fn begin_operation(&self) -> Result<Self, SortError> {
        if !self.mode.is_sorting() {
            return Err(SortError::NotSorting);
        }
        self.ensure_not_in_flight()?;
        Ok(Self {
            in_flight: true,
            hover_target: None,
            ..self.clone()
        })
    }

    pub fn end_operation(&self) -> Self {
        Self {
            in_flight: false,
            ..self.clone()
        }
    }

    /// Rebuilds the working copy from a freshly loaded tree, keeping the mode.
    ///
    /// A site session whose group disappeared falls back to idle.
    pub fn rebase(&self, groups: &[GroupWithSites]) -> Self {
        let working = match self.mode {
            SortMode::Idle => WorkingOrder::Empty,
            SortMode::GroupReorder => WorkingOrder::groups_of(groups),
            SortMode::SiteReorder(group_id) => match find_group(groups, group_id) {
                Some(group) => WorkingOrder::sites_of(group),
                None => {
                    return Self {
                        in_flight: self.in_flight,
                        ..Self::idle()
                    }
                }
            },
        };
        Self {
            working,
            ..self.clone()
        }
    }

    /// Returns `groups` with the working order applied for rendering.
    ///
    /// Ids missing from the tree are skipped; tree members missing from the
    /// working list keep their relative order after the listed ones.
    pub fn apply_to(&self, groups: &[GroupWithSites]) -> Vec<GroupWithSites> {
        match &self.working {
            WorkingOrder::Empty => groups.to_vec(),
            WorkingOrder::Groups(order) => reorder_by(groups.to_vec(), order, GroupWithSites::id),
            WorkingOrder::Sites {
                group_id,
                sites: order,
            } => groups
                .iter()
                .map(|group| {
                    if group.id() != *group_id {
                        return group.clone();
                    }
                    GroupWithSites {
                        group: group.group.clone(),
                        sites: reorder_by(group.sites.clone(), order, |site| site.id),
                    }
                })
                .collect(),
        }
    }
}

fn reorder_by<T, Id: PartialEq + Copy>(
    mut items: Vec<T>,
    order: &[Id],
    id_of: impl Fn(&T) -> Id,
) -> Vec<T> {
    let mut ordered = Vec::with_capacity(items.len());
    for id in order {
        if let Some(position) = items.iter().position(|item| id_of(item) == *id) {
            ordered.push(items.remove(position));
        }
    }
    ordered.extend(items);
    ordered
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
