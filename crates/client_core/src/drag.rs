//! Drag lifecycle interpretation.

use std::{
    str::FromStr,
    time::{Duration, Instant},
};

use shared::domain::{GroupId, SiteId};
use tracing::debug;

use crate::{
    error::SortError,
    session::{SortMode, SortSession},
};

pub const GROUP_MARKER_PREFIX: &str = "group-";
pub const POINTER_ACTIVATION_DISTANCE: f32 = 1.0;
pub const TOUCH_ACTIVATION_DELAY: Duration = Duration::from_millis(100);
pub const TOUCH_ACTIVATION_TOLERANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModality {
    Pointer,
    Touch,
    Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Pending,
    Active,
    Aborted,
}

/// Movement/hold thresholds a continuous gesture must pass before it counts as a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationConstraint {
    pub distance: f32,
    pub delay: Duration,
    pub tolerance: f32,
}

impl ActivationConstraint {
    /// Keyboard input has no continuous gesture and therefore no constraint.
    pub fn for_modality(modality: InputModality) -> Option<Self> {
        match modality {
            InputModality::Pointer => Some(Self {
                distance: POINTER_ACTIVATION_DISTANCE,
                delay: Duration::ZERO,
                tolerance: 0.0,
            }),
            InputModality::Touch => Some(Self {
                distance: 0.0,
                delay: TOUCH_ACTIVATION_DELAY,
                tolerance: TOUCH_ACTIVATION_TOLERANCE,
            }),
            InputModality::Keyboard => None,
        }
    }

    pub fn evaluate(&self, moved: f32, held: Duration) -> Activation {
        if self.delay.is_zero() {
            return if moved >= self.distance {
                Activation::Active
            } else {
                Activation::Pending
            };
        }
        if held < self.delay {
            return if moved > self.tolerance {
                Activation::Aborted
            } else {
                Activation::Pending
            };
        }
        Activation::Active
    }
}

/// A parsed drop target id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    GroupContainer(GroupId),
    Item(i64),
}

impl FromStr for DropTarget {
    type Err = SortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(group) = raw.strip_prefix(GROUP_MARKER_PREFIX) {
            return group
                .parse::<i64>()
                .map(|id| Self::GroupContainer(GroupId(id)))
                .map_err(|_| SortError::validation(format!("malformed group marker '{raw}'")));
        }
        raw.parse::<i64>()
            .map(Self::Item)
            .map_err(|_| SortError::validation(format!("malformed drop target '{raw}'")))
    }
}

pub fn group_marker(group_id: GroupId) -> String {
    format!("{GROUP_MARKER_PREFIX}{}", group_id.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderScope {
    Groups,
    Sites(GroupId),
}

/// The single domain action produced by a completed drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    Noop,
    Reorder {
        scope: ReorderScope,
        from: usize,
        to: usize,
    },
    Transfer {
        site_id: SiteId,
        source_group: GroupId,
        target_group: GroupId,
    },
}

fn parse_item(raw: &str) -> Result<i64, SortError> {
    raw.parse::<i64>()
        .map_err(|_| SortError::validation(format!("malformed dragged item id '{raw}'")))
}

fn reorder_scope(mode: SortMode) -> Option<ReorderScope> {
    match mode {
        SortMode::Idle => None,
        SortMode::GroupReorder => Some(ReorderScope::Groups),
        SortMode::SiteReorder(group_id) => Some(ReorderScope::Sites(group_id)),
    }
}

/// Classifies the final drop of `item_id` onto `target`.
pub fn classify_drop(
    session: &SortSession,
    item_id: &str,
    target: Option<&str>,
) -> Result<DragAction, SortError> {
    let Some(target) = target else {
        return Ok(DragAction::Noop);
    };
    let Some(scope) = reorder_scope(session.mode()) else {
        return Ok(DragAction::Noop);
    };
    let item = parse_item(item_id)?;

    let action = match target.parse::<DropTarget>()? {
        DropTarget::GroupContainer(target_group) => match session.mode() {
            SortMode::SiteReorder(source_group) if target_group != source_group => {
                if session.working().position_of(item).is_none() {
                    return Err(SortError::validation(format!(
                        "site {item} does not belong to group {source_group}"
                    )));
                }
                DragAction::Transfer {
                    site_id: SiteId(item),
                    source_group,
                    target_group,
                }
            }
            _ => DragAction::Noop,
        },
        DropTarget::Item(over) => {
            let from = session.working().position_of(item).ok_or_else(|| {
                SortError::validation(format!("dragged item {item} is not in the sorted list"))
            })?;
            match session.working().position_of(over) {
                Some(to) if to != from => DragAction::Reorder { scope, from, to },
                _ => DragAction::Noop,
            }
        }
    };
    debug!(
        item_id,
        drop_target = target,
        mode = session.mode().label(),
        ?action,
        "drag: classified drop"
    );
    Ok(action)
}

/// Group to highlight while a site is dragged over `candidate`.
pub fn hover_target(session: &SortSession, candidate: Option<&str>) -> Option<GroupId> {
    let SortMode::SiteReorder(source_group) = session.mode() else {
        return None;
    };
    match candidate?.parse::<DropTarget>().ok()? {
        DropTarget::GroupContainer(group_id) if group_id != source_group => Some(group_id),
        _ => None,
    }
}

/// Discrete keyboard equivalents of a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardCommand {
    PickUp,
    MoveUp,
    MoveDown,
    Drop,
    Cancel,
}

/// Translates a keyboard move of `item_id` into a one-step reorder.
pub fn keyboard_action(
    session: &SortSession,
    item_id: &str,
    command: KeyboardCommand,
) -> Result<DragAction, SortError> {
    let Some(scope) = reorder_scope(session.mode()) else {
        return Err(SortError::NotSorting);
    };
    let item = parse_item(item_id)?;
    let from = session.working().position_of(item).ok_or_else(|| {
        SortError::validation(format!("item {item} is not in the sorted list"))
    })?;
    let last = session.working().len().saturating_sub(1);
    let to = match command {
        KeyboardCommand::MoveUp => from.saturating_sub(1),
        KeyboardCommand::MoveDown => (from + 1).min(last),
        KeyboardCommand::PickUp | KeyboardCommand::Drop | KeyboardCommand::Cancel => from,
    };
    if to == from {
        return Ok(DragAction::Noop);
    }
    Ok(DragAction::Reorder { scope, from, to })
}

#[derive(Debug, Clone, PartialEq)]
enum DragPhase {
    Idle,
    Pending {
        item_id: String,
        constraint: ActivationConstraint,
        started_at: Instant,
    },
    Active {
        item_id: String,
    },
}

/// Tracks one gesture from press to release and applies activation thresholds.
#[derive(Debug, Clone)]
pub struct DragTracker {
    phase: DragPhase,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self {
            phase: DragPhase::Idle,
        }
    }
}

impl DragTracker {
    pub fn start(&mut self, item_id: impl Into<String>, modality: InputModality, now: Instant) {
        let item_id = item_id.into();
        self.phase = match ActivationConstraint::for_modality(modality) {
            Some(constraint) => DragPhase::Pending {
                item_id,
                constraint,
                started_at: now,
            },
            None => DragPhase::Active { item_id },
        };
    }

    /// Feeds the total distance moved since press. Returns whether the drag is active.
    pub fn track(&mut self, moved: f32, now: Instant) -> bool {
        let DragPhase::Pending {
            item_id,
            constraint,
            started_at,
        } = &self.phase
        else {
            return self.is_active();
        };
        match constraint.evaluate(moved, now.saturating_duration_since(*started_at)) {
            Activation::Pending => false,
            Activation::Active => {
                self.phase = DragPhase::Active {
                    item_id: item_id.clone(),
                };
                true
            }
            Activation::Aborted => {
                self.phase = DragPhase::Idle;
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, DragPhase::Active { .. })
    }

    pub fn active_item(&self) -> Option<&str> {
        match &self.phase {
            DragPhase::Active { item_id } => Some(item_id),
            _ => None,
        }
    }

    /// Ends the gesture. True only if `item_id` was the activated drag.
    pub fn finish(&mut self, item_id: &str) -> bool {
        let completed = self.active_item() == Some(item_id);
        self.phase = DragPhase::Idle;
        completed
    }

    pub fn abort(&mut self) {
        self.phase = DragPhase::Idle;
    }
}

#[cfg(test)]
#[path = "tests/drag_tests.rs"]
mod tests;
