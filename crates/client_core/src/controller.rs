use std::{sync::Arc, time::Instant};

use shared::{
    domain::{find_group, Group, GroupId, GroupWithSites, Site, SiteId},
    protocol::{GroupPatch, NewSite, SitePatch},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    commit::{OrderCommit, ReorderCommitter},
    drag::{self, DragAction, DragTracker, InputModality, KeyboardCommand},
    error::SortError,
    session::{SortMode, SortSession},
    sync::{DataSync, SyncOutcome},
    transfer::{CrossGroupTransfer, TransferRequest},
    Notification,
};

/// What a completed drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Ignored,
    Reordered { from: usize, to: usize },
    Transferred { site: Site, sync: SyncOutcome },
}

pub struct SortController {
    sync: Arc<DataSync>,
    committer: ReorderCommitter,
    transfer: CrossGroupTransfer,
    session: Mutex<SortSession>,
    drag: Mutex<DragTracker>,
}

impl SortController {
    pub fn new(sync: Arc<DataSync>) -> Arc<Self> {
        let backend = sync.backend();
        let timeout = sync.timeout();
        Arc::new(Self {
            committer: ReorderCommitter::new(Arc::clone(&backend), timeout),
            transfer: CrossGroupTransfer::new(backend, timeout),
            sync,
            session: Mutex::new(SortSession::idle()),
            drag: Mutex::new(DragTracker::default()),
        })
    }

    pub fn data(&self) -> &Arc<DataSync> {
        &self.sync
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sync.subscribe()
    }

    fn report<T>(&self, result: Result<T, SortError>) -> Result<T, SortError> {
        if let Err(err) = &result {
            warn!(category = ?err.category(), "sort: {err}");
            self.sync.notify_error(err);
        }
        result
    }

    /// Initial load. Failure is reported and leaves the snapshot empty.
    pub async fn load(&self) -> Result<(), SortError> {
        let groups = self.report(self.sync.reload().await)?;
        self.rebase(&groups).await;
        Ok(())
    }

    pub async fn session(&self) -> SortSession {
        self.session.lock().await.clone()
    }

    pub async fn mode(&self) -> SortMode {
        self.session.lock().await.mode()
    }

    /// Authoritative tree with the active working order applied.
    pub async fn visible_groups(&self) -> Vec<GroupWithSites> {
        let snapshot = self.sync.snapshot().await;
        self.session.lock().await.apply_to(&snapshot)
    }

    async fn rebase(&self, groups: &[GroupWithSites]) {
        let mut session = self.session.lock().await;
        *session = session.rebase(groups);
    }

    async fn transition(
        &self,
        step: impl FnOnce(&SortSession) -> Result<SortSession, SortError>,
    ) -> Result<SortSession, SortError> {
        let mut session = self.session.lock().await;
        let next = self.report(step(&session))?;
        *session = next.clone();
        Ok(next)
    }

    pub async fn start_group_sort(&self) -> Result<(), SortError> {
        let snapshot = self.sync.snapshot().await;
        self.transition(|session| session.start_group_sort(&snapshot)).await?;
        self.drag.lock().await.abort();
        info!(groups = snapshot.len(), "sort: group reorder started");
        Ok(())
    }

    pub async fn start_site_sort(&self, group_id: GroupId) -> Result<(), SortError> {
        let snapshot = self.sync.snapshot().await;
        let next = self
            .transition(|session| session.start_site_sort(&snapshot, group_id))
            .await?;
        self.drag.lock().await.abort();
        info!(
            group_id = group_id.0,
            sites = next.working().len(),
            "sort: site reorder started"
        );
        Ok(())
    }

    /// Leaves the session without any write. Refused while a call is pending.
    pub async fn cancel(&self) -> Result<(), SortError> {
        self.transition(SortSession::cancel).await?;
        self.drag.lock().await.abort();
        info!("sort: cancelled");
        Ok(())
    }

    /// Local, uncommitted move within the working list.
    pub async fn move_item(&self, from: usize, to: usize) -> Result<(), SortError> {
        self.transition(|session| session.move_item(from, to)).await?;
        Ok(())
    }

    /// Persists the working order of the active list as one full write.
    pub async fn commit(&self) -> Result<SyncOutcome, SortError> {
        let (commit, mode) = {
            let mut session = self.session.lock().await;
            let prepared = session.begin_operation().and_then(|pending| {
                let commit = OrderCommit::from_working(pending.working())?;
                Ok((commit, pending))
            });
            let (commit, pending) = self.report(prepared)?;
            *session = pending;
            (commit, session.mode())
        };
        info!(
            mode = mode.label(),
            entries = commit.len(),
            "sort: committing order"
        );

        if let Err(err) = self.committer.submit(&commit).await {
            let mut session = self.session.lock().await;
            *session = session.end_operation();
            return self.report(Err(err));
        }

        let outcome = self.sync.reload_after(commit.operation()).await;
        *self.session.lock().await = SortSession::idle();
        Ok(outcome)
    }

    pub async fn drag_start(&self, item_id: &str, modality: InputModality, now: Instant) {
        self.drag.lock().await.start(item_id, modality, now);
    }

    /// Total pointer travel since `drag_start`. Returns whether the drag is active.
    pub async fn drag_move(&self, moved: f32, now: Instant) -> bool {
        self.drag.lock().await.track(moved, now)
    }

    /// Updates the pending transfer highlight while a drag hovers `candidate`.
    pub async fn drag_over(&self, candidate: Option<&str>) -> Option<GroupId> {
        if !self.drag.lock().await.is_active() {
            return None;
        }
        let mut session = self.session.lock().await;
        let target = drag::hover_target(&session, candidate);
        *session = session.with_hover(target);
        target
    }

    /// Completes a drag. Exactly one action is carried out.
    pub async fn drag_end(
        &self,
        item_id: &str,
        target: Option<&str>,
    ) -> Result<DropOutcome, SortError> {
        let activated = self.drag.lock().await.finish(item_id);
        let action = {
            let mut session = self.session.lock().await;
            *session = session.with_hover(None);
            if !activated {
                return Ok(DropOutcome::Ignored);
            }
            self.report(drag::classify_drop(&session, item_id, target))?
        };
        self.apply(action).await
    }

    /// Keyboard equivalent of a drag on `item_id`.
    pub async fn keyboard(
        &self,
        item_id: &str,
        command: KeyboardCommand,
    ) -> Result<DropOutcome, SortError> {
        match command {
            KeyboardCommand::PickUp => {
                self.drag
                    .lock()
                    .await
                    .start(item_id, InputModality::Keyboard, Instant::now());
                Ok(DropOutcome::Ignored)
            }
            KeyboardCommand::Drop | KeyboardCommand::Cancel => {
                self.drag.lock().await.abort();
                let mut session = self.session.lock().await;
                *session = session.with_hover(None);
                Ok(DropOutcome::Ignored)
            }
            KeyboardCommand::MoveUp | KeyboardCommand::MoveDown => {
                let picked_up = self.drag.lock().await.active_item() == Some(item_id);
                let action = {
                    let session = self.session.lock().await;
                    if session.mode().is_sorting() && !picked_up {
                        return self.report(Err(SortError::validation(format!(
                            "item {item_id} must be picked up before it can move"
                        ))));
                    }
                    self.report(drag::keyboard_action(&session, item_id, command))?
                };
                self.apply(action).await
            }
        }
    }

    async fn apply(&self, action: DragAction) -> Result<DropOutcome, SortError> {
        match action {
            DragAction::Noop => Ok(DropOutcome::Ignored),
            DragAction::Reorder { from, to, .. } => {
                self.move_item(from, to).await?;
                Ok(DropOutcome::Reordered { from, to })
            }
            DragAction::Transfer {
                site_id,
                source_group,
                target_group,
            } => {
                self.transfer_site(TransferRequest {
                    site_id,
                    source_group,
                    target_group,
                })
                .await
            }
        }
    }

    async fn transfer_site(&self, request: TransferRequest) -> Result<DropOutcome, SortError> {
        {
            let mut session = self.session.lock().await;
            if session.mode() != SortMode::SiteReorder(request.source_group) {
                return self.report(Err(SortError::validation(format!(
                    "site transfer from group {} needs an active site sort of that group",
                    request.source_group
                ))));
            }
            *session = self.report(session.begin_operation())?;
        }

        let snapshot = self.sync.snapshot().await;
        let site = match self.transfer.execute(&snapshot, request).await {
            Ok(site) => site,
            Err(err) => {
                let mut session = self.session.lock().await;
                *session = session.end_operation();
                return self.report(Err(err));
            }
        };

        let sync = self.sync.reload_after("site transfer").await;
        let fresh = self.sync.snapshot().await;
        {
            let mut session = self.session.lock().await;
            *session = session.end_operation().rebase(&fresh);
        }
        let target_name = find_group(&fresh, request.target_group)
            .or_else(|| find_group(&snapshot, request.target_group))
            .map(|group| group.group.name.clone())
            .unwrap_or_else(|| request.target_group.to_string());
        self.sync.notify(Notification::info(format!(
            "site \"{}\" moved to {target_name}",
            site.name
        )));
        Ok(DropOutcome::Transferred { site, sync })
    }

    /// Creates a group, reloads, and re-derives the working copy.
    pub async fn create_group(&self, name: &str, is_public: bool) -> Result<Group, SortError> {
        let (group, _) = self.sync.create_group(name, is_public).await?;
        self.rebase(&self.sync.snapshot().await).await;
        Ok(group)
    }

    pub async fn update_group(
        &self,
        group_id: GroupId,
        patch: &GroupPatch,
    ) -> Result<Group, SortError> {
        let (group, _) = self.sync.update_group(group_id, patch).await?;
        self.rebase(&self.sync.snapshot().await).await;
        Ok(group)
    }

    pub async fn delete_group(&self, group_id: GroupId) -> Result<(), SortError> {
        self.sync.delete_group(group_id).await?;
        self.rebase(&self.sync.snapshot().await).await;
        Ok(())
    }

    pub async fn create_site(&self, site: NewSite) -> Result<Site, SortError> {
        let (site, _) = self.sync.create_site(site).await?;
        self.rebase(&self.sync.snapshot().await).await;
        Ok(site)
    }

    pub async fn update_site(&self, site_id: SiteId, patch: &SitePatch) -> Result<Site, SortError> {
        let (site, _) = self.sync.update_site(site_id, patch).await?;
        self.rebase(&self.sync.snapshot().await).await;
        Ok(site)
    }

    pub async fn delete_site(&self, site_id: SiteId) -> Result<(), SortError> {
        self.sync.delete_site(site_id).await?;
        self.rebase(&self.sync.snapshot().await).await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
