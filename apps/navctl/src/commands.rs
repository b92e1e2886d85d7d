use std::{fmt::Write as _, time::Instant};

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use client_core::{
    drag::{group_marker, InputModality},
    DropOutcome, SortController, SyncOutcome,
};
use shared::domain::{find_group, find_site, GroupId, GroupWithSites, SiteId};
use tracing::info;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every group with its sites in rank order.
    List,
    /// Put the given groups first, in this order, and commit.
    ReorderGroups {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Put the given sites of GROUP first, in this order, and commit.
    ReorderSites {
        group: i64,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Move SITE to the front of GROUP.
    MoveSite { site: i64, group: i64 },
}

/// Runs one command and returns a short summary for the user.
pub async fn execute(controller: &SortController, command: &Command) -> Result<String> {
    match command {
        Command::List => Ok(render(&controller.visible_groups().await)),
        Command::ReorderGroups { ids } => {
            controller.start_group_sort().await?;
            arrange_and_commit(controller, ids).await
        }
        Command::ReorderSites { group, ids } => {
            controller.start_site_sort(GroupId(*group)).await?;
            arrange_and_commit(controller, ids).await
        }
        Command::MoveSite { site, group } => {
            move_site(controller, SiteId(*site), GroupId(*group)).await
        }
    }
}

async fn arrange_and_commit(controller: &SortController, ids: &[i64]) -> Result<String> {
    if let Err(err) = arrange(controller, ids).await {
        controller.cancel().await?;
        return Err(err);
    }
    let outcome = controller.commit().await?;
    Ok(format!("order committed ({})", describe(outcome)))
}

/// Moves `ids` to the front of the working list, one local move per id.
async fn arrange(controller: &SortController, ids: &[i64]) -> Result<()> {
    for (index, id) in ids.iter().enumerate() {
        let session = controller.session().await;
        let from = session
            .working()
            .position_of(*id)
            .ok_or_else(|| anyhow!("{id} is not part of the list being sorted"))?;
        if from != index {
            controller.move_item(from, index).await?;
        }
    }
    Ok(())
}

async fn move_site(
    controller: &SortController,
    site_id: SiteId,
    target: GroupId,
) -> Result<String> {
    let snapshot = controller.data().snapshot().await;
    let source = find_site(&snapshot, site_id)
        .map(|site| site.group_id)
        .with_context(|| format!("site {site_id} does not exist"))?;
    let target_name = find_group(&snapshot, target)
        .map(|group| group.group.name.clone())
        .with_context(|| format!("group {target} does not exist"))?;

    controller.start_site_sort(source).await?;
    let item = site_id.to_string();
    controller
        .drag_start(&item, InputModality::Keyboard, Instant::now())
        .await;
    let outcome = controller.drag_end(&item, Some(&group_marker(target))).await;
    controller.cancel().await?;

    match outcome? {
        DropOutcome::Transferred { site, sync } => {
            info!(site_id = site.id.0, group_id = target.0, "navctl: site moved");
            Ok(format!(
                "moved \"{}\" to {target_name} ({})",
                site.name,
                describe(sync)
            ))
        }
        _ => Ok(format!("site {site_id} already belongs to {target_name}")),
    }
}

fn describe(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Reloaded => "reloaded",
        SyncOutcome::Stale => "reload failed, view may be stale",
    }
}

pub fn render(groups: &[GroupWithSites]) -> String {
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(
            out,
            "[{}] {} (#{})",
            group.group.order_num, group.group.name, group.group.id
        );
        for site in &group.sites {
            let _ = writeln!(
                out,
                "    [{}] {} (#{}) {}",
                site.order_num, site.name, site.id, site.url
            );
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
