use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    DataSync, HttpNavigationClient, InMemoryNavigationBackend, NavigationBackend,
    NotificationLevel, SortController,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "navctl", about = "Reorder navigation groups and sites")]
struct Args {
    /// API root of the navigation backend.
    #[arg(long)]
    backend_url: Option<String>,
    /// Use a seeded in-memory backend instead of HTTP.
    #[arg(long)]
    demo: bool,
    /// Per-call timeout in milliseconds, 0 to disable.
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings();
    if let Some(url) = args.backend_url {
        settings.backend_url = url;
    }
    if args.demo {
        settings.use_in_memory_backend = true;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.operation_timeout_ms = timeout_ms;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let backend: Arc<dyn NavigationBackend> = if settings.use_in_memory_backend {
        info!("navctl: using in-memory demo backend");
        Arc::new(InMemoryNavigationBackend::demo())
    } else {
        info!(backend_url = %settings.backend_url, "navctl: using http backend");
        Arc::new(HttpNavigationClient::new(&settings.backend_url)?)
    };

    let controller = SortController::new(DataSync::new(backend, settings.operation_timeout()));
    let mut events = controller.subscribe();
    controller
        .load()
        .await
        .context("failed to load groups and sites")?;

    let result = commands::execute(&controller, &args.command).await;
    while let Ok(notification) = events.try_recv() {
        match notification.level {
            NotificationLevel::Info => println!("note: {}", notification.message),
            NotificationLevel::Error => eprintln!("error: {}", notification.message),
        }
    }
    println!("{}", result?);
    if args.command != Command::List {
        print!("{}", commands::render(&controller.visible_groups().await));
    }
    Ok(())
}
