//! Long-running watch host.
//!
//! Wires the query watcher to an in-memory store, a logging executor and a
//! `notify` watcher over the source root, then registers the configured pages.
//!
//! ```text
//!  notify ──paths──▶ mpsc ──┐
//!                           ├──▶ QueryWatcher ──▶ MemoryStore / executor
//!  MemoryStore ──actions──▶─┘
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use colored::Colorize;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    super::{args::WatchCommand, exit_status::ExitStatus, report::SUCCESS_MARK},
    CommandContext,
};
use crate::core::{
    QueryWatcher,
    executor::LoggingExecutor,
    file_scanner::SourceFilter,
    store::{Action, BootstrapStage, MemoryStore, Page, StateStore},
};

const CHANGE_QUEUE_CAPACITY: usize = 256;

pub fn watch(cmd: WatchCommand) -> Result<ExitStatus> {
    let ctx = CommandContext::new(&cmd.common)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?
        .block_on(run(ctx))
}

async fn run(ctx: CommandContext) -> Result<ExitStatus> {
    let compiler = ctx.compiler();
    let filter = compiler.filter().clone();
    let store = Arc::new(MemoryStore::new());
    let watcher = Arc::new(QueryWatcher::new(
        Arc::new(compiler),
        Arc::clone(&store) as Arc<dyn StateStore>,
        Arc::new(LoggingExecutor),
        Duration::from_millis(ctx.config.bootstrap_debounce_ms),
    ));

    let (sender, changes) = mpsc::channel(CHANGE_QUEUE_CAPACITY);
    let mut fs_watcher = notify::recommended_watcher(forward_changes(filter, sender))
        .context("Failed to create file watcher")?;
    fs_watcher
        .watch(&ctx.locations.base_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", ctx.locations.base_dir.display()))?;

    let mut progress = store.subscribe();
    tokio::spawn(async move {
        while let Ok(action) = progress.recv().await {
            if action == Action::SetBootstrapStage(BootstrapStage::QueryExtractionFinished) {
                println!(
                    "{} {}",
                    SUCCESS_MARK.green(),
                    "Page queries extracted, watching for changes".green()
                );
            }
        }
    });

    let runner = tokio::spawn(Arc::clone(&watcher).run(store.subscribe(), changes));

    for page in &ctx.config.pages {
        store.dispatch(Action::UpsertPage(Page {
            path: page.path.clone(),
            component: ctx.root.join(&page.component),
        }));
    }
    if ctx.config.pages.is_empty() {
        warn!("no pages configured, only file changes to registered components are tracked");
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for interrupt")?;
            debug!("interrupted");
        }
        result = runner => {
            result.context("Query watcher task failed")?;
        }
    }

    drop(fs_watcher);
    Ok(ExitStatus::Success)
}

/// Forward create/modify events for source files to the watcher.
///
/// Runs on the `notify` thread, outside the runtime, so sending blocks.
fn forward_changes(
    filter: SourceFilter,
    sender: mpsc::Sender<PathBuf>,
) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |event| match event {
        Ok(event) if is_relevant(&event) => {
            for path in event.paths {
                if filter.is_source_file(&path) && sender.blocking_send(path).is_err() {
                    return;
                }
            }
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "file watch error"),
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}
