//! Dependency & bootstrap tracker.
//!
//! Owns the component → compiled query map and reacts to two event sources:
//!
//! - page registrations (store actions): a component seen for the first time is
//!   compiled and its query stored, then the bootstrap timer is re-armed;
//! - source changes (paths from the file watcher): the project is recompiled and,
//!   when the component's printed query differs from the stored one, the pages
//!   using it get their data dependencies cleared and their query re-run.
//!
//! Reactions for the same component are serialized; reactions for different
//! components may overlap, since every compile pass re-reads the whole project.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::{Mutex as AsyncMutex, broadcast, broadcast::error::RecvError, mpsc};
use tracing::{debug, error, info, warn};

use crate::core::{
    compiler::{CompileQueries, CompiledQueries},
    error::CompileError,
    executor::PageQueryExecutor,
    store::{Action, BootstrapStage, ComponentPath, PageComponent, PagePath, StateStore},
    timer::DebounceTimer,
};

/// What a source change led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The path is not a registered component.
    Untracked,
    /// The compiled query text is identical to the stored one.
    Unchanged,
    /// The stored query was replaced and these pages were re-run.
    Updated { pages: Vec<PagePath> },
    /// The compile pass failed; stored state was left untouched.
    Failed,
}

pub struct QueryWatcher {
    compiler: Arc<dyn CompileQueries>,
    store: Arc<dyn StateStore>,
    executor: Arc<dyn PageQueryExecutor>,
    components: Mutex<HashMap<ComponentPath, PageComponent>>,
    component_locks: Mutex<HashMap<ComponentPath, Arc<AsyncMutex<()>>>>,
    bootstrap: DebounceTimer,
    bootstrap_finished: Arc<AtomicBool>,
}

impl QueryWatcher {
    pub fn new(
        compiler: Arc<dyn CompileQueries>,
        store: Arc<dyn StateStore>,
        executor: Arc<dyn PageQueryExecutor>,
        bootstrap_debounce: Duration,
    ) -> Self {
        let finished = store.bootstrap_stage() == BootstrapStage::QueryExtractionFinished;
        Self {
            compiler,
            store,
            executor,
            components: Mutex::new(HashMap::new()),
            component_locks: Mutex::new(HashMap::new()),
            bootstrap: DebounceTimer::new(bootstrap_debounce),
            bootstrap_finished: Arc::new(AtomicBool::new(finished)),
        }
    }

    /// The stored state of a registered component.
    pub fn component(&self, path: &Path) -> Option<PageComponent> {
        self.components().get(path).cloned()
    }

    pub fn is_bootstrap_finished(&self) -> bool {
        self.bootstrap_finished.load(Ordering::SeqCst)
    }

    /// Handle a page registration for `component`.
    ///
    /// Returns `false` when the component was already registered. A failed
    /// compile is logged and still re-arms the bootstrap timer, so a broken
    /// query cannot hold bootstrap back forever.
    pub async fn register_page(&self, component: &Path) -> bool {
        {
            let mut components = self.components();
            if components.contains_key(component) {
                return false;
            }
            components.insert(
                component.to_path_buf(),
                PageComponent {
                    path: component.to_path_buf(),
                    query: None,
                },
            );
        }
        self.store
            .dispatch(Action::AddPageComponent(component.to_path_buf()));
        info!(component = %component.display(), "registered page component");

        let lock = self.component_lock(component);
        let _guard = lock.lock().await;

        match self.compile().await {
            Ok(compiled) => {
                let query = query_text(&compiled, component);
                debug!(
                    component = %component.display(),
                    has_query = query.is_some(),
                    "extracted component query"
                );
                self.store_query(component, query);
            }
            Err(err) => {
                error!(component = %component.display(), "{err}");
            }
        }

        self.arm_bootstrap();
        true
    }

    /// Handle a change of the source file at `path`.
    pub async fn source_changed(&self, path: &Path) -> ChangeOutcome {
        if !self.components().contains_key(path) {
            debug!(path = %path.display(), "change to untracked file");
            return ChangeOutcome::Untracked;
        }

        let lock = self.component_lock(path);
        let _guard = lock.lock().await;

        let compiled = match self.compile().await {
            Ok(compiled) => compiled,
            Err(err) => {
                error!(component = %path.display(), "{err}");
                return ChangeOutcome::Failed;
            }
        };

        let query = query_text(&compiled, path);
        let stored = self.component(path).and_then(|component| component.query);
        if query == stored {
            debug!(component = %path.display(), "page query unchanged");
            return ChangeOutcome::Unchanged;
        }

        let component = self.store_query(path, query);
        let pages = self.store.pages_for_component(path);
        let page_paths: Vec<PagePath> = pages.iter().map(|page| page.path.clone()).collect();

        // Every dependency set is cleared before the first page re-runs.
        self.store
            .dispatch(Action::RemovePagesDataDependencies(page_paths.clone()));
        for page in &pages {
            self.executor.run_page_query(page, &component);
        }

        info!(
            component = %path.display(),
            pages = page_paths.len(),
            "page query changed"
        );
        ChangeOutcome::Updated { pages: page_paths }
    }

    /// React to store actions and source changes until either channel closes.
    ///
    /// Pages already in the store are registered first. Each event is handled
    /// on its own task.
    pub async fn run(
        self: Arc<Self>,
        mut actions: broadcast::Receiver<Action>,
        mut changes: mpsc::Receiver<PathBuf>,
    ) {
        self.register_known_pages();

        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Ok(Action::UpsertPage(page)) => self.spawn_registration(page.component),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed store actions, re-reading pages");
                        self.register_known_pages();
                    }
                    Err(RecvError::Closed) => break,
                },
                change = changes.recv() => match change {
                    Some(path) => {
                        let watcher = Arc::clone(&self);
                        tokio::spawn(async move {
                            watcher.source_changed(&path).await;
                        });
                    }
                    None => break,
                },
            }
        }
        debug!("query watcher stopped");
    }

    fn register_known_pages(self: &Arc<Self>) {
        for page in self.store.pages() {
            self.spawn_registration(page.component);
        }
    }

    fn spawn_registration(self: &Arc<Self>, component: ComponentPath) {
        let watcher = Arc::clone(self);
        tokio::spawn(async move {
            watcher.register_page(&component).await;
        });
    }

    async fn compile(&self) -> Result<CompiledQueries, CompileError> {
        let compiler = Arc::clone(&self.compiler);
        tokio::task::spawn_blocking(move || compiler.compile_all())
            .await
            .map_err(|err| CompileError::Task(err.to_string()))?
    }

    fn store_query(&self, component: &Path, query: Option<String>) -> PageComponent {
        let updated = PageComponent {
            path: component.to_path_buf(),
            query: query.clone(),
        };
        self.components()
            .insert(component.to_path_buf(), updated.clone());
        self.store.dispatch(Action::SetPageComponentQuery {
            component: component.to_path_buf(),
            query,
        });
        updated
    }

    fn arm_bootstrap(&self) {
        if self.is_bootstrap_finished() {
            return;
        }
        let store = Arc::clone(&self.store);
        let finished = Arc::clone(&self.bootstrap_finished);
        self.bootstrap.arm(move || {
            if finished.swap(true, Ordering::SeqCst) {
                return;
            }
            store.dispatch(Action::SetBootstrapStage(
                BootstrapStage::QueryExtractionFinished,
            ));
            info!("page query extraction finished");
        });
    }

    fn components(&self) -> MutexGuard<'_, HashMap<ComponentPath, PageComponent>> {
        self.components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn component_lock(&self, component: &Path) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .component_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(component.to_path_buf()).or_default())
    }
}

/// Text of the page query compiled from `component`, the first root of its
/// primary tag.
fn query_text(compiled: &CompiledQueries, component: &Path) -> Option<String> {
    compiled
        .get(component)
        .and_then(|queries| queries.first())
        .map(|query| query.text.clone())
}
