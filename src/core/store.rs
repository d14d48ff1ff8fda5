//! External state the watcher reads from and dispatches into.
//!
//! The watcher only sees the [`StateStore`] trait. [`MemoryStore`] is the
//! in-process implementation used by the `watch` command and by tests: it keeps
//! the handful of fields the pipeline touches and broadcasts every dispatched
//! action to subscribers.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tokio::sync::broadcast;

/// Absolute path of a component source file.
pub type ComponentPath = PathBuf;

/// Routed path of a page, e.g. `/blog/hello`.
pub type PagePath = String;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: PagePath,
    pub component: ComponentPath,
}

/// A component file and the compiled text of its page query, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageComponent {
    pub path: ComponentPath,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapStage {
    #[default]
    ExtractingQueries,
    QueryExtractionFinished,
}

/// Commands accepted by the store. Upserting a page is the page-registration event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    UpsertPage(Page),
    AddPageComponent(ComponentPath),
    SetPageComponentQuery {
        component: ComponentPath,
        query: Option<String>,
    },
    AddPageDataDependency {
        page: PagePath,
        key: String,
    },
    RemovePagesDataDependencies(Vec<PagePath>),
    SetBootstrapStage(BootstrapStage),
}

pub trait StateStore: Send + Sync {
    /// Every registered page, in path order.
    fn pages(&self) -> Vec<Page>;

    fn bootstrap_stage(&self) -> BootstrapStage;

    fn dispatch(&self, action: Action);

    /// Pages rendered by `component`.
    fn pages_for_component(&self, component: &Path) -> Vec<Page> {
        self.pages()
            .into_iter()
            .filter(|page| page.component == component)
            .collect()
    }
}

#[derive(Debug, Default)]
struct State {
    /// Last write wins per page path.
    pages: BTreeMap<PagePath, Page>,
    components: BTreeMap<ComponentPath, PageComponent>,
    data_dependencies: BTreeMap<PagePath, BTreeSet<String>>,
    bootstrap_stage: BootstrapStage,
}

impl State {
    fn apply(&mut self, action: &Action) {
        match action {
            Action::UpsertPage(page) => {
                self.pages.insert(page.path.clone(), page.clone());
            }
            Action::AddPageComponent(path) => {
                self.components
                    .entry(path.clone())
                    .or_insert_with(|| PageComponent {
                        path: path.clone(),
                        query: None,
                    });
            }
            Action::SetPageComponentQuery { component, query } => {
                self.components
                    .entry(component.clone())
                    .or_insert_with(|| PageComponent {
                        path: component.clone(),
                        query: None,
                    })
                    .query = query.clone();
            }
            Action::AddPageDataDependency { page, key } => {
                self.data_dependencies
                    .entry(page.clone())
                    .or_default()
                    .insert(key.clone());
            }
            Action::RemovePagesDataDependencies(pages) => {
                for page in pages {
                    self.data_dependencies.remove(page);
                }
            }
            Action::SetBootstrapStage(stage) => self.bootstrap_stage = *stage,
        }
    }
}

/// In-memory store with subscribe/dispatch semantics.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
    sender: broadcast::Sender<Action>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(State::default()),
            sender,
        }
    }

    /// Receive every action dispatched after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.sender.subscribe()
    }

    pub fn page_component(&self, path: &Path) -> Option<PageComponent> {
        self.read().components.get(path).cloned()
    }

    pub fn data_dependencies(&self, page: &str) -> BTreeSet<String> {
        self.read()
            .data_dependencies
            .get(page)
            .cloned()
            .unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    fn pages(&self) -> Vec<Page> {
        self.read().pages.values().cloned().collect()
    }

    fn bootstrap_stage(&self) -> BootstrapStage {
        self.read().bootstrap_stage
    }

    fn dispatch(&self, action: Action) {
        self.write().apply(&action);
        // No subscribers is fine.
        let _ = self.sender.send(action);
    }
}
