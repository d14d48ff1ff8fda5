//! Page query execution requests.

use tracing::info;

use crate::core::store::{Page, PageComponent};

/// Runs a page's query against application data. Fire-and-forget: the
/// watcher never waits for the result.
pub trait PageQueryExecutor: Send + Sync {
    fn run_page_query(&self, page: &Page, component: &PageComponent);
}

/// Executor for hosts without a data layer: logs each request.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExecutor;

impl PageQueryExecutor for LoggingExecutor {
    fn run_page_query(&self, page: &Page, component: &PageComponent) {
        info!(
            page = %page.path,
            component = %component.path.display(),
            has_query = component.query.is_some(),
            "re-running page query"
        );
    }
}
