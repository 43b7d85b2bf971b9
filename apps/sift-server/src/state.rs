//! Application state for the sift server

use std::sync::Arc;

use sift_search::SearchResources;

use crate::storage::Directories;
use crate::summary::Summarizer;

/// Shared application state; everything inside is read-only
#[derive(Clone)]
pub struct AppState {
    pub resources: Arc<SearchResources>,
    pub summarizer: Arc<dyn Summarizer>,
    pub dirs: Arc<Directories>,
}

impl AppState {
    pub fn new(
        resources: SearchResources,
        summarizer: impl Summarizer + 'static,
        dirs: Directories,
    ) -> Self {
        Self {
            resources: Arc::new(resources),
            summarizer: Arc::new(summarizer),
            dirs: Arc::new(dirs),
        }
    }
}
