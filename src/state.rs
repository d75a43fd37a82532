use crate::config::Config;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub api_token: Option<Arc<str>>,
    pub report_page_size: usize,
}

impl AppState {
    pub fn new(config: &Config, store: Store) -> Self {
        Self {
            store,
            api_token: config.api_token.as_deref().map(Arc::from),
            report_page_size: config.report_page_size,
        }
    }
}
