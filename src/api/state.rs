use std::sync::Arc;

use crate::query::QueryFacade;

#[derive(Clone)]
pub struct AppState {
    pub facade: QueryFacade,
    pub cors_origin: Arc<str>,
}

impl AppState {
    pub fn new(facade: QueryFacade, cors_origin: &str) -> Self {
        Self {
            facade,
            cors_origin: Arc::from(cors_origin),
        }
    }
}
