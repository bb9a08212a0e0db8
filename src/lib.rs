pub mod auth;
pub mod contest;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::{middleware, Router};

use crate::{
    auth::BasicAuth,
    store::{GoogleSheets, RecordStore, SheetBackend},
};

pub struct AppState<B = GoogleSheets> {
    pub store: Arc<RecordStore<B>>,
    pub basic_auth: Option<BasicAuth>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            basic_auth: self.basic_auth.clone(),
        }
    }
}

impl<B: SheetBackend> AppState<B> {
    pub fn new(backend: B, basic_auth: Option<BasicAuth>) -> Self {
        Self {
            store: Arc::new(RecordStore::new(backend)),
            basic_auth,
        }
    }
}

pub fn router<B: SheetBackend + 'static>(state: AppState<B>) -> Router {
    if state.basic_auth.is_none() {
        tracing::warn!("basic auth is not configured, the API is open");
    }

    Router::new()
        .merge(handlers::records::routes::<B>())
        .merge(handlers::contests::routes::<B>())
        .layer(middleware::from_fn_with_state(
            state.basic_auth.clone(),
            auth::basic_auth_gate,
        ))
        .with_state(state)
}
