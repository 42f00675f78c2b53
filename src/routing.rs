//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState, endpoints, log_in::post_log_in, register::register_user, stores::UserStore,
};

/// Return a router with all the app's routes.
pub fn build_router<U>(state: AppState<U>) -> Router
where
    U: UserStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(endpoints::ROOT, get(get_index))
        .route(endpoints::REGISTER, post(register_user::<U>))
        .route(endpoints::LOG_IN, post(post_log_in::<U>))
        .with_state(state)
}

/// A plain greeting so deployments can check that the server is up.
async fn get_index() -> &'static str {
    "Hello! This is the AgriSetu backend server."
}
