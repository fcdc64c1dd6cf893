pub mod relay;

use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::Router;

use crate::middleware::guards;
use crate::state::SharedState;

/// `POST /` behind the validation chain. Layers run bottom-up, so the
/// header check is outermost and signature verification runs last.
pub fn relay_routes(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", post(relay::relay))
        .route_layer(from_fn_with_state(state.clone(), guards::verify_signature))
        .route_layer(from_fn_with_state(state.clone(), guards::lookup_form))
        .route_layer(from_fn_with_state(state, guards::check_headers))
}
