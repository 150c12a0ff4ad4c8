//! Chat page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use crate::state::AppState;

/// Single-page chat widget.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub store_name: String,
    pub window: String,
    pub is_open: bool,
    pub is_available: bool,
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> IndexTemplate {
    let relay = state.relay();
    let store = relay.store();

    IndexTemplate {
        store_name: store.name.clone(),
        window: store.hours.window_label(),
        is_open: relay.gate_status().is_open(),
        is_available: relay.is_available(),
    }
}
