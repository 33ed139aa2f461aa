//! API endpoint handlers
//!
//! Handlers never touch panel state; they post events to the interactive loop
//! and read back a fresh view.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tracing::{debug, warn};

use crate::display::{parse_hex_color, ButtonFace};
use crate::input::PanelEvent;
use crate::state::PanelView;

use super::types::{ApiResponse, PageDescriptionRequest, SetColorRequest, UpdateSlotRequest};

/// Shared state for web handlers
pub struct WebState {
    pub events: UnboundedSender<PanelEvent>,
}

type ViewResponse = Json<ApiResponse<PanelView>>;

impl WebState {
    fn post(&self, event: PanelEvent) -> Result<(), String> {
        self.events
            .send(event)
            .map_err(|_| "panel is shutting down".to_string())
    }

    /// Current view, after every event posted before this call
    async fn view(&self) -> Result<PanelView, String> {
        let (tx, rx) = oneshot::channel();
        self.post(PanelEvent::Snapshot(tx))?;
        rx.await.map_err(|_| "panel is shutting down".to_string())
    }

    async fn post_then_view(&self, event: PanelEvent) -> ViewResponse {
        if let Err(e) = self.post(event) {
            return Json(ApiResponse::error(e));
        }
        respond(self.view().await)
    }
}

fn respond(view: Result<PanelView, String>) -> ViewResponse {
    match view {
        Ok(view) => Json(ApiResponse::ok(view)),
        Err(e) => Json(ApiResponse::error(e)),
    }
}

/// Map a 1-based button number from the URL to a global index on the visible page
fn visible_index(view: &PanelView, number: usize) -> Result<usize, String> {
    if view.slots.iter().any(|slot| slot.number == number) {
        Ok(number - 1)
    } else {
        Err(format!("Button {} is not on page {}", number, view.page))
    }
}

/// GET /api/panel - Current page
pub async fn get_panel(State(state): State<Arc<WebState>>) -> ViewResponse {
    respond(state.view().await)
}

/// POST /api/slots/:number/click - Run a button's command
pub async fn click_slot(
    State(state): State<Arc<WebState>>,
    Path(number): Path<usize>,
) -> ViewResponse {
    let Some(index) = number.checked_sub(1) else {
        return Json(ApiResponse::error("Button numbers start at 1"));
    };
    state.post_then_view(PanelEvent::ClickSlot(index)).await
}

/// PUT /api/slots/:number - Edit a button's command and/or description
pub async fn update_slot(
    State(state): State<Arc<WebState>>,
    Path(number): Path<usize>,
    Json(request): Json<UpdateSlotRequest>,
) -> ViewResponse {
    let index = match state.view().await.and_then(|view| visible_index(&view, number)) {
        Ok(index) => index,
        Err(e) => return Json(ApiResponse::error(e)),
    };

    if let Some(text) = request.command {
        if let Err(e) = state.post(PanelEvent::EditCommand { slot: index, text }) {
            return Json(ApiResponse::error(e));
        }
    }
    if let Some(text) = request.description {
        if let Err(e) = state.post(PanelEvent::EditDescription { slot: index, text }) {
            return Json(ApiResponse::error(e));
        }
    }

    respond(state.view().await)
}

/// GET /api/slots/:number/image - Image shown on a visible button
pub async fn slot_image(
    State(state): State<Arc<WebState>>,
    Path(number): Path<usize>,
) -> Response {
    let view = match state.view().await {
        Ok(view) => view,
        Err(e) => return (StatusCode::SERVICE_UNAVAILABLE, e).into_response(),
    };

    let path = view.slots.iter().find_map(|slot| match &slot.face {
        ButtonFace::Image { path } if slot.number == number => Some(path.clone()),
        _ => None,
    });
    let Some(path) = path else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(e) => {
            warn!("Failed to read button image {:?}: {}", path, e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

/// POST /api/page/next
pub async fn next_page(State(state): State<Arc<WebState>>) -> ViewResponse {
    state.post_then_view(PanelEvent::NextPage).await
}

/// POST /api/page/previous
pub async fn previous_page(State(state): State<Arc<WebState>>) -> ViewResponse {
    state.post_then_view(PanelEvent::PreviousPage).await
}

/// PUT /api/page/description
pub async fn update_page_description(
    State(state): State<Arc<WebState>>,
    Json(request): Json<PageDescriptionRequest>,
) -> ViewResponse {
    state
        .post_then_view(PanelEvent::EditPageDescription(request.description))
        .await
}

/// POST /api/window/restore
pub async fn restore_window(State(state): State<Arc<WebState>>) -> ViewResponse {
    state.post_then_view(PanelEvent::RestoreWindow).await
}

/// POST /api/window/maximize
pub async fn maximize_window(State(state): State<Arc<WebState>>) -> ViewResponse {
    state.post_then_view(PanelEvent::MaximizeWindow).await
}

/// PUT /api/colors/:name - Change one palette entry
pub async fn set_color(
    State(state): State<Arc<WebState>>,
    Path(name): Path<String>,
    Json(request): Json<SetColorRequest>,
) -> ViewResponse {
    let Some(color) = parse_hex_color(&request.color) else {
        return Json(ApiResponse::error(format!(
            "Invalid color '{}'",
            request.color
        )));
    };
    let view = match state.view().await {
        Ok(view) => view,
        Err(e) => return Json(ApiResponse::error(e)),
    };
    if !view.colors.contains_key(&name) {
        return Json(ApiResponse::error(format!("Unknown color '{}'", name)));
    }
    state.post_then_view(PanelEvent::SetColor { name, color }).await
}

/// POST /api/close - Save the page and exit
pub async fn close(State(state): State<Arc<WebState>>) -> Json<ApiResponse<()>> {
    debug!("Close requested from the panel");
    match state.post(PanelEvent::Close) {
        Ok(()) => Json(ApiResponse::ok(())),
        Err(e) => Json(ApiResponse::error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::App;
    use tempfile::TempDir;
    use tokio::task::JoinHandle;

    fn spawn_app(max_pages: usize) -> (Arc<WebState>, JoinHandle<App>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config.pages.max_pages = max_pages;
        config.hotkeys.enabled = false;

        let mut app = App::new(config).unwrap();
        let state = Arc::new(WebState {
            events: app.sender(),
        });
        let handle = tokio::spawn(async move {
            app.run().await.unwrap();
            app
        });
        (state, handle, dir)
    }

    #[tokio::test]
    async fn test_page_navigation() {
        let (state, handle, _dir) = spawn_app(2);

        let Json(response) = get_panel(State(state.clone())).await;
        assert_eq!(response.data.unwrap().page, 1);

        let Json(response) = previous_page(State(state.clone())).await;
        assert_eq!(response.data.unwrap().page, 1);

        let Json(response) = next_page(State(state.clone())).await;
        let view = response.data.unwrap();
        assert_eq!(view.page, 2);
        assert_eq!(view.slots[0].number, 17);

        let Json(response) = close(State(state)).await;
        assert!(response.success);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_update_slot_only_on_visible_page() {
        let (state, handle, _dir) = spawn_app(2);

        let Json(response) = update_slot(
            State(state.clone()),
            Path(2),
            Json(UpdateSlotRequest {
                command: Some("hostname".to_string()),
                description: Some("Host".to_string()),
            }),
        )
        .await;
        let view = response.data.unwrap();
        assert_eq!(view.slots[1].command, "hostname");
        assert_eq!(view.slots[1].description, "Host");

        let Json(response) = update_slot(
            State(state.clone()),
            Path(20),
            Json(UpdateSlotRequest {
                command: Some("hostname".to_string()),
                description: None,
            }),
        )
        .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Button 20 is not on page 1"));

        close(State(state)).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_set_color_validation() {
        let (state, handle, _dir) = spawn_app(1);

        let Json(response) = set_color(
            State(state.clone()),
            Path("Button1BackColor".to_string()),
            Json(SetColorRequest {
                color: "#102030".to_string(),
            }),
        )
        .await;
        let view = response.data.unwrap();
        assert_eq!(view.slots[0].back_color, "#102030");

        let Json(response) = set_color(
            State(state.clone()),
            Path("Button1BackColor".to_string()),
            Json(SetColorRequest {
                color: "blue".to_string(),
            }),
        )
        .await;
        assert!(!response.success);

        let Json(response) = set_color(
            State(state.clone()),
            Path("Nope".to_string()),
            Json(SetColorRequest {
                color: "#102030".to_string(),
            }),
        )
        .await;
        assert_eq!(response.error.as_deref(), Some("Unknown color 'Nope'"));

        close(State(state)).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_click_with_empty_command_reports_notice() {
        let (state, handle, _dir) = spawn_app(1);

        update_slot(
            State(state.clone()),
            Path(3),
            Json(UpdateSlotRequest {
                command: Some(String::new()),
                description: None,
            }),
        )
        .await;
        let Json(response) = click_slot(State(state.clone()), Path(3)).await;
        let view = response.data.unwrap();
        assert_eq!(
            view.notices.last().map(|n| n.body.as_str()),
            Some("Please enter a command for button 3.")
        );

        let Json(response) = click_slot(State(state.clone()), Path(0)).await;
        assert!(!response.success);

        close(State(state)).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_image_for_text_button_is_not_found() {
        let (state, handle, _dir) = spawn_app(1);
        let response = slot_image(State(state.clone()), Path(1)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        close(State(state)).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_panel_reports_error() {
        let (state, handle, _dir) = spawn_app(1);
        close(State(state.clone())).await;
        let app = handle.await.unwrap();
        drop(app);

        let Json(response) = get_panel(State(state)).await;
        assert!(!response.success);
    }
}
