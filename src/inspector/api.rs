//! REST API endpoints for the inspector
//!
//! Provides the raw message endpoint, pointer input, the form, parsing,
//! picking, selection events and exports.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::context::{ContextClient, ContextTransport, PointerInput, Push, Request};
use crate::controller::{Controller, FormState, PickTarget, Status};
use crate::error::PickerError;
use crate::export::ExportFormat;
use crate::extractor::{Field, Record};

/// Shared state for API handlers
pub struct AppState {
    pub controller: Mutex<Controller<ContextClient>>,
    pub client: ContextClient,
    pub pushes: Mutex<mpsc::UnboundedReceiver<Push>>,
}

/// Everything the UI renders
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub form: FormState,
    pub status: Option<Status>,
    pub stats: Option<String>,
    pub results: Option<Vec<Record>>,
    /// Fields the results were extracted with, in column order
    pub result_fields: Option<Vec<Field>>,
    pub exports_enabled: bool,
    pub pending_pick: Option<PickTarget>,
}

/// Request body for starting or stopping a pick
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickRequest {
    pub target: Option<PickTarget>,
}

/// Build API router
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/message", post(send_message))
        .route("/api/pointer", post(send_pointer))
        .route("/api/form", get(get_form).post(update_form))
        .route("/api/parse", post(parse))
        .route("/api/pick", post(pick))
        .route("/api/events", get(drain_events))
        .route("/api/export/:format", get(export))
}

fn view(controller: &Controller<ContextClient>) -> ViewResponse {
    ViewResponse {
        form: controller.form().clone(),
        status: controller.status().cloned(),
        stats: controller.stats().map(str::to_string),
        results: controller.results().map(|r| r.records().to_vec()),
        result_fields: controller.result_fields().map(<[Field]>::to_vec),
        exports_enabled: controller.exports_enabled(),
        pending_pick: controller.pending_pick(),
    }
}

fn error_status(error: &PickerError) -> StatusCode {
    match error {
        PickerError::MissingInput(_) | PickerError::UnknownFormat(_) => StatusCode::BAD_REQUEST,
        PickerError::ContextUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PickerError::NoTarget(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(error: PickerError) -> Response {
    (
        error_status(&error),
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

/// POST /api/message - Forward a raw request to the page context
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Request>,
) -> Response {
    match state.client.send(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/pointer - Deliver pointer input to the page
async fn send_pointer(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PointerInput>,
) -> Response {
    match state.client.pointer(input).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/form - Current form, status and results
async fn get_form(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    let controller = state.controller.lock().await;
    Json(view(&controller))
}

/// POST /api/form - Replace the form and persist it
async fn update_form(
    State(state): State<Arc<AppState>>,
    Json(form): Json<FormState>,
) -> Response {
    let mut controller = state.controller.lock().await;
    controller.set_form(form);
    if let Err(e) = controller.save_form() {
        warn!("Failed to save form: {}", e);
        return error_response(e);
    }
    Json(view(&controller)).into_response()
}

/// POST /api/parse - Extract records for the current form
async fn parse(State(state): State<Arc<AppState>>) -> Response {
    let mut controller = state.controller.lock().await;
    // Failures are reported through the view's status line
    let _ = controller.parse().await;
    Json(view(&controller)).into_response()
}

/// POST /api/pick - Start a pick for a slot, or stop when no target is given
async fn pick(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PickRequest>,
) -> Response {
    let mut controller = state.controller.lock().await;
    let result = match request.target {
        Some(target) => controller.start_picking(target).await,
        None => controller.stop_picking().await,
    };
    match result {
        Ok(()) => Json(view(&controller)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/events - Apply pending selections and return the updated view
async fn drain_events(State(state): State<Arc<AppState>>) -> Response {
    let mut pushes = state.pushes.lock().await;
    let mut controller = state.controller.lock().await;
    while let Ok(push) = pushes.try_recv() {
        if let Err(e) = controller.apply_push(push) {
            return error_response(e);
        }
    }
    Json(view(&controller)).into_response()
}

/// GET /api/export/:format - Download the current results
async fn export(State(state): State<Arc<AppState>>, Path(format): Path<String>) -> Response {
    let format: ExportFormat = match format.parse() {
        Ok(format) => format,
        Err(e) => return error_response(e),
    };
    let controller = state.controller.lock().await;
    match controller.export(format) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, format.content_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", format.file_name()),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::spawn_page_context;
    use crate::utils::Config;

    const HTML: &str = r#"
        <html><body>
            <div class="card"><b>one</b></div>
            <div class="card"><b>two</b></div>
        </body></html>
    "#;

    fn state() -> Arc<AppState> {
        let (client, pushes) = spawn_page_context(HTML.into(), &Config::default()).unwrap();
        Arc::new(AppState {
            controller: Mutex::new(Controller::new(client.clone())),
            client,
            pushes: Mutex::new(pushes),
        })
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&PickerError::MissingInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&PickerError::ContextUnreachable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(&PickerError::NoBaseMatch),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_parse_through_handlers() {
        let state = state();
        update_form(
            State(state.clone()),
            Json(FormState {
                base_selector: ".card".into(),
                fields: vec![Field::new("label", "b")],
            }),
        )
        .await;
        parse(State(state.clone())).await;

        let Json(view) = get_form(State(state.clone())).await;
        assert!(view.exports_enabled);
        assert_eq!(view.stats.as_deref(), Some("Found 2 items"));
        assert_eq!(view.results.unwrap()[1]["label"], "two");

        let response = export(State(state), Path("json".into())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_result_columns_survive_form_edits() {
        let state = state();
        update_form(
            State(state.clone()),
            Json(FormState {
                base_selector: ".card".into(),
                fields: vec![Field::new("label", "b")],
            }),
        )
        .await;
        parse(State(state.clone())).await;
        update_form(
            State(state.clone()),
            Json(FormState {
                base_selector: ".card".into(),
                fields: vec![Field::new("renamed", "b"), Field::new("extra", "i")],
            }),
        )
        .await;

        let Json(view) = get_form(State(state)).await;
        assert_eq!(view.form.fields[0].name, "renamed");
        assert_eq!(view.result_fields, Some(vec![Field::new("label", "b")]));
        assert_eq!(view.results.unwrap()[0]["label"], "one");
    }

    #[tokio::test]
    async fn test_unknown_export_format() {
        let response = export(State(state()), Path("pdf".into())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
