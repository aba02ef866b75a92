use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::WorkerConfig;
use crate::dataset;
use crate::module::BuiltinLoader;
use crate::worker::{Converter, InboundMessage};

pub struct AppState {
    converter: Converter,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: Option<String>,
}

pub fn router(config: WorkerConfig) -> Router {
    let app_state = Arc::new(AppState {
        converter: Converter::new(config, Arc::new(BuiltinLoader::new())),
    });

    Router::new()
        .route("/api/sample", get(get_sample))
        .route("/api/convert", post(convert_spreadsheet))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn run(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(WorkerConfig::from_env());

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    log::info!("Listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn get_sample() -> Json<Value> {
    Json(dataset::styled_dataset())
}

async fn convert_spreadsheet(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Response {
    match state.converter.convert(InboundMessage::convert(payload)).await {
        Some(result) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, result.blob.mime.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"data.xlsx\"".to_string(),
                ),
            ],
            Body::from(Bytes::from(result.blob.bytes)),
        )
            .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                status: "error".to_string(),
                message: Some("conversion failed".to_string()),
            }),
        )
            .into_response(),
    }
}
