use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use panel_nesting::config::{CuttingConfig, SheetCatalog};
use panel_nesting::error::OptimizeError;
use panel_nesting::optimizer::Optimizer;
use panel_nesting::report::{CutListRow, CuttingReport};
use panel_nesting::types::PieceRequirement;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    #[serde(default)]
    project_id: Option<String>,
    pieces: Vec<PieceRequirement>,
    #[serde(default)]
    config: CuttingConfig,
    #[serde(default)]
    catalog: SheetCatalog,
}

#[derive(Serialize)]
struct OptimizeResponse {
    report: CuttingReport,
    cut_list: Vec<CutListRow>,
    sheet_count: usize,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Optimize(OptimizeError::PieceTooLarge { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "PIECE_TOO_LARGE")
            }
        };
        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

async fn optimize(Json(req): Json<OptimizeRequest>) -> Result<Json<OptimizeResponse>, ApiError> {
    tracing::info!(
        project = req.project_id.as_deref().unwrap_or("-"),
        rows = req.pieces.len(),
        "POST /optimize"
    );

    let sheet = req.config.default_sheet_mm;
    if sheet.w == 0 || sheet.h == 0 {
        return Err(ApiError::BadRequest(
            "default_sheet_mm dimensions must be non-zero".to_string(),
        ));
    }

    let optimizer = Optimizer::new(req.config, req.catalog);
    let plan = optimizer.optimize(req.project_id, &req.pieces)?;

    Ok(Json(OptimizeResponse {
        report: plan.report(),
        cut_list: plan.cut_list(),
        sheet_count: plan.sheet_count(),
    }))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await.unwrap();
}
