use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use share_stats::{HashrateReporter, ReportError, ReportWindows};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

/// Result codes carried in the `error` field of every report response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Success = 0,
    NoWallet = 1,
    WalletNotFound = 2,
    NoWorkers = 3,
    Failed = 4,
}

impl ErrorCode {
    pub fn for_error(err: &ReportError) -> (Self, StatusCode) {
        match err {
            ReportError::NoWallet => (ErrorCode::NoWallet, StatusCode::BAD_REQUEST),
            ReportError::WalletNotFound(_) => (ErrorCode::WalletNotFound, StatusCode::NOT_FOUND),
            ReportError::InvalidWindow(_) => (ErrorCode::Failed, StatusCode::BAD_REQUEST),
            ReportError::StoreUnavailable(_) => (ErrorCode::Failed, StatusCode::SERVICE_UNAVAILABLE),
            ReportError::MalformedKey { .. } | ReportError::MalformedRecord { .. } => {
                (ErrorCode::Failed, StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    reporter: Arc<HashrateReporter>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(reporter: Arc<HashrateReporter>, request_timeout: Duration) -> Self {
        Self {
            reporter,
            request_timeout,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HashrateQuery {
    wallet: Option<String>,
    windows: Option<String>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/hashrate", get(hashrate_query_handler))
        .route("/api/hashrate/{wallet}", get(hashrate_path_handler))
        .with_state(state)
}

pub async fn run_http_server(
    address: String,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 Hashrate API listening on http://{}", address);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = match state.reporter.stores().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check failed: {}", e);
            false
        }
    };
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(json!({ "healthy": healthy })))
}

async fn hashrate_query_handler(
    State(state): State<AppState>,
    Query(query): Query<HashrateQuery>,
) -> Response {
    let wallet = query.wallet.unwrap_or_default();
    serve_report(&state, &wallet, query.windows.as_deref()).await
}

async fn hashrate_path_handler(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<HashrateQuery>,
) -> Response {
    serve_report(&state, &wallet, query.windows.as_deref()).await
}

async fn serve_report(state: &AppState, wallet: &str, windows: Option<&str>) -> Response {
    let windows = match windows {
        Some(list) => match ReportWindows::parse(list) {
            Ok(windows) => windows,
            Err(e) => return error_response(&e),
        },
        None => state.reporter.default_windows().clone(),
    };

    let report = tokio::time::timeout(
        state.request_timeout,
        state.reporter.compute_report(wallet, &windows),
    )
    .await;

    match report {
        Ok(Ok(report)) => {
            let params = &state.reporter.config().hashrate;
            let data = match serde_json::to_value(report.render(params)) {
                Ok(data) => data,
                Err(e) => {
                    error!("Failed to serialize report for {}: {}", wallet, e);
                    return envelope(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::Failed,
                        "Failed to serialize report",
                        json!({}),
                    );
                }
            };

            if report.has_workers() {
                debug!("Served report for wallet {}", wallet);
                envelope(StatusCode::OK, ErrorCode::Success, "", data)
            } else {
                envelope(StatusCode::OK, ErrorCode::NoWorkers, "No workers found", data)
            }
        }
        Ok(Err(e)) => error_response(&e),
        Err(_) => {
            warn!(
                "Report for wallet {} timed out after {:?}",
                wallet, state.request_timeout
            );
            envelope(
                StatusCode::GATEWAY_TIMEOUT,
                ErrorCode::Failed,
                "Report timed out",
                json!({}),
            )
        }
    }
}

fn error_response(err: &ReportError) -> Response {
    let (code, status) = ErrorCode::for_error(err);
    if status.is_server_error() {
        error!("Report failed: {}", err);
    } else {
        warn!("Report rejected: {}", err);
    }
    envelope(status, code, &err.to_string(), json!({}))
}

fn envelope(status: StatusCode, code: ErrorCode, message: &str, data: Value) -> Response {
    (
        status,
        Json(json!({
            "error": code as u8,
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}
