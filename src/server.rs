use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    core::{ChargingWindow, DailySummary, EngineError},
    engine::Engine,
    prelude::*,
};

pub struct AppState {
    pub engine: Engine,

    /// Used when the request does not specify `daysAhead`.
    pub days_ahead: u16,

    /// Used when the request does not specify `horizonDays`.
    pub horizon_days: u16,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/energy-mix/daily-summary", get(get_daily_summary))
        .route("/energy-mix/optimal-charging-window", get(get_optimal_charging_window))
        .with_state(state)
}

#[instrument(skip_all, fields(bind_address = bind_address))]
pub async fn serve(bind_address: &str, state: AppState) -> Result {
    let listener = TcpListener::bind(bind_address).await.context("failed to bind to the address")?;
    let app = router(Arc::new(state))
        .layer((TraceLayer::new_for_http(), TimeoutLayer::new(Duration::from_secs(30))));

    info!("serving…");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Per <https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs>.
async fn shutdown_signal() {
    let ctrl_c = wait_for_signal("Ctrl+C", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = wait_for_signal("SIGTERM", async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?.recv().await;
        Ok(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Resolve once the signal is received.
///
/// A signal that cannot be listened to never resolves, so it does not trigger the shutdown.
async fn wait_for_signal(name: &str, signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(error) = signal.await {
        error!(signal = name, "failed to listen for the signal: {error:#}");
        std::future::pending::<()>().await;
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryQuery {
    days_ahead: Option<u16>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowQuery {
    /// Hours.
    window_length: i64,

    horizon_days: Option<u16>,
}

async fn get_daily_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Vec<DailySummary>>, ApiError> {
    let days_ahead = query.days_ahead.unwrap_or(state.days_ahead);
    Ok(Json(state.engine.compute_multi_day_summary(Utc::now(), days_ahead).await?))
}

async fn get_optimal_charging_window(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ChargingWindow>, ApiError> {
    let horizon_days = query.horizon_days.unwrap_or(state.horizon_days);
    let window = state
        .engine
        .compute_optimal_window(Utc::now(), query.window_length, horizon_days)
        .await?;
    Ok(Json(window))
}

#[derive(derive_more::From)]
struct ApiError(EngineError);

#[derive(Serialize)]
struct ErrorDetails {
    #[serde(rename = "timeStamp")]
    timestamp: DateTime<Utc>,

    description: String,
    details: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            EngineError::InvalidWindowLength(_) | EngineError::WindowTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            EngineError::NoDataReturned | EngineError::EmptyIntervalSet(_) => StatusCode::NOT_FOUND,
            EngineError::UpstreamMalformed(_) => StatusCode::BAD_GATEWAY,
            EngineError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            error!(%status, "{:#}", self.0);
        } else {
            warn!(%status, "{:#}", self.0);
        }
        let details = ErrorDetails {
            timestamp: Utc::now(),
            description: self.0.to_string(),
            details: self.0.kind(),
        };
        (status, Json(details)).into_response()
    }
}
