//! Test utilities for pare-core
//!
//! This module provides a mock finance backend over real HTTP, serving the
//! same endpoints and JSON shapes as the production service.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::{ExpenseAnalysis, STATUS_INSUFFICIENT_DATA};
use crate::service::{sample_analysis, simulate_cut_plan};

#[derive(Default)]
struct ServerState {
    analysis: RwLock<Option<ExpenseAnalysis>>,
    failure: RwLock<Option<String>>,
    insufficient_data: AtomicBool,
    last_months: Mutex<Option<u32>>,
    plan_requests: AtomicUsize,
    /// Artificial latency per requested target
    plan_delays: RwLock<Vec<(f64, Duration)>>,
}

/// Mock finance backend for testing and development
pub struct MockFinanceServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockFinanceServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());

        let app = Router::new()
            .route("/api/expense-analysis", get(handle_analysis))
            .route("/api/expense-cuts", get(handle_cuts))
            .route("/api/quick-wins", get(handle_quick_wins))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this mock server, including the `/api` prefix
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Serve a custom analysis instead of the sample household
    pub fn set_analysis(&self, analysis: ExpenseAnalysis) {
        *self.state.analysis.write().unwrap() = Some(analysis);
    }

    /// Fail every request with a 500 carrying `message` (None to recover)
    pub fn fail_with(&self, message: Option<&str>) {
        *self.state.failure.write().unwrap() = message.map(str::to_string);
    }

    /// Respond as the backend does when there are too few transactions
    pub fn set_insufficient_data(&self, on: bool) {
        self.state.insufficient_data.store(on, Ordering::SeqCst);
    }

    /// Delay responses for plans requested with exactly `target`
    pub fn delay_plan(&self, target: f64, delay: Duration) {
        self.state.plan_delays.write().unwrap().push((target, delay));
    }

    pub fn plan_requests(&self) -> usize {
        self.state.plan_requests.load(Ordering::SeqCst)
    }

    pub fn last_months(&self) -> Option<u32> {
        *self.state.last_months.lock().unwrap()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockFinanceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn failure_response(state: &ServerState) -> Option<Response> {
    state.failure.read().unwrap().as_ref().map(|message| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    })
}

fn insufficient_data_response() -> Response {
    Json(json!({
        "status": STATUS_INSUFFICIENT_DATA,
        "message": "Not enough data to analyze. Add more transactions.",
        "suggestions": []
    }))
    .into_response()
}

fn current_analysis(state: &ServerState) -> ExpenseAnalysis {
    state
        .analysis
        .read()
        .unwrap()
        .clone()
        .unwrap_or_else(sample_analysis)
}

#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    months: Option<u32>,
}

async fn handle_analysis(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<AnalysisQuery>,
) -> Response {
    *state.last_months.lock().unwrap() = Some(query.months.unwrap_or(6));

    if let Some(response) = failure_response(&state) {
        return response;
    }
    if state.insufficient_data.load(Ordering::SeqCst) {
        return insufficient_data_response();
    }
    Json(current_analysis(&state)).into_response()
}

#[derive(Debug, Deserialize)]
struct CutsQuery {
    target: Option<f64>,
}

async fn handle_cuts(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CutsQuery>,
) -> Response {
    state.plan_requests.fetch_add(1, Ordering::SeqCst);

    let analysis = current_analysis(&state);
    let target = query
        .target
        .filter(|t| *t > 0.0)
        .unwrap_or_else(|| analysis.total_monthly_expenses().unwrap_or(0.0) * 0.15);

    let delay = state
        .plan_delays
        .read()
        .unwrap()
        .iter()
        .find(|(t, _)| (*t - target).abs() < 1e-9)
        .map(|(_, d)| *d);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(response) = failure_response(&state) {
        return response;
    }
    if state.insufficient_data.load(Ordering::SeqCst) {
        return insufficient_data_response();
    }

    let mut plan = serde_json::to_value(simulate_cut_plan(&analysis, target)).unwrap();
    // The real backend encodes the flag as 0/1
    let achievable = plan["achievable"].as_bool().unwrap_or(false);
    plan["achievable"] = json!(if achievable { 1 } else { 0 });
    Json(plan).into_response()
}

async fn handle_quick_wins(State(state): State<Arc<ServerState>>) -> Response {
    if let Some(response) = failure_response(&state) {
        return response;
    }
    Json(json!({
        "status": "success",
        "quick_wins": [
            {
                "type": "frequent_small_expense",
                "description": "Coffee shop",
                "frequency": 12,
                "total_amount": 96.0,
                "potential_monthly_savings": 72.0,
                "suggestion": "Cut back on Coffee shop (96.00 over 12 visits)"
            },
            {
                "type": "subscription",
                "description": "Streaming Plus",
                "amount": 39.9,
                "potential_monthly_savings": 39.9,
                "suggestion": "Reconsider the Streaming Plus subscription (39.90/month)"
            },
            {
                "type": "high_expense",
                "description": "Electronics store",
                "category": "Shopping",
                "amount": 1899.0,
                "date": "2024-05-02",
                "potential_saving": "variable",
                "suggestion": "Review large expense: Electronics store (1899.00)"
            }
        ]
    }))
    .into_response()
}
