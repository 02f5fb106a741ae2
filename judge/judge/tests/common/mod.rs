//! In-process stand-in for the Piston execution service.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    response: Value,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn execute_handler(
    State(state): State<MockState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(payload);
    (state.status, Json(state.response.clone()))
}

pub struct MockPiston {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockPiston {
    /// Serves `response` with HTTP 200 for every execute request.
    pub async fn start(response: Value) -> Self {
        Self::start_with_status(StatusCode::OK, response).await
    }

    pub async fn start_with_status(status: StatusCode, response: Value) -> Self {
        let state = MockState {
            status,
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();

        let app = Router::new()
            .route("/api/v2/execute", post(execute_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("Failed to bind mock server to 127.0.0.1:0. Error: {e}"));
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| eprintln!("Mock Piston server error: {e}"));
        });

        MockPiston {
            addr,
            shutdown_tx,
            requests,
        }
    }

    /// Base URL to put into `RemoteConfig::base_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v2", self.addr)
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}
