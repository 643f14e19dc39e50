//! Shared test utilities for bossme-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;

use bossme_server::{AppState, BossmeServer, ServerConfig};
use tokio::net::TcpListener;

/// Creates a test server with default state, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    create_test_server_with_state(AppState::new()).await
}

/// Creates a test server around prepared state
#[allow(dead_code)]
pub async fn create_test_server_with_state(state: AppState) -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(state);
    let config = ServerConfig {
        push_path: state.push.path.clone(),
        ..ServerConfig::new("127.0.0.1", 0)
    };

    let server = BossmeServer::with_state(config, Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: BossmeServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}

/// Poll until `condition` holds or a second passes
#[allow(dead_code)]
pub async fn wait_for(condition: impl FnMut() -> bool) -> bool {
    wait_for_within(std::time::Duration::from_secs(1), condition).await
}

/// Poll until `condition` holds or `limit` passes
#[allow(dead_code)]
pub async fn wait_for_within(
    limit: std::time::Duration,
    mut condition: impl FnMut() -> bool,
) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    condition()
}
