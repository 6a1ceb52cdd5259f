//! Shared fixtures: a mock server on a random port and test logging.

#![allow(dead_code)]

use goong_core::{Client, ClientConfig};

/// Start the mock server in a background thread and return its origin.
pub fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
    });

    format!("http://{addr}")
}

/// Route `RUST_LOG`-filtered logs to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config(origin: &str) -> ClientConfig {
    ClientConfig::new("test-key").with_origin(origin)
}

pub fn client_with<T>(origin: &str, transport: std::sync::Arc<T>) -> Client
where
    T: goong_core::Transport + 'static,
{
    Client::builder()
        .config(config(origin))
        .shared_transport(transport)
        .build()
        .unwrap()
}
