use std::collections::HashMap;

use anyhow::{Context, Result};
use homebase_api::app::{self, AppState};
use homebase_api::config::AppConfig;
use tokio::net::TcpListener;

/// Header the test servers trust for the client address
pub const CLIENT_IP_HEADER: &str = "Fly-Client-IP";

pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start an in-process server configured from the given variables.
/// `Fly-Client-IP` is always trusted so tests can choose the client address.
pub async fn spawn_server(vars: &[(&str, &str)]) -> Result<TestServer> {
    let mut env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    env.entry("TRUSTED_PROXY_HEADERS".to_string())
        .or_insert_with(|| CLIENT_IP_HEADER.to_string());

    let config = AppConfig::from_vars(|key| env.get(key).cloned());

    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tokio::spawn(async move {
        if let Err(e) = app::serve(&config, listener, AppState::default()).await {
            eprintln!("test server stopped: {e}");
        }
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
    })
}

/// GET `path` claiming to come from `client_ip`
pub async fn get_as(
    server: &TestServer,
    path: &str,
    client_ip: Option<&str>,
) -> Result<reqwest::Response> {
    let mut request = reqwest::Client::new().get(server.url(path));
    if let Some(ip) = client_ip {
        request = request.header(CLIENT_IP_HEADER, ip);
    }
    Ok(request.send().await?)
}
