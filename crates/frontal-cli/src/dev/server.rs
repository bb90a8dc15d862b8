//! HTTP side of the dev server.
//!
//! Serves the latest compilation from memory, falls back to the public
//! directory, and accepts live-reload websocket connections on
//! [`SOCKET_PATH`].

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use frontal_bundler::plugins::live_reload::SOCKET_PATH;
use futures::{SinkExt, StreamExt};
use path_clean::PathClean;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::dev::state::{SharedState, content_type};
use crate::error::{CliError, Result};
use crate::ui;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(SOCKET_PATH, get(handle_socket))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind `host:port`. A port already in use falls back to any free port.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    match TcpListener::bind((host, port)).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == ErrorKind::AddrInUse => {
            ui::warning(&format!("Port {port} is in use, picking another one"));
            TcpListener::bind((host, 0))
                .await
                .map_err(|e| CliError::Server(format!("Failed to bind to {host}: {e}")))
        }
        Err(err) => Err(CliError::Server(format!(
            "Failed to bind to {host}:{port}: {err}"
        ))),
    }
}

pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    axum::serve(listener, router(state))
        .await
        .map_err(|e| CliError::Server(format!("Server error: {e}")))
}

async fn handle_socket(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| client_session(socket, state))
}

/// Forward channel messages to one client until either side goes away.
async fn client_session(socket: WebSocket, state: SharedState) {
    let channel = Arc::clone(state.channel());
    let (id, mut rx) = channel.register();
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // clients only ever close
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, WsMessage::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    channel.unregister(id);
}

async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let url_path = uri.path();
    let Some(site_path) = state.site_path(url_path) else {
        return not_found(url_path);
    };

    if let Some((content, kind)) = state.cached(site_path) {
        return (
            [(header::CONTENT_TYPE, kind), (header::CACHE_CONTROL, "no-cache")],
            content,
        )
            .into_response();
    }

    if let Some(path) = public_file(&state.public_dir(), site_path).await {
        match tokio::fs::read(&path).await {
            Ok(content) => {
                return (
                    [
                        (header::CONTENT_TYPE, content_type(&path)),
                        (header::CACHE_CONTROL, "no-cache"),
                    ],
                    content,
                )
                    .into_response();
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read public file");
            }
        }
    }

    not_found(url_path)
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("File not found: {path}"),
    )
        .into_response()
}

/// File under `public` for a site path. Paths leaving `public` yield `None`;
/// directories resolve to their `index.html`.
async fn public_file(public: &Path, site_path: &str) -> Option<PathBuf> {
    let relative = PathBuf::from(site_path.trim_start_matches('/')).clean();
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return None;
    }

    let mut path = public.join(relative);
    let meta = tokio::fs::metadata(&path).await.ok()?;
    if meta.is_dir() {
        path = path.join("index.html");
        if !tokio::fs::metadata(&path).await.ok()?.is_file() {
            return None;
        }
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::channel::LiveReloadChannel;
    use crate::dev::state::DevServerState;
    use frontal_bundler::{Compilation, EmittedAsset};
    use std::fs;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn get_raw(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn public_file_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("public/docs")).unwrap();
        fs::write(dir.path().join("public/robots.txt"), "").unwrap();
        fs::write(dir.path().join("public/docs/index.html"), "").unwrap();
        fs::write(dir.path().join("secret.txt"), "").unwrap();
        let public = dir.path().join("public");

        assert!(public_file(&public, "robots.txt").await.is_some());
        assert_eq!(
            public_file(&public, "docs").await,
            Some(public.join("docs/index.html"))
        );
        assert!(public_file(&public, "../secret.txt").await.is_none());
        assert!(public_file(&public, "docs/../../secret.txt").await.is_none());
        assert!(public_file(&public, "missing.txt").await.is_none());
    }

    #[tokio::test]
    async fn serves_cache_then_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/robots.txt"), "User-agent: *").unwrap();

        let state = Arc::new(DevServerState::new(
            Arc::new(LiveReloadChannel::new()),
            dir.path().join("public"),
            "/",
        ));
        let mut compilation = Compilation::default();
        compilation.assets.insert(
            "index.html".into(),
            EmittedAsset {
                content: b"<h1>home</h1>".to_vec(),
                emitted: true,
                development: false,
            },
        );
        state.update(&compilation);

        let listener = bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state));

        let home = get_raw(addr, "/").await;
        assert!(home.starts_with("HTTP/1.1 200"));
        assert!(home.contains("<h1>home</h1>"));

        let robots = get_raw(addr, "/robots.txt").await;
        assert!(robots.contains("User-agent: *"));

        let missing = get_raw(addr, "/nope.html").await;
        assert!(missing.starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn busy_port_falls_back() {
        let taken = bind("127.0.0.1", 0).await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let other = bind("127.0.0.1", port).await.unwrap();
        assert_ne!(other.local_addr().unwrap().port(), port);
    }
}
