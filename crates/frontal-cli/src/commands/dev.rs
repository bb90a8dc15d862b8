//! `frontal dev`: build, serve and rebuild on change.

use std::sync::Arc;

use frontal_bundler::PluginFactory;
use frontal_config::ConfigDiscovery;
use tokio::signal;
use tokio::sync::mpsc;

use crate::cli::DevArgs;
use crate::commands::utils;
use crate::dev::{DevApp, DevServerState, LiveReloadChannel, server};
use crate::error::Result;
use crate::ui;

/// Execute the dev command.
///
/// 1. Build once and start watching
/// 2. Serve the in-memory site and the live-reload socket
/// 3. React to file events until Ctrl+C
pub async fn execute(args: DevArgs) -> Result<()> {
    let root = utils::resolve_project_root(args.cwd.as_deref())?;
    ui::info(&format!("Project root: {}", root.display()));

    let config = ConfigDiscovery::new(&root).load()?;
    let channel = Arc::new(LiveReloadChannel::new());
    let state = Arc::new(DevServerState::new(
        Arc::clone(&channel),
        config.public_dir(),
        &config.server.base,
    ));

    let (events_tx, mut events_rx) = mpsc::channel(256);
    let mut app = DevApp::start(
        &root,
        PluginFactory::with_builtins(),
        Arc::clone(&state),
        events_tx,
    )
    .await?;

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let listener = server::bind(&host, port).await?;
    let addr = listener.local_addr()?;
    let mut server_handle = tokio::spawn(server::serve(listener, Arc::clone(&state)));

    ui::success(&format!("Serving at http://{addr}{}", state.base()));
    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                let reaction = app.handle(event).await;
                tracing::debug!(?reaction, generation = app.generation(), "event handled");
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }

            result = &mut server_handle => {
                match result {
                    Ok(Err(err)) => ui::error(&err.to_string()),
                    Err(err) => ui::error(&format!("Server task failed: {err}")),
                    Ok(Ok(())) => ui::warning("Server stopped unexpectedly"),
                }
                break;
            }
        }
    }

    app.shutdown().await;
    server_handle.abort();
    ui::success("Development server stopped");
    Ok(())
}
