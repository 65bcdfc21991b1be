//! Listener lifecycle: bind, serve, sweep sessions, shut down.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use super::router::{create_router_with_limit, ServerConfig};
use crate::routing::RouteManager;
use crate::session::spawn_sweeper;
use crate::Result;

/// A route manager bound to an HTTP listener.
pub struct Application {
    config: ServerConfig,
    manager: Arc<RouteManager>,
    stop: Arc<Notify>,
}

impl Application {
    pub fn new(config: ServerConfig, manager: Arc<RouteManager>) -> Self {
        Self {
            config,
            manager,
            stop: Arc::new(Notify::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<RouteManager> {
        &self.manager
    }

    /// Ask a running server to stop. A stop requested before `run` is
    /// remembered and ends the server as soon as it starts.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Bind the configured address and serve until stopped or interrupted.
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local: SocketAddr = listener.local_addr()?;
        info!("Starting mvc-dispatch server on {}", local);
        info!(
            root = %self.manager.static_files().base_dir().display(),
            default_controller = ?self.manager.default_controller(),
            "Dispatch configured"
        );

        let sweeper = spawn_sweeper(
            Arc::clone(self.manager.sessions()),
            self.config.sweep_interval,
        );
        let router =
            create_router_with_limit(Arc::clone(&self.manager), self.config.max_body_bytes);
        let stop = Arc::clone(&self.stop);

        let served = if self.config.graceful_shutdown {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal(stop))
                .await
        } else {
            tokio::select! {
                served = axum::serve(listener, router).into_future() => served,
                _ = shutdown_signal(stop) => Ok(()),
            }
        };

        sweeper.abort();
        served?;
        info!("Server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C, SIGTERM, or an explicit [`Application::stop`].
async fn shutdown_signal(stop: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = stop.notified() => {},
    }

    info!("Shutdown signal received");
}
