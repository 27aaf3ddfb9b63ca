use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinError;

use crate::error::{Error, Result};

/// How long in-flight requests may keep running once shutdown starts.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Serves `app` until `shutdown` resolves, then drains connections for at most
/// [`SHUTDOWN_GRACE_PERIOD`] before dropping whatever is left.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    serve_with_grace(listener, app, shutdown, SHUTDOWN_GRACE_PERIOD).await
}

async fn serve_with_grace<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let addr = listener.local_addr()?;
    tracing::info!(component = "server", %addr, "server listening");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => return server_exit(result),
        _ = shutdown => {}
    }

    tracing::info!(component = "server", "shutting down server");
    let _ = stop_tx.send(());

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            server_exit(result)?;
            tracing::info!(component = "server", "server stopped");
            Ok(())
        }
        Err(_) => {
            tracing::warn!(
                component = "server",
                grace_secs = grace.as_secs_f64(),
                "grace period elapsed, forcing shutdown"
            );
            server.abort();
            Ok(())
        }
    }
}

fn server_exit(result: std::result::Result<std::io::Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(Error::Io(err)),
        Err(err) => Err(Error::Internal(format!("server task failed: {}", err))),
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(component = "server", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(component = "server", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!(component = "server", "shutdown signal received");
}
