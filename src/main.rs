use job_board_api::{
    config::Config,
    database::setup_job_repositories,
    routes,
    server::{serve, shutdown_signal},
    telemetry::init_tracing,
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.logger);
    info!(component = "server", mode = ?config.mode, "starting job board api");

    let (repos, pool) = setup_job_repositories(&config).await?;
    let app = routes::router(AppState::new(repos), &config);

    let listener = TcpListener::bind(&config.server_address).await?;
    serve(listener, app, shutdown_signal()).await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!(component = "database", "database pool closed");
    }

    Ok(())
}
