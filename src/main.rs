use std::net::SocketAddr;

use applications_backend::{
    build_router,
    config::{Config, LogFormat},
    database::pool::{create_pool, run_migrations},
    middleware::auth::issue_admin_token,
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    // `applications-backend issue-token <subject> [hours]` prints an admin token.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("issue-token") {
        let subject = args.get(1).map(String::as_str).unwrap_or("owner");
        let hours: i64 = args.get(2).map(|h| h.parse::<i64>()).transpose()?.unwrap_or(24);
        let token = issue_admin_token(
            &config.admin_jwt_secret,
            subject,
            chrono::Duration::hours(hours),
        )?;
        println!("{token}");
        return Ok(());
    }

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let addr: SocketAddr = config.server_address.parse()?;
    let app_state = AppState::new(config, pool)?;
    let app = build_router(app_state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
