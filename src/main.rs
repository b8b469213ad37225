use clap::Parser;
use repo_digest::{
    api::{create_router, AppState},
    cli::{Cli, Commands},
    config::Settings,
    service::AnalysisRequest,
    Error, Result,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,repo_digest=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => {
            let settings = Settings::from_env()?;
            settings.validate()?;
            serve(settings, port, host).await?;
        }
        Commands::Branches { repo_url, server } => {
            repo_digest::cli::commands::branches(&server, &repo_url).await?;
        }
        Commands::Analyze {
            repo_url,
            branch,
            max_files,
            include_tests,
            ignore_patterns,
            languages,
            depth,
            json,
            server,
        } => {
            let request = AnalysisRequest {
                max_files,
                ignore_tests: !include_tests,
                ignore_patterns,
                languages,
                depth,
                ..AnalysisRequest::new(repo_url, branch)
            };
            repo_digest::cli::commands::analyze(&server, &request, json).await?;
        }
    }

    Ok(())
}

async fn serve(mut settings: Settings, port: Option<u16>, host: Option<String>) -> Result<()> {
    // Override settings with CLI arguments
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(host) = host {
        settings.server.host = host;
    }

    info!("Starting repo-digest server");
    info!(
        "GitHub API: {} ({})",
        settings.github.api_url,
        if settings.github.token.is_some() {
            "authenticated"
        } else {
            "unauthenticated"
        }
    );
    info!(
        "Rate limit: {} requests/minute per client",
        settings.server.rate_limit_per_minute
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::from_settings(settings)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    println!("\n========================================");
    println!("repo-digest");
    println!("========================================");
    println!("Address: http://{addr}");
    println!("\nAPI Endpoints:");
    println!("  GET  /api/branches?repo_url=<url>");
    println!("  POST /api/process");
    println!("  GET  /health");
    println!("\nPress Ctrl+C to stop");
    println!("========================================\n");

    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
