use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::signal;

use kiosk_alerts::{
    api,
    cli::Cli,
    config::Config,
    db,
    error::AppError,
    logging::init_logging,
    metrics::AppMetrics,
    pipeline::Pipeline,
    repository::NotificationRepository,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "info" });

    if let Err(err) = run(cli).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load(&cli).map_err(AppError::Config)?;
    tracing::info!(
        "Service starting (channel: {}, port: {}, database: {})",
        config.channel.name(),
        config.api_port,
        config.database_url
    );

    let pool = db::create_pool(&config.database_url).await?;
    let repository = Arc::new(NotificationRepository::new(pool));
    let metrics = Arc::new(AppMetrics::new().map_err(|err| AppError::Server(err.to_string()))?);
    let dispatcher = config.channel.build()?;

    let mut pipeline = Pipeline::new(dispatcher, config.recipient.clone())
        .with_repository(repository.clone())
        .with_metrics(metrics.clone());
    if let Some(machines) = &config.monitored_machines {
        tracing::info!("Monitoring levels for: {}", machines.join(", "));
        pipeline = pipeline.with_monitored_machines(machines.clone());
    }

    let app = api::create_router(Arc::new(pipeline), repository, metrics);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.api_port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Service stopped cleanly");
    Ok(())
}
