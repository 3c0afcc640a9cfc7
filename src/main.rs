use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use wildsight::{
    animals::AnimalFacts, config, model, news::NewsClient, server, telemetry,
};

#[derive(Parser)]
#[command(name = "wildsight", about = "Serve ImageNet classifiers over HTTP")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "WILDSIGHT_CONFIG", default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Load Config
    let config = config::AppConfig::from_file(&cli.config)?;
    telemetry::init_logging(config.logging.format);
    let metrics_handle = telemetry::init_metrics()?;

    // 2. Init ONNX Runtime
    model::loader::init_ort()?;

    // 3. Initialize Models; any failure aborts startup
    let mut classifiers = Vec::with_capacity(config.models.len());
    for model_conf in &config.models {
        tracing::info!(model = %model_conf.name, path = %model_conf.path, "loading model");
        classifiers.push(model::loader::build_classifier(model_conf)?);
    }
    let registry = model::registry::ModelRegistry::new(classifiers, config.default_model_name());

    let animals = match &config.animals {
        Some(animal_conf) => AnimalFacts::from_file(&animal_conf.data_path)?,
        None => AnimalFacts::default(),
    };
    tracing::info!(entries = animals.len(), "animal facts loaded");

    let news = config
        .news
        .clone()
        .map(NewsClient::from_env)
        .transpose()?;

    let state = server::types::AppState {
        registry,
        animals: Arc::new(animals),
        news,
    };

    // 4. Create Router
    let app = server::routes::create_router(state, metrics_handle, &config.server);

    // 5. Bind & Serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        "Server listening on http://{} (default model: {})",
        addr,
        config.default_model_name()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
