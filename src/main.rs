use anyhow::Context;
use background_service::{spawn_signal_listener, BackgroundService, JobRunner, Schedule};
use chainpulse_core::{AppConfig, Catalog, ConfigLocation, CONFIG_PATH_ENV};
use llm_interface::{FallbackChain, OpenAiProvider};
use platform_client::{Platform, PlatformAdapter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let location = ConfigLocation::resolve(&args, std::env::var(CONFIG_PATH_ENV).ok());
    let config = AppConfig::load(&location)
        .with_context(|| format!("failed to load {}", location.path.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.filter).context("invalid log filter")?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Chainpulse");

    let catalog = Arc::new(
        Catalog::from_config(config.catalog.as_ref()).context("invalid catalog")?,
    );
    tracing::info!(
        projects = catalog.projects().len(),
        accounts = catalog.accounts().len(),
        keywords = catalog.keywords().len(),
        "Catalog loaded"
    );

    let backend = Arc::new(
        OpenAiProvider::new(&config.generation).context("failed to build generation backend")?,
    );
    let chain = FallbackChain::from_config(&config.generation);
    tracing::info!("Model fallback chain: {}", chain.models().join(" -> "));

    let token = CancellationToken::new();
    let adapter = Arc::new(
        Platform::from_config(&config.platform, &token)
            .context("failed to build platform adapter")?,
    );
    adapter
        .connect()
        .await
        .context("could not open a platform session")?;

    let schedule = Schedule::from_config(&config.schedule).context("invalid schedule")?;
    let jobs = JobRunner::new(catalog, backend, chain, adapter, config.jobs.clone());
    let mut service = BackgroundService::new(jobs, schedule, &config.schedule);

    let signals = spawn_signal_listener(token.clone());

    service.run(token).await;
    signals.abort();

    tracing::info!("Chainpulse stopped");
    Ok(())
}
