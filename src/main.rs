use anyhow::Context;
use ledger_rollup::datasource::{EventSource, HttpLedgerSource, MetadataSource};
use ledger_rollup::orchestration::{Orchestrator, Pipeline, Registrar};
use ledger_rollup::store::Store;
use ledger_rollup::{api, config::Config, db::init_db, Repository};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let pool = init_db(&config.database_path)
        .await
        .context("failed to initialize database")?;
    let store: Arc<dyn Store> = Arc::new(Repository::new(pool));

    let upstream = Arc::new(HttpLedgerSource::new(config.event_source_url.clone()));
    let events: Arc<dyn EventSource> = upstream.clone();
    let metadata: Arc<dyn MetadataSource> = upstream.clone();

    let registrar = Registrar::new(store.clone(), metadata, config.factory_id.clone());
    if config.hydrate_on_start {
        let report = registrar
            .hydrate(upstream.as_ref(), config.hydrate_batch)
            .await
            .context("hydration failed")?;
        tracing::info!(
            registered = report.registered,
            next_index = report.next_index,
            "Startup hydration complete"
        );
    }

    let orchestrator = Orchestrator::new(store.clone(), config.aggregation_context());
    let pipeline = Pipeline::new(events, store.clone(), registrar, orchestrator)
        .with_batch_size(config.batch_size)
        .with_poll_interval(Duration::from_millis(config.poll_interval_ms));
    let ingest = tokio::spawn(pipeline.run());

    let app = api::create_router(api::AppState::new(store));
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    tokio::select! {
        served = axum::serve(listener, app).into_future() => served.context("server error")?,
        ingested = ingest => {
            ingested
                .context("pipeline task panicked")?
                .context("pipeline halted")?;
        }
    }

    Ok(())
}
