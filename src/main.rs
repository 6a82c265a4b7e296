use eyre::WrapErr;
use listing_quality::{
    analysis::HttpAnalysisClient,
    catalog::{CatalogStore, HttpCatalogClient, MemoryCatalogStore, RedisCatalogStore},
    config::ServiceConfig,
    consumer::{self, QualityWorker},
    exit_status,
    http::build_client,
    init_tracing,
    server::{self, AppState},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{future::IntoFuture, net::SocketAddr, process::ExitCode, sync::Arc};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    exit_status("listing-quality", run().await)
}

async fn run() -> eyre::Result<()> {
    init_tracing();
    let config = ServiceConfig::from_env();

    let store: Arc<dyn CatalogStore> = match &config.catalog_redis_url {
        Some(url) => Arc::new(RedisCatalogStore::open(url).wrap_err("open catalog redis store")?),
        None => Arc::new(MemoryCatalogStore::new()),
    };
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .wrap_err("install prometheus recorder")?;
    let app = server::router(AppState::new(prometheus_handle), store, config.body_limit);

    let http = build_client(&config.http);
    let analysis = Arc::new(HttpAnalysisClient::new(
        http.clone(),
        &config.image_analysis_url,
        &config.text_analysis_url,
    ));
    let catalog = Arc::new(HttpCatalogClient::new(http, &config.catalog_url));
    let worker = QualityWorker::new(analysis.clone(), analysis, catalog);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("bind {addr}"))?;
    info!(target = "listing_quality.api", "mock catalog listening on {addr}");

    let consumer_task = tokio::spawn(consumer::run_with_broker(worker, config.broker.clone()));

    tokio::select! {
        served = axum::serve(listener, app.into_make_service()).into_future() => {
            served.wrap_err("http server")?;
        }
        joined = consumer_task => {
            warn!(target = "listing_quality.api", "consumer loop exited: {joined:?}");
        }
        _ = tokio::signal::ctrl_c() => {
            info!(target = "listing_quality.api", "shutdown requested");
        }
    }
    Ok(())
}
