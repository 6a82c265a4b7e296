use eyre::WrapErr;
use listing_quality::{
    broker::RedisStream,
    config::ServiceConfig,
    exit_status, init_tracing,
    producer::{publish_all, sample_events},
};
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    exit_status("listing-producer", run().await)
}

async fn run() -> eyre::Result<()> {
    init_tracing();
    let config = ServiceConfig::from_env();

    let stream = RedisStream::connect(&config.broker.url, &config.broker.topic)
        .await
        .wrap_err("connect to broker")?;
    info!(target = "listing_quality.producer", topic = stream.topic(), "producer connected");

    let summary = publish_all(&stream, &sample_events(chrono::Utc::now())).await;
    info!(
        target = "listing_quality.producer",
        sent = summary.sent,
        failed = summary.failed,
        "producer done",
    );
    Ok(())
}
