use listing_quality::{
    exit_status, init_tracing,
    mock_analysis::{MockAnalysisState, image_router, text_router},
};
use std::{future::IntoFuture, net::SocketAddr, process::ExitCode};
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    exit_status("mock-analysis", run().await)
}

fn port_from_env(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

async fn run() -> eyre::Result<()> {
    init_tracing();
    let state = MockAnalysisState::from_os_rng();

    let image_addr: SocketAddr = ([0, 0, 0, 0], port_from_env("IMAGE_ANALYSIS_PORT", 5001)).into();
    let text_addr: SocketAddr = ([0, 0, 0, 0], port_from_env("TEXT_ANALYSIS_PORT", 5002)).into();
    let image_listener = tokio::net::TcpListener::bind(image_addr).await?;
    let text_listener = tokio::net::TcpListener::bind(text_addr).await?;
    info!(target = "listing_quality.mock_analysis", "image analysis on {image_addr}, text analysis on {text_addr}");

    tokio::try_join!(
        axum::serve(image_listener, image_router(state.clone()).into_make_service()).into_future(),
        axum::serve(text_listener, text_router(state).into_make_service()).into_future(),
    )?;
    Ok(())
}
