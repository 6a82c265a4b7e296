//! Listing quality pipeline: consume `listing_created` events, score each
//! listing from image and text analysis, and record the result in the
//! product catalog.

pub mod analysis;
pub mod broker;
pub mod catalog;
pub mod config;
pub mod consumer;
pub mod error;
pub mod http;
pub mod metrics;
pub mod mock_analysis;
pub mod models;
pub mod producer;
pub mod scoring;
pub mod server;

use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Log a binary's failure as its error chain and map it to the exit status.
pub fn exit_status(binary: &str, result: eyre::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(
                target = "listing_quality",
                binary,
                "crashed: {}",
                failure_summary(&err),
            );
            ExitCode::FAILURE
        }
    }
}

fn failure_summary(err: &eyre::Report) -> String {
    format!("{err:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn failure_is_logged_as_one_line_chain() {
        let err = Err::<(), _>(eyre::eyre!("connection refused"))
            .wrap_err("connect to broker")
            .unwrap_err();
        assert_eq!(failure_summary(&err), "connect to broker: connection refused");
    }

    #[test]
    fn failed_run_exits_non_zero() {
        let failed = exit_status("listing-quality", Err(eyre::eyre!("bind 0.0.0.0:3000")));
        assert_eq!(format!("{failed:?}"), format!("{:?}", ExitCode::FAILURE));
        let ok = exit_status("listing-quality", Ok(()));
        assert_eq!(format!("{ok:?}"), format!("{:?}", ExitCode::SUCCESS));
    }
}
