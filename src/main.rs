// src/main.rs

//! `laneflow` diagnostic binary: reports the compiled-in backend and checks
//! it against the generic backend.

use anyhow::{bail, Context};
use log::{error, info};

use laneflow::config::CONFIG;
use laneflow::{selftest, DenormalGuard, ACTIVE_BACKEND};

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!(
        "laneflow {}: backend {} (native: {})",
        env!("CARGO_PKG_VERSION"),
        ACTIVE_BACKEND,
        ACTIVE_BACKEND.is_native()
    );
    info!(
        "Denormal control: {} (current mode {:?})",
        if DenormalGuard::is_supported() { "supported" } else { "unsupported" },
        DenormalGuard::current_mode()
    );

    let config = &*CONFIG;
    info!(
        "Self-test: {} samples, seed {:#x}, NaN inputs {}",
        config.samples,
        config.seed,
        if config.include_nan { "on" } else { "off" }
    );

    let report = selftest::run(config);

    if config.report_json {
        let json = report.to_json().context("Failed to render report")?;
        println!("{json}");
    }

    if !report.passed() {
        error!("Parity failures: {}", report.failures.len());
        bail!(
            "{} of {} checks disagree with the generic backend",
            report.mismatches,
            report.checks
        );
    }

    info!("All {} checks passed.", report.checks);
    Ok(())
}
