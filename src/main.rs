// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-Roast CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use strava_roast::cli::Cli;

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    if let Err(err) = cli.execute().await {
        eprintln!("错误：{}", err);
        std::process::exit(1);
    }
}

/// Logs go to stderr via tracing; stdout is reserved for pipeline progress.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("strava_roast=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
