//! Switchyard CLI - route customer queries to the right handler
use anyhow::Result;
use clap::Parser as _;
use std::io::{self, stderr};
use switchyard_cli::{Cli, handlers};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "switchyard=info,switchyard_routing=info,switchyard_semantic=info".into()
        }))
        .with(
            fmt::layer()
                .with_writer(stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();
    handlers::run(cli, &mut out).await
}
