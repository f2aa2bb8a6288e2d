use anyhow::Context;
use atelier_server::{build_pipeline, init_tracing, routes, LogFormat, ServiceConfig};
use clap::{value_parser, Arg, Command};
use std::net::SocketAddr;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("atelier")
        .version(atelier_server::VERSION)
        .about("Garment photo pipeline: enhancement, side angles and video over SSE")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML config file"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .value_parser(value_parser!(u16))
                .help("Port to listen on (overrides PORT)"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .default_value("pretty")
                .value_parser(["pretty", "json"])
                .help("Log output format"),
        )
        .get_matches();

    // .env may carry RUST_LOG, so load it before the subscriber
    dotenvy::dotenv().ok();

    let log_format = matches
        .get_one::<String>("log-format")
        .map(|s| s.parse::<LogFormat>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();
    init_tracing(log_format);

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServiceConfig::new(),
    };
    config.apply_env().context("reading environment")?;
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    config.validate().context("invalid configuration")?;

    let pipeline = build_pipeline(&config).context("starting pipeline")?;
    let routes = routes(pipeline, &config.server.allowed_origin);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, shutdown_signal())
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        addr = %bound,
        origin = %config.server.allowed_origin,
        version = atelier_server::VERSION,
        "Atelier listening"
    );
    server.await;
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
