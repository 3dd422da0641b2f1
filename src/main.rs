use almanac::config::Config;
use almanac::fs::DiskFs;
use almanac::render::Views;
use almanac::repository::Repository;
use almanac::server::{router, Site};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Serves a personal site and blog from a directory of markdown posts.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The project directory (or any directory beneath it) containing
    /// `site.yaml`.
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Number of threads used to parse posts. Defaults to the number of CPUs.
    #[arg(long)]
    threads: Option<usize>,

    /// Listen address, overriding `address` in `site.yaml`.
    #[arg(long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::from_directory(&args.project, args.threads)?;
    if let Some(address) = args.address {
        config.address = address;
    }

    let views = Views::load(&config)?;
    let settings = config.repository_settings();
    let repository = tokio::task::spawn_blocking(move || Repository::open(DiskFs, settings))
        .await?
        .context("no post catalog to serve")?;

    let site = Arc::new(Site {
        repository,
        views,
        static_directory: config.static_directory.clone(),
    });

    #[cfg(unix)]
    tokio::spawn(rebuild_on_hangup(Arc::clone(&site)));

    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("binding {}", config.address))?;
    tracing::info!(address = %listener.local_addr()?, "listening");

    let shutdown_site = Arc::clone(&site);
    axum::serve(listener, router(site))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
            shutdown_site.repository.abandon();
        })
        .await?;
    Ok(())
}

/// Rebuilds the catalog every time the process receives `SIGHUP`.
#[cfg(unix)]
async fn rebuild_on_hangup(site: Arc<Site>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(hangups) => hangups,
        Err(err) => {
            tracing::error!(%err, "installing SIGHUP handler; rebuilds disabled");
            return;
        }
    };
    while hangups.recv().await.is_some() {
        let site = Arc::clone(&site);
        match tokio::task::spawn_blocking(move || site.repository.build()).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::error!(%err, "rebuild failed; keeping previous catalog"),
            Err(err) => tracing::error!(%err, "rebuild task failed"),
        }
    }
}
