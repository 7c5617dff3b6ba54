//! Refresh one rider's trip history, resolve distances and print statistics.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bikage::BikageSettings;
use bikage::domain::ports::PersistentCache;
use bikage::domain::{
    BatchFetcher, Bikage, BikagePorts, Credentials, DistanceResolver, PaginatedTripSource,
    RefreshMode, RefreshScheduler, StationCatalogue,
};
use bikage::outbound::cache::{JsonFileCache, NoopCache};
use bikage::outbound::directions::GoogleDirectionsClient;
use bikage::outbound::trip_export::ExportDirectoryTripPages;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `bikage` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bikage",
    about = "Summarise a bike-share rider's trip history",
    version
)]
struct CliArgs {
    /// Rider account name.
    #[arg(long, value_name = "name")]
    username: String,
    /// Rider account password.
    #[arg(long, env = "BIKAGE_PASSWORD", hide_env_values = true)]
    password: String,
    /// Directory holding exported trip pages, one subdirectory per rider.
    #[arg(long = "export-dir", value_name = "path")]
    export_dir: PathBuf,
    /// Station feed JSON used to resolve station identifiers.
    #[arg(long = "stations", value_name = "feed.json")]
    stations: PathBuf,
    /// Answer from the cache without waiting for the history refresh.
    #[arg(long)]
    cached: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = BikageSettings::load_from_iter([OsString::from("bikage")])
        .map_err(|error| eyre!("load settings: {error}"))?;
    let credentials = Credentials::try_from_parts(&args.username, &args.password)
        .wrap_err("invalid credentials")?;
    let stations = Arc::new(load_stations(&args.stations).await?);
    info!(stations = stations.len(), "loaded station catalogue");

    let service = build_service(&settings, &args.export_dir, stations).await?;
    let mode = if args.cached {
        RefreshMode::Cached
    } else {
        RefreshMode::Wait
    };
    let stats = service
        .stats(&credentials, mode)
        .await
        .wrap_err("refresh trip history")?;

    println!("{stats}");
    Ok(())
}

async fn load_stations(path: &Path) -> Result<StationCatalogue> {
    let feed = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("read station feed {}", path.display()))?;
    StationCatalogue::from_feed_json(&feed)
        .wrap_err_with(|| format!("decode station feed {}", path.display()))
}

async fn build_service(
    settings: &BikageSettings,
    export_dir: &Path,
    stations: Arc<StationCatalogue>,
) -> Result<Bikage> {
    let cache: Arc<dyn PersistentCache> = if settings.cache_enabled() {
        Arc::new(JsonFileCache::open(settings.cache_path()).await)
    } else {
        Arc::new(NoopCache)
    };

    let api_key = settings
        .google_api_key
        .clone()
        .ok_or_else(|| eyre!("BIKAGE_GOOGLE_API_KEY is not set"))?;
    let fetcher_config = settings.fetcher_config();
    let directions = GoogleDirectionsClient::new(
        settings
            .directions_endpoint()
            .wrap_err("invalid directions endpoint")?,
        api_key,
        fetcher_config.request_timeout,
    )
    .wrap_err("build directions client")?;
    let fetcher = BatchFetcher::spawn(Arc::new(directions), fetcher_config);
    let resolver = DistanceResolver::new(Arc::clone(&cache), fetcher);

    let source = PaginatedTripSource::new(ExportDirectoryTripPages::new(export_dir, stations));
    let scheduler = RefreshScheduler::spawn(
        Arc::new(source),
        Arc::clone(&cache),
        Arc::new(DefaultClock),
        settings.scheduler_config(),
    );

    Ok(Bikage::new(
        BikagePorts {
            cache,
            scheduler,
            resolver,
        },
        settings.utc_offset(),
    ))
}
