#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point, meant to be run once a day by a scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use traffic_watch_bot::{RunConfig, RunOptions};
use traffic_watch_cli_utils::IndicatifProgress;
use traffic_watch_poster::{DryRunPoster, SocialPoster, XPoster};
use traffic_watch_source::FeedClient;
use traffic_watch_summary_models::SummaryMode;

#[derive(Parser)]
#[command(
    name = "traffic_watch",
    about = "Posts 911-reported traffic violence for a city"
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Location id from the locations file (e.g., "richmond")
    #[arg(long)]
    location: String,

    /// Attach a satellite image to each incident (needs a Google key)
    #[arg(long)]
    satellite: bool,

    /// Tag district representatives (needs a representatives table)
    #[arg(long)]
    reps: bool,

    /// Classify and log, but neither post nor write state
    #[arg(long)]
    dry_run: bool,

    /// Number of days of incidents to consider
    #[arg(long, default_value_t = 1)]
    days: u32,

    /// Weekly/monthly summary bookkeeping: "off", "on" (totals), or
    /// "districts" (totals plus a per-district breakdown)
    #[arg(long, default_value_t = SummaryMode::Off)]
    summary: SummaryMode,

    /// Locations file
    #[arg(long, default_value = "locations.toml")]
    config: PathBuf,

    /// Directory holding the archive and asset directories
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = traffic_watch_cli_utils::init_logger();
    let cli = Cli::parse();

    let file = traffic_watch_location::load(&cli.config)?;
    let config = RunConfig::new(
        RunOptions {
            location: cli.location,
            satellite: cli.satellite,
            representatives: cli.reps,
            dry_run: cli.dry_run,
            window_days: cli.days,
            summary_mode: cli.summary,
            data_dir: cli.data_dir,
        },
        &file,
    )?;

    let http = traffic_watch_source::http_client()?;
    let feed = FeedClient::new(http.clone(), config.location.feed.base_url.clone());

    let poster: Arc<dyn SocialPoster> = match config.location.access_token.as_deref() {
        Some(token) if !config.dry_run => Arc::new(XPoster::new(http.clone(), token)),
        _ => Arc::new(DryRunPoster),
    };

    let progress = IndicatifProgress::posting_bar(&multi);
    let report = traffic_watch_bot::run(
        &config,
        &feed,
        poster.as_ref(),
        &http,
        &progress,
        chrono::Utc::now(),
    )
    .await?;

    if report.threads_failed > 0 {
        log::warn!("{} incident thread(s) failed to post", report.threads_failed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(["traffic_watch", "--location", "richmond"].iter().chain(args))
    }

    #[test]
    fn summary_mode_flag() {
        assert_eq!(parse(&[]).unwrap().summary, SummaryMode::Off);
        assert_eq!(
            parse(&["--summary", "districts"]).unwrap().summary,
            SummaryMode::Districts
        );
        assert_eq!(parse(&["--summary", "on"]).unwrap().summary, SummaryMode::On);
        assert!(parse(&["--summary", "weekly"]).is_err());
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.days, 1);
        assert_eq!(cli.config, PathBuf::from("locations.toml"));
        assert!(!cli.dry_run && !cli.reps && !cli.satellite);
    }
}
