//! One run of the bot, start to finish.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use traffic_watch_archive::{ArchiveStore, RunLock, dedupe_by};
use traffic_watch_classifier::{partition, within_window};
use traffic_watch_district::{DistrictIndex, download_boundaries};
use traffic_watch_incident_models::TrackedIncident;
use traffic_watch_poster::{Post, SocialPoster};
use traffic_watch_source::IncidentFeed;
use traffic_watch_source::progress::ProgressCallback;
use traffic_watch_summary::daily::{DailySummary, RepresentativeContext, daily_summary};
use traffic_watch_summary::{RollupOptions, SummaryStore, record_and_maybe_rollup};
use traffic_watch_summary_models::SummaryState;

use crate::PipelineError;
use crate::config::RunConfig;
use crate::images::fetch_images;
use crate::thread::incident_thread;

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Incidents returned by the feed.
    pub fetched: usize,
    /// New traffic-violence incidents after deduplication.
    pub new_incidents: usize,
    /// Incident threads published.
    pub threads_posted: usize,
    /// Incident threads that failed to publish.
    pub threads_failed: usize,
    /// Rollup messages produced this run.
    pub rollups: Vec<String>,
}

/// Runs the bot once.
///
/// `now` decides the fetch window and, in the location's local time, the
/// calendar day used for rollups.
///
/// # Errors
///
/// Returns [`PipelineError`] for failures that make the run pointless:
/// the lock is held, the summary counters are corrupt, the feed or the
/// district boundaries cannot be fetched, or state cannot be persisted.
/// Per-incident image and posting failures are only logged.
pub async fn run<F, P>(
    config: &RunConfig,
    feed: &F,
    poster: &P,
    http: &reqwest::Client,
    progress: &Arc<dyn ProgressCallback>,
    now: DateTime<Utc>,
) -> Result<RunReport, PipelineError>
where
    F: IncidentFeed + ?Sized,
    P: SocialPoster + ?Sized,
{
    let location = &config.location;
    let _lock = RunLock::acquire(&config.paths.lock_file, config.lock_stale_after)?;

    let summary_store = SummaryStore::new(config.paths.summary_file.clone());
    let summary_state = if config.summary_mode.is_enabled() {
        Some(summary_store.load()?)
    } else {
        None
    };

    reset_dir(&config.paths.asset_dir)?;
    let district_index = load_districts(config, http).await?;

    let incidents = feed
        .fetch_incidents(&location.bounds, config.fetch_limit())
        .await?;
    let mut report = RunReport {
        fetched: incidents.len(),
        ..RunReport::default()
    };

    let recent = within_window(incidents, now.timestamp_millis(), config.window_days);
    let split = partition(recent);
    let pedestrian_total = split.pedestrian_or_cyclist.len();
    log::debug!("{pedestrian_total} pedestrian/cyclist incident(s) before deduplication");

    let archive_store = ArchiveStore::new(config.paths.archive_file.clone());
    let outcome = dedupe_by(split.into_tracked(), archive_store.load(), |t| &t.incident);
    let mut tracked = outcome.to_process;
    report.new_incidents = tracked.len();

    if let Some(index) = &district_index {
        index.assign(&mut tracked);
    }

    if let Some(state) = summary_state {
        report.rollups = aggregate(config, &summary_store, state, &tracked, now)?;
    }

    if config.dry_run {
        log::info!("Dry run: not updating {}", archive_store.path().display());
    } else {
        archive_store.save(&outcome.updated_archive)?;
    }

    post_incidents(config, poster, http, progress, &tracked, &mut report).await;

    tokio::time::sleep(config.summary_delay).await;
    let reps = config
        .districts()
        .filter(|_| config.representatives)
        .map(|d| RepresentativeContext {
            district_term: &d.district_term,
            at_large: &d.at_large,
        });
    let summary = daily_summary(
        &tracked,
        &DailySummary {
            window_days: config.window_days,
            location_name: &location.display_name,
            representatives: reps,
        },
    );
    let summary: Vec<Post> = summary.into_iter().map(Post::text).collect();
    if let Err(e) = poster.post_thread(&summary).await {
        log::error!("Failed to post daily summary: {e}");
    }

    for message in &report.rollups {
        if let Err(e) = poster.post_thread(&[Post::text(message.clone())]).await {
            log::error!("Failed to post rollup: {e}");
        }
    }

    log::info!(
        "Run complete: {} fetched, {} new, {} posted, {} failed",
        report.fetched,
        report.new_incidents,
        report.threads_posted,
        report.threads_failed
    );
    Ok(report)
}

/// Boundaries are fetched before the archive is touched, so a failed
/// download leaves every incident eligible for the next run.
async fn load_districts(
    config: &RunConfig,
    http: &reqwest::Client,
) -> Result<Option<DistrictIndex>, PipelineError> {
    let Some(districts) = config.districts().filter(|_| config.needs_districts()) else {
        return Ok(None);
    };
    let path = download_boundaries(http, &districts.geojson_url, &config.paths.asset_dir).await?;
    Ok(Some(DistrictIndex::from_file(
        &path,
        &districts.district_property,
    )?))
}

fn aggregate(
    config: &RunConfig,
    store: &SummaryStore,
    state: SummaryState,
    tracked: &[TrackedIncident],
    now: DateTime<Utc>,
) -> Result<Vec<String>, PipelineError> {
    let today = now.with_timezone(&config.location.utc_offset).date_naive();
    let options = RollupOptions {
        breakdown: config.summary_mode.tracks_districts(),
        district_term: config
            .districts()
            .map_or_else(|| RollupOptions::default().district_term, |d| d.district_term.clone()),
    };

    let outcome = record_and_maybe_rollup(state, tracked, today, &options);
    if config.dry_run {
        log::info!("Dry run: not updating {}", store.path().display());
    } else {
        store.save(&outcome.state)?;
    }
    Ok(outcome.messages)
}

async fn post_incidents<P: SocialPoster + ?Sized>(
    config: &RunConfig,
    poster: &P,
    http: &reqwest::Client,
    progress: &Arc<dyn ProgressCallback>,
    tracked: &[TrackedIncident],
    report: &mut RunReport,
) {
    progress.set_total(tracked.len() as u64);
    let rep_settings = config.districts().filter(|_| config.representatives);

    for item in tracked {
        let incident = &item.incident;
        progress.set_message(incident.key.clone());
        log::info!("{}", incident.raw_text());

        tokio::time::sleep(config.post_delay).await;
        let media = fetch_images(
            http,
            incident,
            &config.paths,
            config.location.google_key.as_deref(),
        )
        .await;

        let posts = incident_thread(item, media, config.location.utc_offset, rep_settings);
        match poster.post_thread(&posts).await {
            Ok(()) => report.threads_posted += 1,
            Err(e) => {
                log::error!("Failed to post thread for {}: {e}", incident.key);
                report.threads_failed += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish(format!("Posted {} thread(s)", report.threads_posted));
}

fn reset_dir(dir: &Path) -> Result<(), PipelineError> {
    let err = |source| PipelineError::Assets {
        path: dir.display().to_string(),
        source,
    };
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(err(e)),
    }
    std::fs::create_dir_all(dir).map_err(err)
}
