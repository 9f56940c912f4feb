use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use schedule_ingest::events::{CourseEvent, RecordingPublisher};
use schedule_ingest::ingest::{IngestConfig, Schedule, ScheduleId, SchedulePipeline, StoredCourse};
use schedule_ingest::service::IngestionService;
use schedule_ingest::store::InMemoryCourseStore;

mod cli;
mod logging;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format)?;

    let config = match &cli.config {
        Some(path) => IngestConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => IngestConfig::default(),
    };

    match cli.command {
        Command::Parse { page } => parse_page(&config, &page),
        Command::Fetch { urls } => fetch_pages(&config, urls).await,
        Command::Diff { stored, page } => diff_page(&config, &stored, &page).await,
    }
}

fn parse_page(config: &IngestConfig, page: &Path) -> Result<()> {
    let html = read_page(page)?;
    let pipeline = SchedulePipeline::new(config)?;
    let courses = pipeline.parse_html(&html)?;

    println!("{}", serde_json::to_string_pretty(&courses.sorted())?);
    Ok(())
}

async fn fetch_pages(config: &IngestConfig, urls: Vec<String>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<CourseEvent>();
    let service = IngestionService::new(config, InMemoryCourseStore::new(), tx)?;

    let schedules: Vec<Schedule> = urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| Schedule {
            id: ScheduleId(i as u64 + 1),
            url,
        })
        .collect();

    let results = service.ingest_all(&schedules).await;
    drop(service);

    let mut processed = Vec::new();
    while let Some(event) = rx.recv().await {
        if let CourseEvent::ScheduleProcessed { .. } = event {
            processed.push(event);
        }
    }
    println!("{}", serde_json::to_string_pretty(&processed)?);

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        bail!("{} of {} schedules failed", failed, schedules.len());
    }

    Ok(())
}

async fn diff_page(config: &IngestConfig, stored: &Path, page: &Path) -> Result<()> {
    let stored_json =
        fs::read_to_string(stored).with_context(|| format!("reading {}", stored.display()))?;
    let stored_courses: Vec<StoredCourse> = serde_json::from_str(&stored_json)
        .with_context(|| format!("parsing {}", stored.display()))?;
    let html = read_page(page)?;

    let schedule_id = ScheduleId(1);
    let store = InMemoryCourseStore::new();
    store.insert(schedule_id, stored_courses);

    let service = IngestionService::new(config, store, RecordingPublisher::new())?;
    let delta = service.ingest_html(schedule_id, &html).await?;

    info!(
        to_create = delta.to_create.len(),
        to_delete = delta.to_delete.len(),
        "Computed course delta"
    );

    let events = CourseEvent::from_delta(schedule_id, &delta);
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

fn read_page(page: &Path) -> Result<String> {
    fs::read_to_string(page).with_context(|| format!("reading {}", page.display()))
}
