//! Event-driven ingestion: turns schedule events into course events.
//!
//! Handles the flow:
//! 1. Fetch the schedule page (created/updated schedules only)
//! 2. Parse it into a course set
//! 3. Load the persisted courses and diff them against the new set
//! 4. Publish the course set, the deletions and the creations as one batch
//!
//! A run that fails publishes nothing.

use crate::events::{CourseEvent, EventPublisher, ScheduleEvent};
use crate::ingest::{
    diff, generate_correlation_id, CourseDelta, IngestConfig, IngestError, Schedule, ScheduleClient,
    ScheduleCourseSet, ScheduleId, SchedulePipeline,
};
use crate::store::CourseRepository;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Ingests schedules and reconciles them against a course repository.
pub struct IngestionService<R, P> {
    client: ScheduleClient,
    pipeline: SchedulePipeline,
    repository: R,
    publisher: P,
    max_concurrent_fetches: usize,
    /// Per-schedule locks so two runs for one schedule never load, diff and
    /// publish at once
    schedule_locks: DashMap<ScheduleId, Arc<Mutex<()>>>,
}

impl<R, P> IngestionService<R, P>
where
    R: CourseRepository,
    P: EventPublisher,
{
    pub fn new(config: &IngestConfig, repository: R, publisher: P) -> Result<Self, IngestError> {
        config.validate()?;

        Ok(Self {
            client: ScheduleClient::new(&config.fetch)?,
            pipeline: SchedulePipeline::new(config)?,
            repository,
            publisher,
            max_concurrent_fetches: config.fetch.max_concurrent_fetches.max(1),
            schedule_locks: DashMap::new(),
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Routes one schedule event.
    ///
    /// # Returns
    /// * `Ok(Some(CourseDelta))` - The changes published for the schedule
    /// * `Ok(None)` - The event kind is not handled here
    /// * `Err(IngestError)` - The run failed; nothing was reconciled
    pub async fn handle(&self, event: ScheduleEvent) -> Result<Option<CourseDelta>, IngestError> {
        debug!(kind = event.kind(), "Handling schedule event");

        match event {
            ScheduleEvent::Created(schedule) | ScheduleEvent::Updated(schedule) => {
                self.ingest_schedule(&schedule).await.map(Some)
            }
            ScheduleEvent::Deleted { schedule_id } => {
                self.reconcile(schedule_id, &ScheduleCourseSet::new()).await.map(Some)
            }
            ScheduleEvent::Unsupported => {
                debug!("Ignoring unsupported schedule event");
                Ok(None)
            }
        }
    }

    /// Fetches, parses and reconciles one schedule.
    pub async fn ingest_schedule(&self, schedule: &Schedule) -> Result<CourseDelta, IngestError> {
        let html = self.client.fetch_page(&schedule.url).await?;
        self.ingest_html(schedule.id, &html).await
    }

    /// Parses an already fetched page and reconciles the result.
    pub async fn ingest_html(&self, schedule_id: ScheduleId, html: &str) -> Result<CourseDelta, IngestError> {
        let courses = match self.pipeline.parse_html(html) {
            Ok(courses) => courses,
            Err(e) => {
                warn!(schedule_id = %schedule_id, error = %e, "Schedule page yielded no courses");
                return Err(e);
            }
        };

        self.reconcile_and_publish(schedule_id, &courses, true).await
    }

    /// Diffs `received` against the repository and publishes the delta.
    ///
    /// The service never writes the repository. Applying the published delta
    /// is up to its consumer, so two runs for one schedule that both finish
    /// before it is applied publish the same delta, one after the other.
    pub async fn reconcile(
        &self,
        schedule_id: ScheduleId,
        received: &ScheduleCourseSet,
    ) -> Result<CourseDelta, IngestError> {
        self.reconcile_and_publish(schedule_id, received, false).await
    }

    async fn reconcile_and_publish(
        &self,
        schedule_id: ScheduleId,
        received: &ScheduleCourseSet,
        announce_course_set: bool,
    ) -> Result<CourseDelta, IngestError> {
        let correlation_id = generate_correlation_id();
        let lock = self.schedule_lock(schedule_id);
        let _guard = lock.lock().await;

        let current = self.repository.current_courses(schedule_id)?;
        let delta = diff(&current, received);

        info!(
            correlation_id = %correlation_id,
            schedule_id = %schedule_id,
            stored = current.len(),
            received = received.len(),
            to_create = delta.to_create.len(),
            to_delete = delta.to_delete.len(),
            "Reconciled schedule courses"
        );

        let mut events = Vec::with_capacity(3);
        if announce_course_set {
            events.push(CourseEvent::processed(schedule_id, received));
        }
        events.extend(CourseEvent::from_delta(schedule_id, &delta));

        if let Err(e) = self.publisher.publish_all(events) {
            warn!(
                correlation_id = %correlation_id,
                schedule_id = %schedule_id,
                error = %e,
                "Failed to publish course events"
            );
            return Err(e);
        }

        Ok(delta)
    }

    /// Ingests several schedules, at most `max_concurrent_fetches` at a time.
    ///
    /// Results come back in completion order; one failing schedule doesn't
    /// stop the others.
    pub async fn ingest_all(
        &self,
        schedules: &[Schedule],
    ) -> Vec<(ScheduleId, Result<CourseDelta, IngestError>)> {
        let start = Instant::now();

        let results: Vec<_> = stream::iter(schedules)
            .map(|schedule| async move { (schedule.id, self.ingest_schedule(schedule).await) })
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        for (schedule_id, result) in &results {
            if let Err(e) = result {
                error!(schedule_id = %schedule_id, error = %e, "Schedule ingestion failed");
            }
        }

        info!(
            schedules = schedules.len(),
            failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Finished ingesting schedules"
        );

        results
    }

    /// Gets or creates the lock for the given schedule.
    fn schedule_lock(&self, schedule_id: ScheduleId) -> Arc<Mutex<()>> {
        self.schedule_locks
            .entry(schedule_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
