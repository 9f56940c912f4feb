//! Inbound schedule events and outbound course events.

use crate::ingest::{
    CourseDelta, IngestError, NormalizedCourse, Schedule, ScheduleCourseSet, ScheduleId, StoredCourse,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Event emitted by the schedule service.
///
/// Kinds this service does not handle deserialize into `Unsupported`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleEvent {
    Created(Schedule),
    Updated(Schedule),
    Deleted { schedule_id: ScheduleId },
    #[serde(other)]
    Unsupported,
}

impl ScheduleEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleEvent::Created(_) => "created",
            ScheduleEvent::Updated(_) => "updated",
            ScheduleEvent::Deleted { .. } => "deleted",
            ScheduleEvent::Unsupported => "unsupported",
        }
    }
}

/// Event handed to the publishing collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CourseEvent {
    /// The full course set computed for a schedule
    ScheduleProcessed {
        schedule_id: ScheduleId,
        courses: Vec<NormalizedCourse>,
    },
    CoursesCreated {
        schedule_id: ScheduleId,
        courses: Vec<NormalizedCourse>,
    },
    CoursesDeleted {
        schedule_id: ScheduleId,
        courses: Vec<StoredCourse>,
    },
}

impl CourseEvent {
    pub fn processed(schedule_id: ScheduleId, courses: &ScheduleCourseSet) -> Self {
        CourseEvent::ScheduleProcessed {
            schedule_id,
            courses: courses.sorted().into_iter().cloned().collect(),
        }
    }

    /// Splits a delta into its deletion and creation events, skipping empty halves
    pub fn from_delta(schedule_id: ScheduleId, delta: &CourseDelta) -> Vec<Self> {
        let mut events = Vec::with_capacity(2);

        if !delta.to_delete.is_empty() {
            let mut courses: Vec<StoredCourse> = delta.to_delete.iter().cloned().collect();
            courses.sort_by_key(|c| c.id);
            events.push(CourseEvent::CoursesDeleted {
                schedule_id,
                courses,
            });
        }

        if !delta.to_create.is_empty() {
            let created: ScheduleCourseSet = delta.to_create.iter().cloned().collect();
            events.push(CourseEvent::CoursesCreated {
                schedule_id,
                courses: created.sorted().into_iter().cloned().collect(),
            });
        }

        events
    }
}

/// Outbound side of the message bus
pub trait EventPublisher: Send + Sync {
    /// Delivers a batch of events in order, either all of them or none.
    fn publish_all(&self, events: Vec<CourseEvent>) -> Result<(), IngestError>;

    fn publish(&self, event: CourseEvent) -> Result<(), IngestError> {
        self.publish_all(vec![event])
    }
}

impl EventPublisher for UnboundedSender<CourseEvent> {
    fn publish_all(&self, events: Vec<CourseEvent>) -> Result<(), IngestError> {
        // Sending only fails once the receiver is gone.
        if self.is_closed() {
            return Err(IngestError::Publish {
                message: "channel closed".to_string(),
            });
        }

        for event in events {
            self.send(event).map_err(|e| IngestError::Publish {
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Keeps every published event in memory
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<CourseEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything published so far
    pub fn take(&self) -> Vec<CourseEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish_all(&self, events: Vec<CourseEvent>) -> Result<(), IngestError> {
        let mut guard = self.events.lock().map_err(|e| IngestError::Publish {
            message: e.to_string(),
        })?;
        guard.extend(events);
        Ok(())
    }
}
