//! Persisted course state as seen by the ingestion service.

use crate::ingest::{CourseDelta, CourseId, IngestError, ScheduleId, StoredCourse};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read side of the storage collaborator.
pub trait CourseRepository: Send + Sync {
    /// Returns every stored course of a schedule, empty if the schedule is unknown.
    fn current_courses(&self, schedule_id: ScheduleId) -> Result<Vec<StoredCourse>, IngestError>;
}

/// Thread-safe in-memory course store.
///
/// Uses DashMap for concurrent access without external locking.
#[derive(Debug)]
pub struct InMemoryCourseStore {
    schedules: DashMap<ScheduleId, Vec<StoredCourse>>,
    next_id: AtomicU64,
}

impl InMemoryCourseStore {
    pub fn new() -> Self {
        Self {
            schedules: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seeds a schedule with already persisted courses.
    pub fn insert(&self, schedule_id: ScheduleId, courses: Vec<StoredCourse>) {
        if let Some(max) = courses.iter().map(|c| c.id.0).max() {
            self.next_id.fetch_max(max + 1, Ordering::Relaxed);
        }
        self.schedules.insert(schedule_id, courses);
    }

    /// Applies a delta, giving every created course a fresh identifier.
    ///
    /// Returns the newly stored courses.
    pub fn apply(&self, schedule_id: ScheduleId, delta: &CourseDelta) -> Vec<StoredCourse> {
        let mut entry = self.schedules.entry(schedule_id).or_default();

        entry.retain(|stored| !delta.to_delete.contains(stored));

        let created: Vec<StoredCourse> = delta
            .to_create
            .iter()
            .map(|course| StoredCourse {
                id: CourseId(self.next_id.fetch_add(1, Ordering::Relaxed)),
                course: course.clone(),
            })
            .collect();
        entry.extend(created.iter().cloned());

        if entry.is_empty() {
            drop(entry);
            self.schedules.remove(&schedule_id);
        }

        created
    }

    /// Returns the number of schedules with at least one course.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

impl Default for InMemoryCourseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CourseRepository for InMemoryCourseStore {
    fn current_courses(&self, schedule_id: ScheduleId) -> Result<Vec<StoredCourse>, IngestError> {
        Ok(self
            .schedules
            .get(&schedule_id)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{diff, ScheduleCourseSet};
    use crate::ingest::tests_support::course;
    use chrono::Weekday;

    #[test]
    fn test_apply_assigns_fresh_ids() {
        let store = InMemoryCourseStore::new();
        let received: ScheduleCourseSet = vec![
            course("Analiza", Weekday::Mon, (8, 30), (10, 0)),
            course("Fizyka", Weekday::Tue, (8, 30), (10, 0)),
        ]
        .into_iter()
        .collect();

        let delta = diff(&store.current_courses(ScheduleId(1)).unwrap(), &received);
        let created = store.apply(ScheduleId(1), &delta);

        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);
        assert_eq!(store.current_courses(ScheduleId(1)).unwrap().len(), 2);
        assert!(diff(&store.current_courses(ScheduleId(1)).unwrap(), &received).is_empty());
    }

    #[test]
    fn test_seeded_ids_are_not_reused() {
        let store = InMemoryCourseStore::new();
        store.insert(
            ScheduleId(1),
            vec![StoredCourse {
                id: CourseId(41),
                course: course("Analiza", Weekday::Mon, (8, 30), (10, 0)),
            }],
        );

        let received: ScheduleCourseSet = vec![course("Fizyka", Weekday::Tue, (8, 30), (10, 0))]
            .into_iter()
            .collect();
        let delta = diff(&store.current_courses(ScheduleId(1)).unwrap(), &received);
        let created = store.apply(ScheduleId(1), &delta);

        assert_eq!(created[0].id, CourseId(42));
        let current = store.current_courses(ScheduleId(1)).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].course.name, "Fizyka");
    }

    #[test]
    fn test_deleting_everything_forgets_schedule() {
        let store = InMemoryCourseStore::new();
        store.insert(
            ScheduleId(7),
            vec![StoredCourse {
                id: CourseId(1),
                course: course("Analiza", Weekday::Mon, (8, 30), (10, 0)),
            }],
        );

        let delta = diff(&store.current_courses(ScheduleId(7)).unwrap(), &ScheduleCourseSet::new());
        store.apply(ScheduleId(7), &delta);

        assert!(store.is_empty());
        assert!(store.current_courses(ScheduleId(7)).unwrap().is_empty());
    }
}
