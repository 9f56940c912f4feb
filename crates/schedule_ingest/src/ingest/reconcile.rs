//! Reconciliation of freshly scraped courses against persisted ones

use super::types::{CourseId, NormalizedCourse, ScheduleCourseSet, StoredCourse};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Changes needed to turn the persisted course set into the received one.
///
/// A changed course shows up as one deletion plus one creation; there are no
/// in-place updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDelta {
    pub to_create: HashSet<NormalizedCourse>,
    pub to_delete: HashSet<StoredCourse>,
}

impl CourseDelta {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Computes the symmetric difference between stored and received courses by value.
///
/// Stored identifiers are ignored for matching. When the store holds several
/// records with one value, the one with the lowest id is kept and the rest are
/// deleted. Runs in O(n + m) using a hash index over each side.
pub fn diff(current: &[StoredCourse], received: &ScheduleCourseSet) -> CourseDelta {
    let mut kept: HashMap<&NormalizedCourse, CourseId> = HashMap::with_capacity(current.len());
    for stored in current {
        kept.entry(&stored.course)
            .and_modify(|id| *id = (*id).min(stored.id))
            .or_insert(stored.id);
    }

    let to_create = received
        .iter()
        .filter(|course| !kept.contains_key(course))
        .cloned()
        .collect();

    let to_delete = current
        .iter()
        .filter(|stored| {
            !received.contains(&stored.course) || kept.get(&stored.course) != Some(&stored.id)
        })
        .cloned()
        .collect();

    CourseDelta {
        to_create,
        to_delete,
    }
}
