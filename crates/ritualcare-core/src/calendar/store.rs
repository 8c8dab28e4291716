//! Storage seam for calendar events.
//!
//! [`CalendarStore::atomically`] runs a closure against an [`EventRepository`]
//! as one unit: either every write inside it lands or none does.

use std::sync::{Mutex, MutexGuard};

use super::{CalendarEvent, EventCategory, EventStatusKind, TimeWindow};
use crate::error::DatabaseError;

/// Filter for [`EventRepository::find_events`]. Results are ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub user_id: String,
    pub overlapping: Option<TimeWindow>,
    /// Empty means any status.
    pub statuses: Vec<EventStatusKind>,
    pub category: Option<EventCategory>,
}

impl EventQuery {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            overlapping: None,
            statuses: Vec::new(),
            category: None,
        }
    }

    pub fn overlapping(mut self, window: TimeWindow) -> Self {
        self.overlapping = Some(window);
        self
    }

    pub fn with_statuses(mut self, statuses: &[EventStatusKind]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    /// Every status except SKIPPED.
    pub fn active(self) -> Self {
        self.with_statuses(&[
            EventStatusKind::Planned,
            EventStatusKind::Rescheduled,
            EventStatusKind::Completed,
        ])
    }

    pub fn in_category(mut self, category: EventCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn matches(&self, event: &CalendarEvent) -> bool {
        event.user_id == self.user_id
            && self.overlapping.map_or(true, |w| event.overlaps(&w))
            && (self.statuses.is_empty() || self.statuses.contains(&event.status.kind()))
            && self.category.map_or(true, |c| event.category == c)
    }
}

/// Row-level access to calendar events inside one atomic scope.
pub trait EventRepository {
    fn find_events(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, DatabaseError>;

    fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>, DatabaseError>;

    fn create_event(&mut self, event: &CalendarEvent) -> Result<(), DatabaseError>;

    /// Returns `false` when no event with that id exists.
    fn update_event(&mut self, event: &CalendarEvent) -> Result<bool, DatabaseError>;

    /// Returns the number of rows removed.
    fn delete_events(&mut self, ids: &[String]) -> Result<usize, DatabaseError>;
}

pub trait CalendarStore: Send + Sync {
    /// Run `f` atomically. An `Err` from `f` discards its writes.
    fn atomically<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut dyn EventRepository) -> Result<T, DatabaseError>;
}

/// In-process store. Each atomic scope works on a copy that replaces the
/// shared list only when the closure succeeds.
#[derive(Debug, Default)]
pub struct MemoryCalendarStore {
    events: Mutex<Vec<CalendarEvent>>,
}

impl MemoryCalendarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    /// Snapshot of every stored event.
    pub fn snapshot(&self) -> Vec<CalendarEvent> {
        match self.lock() {
            Ok(events) => events.clone(),
            Err(_) => Vec::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<CalendarEvent>>, DatabaseError> {
        self.events.lock().map_err(|_| DatabaseError::Locked)
    }
}

impl CalendarStore for MemoryCalendarStore {
    fn atomically<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut dyn EventRepository) -> Result<T, DatabaseError>,
    {
        let mut committed = self.lock()?;
        let mut working = MemoryRepository {
            events: committed.clone(),
        };
        let value = f(&mut working)?;
        *committed = working.events;
        Ok(value)
    }
}

struct MemoryRepository {
    events: Vec<CalendarEvent>,
}

impl EventRepository for MemoryRepository {
    fn find_events(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, DatabaseError> {
        let mut found: Vec<CalendarEvent> = self
            .events
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start_time);
        Ok(found)
    }

    fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>, DatabaseError> {
        Ok(self.events.iter().find(|e| e.id == id).cloned())
    }

    fn create_event(&mut self, event: &CalendarEvent) -> Result<(), DatabaseError> {
        if self.events.iter().any(|e| e.id == event.id) {
            return Err(DatabaseError::QueryFailed(format!(
                "event {} already exists",
                event.id
            )));
        }
        self.events.push(event.clone());
        Ok(())
    }

    fn update_event(&mut self, event: &CalendarEvent) -> Result<bool, DatabaseError> {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => {
                *slot = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_events(&mut self, ids: &[String]) -> Result<usize, DatabaseError> {
        let before = self.events.len();
        self.events.retain(|e| !ids.contains(&e.id));
        Ok(before - self.events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventStatus;
    use crate::rituals::{ActivityType, LoadLevel};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn ritual(user: &str, start: DateTime<Utc>) -> CalendarEvent {
        CalendarEvent::new(
            user,
            EventCategory::HairRitual,
            ActivityType::ScalpTreatment,
            "Scalp",
            start,
            start + Duration::minutes(20),
            LoadLevel::Light,
        )
    }

    #[test]
    fn failed_scope_discards_writes() {
        let store = MemoryCalendarStore::new();
        let result: Result<(), _> = store.atomically(|repo| {
            repo.create_event(&ritual("u", at(2, 9)))?;
            Err(DatabaseError::QueryFailed("boom".into()))
        });
        assert!(result.is_err());
        assert!(store.snapshot().is_empty());

        store
            .atomically(|repo| repo.create_event(&ritual("u", at(2, 9))))
            .unwrap();
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn query_filters_and_orders() {
        let mut skipped = ritual("u", at(3, 9));
        skipped.status = EventStatus::Skipped { skipped_at: at(3, 8), reason: None };
        let store = MemoryCalendarStore::with_events(vec![
            ritual("u", at(4, 9)),
            ritual("other", at(2, 9)),
            skipped,
            ritual("u", at(2, 9)),
        ]);

        let found = store
            .atomically(|repo| repo.find_events(&EventQuery::for_user("u").active()))
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].start_time < found[1].start_time);

        let window = TimeWindow::new(at(2, 0), at(3, 0)).unwrap();
        let found = store
            .atomically(|repo| repo.find_events(&EventQuery::for_user("u").overlapping(window)))
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn update_and_delete_report_counts() {
        let event = ritual("u", at(2, 9));
        let store = MemoryCalendarStore::with_events(vec![event.clone()]);
        store
            .atomically(|repo| {
                let mut moved = event.clone();
                moved.start_time = at(2, 10);
                assert!(repo.update_event(&moved)?);
                assert!(!repo.update_event(&ritual("u", at(5, 9)))?);
                assert_eq!(repo.delete_events(&[event.id.clone(), "missing".into()])?, 1);
                Ok(())
            })
            .unwrap();
        assert!(store.snapshot().is_empty());
    }
}
