//! SQLite-backed calendar event storage.
//!
//! Each [`CalendarStore::atomically`] scope is one SQLite transaction. A failed
//! statement inside the scope does not abort the transaction; only an `Err`
//! returned from the scope rolls it back.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

use super::{data_dir, migrations};
use crate::calendar::{
    CalendarEvent, CalendarStore, EventCategory, EventQuery, EventRepository, EventStatus,
};
use crate::error::{CoreError, DatabaseError};
use crate::rituals::{ActivityType, LoadLevel};

const TABLE: &str = "calendar_events";

const COLUMNS: &str = "id, user_id, category, activity_type, title, description, start_time, \
     end_time, load_level, requires_rest_buffer, recommended_rest_hours_after, status_detail, \
     ritual_id, booking_id, parent_event_id, created_at, updated_at";

/// SQLite database for calendar events.
pub struct CalendarDb {
    conn: Mutex<Connection>,
}

impl CalendarDb {
    /// Open the database at `<data_dir>/ritualcare.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("ritualcare.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::Locked)
    }
}

impl CalendarStore for CalendarDb {
    fn atomically<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut dyn EventRepository) -> Result<T, DatabaseError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&mut SqliteRepository { tx: &tx })?;
        tx.commit()?;
        Ok(value)
    }
}

struct SqliteRepository<'a> {
    tx: &'a Transaction<'a>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed-width UTC so text comparison matches time order.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(format!("{column}: {e}")))
}

fn corrupt(message: String) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: TABLE.to_string(),
        message,
    }
}

/// A row as stored, before enum and timestamp decoding.
struct StoredEvent {
    id: String,
    user_id: String,
    category: String,
    activity_type: String,
    title: String,
    description: Option<String>,
    start_time: String,
    end_time: String,
    load_level: String,
    requires_rest_buffer: bool,
    recommended_rest_hours_after: u32,
    status_detail: String,
    ritual_id: Option<String>,
    booking_id: Option<String>,
    parent_event_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl StoredEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            activity_type: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            load_level: row.get(8)?,
            requires_rest_buffer: row.get(9)?,
            recommended_rest_hours_after: row.get(10)?,
            status_detail: row.get(11)?,
            ritual_id: row.get(12)?,
            booking_id: row.get(13)?,
            parent_event_id: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }

    fn decode(self) -> Result<CalendarEvent, DatabaseError> {
        let status: EventStatus = serde_json::from_str(&self.status_detail)
            .map_err(|e| corrupt(format!("status_detail for {}: {e}", self.id)))?;
        Ok(CalendarEvent {
            category: EventCategory::parse(&self.category)
                .ok_or_else(|| corrupt(format!("unknown category '{}'", self.category)))?,
            activity_type: ActivityType::parse(&self.activity_type)
                .ok_or_else(|| corrupt(format!("unknown activity type '{}'", self.activity_type)))?,
            load_level: LoadLevel::parse(&self.load_level)
                .ok_or_else(|| corrupt(format!("unknown load level '{}'", self.load_level)))?,
            start_time: parse_timestamp("start_time", &self.start_time)?,
            end_time: parse_timestamp("end_time", &self.end_time)?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            requires_rest_buffer: self.requires_rest_buffer,
            recommended_rest_hours_after: self.recommended_rest_hours_after,
            status,
            ritual_id: self.ritual_id,
            booking_id: self.booking_id,
            parent_event_id: self.parent_event_id,
        })
    }
}

fn status_detail(event: &CalendarEvent) -> Result<String, DatabaseError> {
    serde_json::to_string(&event.status).map_err(|e| DatabaseError::QueryFailed(e.to_string()))
}

impl EventRepository for SqliteRepository<'_> {
    fn find_events(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, DatabaseError> {
        let mut sql = format!("SELECT {COLUMNS} FROM {TABLE} WHERE user_id = ?");
        let mut args: Vec<String> = vec![query.user_id.clone()];

        if let Some(window) = query.overlapping {
            sql.push_str(" AND start_time < ? AND end_time > ?");
            args.push(timestamp(window.end));
            args.push(timestamp(window.start));
        }
        if !query.statuses.is_empty() {
            let placeholders = vec!["?"; query.statuses.len()].join(", ");
            sql.push_str(&format!(" AND status IN ({placeholders})"));
            args.extend(query.statuses.iter().map(|s| s.as_str().to_string()));
        }
        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            args.push(category.as_str().to_string());
        }
        sql.push_str(" ORDER BY start_time, id");

        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), StoredEvent::from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.decode()?);
        }
        Ok(events)
    }

    fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>, DatabaseError> {
        let stored = self
            .tx
            .query_row(
                &format!("SELECT {COLUMNS} FROM {TABLE} WHERE id = ?1"),
                params![id],
                StoredEvent::from_row,
            )
            .optional()?;
        stored.map(StoredEvent::decode).transpose()
    }

    fn create_event(&mut self, event: &CalendarEvent) -> Result<(), DatabaseError> {
        self.tx.execute(
            &format!(
                "INSERT INTO {TABLE} ({COLUMNS}, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                event.id,
                event.user_id,
                event.category.as_str(),
                event.activity_type.as_str(),
                event.title,
                event.description,
                timestamp(event.start_time),
                timestamp(event.end_time),
                event.load_level.as_str(),
                event.requires_rest_buffer,
                event.recommended_rest_hours_after,
                status_detail(event)?,
                event.ritual_id,
                event.booking_id,
                event.parent_event_id,
                timestamp(event.created_at),
                timestamp(event.updated_at),
                event.status.kind().as_str(),
            ],
        )?;
        Ok(())
    }

    fn update_event(&mut self, event: &CalendarEvent) -> Result<bool, DatabaseError> {
        let changed = self.tx.execute(
            &format!(
                "UPDATE {TABLE} SET
                    title = ?2, description = ?3, start_time = ?4, end_time = ?5,
                    recommended_rest_hours_after = ?6, status = ?7, status_detail = ?8,
                    booking_id = ?9, updated_at = ?10
                 WHERE id = ?1"
            ),
            params![
                event.id,
                event.title,
                event.description,
                timestamp(event.start_time),
                timestamp(event.end_time),
                event.recommended_rest_hours_after,
                event.status.kind().as_str(),
                status_detail(event)?,
                event.booking_id,
                timestamp(event.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_events(&mut self, ids: &[String]) -> Result<usize, DatabaseError> {
        let mut stmt = self
            .tx
            .prepare(&format!("DELETE FROM {TABLE} WHERE id = ?1"))?;
        let mut removed = 0;
        for id in ids {
            removed += stmt.execute(params![id])?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{EventStatusKind, TimeWindow};
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn wash(user: &str, start: DateTime<Utc>) -> CalendarEvent {
        let mut event = CalendarEvent::new(
            user,
            EventCategory::HairRitual,
            ActivityType::WashDay,
            "Wash day",
            start,
            start + Duration::minutes(150),
            LoadLevel::Heavy,
        );
        event.ritual_id = Some("wash-day-full".into());
        event.description = Some("Pre-poo; Cleanse".into());
        event.recommended_rest_hours_after = 55;
        event
    }

    #[test]
    fn event_round_trips_through_sqlite() {
        let db = CalendarDb::open_memory().unwrap();
        let event = wash("u", at(7, 9));
        db.atomically(|repo| repo.create_event(&event)).unwrap();

        let loaded = db.atomically(|repo| repo.get_event(&event.id)).unwrap().unwrap();
        assert_eq!(loaded.id, event.id);
        assert_eq!(loaded.start_time, event.start_time);
        assert_eq!(loaded.activity_type, ActivityType::WashDay);
        assert_eq!(loaded.ritual_id.as_deref(), Some("wash-day-full"));
        assert_eq!(loaded.recommended_rest_hours_after, 55);
        assert_eq!(loaded.status, EventStatus::Planned);
    }

    #[test]
    fn query_by_window_status_and_category() {
        let db = CalendarDb::open_memory().unwrap();
        let mut skipped = wash("u", at(14, 9));
        skipped.status = EventStatus::Skipped {
            skipped_at: at(14, 8),
            reason: Some("travel".into()),
        };
        let events = vec![wash("u", at(7, 9)), skipped, wash("other", at(7, 9))];
        db.atomically(|repo| {
            for event in &events {
                repo.create_event(event)?;
            }
            Ok(())
        })
        .unwrap();

        let all = db
            .atomically(|repo| repo.find_events(&EventQuery::for_user("u")))
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].start_time < all[1].start_time);

        let active = db
            .atomically(|repo| repo.find_events(&EventQuery::for_user("u").active()))
            .unwrap();
        assert_eq!(active.len(), 1);

        let skipped = db
            .atomically(|repo| {
                repo.find_events(
                    &EventQuery::for_user("u").with_statuses(&[EventStatusKind::Skipped]),
                )
            })
            .unwrap();
        assert!(matches!(
            skipped[0].status,
            EventStatus::Skipped { ref reason, .. } if reason.as_deref() == Some("travel")
        ));

        // Touching windows do not overlap.
        let window = TimeWindow::new(at(7, 11) + Duration::minutes(30), at(8, 0)).unwrap();
        let touching = db
            .atomically(|repo| repo.find_events(&EventQuery::for_user("u").overlapping(window)))
            .unwrap();
        assert!(touching.is_empty());

        let prompts = db
            .atomically(|repo| {
                repo.find_events(
                    &EventQuery::for_user("u").in_category(EventCategory::EducationPrompt),
                )
            })
            .unwrap();
        assert!(prompts.is_empty());
    }

    #[test]
    fn failed_scope_rolls_back() {
        let db = CalendarDb::open_memory().unwrap();
        let event = wash("u", at(7, 9));
        let result: Result<(), _> = db.atomically(|repo| {
            repo.create_event(&event)?;
            Err(DatabaseError::QueryFailed("abort".into()))
        });
        assert!(result.is_err());
        let found = db.atomically(|repo| repo.get_event(&event.id)).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn duplicate_insert_fails_without_aborting_scope() {
        let db = CalendarDb::open_memory().unwrap();
        let event = wash("u", at(7, 9));
        let other = wash("u", at(14, 9));
        db.atomically(|repo| {
            repo.create_event(&event)?;
            assert!(repo.create_event(&event).is_err());
            repo.create_event(&other)
        })
        .unwrap();
        let all = db
            .atomically(|repo| repo.find_events(&EventQuery::for_user("u")))
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn update_and_delete() {
        let db = CalendarDb::open_memory().unwrap();
        let mut event = wash("u", at(7, 9));
        db.atomically(|repo| repo.create_event(&event)).unwrap();

        event.status = EventStatus::Rescheduled { previous_start: event.start_time };
        event.start_time = at(8, 9);
        event.end_time = at(8, 11);
        assert!(db.atomically(|repo| repo.update_event(&event)).unwrap());

        let loaded = db.atomically(|repo| repo.get_event(&event.id)).unwrap().unwrap();
        assert_eq!(loaded.status.kind(), EventStatusKind::Rescheduled);
        assert_eq!(loaded.start_time, at(8, 9));

        let removed = db
            .atomically(|repo| repo.delete_events(&[event.id.clone(), "missing".to_string()]))
            .unwrap();
        assert_eq!(removed, 1);
    }
}
