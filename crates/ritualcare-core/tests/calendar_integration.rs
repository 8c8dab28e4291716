use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use ritualcare_core::calendar::{
    CalendarStore, EventQuery, EventRepository, EventStatusKind, MemoryCalendarStore,
};
use ritualcare_core::error::DatabaseError;
use ritualcare_core::profile::{Level, TextureClass};
use ritualcare_core::rituals::ActivityType;
use ritualcare_core::{
    CalendarDb, CalendarEvent, CalendarMaterializer, EventCategory, EventStatus,
    GenerationOptions, OperationFailure, Profile,
};

// 2026-03-01 is a Sunday.
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn curly_profile() -> Profile {
    Profile {
        texture_class: Some(TextureClass::Curly),
        porosity_level: Level::High,
        scalp_sensitivity: Level::High,
        ..Profile::default()
    }
}

#[test]
fn sqlite_calendar_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.db");

    let created = {
        let db = CalendarDb::open_at(&path).unwrap();
        let materializer = CalendarMaterializer::new(db).with_clock(fixed_now);
        let result = materializer
            .generate("user-1", &curly_profile(), GenerationOptions::new(start_date()))
            .into_result()
            .unwrap();
        assert!(result.events_created > 0);
        assert_eq!(result.events_skipped, 0);
        result.events_created
    };

    let db = CalendarDb::open_at(&path).unwrap();
    let all = db
        .atomically(|repo| repo.find_events(&EventQuery::for_user("user-1")))
        .unwrap();
    assert_eq!(all.len() as u32, created);
    assert!(all.windows(2).all(|w| w[0].start_time <= w[1].start_time));

    let materializer = CalendarMaterializer::new(db).with_clock(fixed_now);
    let ritual = all.iter().find(|e| e.is_ritual()).unwrap();
    let done = materializer
        .complete("user-1", &ritual.id, Some(4))
        .into_result()
        .unwrap();
    assert_eq!(done.status.kind(), EventStatusKind::Completed);

    let reloaded = materializer
        .store()
        .atomically(|repo| repo.get_event(&ritual.id))
        .unwrap()
        .unwrap();
    assert!(matches!(reloaded.status, EventStatus::Completed { quality: Some(4), .. }));
}

#[test]
fn sqlite_and_memory_stores_agree() {
    let memory = CalendarMaterializer::new(MemoryCalendarStore::new()).with_clock(fixed_now);
    let sqlite =
        CalendarMaterializer::new(CalendarDb::open_memory().unwrap()).with_clock(fixed_now);

    let options = GenerationOptions {
        weeks_to_generate: 3,
        ..GenerationOptions::new(start_date())
    };
    let a = memory
        .generate("user-1", &curly_profile(), options)
        .into_result()
        .unwrap();
    let b = sqlite
        .generate("user-1", &curly_profile(), options)
        .into_result()
        .unwrap();
    assert_eq!(a.events_created, b.events_created);
    assert_eq!(a.next_scheduled_date, b.next_scheduled_date);
    assert_eq!(a.weekly_load_score, b.weekly_load_score);

    let upcoming_a = memory.list_upcoming("user-1", &curly_profile()).into_result().unwrap();
    let upcoming_b = sqlite.list_upcoming("user-1", &curly_profile()).into_result().unwrap();
    assert_eq!(upcoming_a.total_upcoming, upcoming_b.total_upcoming);
    assert_eq!(upcoming_a.next_wash_day, upcoming_b.next_wash_day);
}

#[test]
fn missing_event_is_a_failure_result() {
    let materializer = CalendarMaterializer::new(CalendarDb::open_memory().unwrap());
    let id = uuid::Uuid::new_v4().to_string();

    let result = materializer.complete("user-1", &id, None);
    assert!(!result.success);
    assert!(result.data.is_none());
    assert!(matches!(result.failure, Some(OperationFailure::NotFound { .. })));

    let result = materializer.skip("user-1", &id, Some("busy".into()));
    assert!(!result.success);

    let result = materializer.reschedule("user-1", &id, fixed_now(), &Profile::default());
    assert!(!result.success);
}

#[test]
fn weeks_outside_range_are_clamped() {
    let materializer = CalendarMaterializer::new(MemoryCalendarStore::new()).with_clock(fixed_now);
    let options = GenerationOptions {
        weeks_to_generate: 12,
        include_education_prompts: false,
        include_rest_buffers: false,
        ..GenerationOptions::new(start_date())
    };
    materializer.generate("user-1", &curly_profile(), options);

    let last = materializer
        .store()
        .snapshot()
        .iter()
        .map(|e| e.start_time)
        .max()
        .unwrap();
    let limit = start_date().and_hms_opt(0, 0, 0).unwrap().and_utc() + Duration::weeks(4);
    assert!(last < limit);

    let washes = materializer
        .store()
        .snapshot()
        .into_iter()
        .filter(|e| e.activity_type == ActivityType::WashDay)
        .count();
    assert_eq!(washes, 4);
}

#[test]
fn rest_buffers_can_be_disabled() {
    let materializer = CalendarMaterializer::new(MemoryCalendarStore::new()).with_clock(fixed_now);
    let options = GenerationOptions {
        include_rest_buffers: false,
        ..GenerationOptions::new(start_date())
    };
    materializer.generate("user-1", &curly_profile(), options);
    assert!(materializer
        .store()
        .snapshot()
        .iter()
        .all(|e| e.category != EventCategory::RestBuffer));
}

#[test]
fn existing_events_of_other_users_never_conflict() {
    let mut foreign = CalendarEvent::new(
        "someone-else",
        EventCategory::HairRitual,
        ActivityType::WashDay,
        "Wash day",
        Utc.with_ymd_and_hms(2026, 3, 7, 9, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap(),
        ritualcare_core::rituals::LoadLevel::Heavy,
    );
    foreign.ritual_id = Some("wash-day-full".into());
    let store = MemoryCalendarStore::with_events(vec![foreign]);
    let materializer = CalendarMaterializer::new(store).with_clock(fixed_now);
    let result = materializer
        .generate("user-1", &curly_profile(), GenerationOptions::new(start_date()))
        .into_result()
        .unwrap();
    assert!(result.conflicts.is_empty());
}

/// Store whose repository fails every `fail_every`-th insert.
struct FlakyStore {
    inner: MemoryCalendarStore,
    fail_every: usize,
    inserts: AtomicUsize,
    failures: AtomicUsize,
}

impl FlakyStore {
    fn new(fail_every: usize) -> Self {
        Self {
            inner: MemoryCalendarStore::new(),
            fail_every,
            inserts: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }
}

struct FlakyRepository<'a> {
    inner: &'a mut dyn EventRepository,
    store: &'a FlakyStore,
}

impl EventRepository for FlakyRepository<'_> {
    fn find_events(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, DatabaseError> {
        self.inner.find_events(query)
    }

    fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>, DatabaseError> {
        self.inner.get_event(id)
    }

    fn create_event(&mut self, event: &CalendarEvent) -> Result<(), DatabaseError> {
        let n = self.store.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if n % self.store.fail_every == 0 {
            self.store.failures.fetch_add(1, Ordering::SeqCst);
            return Err(DatabaseError::QueryFailed("disk full".into()));
        }
        self.inner.create_event(event)
    }

    fn update_event(&mut self, event: &CalendarEvent) -> Result<bool, DatabaseError> {
        self.inner.update_event(event)
    }

    fn delete_events(&mut self, ids: &[String]) -> Result<usize, DatabaseError> {
        self.inner.delete_events(ids)
    }
}

impl CalendarStore for FlakyStore {
    fn atomically<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut dyn EventRepository) -> Result<T, DatabaseError>,
    {
        self.inner.atomically(|repo| {
            let mut flaky = FlakyRepository { inner: repo, store: self };
            f(&mut flaky)
        })
    }
}

#[test]
fn persistence_failures_are_counted_not_fatal() {
    let materializer = CalendarMaterializer::new(FlakyStore::new(3)).with_clock(fixed_now);
    let result =
        materializer.generate("user-1", &curly_profile(), GenerationOptions::new(start_date()));
    assert!(result.success);
    let result = result.data.unwrap();

    let store = materializer.store();
    let failures = store.failures.load(Ordering::SeqCst) as u32;
    assert!(failures > 0);
    assert_eq!(result.events_skipped, failures);
    assert_eq!(result.events_created as usize, store.inner.snapshot().len());
    assert_eq!(
        store.inserts.load(Ordering::SeqCst) as u32,
        result.events_created + result.events_skipped
    );
}
