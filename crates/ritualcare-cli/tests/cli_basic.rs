//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a temporary data directory.

mod common;

use common::{parse_json, run_cli_failure, run_cli_success, write_profile, COILY_PROFILE};

#[test]
fn test_analyze_reports_capacity() {
    let home = tempfile::tempdir().unwrap();
    let profile = write_profile(home.path(), "coily.json", COILY_PROFILE);

    let json = parse_json(&run_cli_success(home.path(), &["analyze", "--profile", &profile]));
    assert!(json["health_score"]["overall"].as_u64().unwrap() <= 100);
    assert!(json["weekly_load_capacity"]["max_heavy_days"].is_number());
}

#[test]
fn test_rituals_are_listed() {
    let home = tempfile::tempdir().unwrap();
    let profile = write_profile(home.path(), "coily.json", COILY_PROFILE);

    let json = parse_json(&run_cli_success(home.path(), &["rituals", "--profile", &profile]));
    let recs = json.as_array().unwrap();
    assert!(!recs.is_empty());
    assert!(recs[0]["template"]["id"].is_string());
}

#[test]
fn test_plan_has_seven_days() {
    let home = tempfile::tempdir().unwrap();
    let profile = write_profile(home.path(), "coily.json", COILY_PROFILE);

    let json = parse_json(&run_cli_success(home.path(), &["plan", "--profile", &profile]));
    assert_eq!(json["days"].as_array().unwrap().len(), 7);
}

#[test]
fn test_rest_for_wash_day() {
    let home = tempfile::tempdir().unwrap();
    let profile = write_profile(home.path(), "coily.json", COILY_PROFILE);

    let json = parse_json(&run_cli_success(
        home.path(),
        &["rest", "--profile", &profile, "--activity", "wash-day"],
    ));
    assert!(
        json["recommended_hours"].as_u64().unwrap() >= json["required_hours"].as_u64().unwrap()
    );
}

#[test]
fn test_unknown_activity_fails() {
    let home = tempfile::tempdir().unwrap();
    let profile = write_profile(home.path(), "coily.json", COILY_PROFILE);

    let (_, stderr, _) = run_cli_failure(
        home.path(),
        &["rest", "--profile", &profile, "--activity", "nap"],
    );
    assert!(stderr.contains("unknown activity type"));
}

#[test]
fn test_calendar_generate_then_complete() {
    let home = tempfile::tempdir().unwrap();
    let profile = write_profile(home.path(), "coily.json", COILY_PROFILE);

    let generated = parse_json(&run_cli_success(
        home.path(),
        &[
            "calendar", "generate", "--user", "user-1", "--profile", &profile,
            "--start", "2030-03-03", "--weeks", "1",
        ],
    ));
    assert!(generated["events_created"].as_u64().unwrap() > 0);

    let upcoming = parse_json(&run_cli_success(
        home.path(),
        &["calendar", "upcoming", "--user", "user-1", "--profile", &profile],
    ));
    assert!(upcoming["total_upcoming"].is_number());

    let summary = parse_json(&run_cli_success(
        home.path(),
        &["calendar", "summary", "--user", "user-1", "--profile", &profile],
    ));
    let event_id = summary["next_ritual"]["id"].as_str().unwrap().to_string();

    let done = parse_json(&run_cli_success(
        home.path(),
        &["calendar", "complete", "--user", "user-1", "--event", &event_id, "--quality", "4"],
    ));
    assert_eq!(done["status"]["state"], "COMPLETED");

    let (_, stderr, _) = run_cli_failure(
        home.path(),
        &["calendar", "skip", "--user", "user-1", "--event", &event_id],
    );
    assert!(stderr.contains("cannot"));
}

#[test]
fn test_calendar_rejects_bad_event_id() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, _) = run_cli_failure(
        home.path(),
        &["calendar", "complete", "--user", "user-1", "--event", "not-a-uuid"],
    );
    assert!(stderr.contains("invalid"));
}

#[test]
fn test_regenerate_without_profile_fails() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().to_string_lossy().into_owned();
    let (_, stderr, _) = run_cli_failure(
        home.path(),
        &["calendar", "regenerate", "--user", "ghost", "--profile-dir", &dir],
    );
    assert!(stderr.contains("not found"));
}

#[test]
fn test_config_roundtrip() {
    let home = tempfile::tempdir().unwrap();

    let weeks = run_cli_success(home.path(), &["config", "get", "generation.weeks"]);
    assert_eq!(weeks.trim(), "2");

    run_cli_success(home.path(), &["config", "set", "generation.weeks", "3"]);
    let weeks = run_cli_success(home.path(), &["config", "get", "generation.weeks"]);
    assert_eq!(weeks.trim(), "3");

    run_cli_failure(home.path(), &["config", "set", "time_of_day.morning_hour", "31"]);
    run_cli_failure(home.path(), &["config", "get", "no.such.key"]);

    let list = run_cli_success(home.path(), &["config", "list"]);
    assert!(list.contains("upcoming.horizon_days = 14"));

    run_cli_success(home.path(), &["config", "reset"]);
    let weeks = run_cli_success(home.path(), &["config", "get", "generation.weeks"]);
    assert_eq!(weeks.trim(), "2");
}
