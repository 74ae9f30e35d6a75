//! Calendar emission: run-length encoding, labels, determinism.

use chrono::NaiveDate;
use stay_engine::{
    emit_import, emit_master, expand_buffers, night_runs, resolve, CalendarMeta, Directive,
    DirectiveKind, NightCategory, Reservation, ResolutionWindow, Source,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

fn meta() -> CalendarMeta {
    CalendarMeta::new("Beach House", "Europe/Lisbon")
}

fn window() -> ResolutionWindow {
    ResolutionWindow::new(d(1, 1), d(3, 1)).unwrap()
}

fn stay(uid: &str, start: NaiveDate, end: NaiveDate) -> Reservation {
    Reservation::new(uid, Source::Booking, start, end)
        .unwrap()
        .with_summary("Guest")
        .with_description("Two adults; late arrival")
}

fn event_count(payload: &str) -> usize {
    payload.matches("BEGIN:VEVENT").count()
}

// ── Master ──────────────────────────────────────────────────────────────────

#[test]
fn runs_collapse_consecutive_nights() {
    let reservations = vec![stay("r1", d(1, 10), d(1, 15))];
    let buffers = expand_buffers(&reservations, 1, 1);
    let resolved = resolve(&reservations, &buffers, &[], window());

    let runs = night_runs(&resolved.nights);
    let shape: Vec<_> = runs.iter().map(|r| (r.start, r.end, r.category)).collect();
    assert_eq!(
        shape,
        vec![
            (d(1, 9), d(1, 10), NightCategory::PrepTime),
            (d(1, 10), d(1, 15), NightCategory::Reserved),
            (d(1, 15), d(1, 16), NightCategory::PrepTime),
        ]
    );
}

#[test]
fn adjacent_runs_with_different_origins_stay_separate() {
    let reservations = vec![stay("r1", d(1, 10), d(1, 12)), stay("r2", d(1, 12), d(1, 14))];
    let resolved = resolve(&reservations, &[], &[], window());
    let runs = night_runs(&resolved.nights);
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].origin_uid.as_deref(), Some("r1"));
    assert_eq!(runs[1].origin_uid.as_deref(), Some("r2"));
}

#[test]
fn master_events_carry_labels_and_all_day_dates() {
    let reservations = vec![stay("r1", d(1, 10), d(1, 15))];
    let buffers = expand_buffers(&reservations, 1, 1);
    let directives =
        vec![Directive::new("b1", DirectiveKind::Block, d(2, 1), d(2, 3), "Owner visit").unwrap()];
    let resolved = resolve(&reservations, &buffers, &directives, window());
    let emitted = emit_master(&resolved.nights, &meta()).unwrap();
    let p = &emitted.payload;

    assert_eq!(emitted.events, 4);
    assert_eq!(event_count(p), 4);
    assert!(p.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(p.ends_with("END:VCALENDAR\r\n"));
    assert!(p.contains("X-WR-CALNAME:Beach House\r\n"));
    assert!(p.contains("UID:r1-reservation-20260110\r\n"));
    assert!(p.contains("DTSTART;VALUE=DATE:20260110\r\nDTEND;VALUE=DATE:20260115\r\n"));
    assert!(p.contains("UID:r1-tp-before-prep-time-20260109\r\n"));
    assert!(p.contains("UID:b1-manual-block-20260201\r\n"));
    assert!(p.contains("CATEGORIES:MANUAL-BLOCK\r\n"));
    assert!(p.contains("DESCRIPTION:Owner visit\r\n"));
    assert!(p.contains("DESCRIPTION:BOOKING. Check-in: 2026-01-10. Check-out: 2026-01-15\r\n"));
}

#[test]
fn empty_calendar_still_has_a_container() {
    let resolved = resolve(&[], &[], &[], window());
    let emitted = emit_master(&resolved.nights, &meta()).unwrap();
    assert_eq!(emitted.events, 0);
    assert!(emitted.payload.contains("BEGIN:VCALENDAR"));
    assert_eq!(event_count(&emitted.payload), 0);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let reservations = vec![stay("b", d(1, 20), d(1, 25)), stay("a", d(1, 10), d(1, 15))];
    let buffers = expand_buffers(&reservations, 2, 1);
    let first = emit_master(&resolve(&reservations, &buffers, &[], window()).nights, &meta()).unwrap();

    let mut reversed = reservations.clone();
    reversed.reverse();
    let buffers = expand_buffers(&reversed, 2, 1);
    let second = emit_master(&resolve(&reversed, &buffers, &[], window()).nights, &meta()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn every_physical_line_respects_the_fold_limit() {
    let long = "x".repeat(300);
    let reservations = vec![stay("r1", d(1, 10), d(1, 15)).with_description(long)];
    let imported = emit_import(&reservations, &[], &meta()).unwrap();
    assert!(imported.payload.split("\r\n").all(|line| line.len() <= 75));
}

// ── Import ──────────────────────────────────────────────────────────────────

#[test]
fn import_keeps_reservation_fields_and_buffers() {
    let reservations = vec![stay("r1", d(1, 10), d(1, 15)).with_location("Lisbon")];
    let buffers = expand_buffers(&reservations, 1, 1);
    let emitted = emit_import(&reservations, &buffers, &meta()).unwrap();
    let p = &emitted.payload;

    assert_eq!(emitted.events, 3);
    assert!(p.contains("X-WR-CALNAME:Beach House (import)\r\n"));
    assert!(p.contains("SUMMARY:Guest\r\n"));
    assert!(p.contains("DESCRIPTION:Two adults\\; late arrival\r\n"));
    assert!(p.contains("LOCATION:Lisbon\r\n"));
    assert!(p.contains("X-STAY-SOURCE:BOOKING\r\n"));
    assert!(p.contains("UID:r1-tp-before\r\n"));
    assert!(p.contains("UID:r1-tp-after\r\n"));
    assert!(p.contains("SUMMARY:Prep time after r1\r\n"));
}
