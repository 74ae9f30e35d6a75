use chrono::NaiveDate;
use chrono_tz::Tz;
use stay_engine::{CalendarMeta, DirectiveBook, DirectiveKind, SyncError};

fn lisbon() -> Tz {
    "Europe/Lisbon".parse().unwrap()
}

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

fn meta() -> CalendarMeta {
    CalendarMeta::new("Beach House", "Europe/Lisbon")
}

#[test]
fn block_adds_single_night_directives() {
    let mut book = DirectiveBook::empty(lisbon());
    assert_eq!(book.block(&[d(3, 1), d(3, 2)]), 2);
    assert_eq!(book.len(), 2);

    let parsed = book.directives();
    assert_eq!(parsed.directives.len(), 2);
    let first = &parsed.directives[0];
    assert_eq!(first.uid(), "manual-block-20260301");
    assert_eq!(first.kind(), DirectiveKind::Block);
    assert_eq!((first.start(), first.end()), (d(3, 1), d(3, 2)));
    assert_eq!(first.description(), "Blocked manually");
}

#[test]
fn unblock_replaces_block_on_the_same_night() {
    let mut book = DirectiveBook::empty(lisbon());
    book.block(&[d(3, 1)]);
    book.unblock(&[d(3, 1)]);
    assert_eq!(book.len(), 1);
    let parsed = book.directives();
    assert_eq!(parsed.directives[0].kind(), DirectiveKind::Unblock);
    assert_eq!(parsed.directives[0].uid(), "manual-remove-20260301");
}

#[test]
fn repeated_block_is_idempotent() {
    let mut book = DirectiveBook::empty(lisbon());
    book.block(&[d(3, 1)]);
    book.block(&[d(3, 1)]);
    assert_eq!(book.len(), 1);
}

#[test]
fn clear_removes_directives_starting_on_a_date() {
    let mut book = DirectiveBook::empty(lisbon());
    book.block(&[d(3, 1), d(3, 2)]);
    book.unblock(&[d(3, 5)]);
    assert_eq!(book.clear(&[d(3, 2), d(3, 5), d(4, 1)]), 2);
    assert_eq!(book.len(), 1);
}

#[test]
fn payload_survives_a_reload() {
    let mut book = DirectiveBook::empty(lisbon());
    book.block(&[d(3, 1)]);
    book.unblock(&[d(3, 9)]);
    let payload = book.to_payload(&meta()).unwrap();
    assert!(payload.contains("X-WR-CALNAME:Beach House (manual)\r\n"));

    let reloaded = DirectiveBook::load(Some(payload.as_bytes()), lisbon()).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.to_payload(&meta()).unwrap(), payload);
}

#[test]
fn multi_night_entries_are_kept_by_single_night_edits() {
    let existing = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:long\r\nDTSTART;VALUE=DATE:20260301\r\nDTEND;VALUE=DATE:20260310\r\nCATEGORIES:MANUAL-BLOCK\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let mut book = DirectiveBook::load(Some(existing.as_bytes()), lisbon()).unwrap();
    book.unblock(&[d(3, 1)]);
    assert_eq!(book.len(), 2);
}

#[test]
fn unreadable_payload_is_an_error() {
    let err = DirectiveBook::load(Some(b"garbage"), lisbon()).unwrap_err();
    assert!(matches!(err, SyncError::Parse { .. }));
}

#[test]
fn missing_payload_is_an_empty_book() {
    let book = DirectiveBook::load(None, lisbon()).unwrap();
    assert!(book.is_empty());
}
