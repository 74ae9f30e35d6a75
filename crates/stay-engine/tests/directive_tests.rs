use chrono::NaiveDate;
use chrono_tz::Tz;
use stay_engine::{parse_directives, DirectiveKind, SyncError};

fn lisbon() -> Tz {
    "Europe/Lisbon".parse().unwrap()
}

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

fn manual(body: &str) -> Vec<u8> {
    format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{}\r\nEND:VCALENDAR\r\n", body.replace('\n', "\r\n"))
        .into_bytes()
}

#[test]
fn missing_payload_means_no_directives() {
    let parsed = parse_directives(None, lisbon());
    assert!(parsed.directives.is_empty());
    assert!(parsed.error.is_none());
}

#[test]
fn block_and_unblock_labels() {
    let bytes = manual(
        "BEGIN:VEVENT\nUID:b1\nDTSTART;VALUE=DATE:20260301\nDTEND;VALUE=DATE:20260303\nCATEGORIES:MANUAL-BLOCK\nDESCRIPTION:Owner stay\nEND:VEVENT\n\
         BEGIN:VEVENT\nUID:u1\nDTSTART;VALUE=DATE:20260309\nDTEND;VALUE=DATE:20260310\nCATEGORIES:MANUAL-REMOVE\nSUMMARY:Early check-in\nEND:VEVENT",
    );
    let parsed = parse_directives(Some(&bytes), lisbon());
    assert_eq!(parsed.directives.len(), 2);

    let block = &parsed.directives[0];
    assert_eq!(block.kind(), DirectiveKind::Block);
    assert_eq!((block.start(), block.end()), (d(3, 1), d(3, 3)));
    assert_eq!(block.description(), "Owner stay");

    let unblock = &parsed.directives[1];
    assert_eq!(unblock.kind(), DirectiveKind::Unblock);
    assert_eq!(unblock.description(), "Early check-in");
}

#[test]
fn unlabelled_and_malformed_entries_are_skipped() {
    let bytes = manual(
        "BEGIN:VEVENT\nUID:plain\nDTSTART;VALUE=DATE:20260301\nDTEND;VALUE=DATE:20260303\nEND:VEVENT\n\
         BEGIN:VEVENT\nUID:reservation\nDTSTART;VALUE=DATE:20260301\nDTEND;VALUE=DATE:20260303\nCATEGORIES:RESERVATION\nEND:VEVENT\n\
         BEGIN:VEVENT\nUID:reversed\nDTSTART;VALUE=DATE:20260305\nDTEND;VALUE=DATE:20260301\nCATEGORIES:MANUAL-BLOCK\nEND:VEVENT",
    );
    let parsed = parse_directives(Some(&bytes), lisbon());
    assert!(parsed.directives.is_empty());
    assert_eq!(parsed.skipped, 3);
    assert!(parsed.error.is_none());
}

#[test]
fn missing_uid_is_derived_from_label_and_date() {
    let bytes = manual(
        "BEGIN:VEVENT\nDTSTART;VALUE=DATE:20260301\nCATEGORIES:MANUAL-BLOCK\nEND:VEVENT",
    );
    let parsed = parse_directives(Some(&bytes), lisbon());
    assert_eq!(parsed.directives[0].uid(), "manual-block-20260301");
    assert_eq!(parsed.directives[0].end(), d(3, 2));
}

#[test]
fn unreadable_payload_is_reported() {
    let parsed = parse_directives(Some(b"not a calendar"), lisbon());
    assert!(matches!(parsed.error, Some(SyncError::Parse { .. })));
    assert!(parsed.directives.is_empty());
}

#[test]
fn out_of_range_duration_is_skipped() {
    let bytes = manual(
        "BEGIN:VEVENT\nUID:huge\nDTSTART;VALUE=DATE:20260301\nDURATION:P999999999999999D\nCATEGORIES:MANUAL-BLOCK\nEND:VEVENT\n\
         BEGIN:VEVENT\nUID:ok\nDTSTART;VALUE=DATE:20260305\nDURATION:P1D\nCATEGORIES:MANUAL-BLOCK\nEND:VEVENT",
    );
    let parsed = parse_directives(Some(&bytes), lisbon());
    assert!(parsed.error.is_none());
    assert_eq!(parsed.skipped, 1);
    assert_eq!(parsed.directives.len(), 1);
    assert_eq!((parsed.directives[0].start(), parsed.directives[0].end()), (d(3, 5), d(3, 6)));
}
