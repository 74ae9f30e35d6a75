use chrono::NaiveDate;
use stay_engine::{deduplicate, Reservation, Source};

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

fn res(uid: &str, source: Source, summary: &str, description: &str) -> Reservation {
    Reservation::new(uid, source, d(1, 10), d(1, 15))
        .unwrap()
        .with_summary(summary)
        .with_description(description)
}

#[test]
fn longest_description_survives() {
    let out = deduplicate(vec![
        res("a", Source::Airbnb, "Reserved", "Guest A"),
        res("b", Source::Booking, "Reserved", "Guest A, 2 adults"),
    ]);
    assert_eq!(out.removed, 1);
    assert_eq!(out.reservations.len(), 1);
    assert_eq!(out.reservations[0].uid(), "b");
}

#[test]
fn ties_prefer_earlier_source_regardless_of_order() {
    let forward = deduplicate(vec![
        res("v", Source::Vrbo, "Reserved", "same"),
        res("a", Source::Airbnb, "Reserved", "same"),
    ]);
    let backward = deduplicate(vec![
        res("a", Source::Airbnb, "Reserved", "same"),
        res("v", Source::Vrbo, "Reserved", "same"),
    ]);
    assert_eq!(forward, backward);
    assert_eq!(forward.reservations[0].uid(), "a");
}

#[test]
fn same_source_tie_goes_to_smaller_uid() {
    let out = deduplicate(vec![
        res("z", Source::Airbnb, "Reserved", ""),
        res("m", Source::Airbnb, "Reserved", ""),
    ]);
    assert_eq!(out.reservations[0].uid(), "m");
}

#[test]
fn summary_is_part_of_the_key() {
    let out = deduplicate(vec![
        res("a", Source::Airbnb, "Reserved", ""),
        res("b", Source::Booking, "reserved", ""),
    ]);
    assert_eq!(out.removed, 0);
    assert_eq!(out.reservations.len(), 2);
}

#[test]
fn different_dates_are_kept() {
    let other = Reservation::new("c", Source::Airbnb, d(1, 11), d(1, 15))
        .unwrap()
        .with_summary("Reserved");
    let out = deduplicate(vec![res("a", Source::Airbnb, "Reserved", ""), other]);
    assert_eq!(out.removed, 0);
}

#[test]
fn empty_input() {
    let out = deduplicate(Vec::new());
    assert_eq!(out.removed, 0);
    assert!(out.reservations.is_empty());
}

#[test]
fn guest_a_reported_twice_keeps_full_itinerary() {
    let out = deduplicate(vec![
        res("airbnb-1", Source::Airbnb, "Guest A", ""),
        res("booking-7", Source::Booking, "Guest A", "Full itinerary text"),
    ]);
    assert_eq!(out.removed, 1);
    assert_eq!(out.reservations[0].description(), "Full itinerary text");
}
