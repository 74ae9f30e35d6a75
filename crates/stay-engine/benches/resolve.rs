use std::hint::black_box;

use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stay_engine::{
    emit_master, expand_buffers, reconcile_payloads, resolve, CalendarMeta, Directive,
    DirectiveKind, FeedPayload, Reservation, ResolutionWindow, RunInputs, Source, SyncConfig,
};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

/// Back-to-back four-night stays with a one-night gap, spread over the window.
fn reservations(count: usize) -> Vec<Reservation> {
    (0..count)
        .map(|i| {
            let start = base() + Duration::days(i as i64 * 5 - 300);
            Reservation::new(format!("r{i}"), Source::Airbnb, start, start + Duration::days(4))
                .unwrap()
                .with_summary("Reserved")
        })
        .collect()
}

fn directives(count: usize) -> Vec<Directive> {
    (0..count)
        .map(|i| {
            let start = base() + Duration::days(i as i64 * 13 - 250);
            let kind = if i % 2 == 0 { DirectiveKind::Block } else { DirectiveKind::Unblock };
            Directive::new(format!("d{i}"), kind, start, start + Duration::days(1), "").unwrap()
        })
        .collect()
}

fn feed_payload(count: usize) -> Vec<u8> {
    let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
    for r in reservations(count) {
        out.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:{}\r\nDTSTART;VALUE=DATE:{}\r\nDTEND;VALUE=DATE:{}\r\nSUMMARY:Reserved\r\nEND:VEVENT\r\n",
            r.uid(),
            r.start().format("%Y%m%d"),
            r.end().format("%Y%m%d"),
        ));
    }
    out.push_str("END:VCALENDAR\r\n");
    out.into_bytes()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let window = ResolutionWindow::around(base(), 365, 730).unwrap();

    for count in [10usize, 100, 200] {
        let stays = reservations(count);
        let buffers = expand_buffers(&stays, 1, 1);
        let edits = directives(count / 2);
        group.bench_with_input(BenchmarkId::new("reservations", count), &count, |b, _| {
            b.iter(|| resolve(black_box(&stays), black_box(&buffers), black_box(&edits), window));
        });
    }

    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    let window = ResolutionWindow::around(base(), 365, 730).unwrap();
    let stays = reservations(200);
    let buffers = expand_buffers(&stays, 1, 1);
    let resolved = resolve(&stays, &buffers, &[], window);
    let meta = CalendarMeta::new("Bench", "Europe/Lisbon");

    group.bench_function("master_200_stays", |b| {
        b.iter(|| emit_master(black_box(&resolved.nights), &meta).unwrap());
    });

    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let inputs = RunInputs {
        feeds: vec![
            FeedPayload {
                id: "airbnb".into(),
                source: Source::Airbnb,
                bytes: feed_payload(200),
            },
            FeedPayload {
                id: "booking".into(),
                source: Source::Booking,
                bytes: feed_payload(200),
            },
        ],
        ..RunInputs::default()
    };
    let config = SyncConfig::default();

    group.bench_function("two_feeds_200_stays", |b| {
        b.iter(|| reconcile_payloads(black_box(&inputs), &config, base()).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_emit, bench_full_run);
criterion_main!(benches);
