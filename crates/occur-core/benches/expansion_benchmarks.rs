use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use occur_core::models::{BaseEvent, EventId, NewEventData, RecurrenceKind, Window};
use occur_core::recurrence::{Expander, SeekStrategy};
use occur_core::service::RangeQueryService;

fn create_test_event(id: &str, start: DateTime<Utc>, recurrence: RecurrenceKind) -> BaseEvent {
    BaseEvent::new(NewEventData {
        id: EventId::new(id),
        start_date: start,
        end_date: start + Duration::minutes(45),
        recurrence,
        ..Default::default()
    })
    .unwrap()
}

fn query_window() -> Window {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    Window::new(start, start + Duration::days(31))
}

fn bench_seek_strategies(c: &mut Criterion) {
    let window = query_window();
    let mut group = c.benchmark_group("seek_strategy");

    for years in [1, 10, 50].iter() {
        let anchor = window.start - Duration::days(365 * years);
        let event = create_test_event("daily", anchor, RecurrenceKind::Daily);

        for seek in [SeekStrategy::Jump, SeekStrategy::Walk] {
            let expander = Expander::default().with_seek(seek);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", seek).to_lowercase(), years),
                years,
                |b, _| b.iter(|| expander.expand(black_box(&event), black_box(&window)).count()),
            );
        }
    }
    group.finish();
}

fn bench_query_many_events(c: &mut Criterion) {
    let window = query_window();
    let service = RangeQueryService::default();
    let kinds = [
        RecurrenceKind::None,
        RecurrenceKind::Daily,
        RecurrenceKind::Weekly,
        RecurrenceKind::Monthly,
        RecurrenceKind::Yearly,
    ];

    let mut group = c.benchmark_group("range_query");

    for count in [10, 100, 1000].iter() {
        let events: Vec<BaseEvent> = (0..*count)
            .map(|i| {
                let start = window.start - Duration::days(i as i64 * 7) + Duration::hours(i as i64 % 24);
                create_test_event(&format!("event-{i}"), start, kinds[i % kinds.len()])
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("events", count), count, |b, _| {
            b.iter(|| service.query(black_box(&events), black_box(&window)))
        });
    }
    group.finish();
}

fn bench_upcoming(c: &mut Criterion) {
    let service = RangeQueryService::default();
    let anchor = Utc.with_ymd_and_hms(2000, 1, 31, 9, 0, 0).unwrap();
    let events = vec![
        create_test_event("monthly", anchor, RecurrenceKind::Monthly),
        create_test_event("weekly", anchor, RecurrenceKind::Weekly),
    ];
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    c.bench_function("upcoming_after_long_series", |b| {
        b.iter(|| service.upcoming(black_box(&events), black_box(from), 20))
    });
}

criterion_group!(benches, bench_seek_strategies, bench_query_many_events, bench_upcoming);
criterion_main!(benches);
