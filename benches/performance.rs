use chrono::{Days, Local, NaiveDate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use intake_desk::records::{Record, RecordKind};
use intake_desk::search::RecordFilter;
use intake_desk::store::Datastore;
use intake_desk::{export, stats};
use serde_json::json;
use std::hint::black_box;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const COURSES: &[&str] = &["IELTS", "TOEFL", "GRE", "GMAT", "SAT"];
const COUNTRIES: &[&str] = &["UK", "USA", "Canada, Australia", "", "Germany"];
const STATUSES: &[&str] = &["pending", "completed", "cancelled"];

fn dataset(size: usize, today: NaiveDate) -> Vec<Record> {
    (0..size)
        .map(|i| {
            let day = today - Days::new((i % 400) as u64);
            serde_json::from_value(json!({
                "id": 1_700_000_000_000i64 + i as i64,
                "submitTime": format!("{}T10:{:02}:00", day, i % 60),
                "name": format!("Student {}", i),
                "phone": format!("138{:08}", i),
                "course": COURSES[i % COURSES.len()],
                "target_country": COUNTRIES[i % COUNTRIES.len()],
                "status": STATUSES[i % STATUSES.len()],
            }))
            .unwrap()
        })
        .collect()
}

fn bench_summarize(c: &mut Criterion) {
    let today = Local::now().date_naive();
    let mut group = c.benchmark_group("summarize");

    for size in [100, 1_000, 10_000] {
        let records = dataset(size, today);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| black_box(stats::summarize(records, &[], today)));
        });
    }
    group.finish();
}

fn bench_trends(c: &mut Criterion) {
    let today = Local::now().date_naive();
    let records = dataset(10_000, today);

    for days in [7, 30, 366] {
        c.bench_function(&format!("trends_{}_days", days), |b| {
            b.iter(|| black_box(stats::trends(&records, days, today)));
        });
    }
}

fn bench_search_and_export(c: &mut Criterion) {
    let today = Local::now().date_naive();
    let records = dataset(10_000, today);
    let filter = RecordFilter::from_raw(Some("student 99"), Some("pending"), None, None, None)
        .unwrap();

    c.bench_function("search_10000", |b| {
        b.iter(|| black_box(filter.apply(records.clone())));
    });

    c.bench_function("export_csv_10000", |b| {
        b.iter(|| black_box(export::to_csv(RecordKind::Registration, &records)));
    });
}

fn bench_store_append(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let today = Local::now().date_naive();

    c.bench_function("append_to_1000", |b| {
        b.to_async(&rt).iter(|| async {
            let temp_dir = TempDir::new().unwrap();
            let store = Datastore::open(temp_dir.path()).await.unwrap();
            store
                .registrations()
                .import(dataset(1_000, today), true)
                .await
                .unwrap();

            let record = dataset(1, today).remove(0);
            black_box(store.registrations().append(record).await.unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_summarize,
    bench_trends,
    bench_search_and_export,
    bench_store_append
);
criterion_main!(benches);
