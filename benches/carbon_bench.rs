use carbon_record::{ColumnType, CreateOptions, ListDerivation, Record, RecordKey, Scalar};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

// ─── Test Data ──────────────────────────────────────────────────────────────

/// A user document with every JSON kind, nested three levels deep, plus
/// integer and float arrays that import as columns.
const BENCH_JSON: &str = r#"{
    "id": "user:abc123",
    "name": "Alice",
    "age": 28,
    "score": 99.5,
    "active": true,
    "deleted": false,
    "metadata": null,
    "tags": ["developer", "rust", "database"],
    "count": 1000,
    "profile": {
        "bio": "Software engineer",
        "avatar": "https://example.com/avatar.jpg",
        "settings": {
            "theme": "dark",
            "notifications": true,
            "privacy": {"public": false, "level": 3}
        }
    },
    "history": [
        {"action": "login", "timestamp": 1234567890},
        {"action": "update", "timestamp": 1234567900}
    ],
    "visits": [3, 5, 8, 13, 21, 34, 55, 89],
    "weights": [0.5, 1.5, 2.5, 3.5]
}"#;

const COLUMN_LEN: u64 = 10_000;

fn make_record() -> Record {
    Record::from_json(BENCH_JSON, RecordKey::Unsigned(7)).unwrap()
}

fn make_column_record() -> Record {
    let mut builder = Record::create_begin(&CreateOptions::default()).unwrap();
    {
        let mut ins = builder.inserter().unwrap();
        let mut col = ins
            .insert_column(ColumnType::U64, ListDerivation::UnsortedMultiset, COLUMN_LEN as usize)
            .unwrap();
        for v in 0..COLUMN_LEN {
            col.insert_u64(v).unwrap();
        }
    }
    builder.create_end().unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 1: Creating records
// ═══════════════════════════════════════════════════════════════════════════

fn bench_creating_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("creating_records");

    group.bench_function("from_json", |b| {
        b.iter(|| Record::from_json(black_box(BENCH_JSON), RecordKey::NoKey).unwrap())
    });

    let cbor_val: serde_json::Value = serde_json::from_str(BENCH_JSON).unwrap();
    let cbor = cbor4ii::serde::to_vec(Vec::new(), &cbor_val).unwrap();
    group.bench_function("from_cbor", |b| {
        b.iter(|| Record::from_cbor(black_box(&cbor), RecordKey::NoKey).unwrap())
    });

    let raw = make_record().into_raw_data();
    group.bench_function("from_raw_data", |b| {
        b.iter(|| Record::from_raw_data(black_box(&raw)).unwrap())
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 2: Reading
// ═══════════════════════════════════════════════════════════════════════════

fn bench_reading(c: &mut Criterion) {
    let mut group = c.benchmark_group("reading");
    group.sample_size(500);
    group.measurement_time(std::time::Duration::from_secs(8));

    let record = make_record();

    group.bench_function("traverse outer object", |b| {
        b.iter(|| {
            let mut outer = record.read().unwrap();
            outer.next().unwrap();
            let mut obj = outer.object_value().unwrap();
            let mut n = 0usize;
            while obj.next().unwrap() {
                n += obj.key().unwrap().len();
            }
            black_box(n)
        })
    });

    group.bench_function("find (shallow)", |b| {
        b.iter(|| record.find(black_box("name")).unwrap())
    });

    group.bench_function("find (deep)", |b| {
        b.iter(|| record.find(black_box("profile.settings.privacy.level")).unwrap())
    });

    group.bench_function("to_json", |b| b.iter(|| record.to_json().unwrap()));

    let columns = make_column_record();
    group.bench_function("find column slot", |b| {
        b.iter(|| columns.find(black_box("0.9876")).unwrap())
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 3: Editing
// ═══════════════════════════════════════════════════════════════════════════

fn bench_editing(c: &mut Criterion) {
    let mut group = c.benchmark_group("editing");
    group.sample_size(500);

    let record = make_record();

    // ── in place: same width, no shifting ──
    let mut patched = record.clone();
    group.bench_function("patch u8 in place", |b| {
        b.iter(|| {
            let mut outer = patched.patch().unwrap();
            outer.next().unwrap();
            let mut obj = outer.object_value().unwrap();
            obj.find_key("age").unwrap();
            obj.update_u8(black_box(29)).unwrap();
        })
    });

    group.bench_function("revise update string", |b| {
        b.iter(|| {
            let mut rev = record.revise().unwrap();
            rev.update("name", &Scalar::String(black_box("Alice Liddell")))
                .unwrap();
            rev.end().unwrap()
        })
    });

    group.bench_function("revise remove property", |b| {
        b.iter(|| {
            let mut rev = record.revise().unwrap();
            rev.remove(black_box("profile")).unwrap();
            rev.end().unwrap()
        })
    });

    group.bench_function("compact", |b| {
        b.iter(|| {
            let mut copy = record.clone();
            copy.compact().unwrap();
            copy
        })
    });

    group.finish();
}

// ─── Criterion Main ─────────────────────────────────────────────────────────

criterion_group!(benches, bench_creating_records, bench_reading, bench_editing);
criterion_main!(benches);
