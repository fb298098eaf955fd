//! Import a JSON document, look up a few paths, revise it and print the
//! result.
//!
//! ```text
//! cargo run --example json_roundtrip -- [file.json] [path ...]
//! RUST_LOG=carbon_record=debug cargo run --example json_roundtrip
//! ```

use carbon_record::{Record, RecordKey, Result, Scalar};
use carbon_record::record::commit_to_str;

const SAMPLE_JSON: &str = r#"{
  "id": "user:abc123",
  "name": "Alice",
  "age": 28,
  "profile": { "bio": "Developer", "avatar": "https://..." },
  "visits": [3, 5, 8, 13],
  "created_at": "2024-01-15T10:30:00Z"
}"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,carbon_record=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let text = match args.next() {
        Some(file) => std::fs::read_to_string(&file).map_err(|e| {
            carbon_record::CarbonError::IllegalArgument(format!("{file}: {e}"))
        })?,
        None => SAMPLE_JSON.to_owned(),
    };
    let mut paths: Vec<String> = args.collect();
    if paths.is_empty() {
        paths = ["name", "profile.bio", "visits.2", "missing"]
            .map(String::from)
            .to_vec();
    }

    let record = Record::from_json(&text, RecordKey::Unsigned(1))?;
    println!("encoded:  {} bytes", record.raw_data().len());
    if let Some(commit) = record.commit_hash()? {
        println!("commit:   {}", commit_to_str(commit));
    }
    for path in &paths {
        println!("{path:>12} = {}", record.find(path)?);
    }

    let mut rev = record.revise()?;
    rev.update("name", &Scalar::String("Alice Liddell"))?;
    rev.remove("created_at")?;
    let revised = rev.end()?;
    if let Some(commit) = revised.commit_hash()? {
        println!("revised:  {}", commit_to_str(commit));
    }
    println!("{}", revised.to_json()?);

    let restored = Record::from_raw_data(revised.raw_data())?;
    assert_eq!(restored.to_json()?, revised.to_json()?);
    Ok(())
}
