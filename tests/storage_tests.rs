//! JSON and CSV library engines

use std::path::PathBuf;

use saslite::runtime::{CsvStore, DatasetStore, Engine, JsonStore};
use saslite::{Dataset, Value};

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "saslite-storage-{}-{}",
        tag,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn sample() -> Dataset {
    let mut ds = Dataset::new("people");
    ds.push_row(vec![
        ("name".to_string(), Value::from("ann")),
        ("age".to_string(), Value::Numeric(31.0)),
        ("score".to_string(), Value::Numeric(88.5)),
    ]);
    ds.push_row(vec![
        ("name".to_string(), Value::from("bob, jr")),
        ("age".to_string(), Value::missing()),
        ("score".to_string(), Value::Numeric(-2.0)),
    ]);
    ds
}

#[test]
fn test_json_round_trip_keeps_missing_and_order() {
    let dir = temp_dir("json");
    let path = dir.join("people.json");
    let store = JsonStore;

    store.save(&sample(), &path).unwrap();
    let loaded = store.load(&path).unwrap();

    assert_eq!(loaded.name, "people");
    assert_eq!(loaded.columns(), sample().columns());
    assert_eq!(loaded.value(0, "score"), Value::Numeric(88.5));
    assert!(loaded.value(1, "age").is_missing());
    assert_eq!(loaded.value(1, "name"), Value::from("bob, jr"));

    // missing travels as null, not as a string
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("null"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_csv_round_trip_infers_column_kinds() {
    let dir = temp_dir("csv");
    let path = dir.join("people.csv");
    let store = CsvStore;

    store.save(&sample(), &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "name$,age,score\nann,31,88.5\n\"bob, jr\",.,-2\n"
    );

    let loaded = store.load(&path).unwrap();
    assert_eq!(loaded.name, "people");
    assert_eq!(loaded.value(0, "age"), Value::Numeric(31.0));
    assert!(loaded.value(1, "age").is_missing());
    assert_eq!(loaded.value(1, "name"), Value::from("bob, jr"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_csv_round_trip_keeps_digit_and_blank_text() {
    let dir = temp_dir("kinds");
    let path = dir.join("zips.csv");

    let mut ds = Dataset::new("zips");
    for (zip, note, n) in [("02134", "", 1.0), ("10001", "", 0.1 + 0.2)] {
        ds.push_row(vec![
            ("zip".to_string(), Value::from(zip)),
            ("note".to_string(), Value::from(note)),
            ("n".to_string(), Value::Numeric(n)),
        ]);
    }

    CsvStore.save(&ds, &path).unwrap();
    let loaded = CsvStore.load(&path).unwrap();
    assert_eq!(loaded, ds);
    assert_eq!(loaded.get(0, "zip").and_then(Value::as_str), Some("02134"));
    assert_eq!(loaded.get(1, "note").and_then(Value::as_str), Some(""));
    assert_eq!(loaded.value(1, "n").as_number(), 0.1 + 0.2);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_csv_column_with_text_stays_character() {
    let dir = temp_dir("mixed");
    let path = dir.join("codes.csv");
    std::fs::write(&path, "code,n\n001,1\nA7,2\n").unwrap();

    let loaded = CsvStore.load(&path).unwrap();
    assert_eq!(loaded.value(0, "code"), Value::from("001"));
    assert_eq!(loaded.value(1, "n"), Value::Numeric(2.0));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = temp_dir("absent");
    let err = Engine::Json.store().load(&dir.join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("nope.json"), "{}", err);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_engine_names() {
    assert_eq!(Engine::from_name("CSV"), Some(Engine::Csv));
    assert_eq!(Engine::from_name("json"), Some(Engine::Json));
    assert_eq!(Engine::from_name("v9"), None);
    assert_eq!(Engine::Csv.extension(), "csv");
}
