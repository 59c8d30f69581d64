mod common;

use std::io::{self, Read};

use common::{Customer, Member};
use databridge::{Config, Error, Input, Record, Value, record_shape, transform};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
struct OnlyA {
    a: String,
}

record_shape!(OnlyA { a: String });

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Order {
    id: i64,
    items: Vec<OrderItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderItem {
    sku: String,
}

record_shape!(Order { id: i64, items: Vec<OrderItem> });
record_shape!(OrderItem { sku: String });

fn strict() -> Config {
    Config::default().with_strict(true)
}

fn violation_paths(err: Error) -> Vec<String> {
    match err {
        Error::StrictViolation(paths) => paths,
        other => panic!("expected a strict violation, got {other:?}"),
    }
}

#[test]
fn unknown_top_level_keys_fail_only_in_strict_mode() {
    let payload = r#"{"a": "x", "b": "y"}"#;
    let err = transform::<OnlyA>(payload, &strict()).unwrap_err();
    assert_eq!(violation_paths(err), vec!["b".to_string()]);

    let lenient: OnlyA = transform(payload, &Config::default()).expect("lenient");
    assert_eq!(lenient.a, "x");
}

#[test]
fn nested_unknown_keys_report_dotted_paths() {
    let err = transform::<Customer>(
        r#"{"name": "Ada", "address": {"city": "Lyon", "planet": "Earth"}}"#,
        &strict(),
    )
    .unwrap_err();
    assert_eq!(violation_paths(err), vec!["address.planet".to_string()]);
}

#[test]
fn unknown_keys_inside_collection_elements_are_rejected() {
    let err = transform::<Order>(
        r#"{"id": 1, "items": [{"sku": "A"}, {"sku": "B", "colour": "red"}]}"#,
        &strict(),
    )
    .unwrap_err();
    assert_eq!(violation_paths(err), vec!["items.1.colour".to_string()]);
}

#[test]
fn one_bad_row_fails_the_whole_dataset() {
    let err = transform::<Vec<Member>>("name,age,nick\nAda,36,a\nLin,29,l\n", &strict()).unwrap_err();
    assert_eq!(violation_paths(err), vec!["nick".to_string()]);
}

#[test]
fn strict_mode_accepts_clean_payloads() {
    let members: Vec<Member> =
        transform("Name,AGE\nAda,36\n", &strict()).expect("clean payload");
    assert_eq!(members[0].age, 36);
}

#[test]
fn strict_mode_skips_the_json_fast_path() {
    let config = strict().with_key_normalization(false);
    let err = transform::<OnlyA>(r#"{"a": "x", "zzz": 1}"#, &config).unwrap_err();
    assert_eq!(violation_paths(err), vec!["zzz".to_string()]);
}

#[test]
fn violation_message_lists_every_path() {
    let err = transform::<OnlyA>(r#"{"a": "x", "b": 1, "c": 2}"#, &strict()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "databridge: strict mode - unknown fields present: [b, c]"
    );
}

#[test]
fn non_finite_numbers_fail_to_marshal() {
    let record = Record::from([("a".to_string(), Value::Float(f64::INFINITY))]);
    let err = transform::<serde_json::Value>(record, &Config::default()).unwrap_err();
    assert!(matches!(err, Error::Marshal(_)));
}

#[test]
fn scalar_json_input_is_unsupported() {
    let err = transform::<OnlyA>(serde_json::json!("text"), &Config::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedInput(_)));
}

#[test]
fn primitive_destination_is_invalid() {
    let err = transform::<String>("a=1", &Config::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidDestination(_)));
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

#[test]
fn reader_failures_propagate_with_their_cause() {
    let err = transform::<OnlyA>(Input::reader(FailingReader), &Config::default()).unwrap_err();
    match err {
        Error::Read(cause) => assert_eq!(cause.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected a read failure, got {other:?}"),
    }
}

#[test]
fn irreconcilable_values_surface_decode_failures() {
    let err = transform::<Member>(r#"{"age": "thirty"}"#, &Config::default()).unwrap_err();
    assert!(matches!(err, Error::DecodeFailed(_)));
}

fn load_member(payload: &str) -> databridge::Result<Member> {
    let member = transform(payload, &strict())?;
    Ok(member)
}

#[test]
fn errors_propagate_through_the_crate_result_alias() {
    assert!(load_member("name=Ada&age=36").is_ok());
    let err = load_member("name=Ada&nickname=Countess").unwrap_err();
    assert_eq!(violation_paths(err), vec!["nickname".to_string()]);
}
