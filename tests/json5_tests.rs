use serde::{Deserialize, Serialize};
use serde_boa::{json5, Error, Literal, NamingConvention, Number, Options, Value};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Limits {
    max_conns: u32,
    burst_rate: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Service {
    service_name: String,
    enabled: bool,
    limits: Limits,
    hosts: Vec<String>,
}

const SERVICE: &str = "\
// Edge service
{
  serviceName: 'edge', // short name
  enabled: true,
  /* rate limits */
  limits: {
    maxConns: 0x100,
    burstRate: +.5,
  },
  hosts: [
    \"a.example\",
    'b.example',
  ],
}
";

#[test]
fn test_bind_commented_document() {
    let service: Service = json5::from_str(SERVICE).unwrap();
    assert_eq!(
        service,
        Service {
            service_name: "edge".to_string(),
            enabled: true,
            limits: Limits {
                max_conns: 256,
                burst_rate: 0.5,
            },
            hosts: vec!["a.example".to_string(), "b.example".to_string()],
        }
    );
    assert_eq!(json5::parse(SERVICE).unwrap().to_string(), SERVICE);
}

#[test]
fn test_help_comments_are_attached_to_keys() {
    let doc = json5::parse(SERVICE).unwrap();
    let root = doc.value().unwrap();
    let keys: Vec<_> = doc.children(root).collect();
    let limits = doc.node(keys[2]);
    assert_eq!(limits.value, Some(Literal::String("limits".to_string())));
    assert_eq!(limits.comments().collect::<Vec<_>>(), vec!["rate limits"]);
}

#[test]
fn test_strings_and_escapes() {
    let value: BTreeMap<String, String> = json5::from_str(
        r#"{
  single: 'it\'s',
  double: "say \"hi\"",
  unicode: 'é😀',
  hex: '\x41',
  continued: 'one \
two',
  nul: '\0',
}"#,
    )
    .unwrap();
    assert_eq!(value["single"], "it's");
    assert_eq!(value["double"], "say \"hi\"");
    assert_eq!(value["unicode"], "é😀");
    assert_eq!(value["hex"], "A");
    assert_eq!(value["continued"], "one two");
    assert_eq!(value["nul"], "\0");
}

#[test]
fn test_numbers() {
    let value: BTreeMap<String, Number> = json5::from_str(
        "{hex: 0xFF, neg_hex: -0x10, lead: .25, trail: 5., exp: 1e3, inf: -Infinity, nan: NaN}",
    )
    .unwrap();
    assert_eq!(value["hex"].as_i64(), Some(255));
    assert_eq!(value["neg_hex"].as_i64(), Some(-16));
    assert_eq!(value["lead"].as_f64(), 0.25);
    assert_eq!(value["trail"].to_string(), "5.0");
    assert_eq!(value["exp"].as_f64(), 1000.0);
    assert_eq!(value["inf"], Number::NegativeInfinity);
    assert_eq!(value["nan"], Number::NaN);
}

#[test]
fn test_syntax_errors() {
    let cases = [
        ("{a: 1", 1),
        ("{\n  a: 1,,\n}", 2),
        ("{\n  a 1\n}", 2),
        ("[1,\n 2\n 3]", 3),
        ("{a: 01}", 1),
        ("{a: '\\1'}", 1),
    ];
    for (input, line) in cases {
        let err = json5::parse(input).unwrap_err();
        assert_eq!(err.position().map(|p| p.line), Some(line), "{}: {}", input, err);
    }
}

#[test]
fn test_duplicate_keys_last_wins() {
    let value: BTreeMap<String, i32> = json5::from_str("{a: 1, b: 2, a: 3}").unwrap();
    assert_eq!(value["a"], 3);
    assert_eq!(value.len(), 2);
}

#[test]
fn test_naming_options() {
    let options = Options::new().with_naming(NamingConvention::SnakeCase);
    let limits = Limits {
        max_conns: 1,
        burst_rate: 2.0,
    };
    let text = json5::to_string_with_options(&limits, &options).unwrap();
    assert_eq!(text, "{\n  max_conns: 1,\n  burst_rate: 2.0,\n}\n");
    let back: Limits = json5::from_str_with_options(&text, &options).unwrap();
    assert_eq!(back, limits);
}

#[test]
fn test_replay_as_json() {
    let doc = json5::parse(SERVICE).unwrap();
    let json = json5::replay_json(&doc).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["serviceName"], "edge");
    assert_eq!(value["limits"]["maxConns"], 256);
    assert_eq!(value["limits"]["burstRate"], 0.5);
    assert_eq!(value["hosts"][1], "b.example");

    let toml_doc = serde_boa::toml::parse("a = 1").unwrap();
    assert!(json5::replay_json(&toml_doc).is_err());
}

#[test]
fn test_json_mode_rejects_non_finite_numbers() {
    let err = json5::to_string_json(&vec![f64::NAN]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType(_)));
    assert_eq!(
        json5::to_string(&vec![f64::INFINITY]).unwrap(),
        "[\n  +Infinity,\n]\n"
    );
}

#[test]
fn test_edit_preserves_layout() {
    let mut doc = json5::parse(SERVICE).unwrap();
    let name = doc.find(&["serviceName"]).unwrap();
    doc.set_scalar(name, Literal::String("core".to_string())).unwrap();
    let rate = doc.find(&["limits", "burstRate"]).unwrap();
    doc.set_scalar(rate, Literal::Number(Number::from(0.75))).unwrap();

    let expected = SERVICE
        .replace("'edge'", "\"core\"")
        .replace("+.5", "0.75");
    assert_eq!(doc.to_string(), expected);

    let service: Service = json5::from_document(&doc, &Options::default()).unwrap();
    assert_eq!(service.service_name, "core");
    assert_eq!(service.limits.burst_rate, 0.75);
}

#[test]
fn test_generic_values() {
    let value: Value = json5::from_str("[null, true, 'x', 1, {a: []}]").unwrap();
    let items = value.as_array().unwrap();
    assert!(items[0].is_null());
    assert_eq!(items[1].as_bool(), Some(true));
    assert_eq!(items[2].as_str(), Some("x"));
    assert_eq!(items[3].as_u64(), Some(1));
    assert!(items[4].get("a").unwrap().is_array());
}
