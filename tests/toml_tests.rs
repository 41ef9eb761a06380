use serde::{Deserialize, Serialize};
use serde_boa::{toml, Datetime, Error, Literal, NodeKind, Number, Options, Value};
use std::collections::BTreeMap;

#[derive(Deserialize, Debug, PartialEq)]
struct Owner {
    name: String,
    dob: Datetime,
}

#[derive(Deserialize, Debug, PartialEq)]
struct Product {
    name: Option<String>,
    sku: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct Example {
    title: String,
    owner: Owner,
    database: BTreeMap<String, Value>,
    products: Vec<Product>,
}

const EXAMPLE: &str = r#"# This is a TOML document

title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[database]
enabled = true
ports = [ 8000, 8001, 8002 ]
data = [ ["delta", "phi"], [3.14] ]
temp_targets = { cpu = 79.5, case = 72.0 }

[[products]]
name = "Hammer"
sku = 738594937

[[products]]  # empty table within the array

[[products]]
name = "Nail"
sku = 284758393
"#;

#[test]
fn test_example_document() {
    let example: Example = toml::from_str(EXAMPLE).unwrap();
    assert_eq!(example.title, "TOML Example");
    assert_eq!(example.owner.name, "Tom Preston-Werner");
    assert_eq!(example.owner.dob.to_string(), "1979-05-27T07:32:00-08:00");
    assert!(example.owner.dob.as_offset().is_some());
    assert_eq!(example.database["enabled"], Value::Bool(true));
    assert_eq!(example.database["ports"].as_array().map(Vec::len), Some(3));
    assert_eq!(
        example.database["temp_targets"].get("case").and_then(Value::as_f64),
        Some(72.0)
    );
    assert_eq!(example.products.len(), 3);
    assert_eq!(
        example.products[1],
        Product {
            name: None,
            sku: None
        }
    );
    assert_eq!(example.products[2].sku, Some(284758393));

    assert_eq!(toml::parse(EXAMPLE).unwrap().to_string(), EXAMPLE);
}

#[test]
fn test_dotted_keys_and_out_of_order_tables() {
    let value: Value = toml::from_str(
        "fruit.apple.color = \"red\"\nfruit.apple.taste.sweet = true\n\n[x.y.z]\nw = 1\n[x]\nv = 2\n",
    )
    .unwrap();
    let apple = value.get("fruit").and_then(|f| f.get("apple")).unwrap();
    assert_eq!(apple.get("color").and_then(Value::as_str), Some("red"));
    assert_eq!(
        apple.get("taste").and_then(|t| t.get("sweet")).and_then(Value::as_bool),
        Some(true)
    );
    let x = value.get("x").unwrap();
    assert_eq!(x.get("v").and_then(Value::as_i64), Some(2));
    assert_eq!(
        x.get("y").and_then(|y| y.get("z")).and_then(|z| z.get("w")).and_then(Value::as_i64),
        Some(1)
    );
}

#[test]
fn test_nested_arrays_of_tables() {
    #[derive(Deserialize, Debug)]
    struct Variety {
        name: String,
    }

    #[derive(Deserialize, Debug)]
    struct Fruit {
        name: String,
        #[serde(default)]
        varieties: Vec<Variety>,
    }

    #[derive(Deserialize, Debug)]
    struct Basket {
        fruits: Vec<Fruit>,
    }

    let basket: Basket = toml::from_str(
        "[[fruits]]\nname = \"apple\"\n\n[[fruits.varieties]]\nname = \"red delicious\"\n\n[[fruits.varieties]]\nname = \"granny smith\"\n\n[[fruits]]\nname = \"banana\"\n",
    )
    .unwrap();
    assert_eq!(basket.fruits.len(), 2);
    assert_eq!(basket.fruits[0].varieties.len(), 2);
    assert_eq!(basket.fruits[0].varieties[1].name, "granny smith");
    assert_eq!(basket.fruits[1].name, "banana");
    assert!(basket.fruits[1].varieties.is_empty());
}

#[test]
fn test_numbers() {
    let value: BTreeMap<String, Number> = toml::from_str(
        "hex = 0xDEAD_BEEF\noct = 0o755\nbin = 0b1101\nneg = -17\nexp = 6.626e-34\nplus_inf = +inf\nnot = nan\n",
    )
    .unwrap();
    assert_eq!(value["hex"].as_i64(), Some(0xdead_beef));
    assert_eq!(value["oct"].as_i64(), Some(0o755));
    assert_eq!(value["bin"].as_i64(), Some(0b1101));
    assert_eq!(value["neg"].as_i64(), Some(-17));
    assert_eq!(value["exp"].as_f64(), 6.626e-34);
    assert_eq!(value["plus_inf"], Number::Infinity);
    assert_eq!(value["not"], Number::NaN);
}

#[test]
fn test_strings() {
    let value: BTreeMap<String, String> = toml::from_str(
        "basic = \"tab\\tquote\\\"\"\nliteral = 'C:\\Users'\nmulti = \"\"\"\nRoses\nViolets\"\"\"\nraw = '''\nno \\escapes'''\n",
    )
    .unwrap();
    assert_eq!(value["basic"], "tab\tquote\"");
    assert_eq!(value["literal"], "C:\\Users");
    assert_eq!(value["multi"], "Roses\nViolets");
    assert_eq!(value["raw"], "no \\escapes");
}

#[test]
fn test_datetimes() {
    let value: BTreeMap<String, Datetime> = toml::from_str(
        "odt = 1979-05-27T00:32:00.999999-07:00\nldt = 1979-05-27T07:32:00\nld = 1979-05-27\nlt = 07:32:00\n",
    )
    .unwrap();
    assert!(value["odt"].as_offset().is_some());
    assert!(value["ldt"].as_local().is_some());
    assert!(value["ld"].as_date().is_some());
    assert!(value["lt"].as_time().is_some());
}

#[test]
fn test_syntax_errors_carry_positions() {
    let cases = [
        ("a = ", 1),
        ("a = 1\nb = \"open\n", 2),
        ("[a\nb = 1", 1),
        ("a = 1 b = 2", 1),
        ("a = [1, 2\n", 2),
        ("x = { a = 1, }", 1),
    ];
    for (input, line) in cases {
        let err = toml::parse(input).unwrap_err();
        assert_eq!(err.position().map(|p| p.line), Some(line), "{}: {}", input, err);
    }
}

#[test]
fn test_redefinitions() {
    let err = toml::parse("[a]\nb = 1\n[a.b]\n").unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }), "{}", err);

    let err = toml::parse("a = { b = 1 }\n[a]\n").unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }), "{}", err);

    let err = toml::parse("[a]\nb.c = 1\n[a.b]\n").unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }), "{}", err);

    assert!(toml::parse("[a.b.c]\n[a]\n[a.b]\n").is_ok());
}

#[test]
fn test_document_navigation() {
    let doc = toml::parse("[server]\nhost = \"a\"\nports = [1, 2]\n").unwrap();
    let host = doc.find(&["server", "host"]).unwrap();
    let node = doc.node(host);
    assert_eq!(node.kind, NodeKind::String);
    assert_eq!(node.value, Some(Literal::String("a".to_string())));
    assert_eq!((node.position.line, node.position.column), (2, 8));
    assert_eq!(doc.find(&["server", "ports"]), None);
    assert!(doc.find(&["server", "missing"]).is_none());
}

#[test]
fn test_edit_then_bind() {
    #[derive(Deserialize, Serialize, Debug, PartialEq)]
    struct Server {
        host: String,
        port: u16,
    }

    let mut doc = toml::parse("host = \"a\" # keep me\nport = 80\n").unwrap();
    let port = doc.find(&["port"]).unwrap();
    doc.set_scalar(port, Literal::Number(Number::from(8080))).unwrap();
    let server: Server = toml::from_document(&doc, &Options::default()).unwrap();
    assert_eq!(server.port, 8080);
    assert_eq!(doc.to_string(), "host = \"a\" # keep me\nport = 8080\n");

    let mut fresh = toml::to_document(&server, &Options::default()).unwrap();
    let host = fresh.find(&["host"]).unwrap();
    fresh
        .set_scalar(host, Literal::String("line\nbreak".to_string()))
        .unwrap();
    assert_eq!(fresh.to_string(), "host = \"line\\nbreak\"\nport = 8080\n");
}

#[test]
fn test_crlf_documents() {
    let input = "a = 1\r\n[t]\r\nb = \"x\"\r\n";
    let doc = toml::parse(input).unwrap();
    assert_eq!(doc.to_string(), input);
    let value: Value = toml::from_document(&doc, &Options::default()).unwrap();
    assert_eq!(value.get("t").and_then(|t| t.get("b")).and_then(Value::as_str), Some("x"));
}
