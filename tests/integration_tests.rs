use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use serde_boa::{
    json5, toml, to_value, Environment, Error, Field, Fields, LineBreak, Literal, NamingConvention,
    Number, Options, Value,
};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Server {
    ip: String,
    port: u16,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Database {
    url: String,
    max_conns: u32,
    replicas: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Config {
    database: Database,
    servers: Vec<Server>,
    name: String,
    debug: bool,
    ratio: f64,
    labels: BTreeMap<String, String>,
    timeout: Option<u32>,
}

fn config() -> Config {
    Config {
        database: Database {
            url: "postgres://localhost/app".to_string(),
            max_conns: 16,
            replicas: vec!["r1".to_string(), "r2".to_string()],
        },
        servers: vec![
            Server {
                ip: "10.0.0.1".to_string(),
                port: 8080,
            },
            Server {
                ip: "10.0.0.2".to_string(),
                port: 8081,
            },
        ],
        name: "demo".to_string(),
        debug: false,
        ratio: 5.0,
        labels: BTreeMap::from([
            ("env".to_string(), "prod".to_string()),
            ("team".to_string(), "core".to_string()),
        ]),
        timeout: None,
    }
}

#[test]
fn test_toml_round_trip() {
    let text = toml::to_string(&config()).unwrap();
    println!("TOML:\n{}", text);

    let back: Config = toml::from_str(&text).unwrap();
    assert_eq!(back, config());
}

#[test]
fn test_json5_round_trip() {
    let text = json5::to_string(&config()).unwrap();
    println!("JSON5:\n{}", text);
    assert!(text.contains("maxConns: 16,"));

    let back: Config = json5::from_str(&text).unwrap();
    assert_eq!(back, config());
}

#[test]
fn test_strict_json_output() {
    let text = json5::to_string_json(&config()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["database"]["maxConns"], 16);
    assert_eq!(parsed["servers"][1]["ip"], "10.0.0.2");

    let back: Config = json5::from_str(&text).unwrap();
    assert_eq!(back, config());
}

#[test]
fn test_scalars_render_before_tables() {
    let text = toml::to_string(&config()).unwrap();
    let first_header = text.find('[').unwrap();
    for key in ["name = ", "debug = ", "ratio = "] {
        assert!(text.find(key).unwrap() < first_header, "{} after a header", key);
    }
    assert!(text.contains("\n[database]\n"));
    assert!(text.contains("\n[[servers]]\n"));
}

#[test]
fn test_float_keeps_fraction() {
    #[derive(Serialize)]
    struct Ratio {
        ratio: f64,
    }

    assert_eq!(toml::to_string(&Ratio { ratio: 5.0 }).unwrap(), "ratio = 5.0\n");
    assert_eq!(json5::to_string(&Ratio { ratio: 5.0 }).unwrap(), "{\n  ratio: 5.0,\n}\n");
}

#[test]
fn test_replay_is_byte_exact() {
    let toml_doc = "\
# Service configuration
title = 'demo'   # inline note

[owner]
name = \"Tom\"
dob = 1979-05-27T07:32:00-08:00

[database]
ports = [ 8000, 8001, 8002 ]
data = [ [\"delta\", \"phi\"], [3.14] ]
temp_targets = { cpu = 79.5, case = 72.0 }

[[products]]
name = \"Hammer\"
sku = 738594937

[[products]]  # empty entry

[[products]]
name = \"Nail\"
color = \"gray\"
";
    assert_eq!(toml::parse(toml_doc).unwrap().to_string(), toml_doc);

    let json5_doc = "\
// Service configuration
{
  title: 'demo', /* inline note */
  owner: {
    name: \"Tom\",
  },
  ports: [8000, 0x1F41, +8002, .5e1,],
  'quoted key': null,
}
";
    assert_eq!(json5::parse(json5_doc).unwrap().to_string(), json5_doc);
}

#[test]
fn test_surgical_edit() {
    let input = "# top\n[server]\nhost = \"a\"   # primary\nport = 80\n";
    let mut doc = toml::parse(input).unwrap();
    let host = doc.find(&["server", "host"]).unwrap();
    doc.set_scalar(host, Literal::String("b".to_string())).unwrap();
    assert_eq!(doc.to_string(), "# top\n[server]\nhost = \"b\"   # primary\nport = 80\n");

    let mut doc = json5::parse("{\n  // port\n  port: 80, // http\n}").unwrap();
    let port = doc.find(&["port"]).unwrap();
    doc.set_scalar(port, Literal::Number(Number::from(8080))).unwrap();
    assert_eq!(doc.to_string(), "{\n  // port\n  port: 8080, // http\n}");

    let server = doc.value().unwrap();
    assert!(doc.set_scalar(server, Literal::Bool(true)).is_err());
}

#[test]
fn test_duplicate_keys() {
    let err = toml::parse("a = 1\na = 2").unwrap_err();
    match err {
        Error::DuplicateKey {
            line, orig_line, ..
        } => {
            assert_eq!(line, 2);
            assert_eq!(orig_line, 1);
        }
        other => panic!("expected duplicate key error, got {:?}", other),
    }

    assert!(matches!(
        toml::parse("[a]\n[a]").unwrap_err(),
        Error::DuplicateKey { .. }
    ));

    let tables: BTreeMap<String, Vec<BTreeMap<String, i32>>> =
        toml::from_str("[[a]]\n[[a]]\n").unwrap();
    assert_eq!(tables["a"].len(), 2);
}

#[test]
fn test_inline_table_redefinitions() {
    for input in ["t = { a.b = 1, a = 2 }", "t = { a = 1, a.b = 2 }"] {
        let err = toml::parse(input).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }), "{}: {:?}", input, err);
        assert!(toml::from_str::<Value>(input).is_err());
    }
}

#[test]
fn test_layered_documents() {
    let base = toml::to_document(&config(), &Options::default()).unwrap();
    let local = toml::parse(
        "debug = true\ntimeout = 30\n\n[database]\nreplicas = [\"r9\"]\n\n[labels]\nenv = \"dev\"\n",
    )
    .unwrap();
    let layered: Config = toml::from_documents(&[&base, &local], &Options::default()).unwrap();
    assert!(layered.debug);
    assert_eq!(layered.timeout, Some(30));
    assert_eq!(layered.database.url, "postgres://localhost/app");
    assert_eq!(layered.database.replicas, vec!["r9"]);
    assert_eq!(layered.labels["env"], "dev");
    assert_eq!(layered.labels["team"], "core");
    assert_eq!(layered.servers, config().servers);

    let overrides = json5::parse("{name: 'edge', database: {max_conns: 2}}").unwrap();
    let layered: Config =
        toml::from_documents(&[&base, &local, &overrides], &Options::default()).unwrap();
    assert_eq!(layered.name, "edge");
    assert_eq!(layered.database.max_conns, 2);
    assert_eq!(layered.database.replicas, vec!["r9"]);
}

#[test]
fn test_prefix_variables_leave_defaults_alone() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Service {
        name: String,
        #[serde(default)]
        log: String,
    }

    let options = Options::new()
        .with_automatic_env("APP")
        .with_environment(Environment::from_list(&["APP_LOG_LEVEL=debug"]));
    let service: Service = toml::from_str_with_options("name = \"api\"\n", &options).unwrap();
    assert_eq!(
        service,
        Service {
            name: "api".to_string(),
            log: String::new(),
        }
    );
}

#[test]
fn test_naming_conventions() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Person {
        #[serde(rename = "FirstName")]
        first_name: String,
    }

    let person = Person {
        first_name: "Ada".to_string(),
    };

    let kebab = Options::new().with_naming(NamingConvention::KebabCase);
    let text = toml::to_string_with_options(&person, &kebab).unwrap();
    assert_eq!(text, "first-name = \"Ada\"\n");
    let back: Person = toml::from_str_with_options(&text, &kebab).unwrap();
    assert_eq!(back, person);

    let text = json5::to_string(&person).unwrap();
    assert_eq!(text, "{\n  firstName: \"Ada\",\n}\n");

    assert_eq!(NamingConvention::KebabCase.format("FirstName"), "first-name");
    assert_eq!(NamingConvention::CamelCase.format("FirstName"), "firstName");
}

#[test]
fn test_environment_overlay() {
    let input = "[database]\nurl = \"file-value\"\nmax_conns = 4\nreplicas = []\n";

    #[derive(Deserialize)]
    struct Partial {
        database: Database,
    }

    let options = Options::new()
        .with_automatic_env("APP")
        .with_environment(Environment::from_list(&[
            "APP_DATABASE_URL=env-value",
            "APP_DATABASE_REPLICAS=a:b:c",
        ]));
    let partial: Partial = toml::from_str_with_options(input, &options).unwrap();
    assert_eq!(partial.database.url, "env-value");
    assert_eq!(partial.database.max_conns, 4);
    assert_eq!(partial.database.replicas, vec!["a", "b", "c"]);

    let json_input = "{database: {url: 'file-value', maxConns: 4, replicas: []}}";
    let partial: Partial = json5::from_str_with_options(json_input, &options).unwrap();
    assert_eq!(partial.database.url, "env-value");
}

#[test]
fn test_missing_variables_never_fail() {
    let options = Options::new()
        .with_automatic_env("APP")
        .with_environment(Environment::from_list::<&str>(&[]));
    let text = toml::to_string(&config()).unwrap();
    let back: Config = toml::from_str_with_options(&text, &options).unwrap();
    assert_eq!(back, config());
}

#[test]
fn test_load_error_paths() {
    let input = "\
name = \"demo\"
debug = false
ratio = 1.0
timeout = 5

[labels]

[database]
url = \"x\"
max_conns = 1
replicas = []

[[servers]]
ip = \"10.0.0.1\"
port = 1

[[servers]]
ip = \"10.0.0.2\"
port = 1

[[servers]]
ip = 3
port = 1
";
    let err = toml::from_str::<Config>(input).unwrap_err();
    assert_eq!(
        err.to_string(),
        "at 22:6: cannot load value into .servers[2].ip: config has number, but expected string instead"
    );
    assert_eq!(err.position().map(|p| p.line), Some(22));
    assert!(matches!(err.root_cause(), Error::TypeMismatch { .. }));

    let err = json5::from_str::<Server>("{ip: 'a', port: 70000}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "at 1:17: cannot load value into .port: cannot assign 70000 to u16: value does not fit"
    );
}

#[test]
fn test_top_level_shape_violations() {
    assert!(toml::to_string(&vec![1, 2]).is_err());
    assert!(toml::to_string(&5).is_err());

    let err = json5::from_str::<Server>("[1, 2]").unwrap_err();
    assert!(err.to_string().contains("config has list, but expected map instead"));
}

#[test]
fn test_big_numbers_round_trip() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Big {
        #[serde(with = "serde_boa::number::bigint")]
        huge: BigInt,
        exact: Number,
        wide: u128,
        low: i128,
    }

    let big = Big {
        huge: "-98765432109876543210987654321".parse().unwrap(),
        exact: Number::parse("3.14159265358979323846264338327950288").unwrap(),
        wide: u128::MAX,
        low: i128::MIN,
    };

    let text = toml::to_string(&big).unwrap();
    assert!(text.contains("huge = -98765432109876543210987654321\n"));
    assert!(text.contains("exact = 3.14159265358979323846264338327950288\n"));
    assert_eq!(toml::from_str::<Big>(&text).unwrap(), big);

    let text = json5::to_string(&big).unwrap();
    assert_eq!(json5::from_str::<Big>(&text).unwrap(), big);
}

#[test]
fn test_field_descriptors() {
    #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
    struct Credentials {
        user: String,
        password: String,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Service {
        name: String,
        #[serde(default)]
        credentials: Credentials,
        endpoint: String,
    }

    let options = Options::new().with_fields(
        Fields::new()
            .field("Service", "credentials", Field::new().inlined())
            .field("Service", "endpoint", Field::new().with_name("URL").with_help("where to connect"))
            .field("Credentials", "password", Field::new().ignored()),
    );
    let service = Service {
        name: "api".to_string(),
        credentials: Credentials {
            user: "admin".to_string(),
            password: "secret".to_string(),
        },
        endpoint: "https://api".to_string(),
    };

    let text = toml::to_string_with_options(&service, &options).unwrap();
    assert_eq!(
        text,
        "name = \"api\"\nuser = \"admin\"\n# where to connect\nURL = \"https://api\"\n"
    );
    assert!(!text.contains("secret"));
}

#[test]
fn test_output_options() {
    #[derive(Serialize)]
    struct Nested {
        inner: BTreeMap<String, i32>,
    }

    let value = Nested {
        inner: BTreeMap::from([("x".to_string(), 1)]),
    };
    let options = Options::new()
        .with_indent("\t")
        .with_line_break(LineBreak::CrLf);
    assert_eq!(
        json5::to_string_with_options(&value, &options).unwrap(),
        "{\r\n\tinner: {\r\n\t\tx: 1,\r\n\t},\r\n}\r\n"
    );
}

#[test]
fn test_readers_and_writers() {
    let text = toml::to_string(&config()).unwrap();
    let back: Config = toml::from_reader(text.as_bytes()).unwrap();
    assert_eq!(back, config());
    let back: Config = toml::from_slice(text.as_bytes()).unwrap();
    assert_eq!(back, config());

    let mut buffer = Vec::new();
    json5::to_writer(&mut buffer, &config()).unwrap();
    let back: Config = json5::from_reader(buffer.as_slice()).unwrap();
    assert_eq!(back, config());

    assert!(toml::from_slice::<Config>(&[0xff, 0xfe]).is_err());
}

#[test]
fn test_values() {
    let value = to_value(&config()).unwrap();
    assert_eq!(value.get("name").and_then(Value::as_str), Some("demo"));

    let doc: Value = toml::from_str("when = 1979-05-27\ncount = 3\n").unwrap();
    assert!(doc.get("when").unwrap().is_datetime());
    assert_eq!(doc.get("count").and_then(Value::as_i64), Some(3));

    let doc: Value = json5::from_str("{nums: [1, -2.5, Infinity]}").unwrap();
    let nums = doc.get("nums").and_then(Value::as_array).unwrap();
    assert_eq!(nums[1].as_f64(), Some(-2.5));
    assert_eq!(nums[2].as_f64(), Some(f64::INFINITY));
}

#[test]
fn test_binding_with_tracing_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let options = Options::new()
            .with_automatic_env("APP")
            .with_environment(Environment::from_list(&["APP_PORT=9"]));
        let server: Server =
            toml::from_str_with_options("ip = \"a\"\nport = 1\nunknown = true\n", &options).unwrap();
        assert_eq!(server.port, 9);
    });
}
