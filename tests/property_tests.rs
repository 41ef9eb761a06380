//! Property-based tests for the round trip guarantees of both formats.
//!
//! Rendering a value and binding the result must give the value back, and
//! replaying a parsed document must reproduce it byte for byte.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_boa::{json5, toml};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct Record {
    name: String,
    count: i64,
    big: u128,
    ratio: f64,
    flags: Vec<bool>,
    nested: BTreeMap<String, i32>,
    note: Option<String>,
}

fn record() -> impl Strategy<Value = Record> {
    (
        ".*",
        any::<i64>(),
        any::<u128>(),
        any::<f64>().prop_filter("finite", |f| f.is_finite()),
        prop::collection::vec(any::<bool>(), 0..8),
        prop::collection::btree_map("[a-z][a-z0-9_-]{0,8}", any::<i32>(), 0..5),
        proptest::option::of("[ -~]{0,12}"),
    )
        .prop_map(|(name, count, big, ratio, flags, nested, note)| Record {
            name,
            count,
            big,
            ratio,
            flags,
            nested,
            note,
        })
}

fn toml_roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(
    value: &T,
) -> bool {
    match toml::to_string(value) {
        Ok(text) => match toml::from_str::<T>(&text) {
            Ok(back) => *value == back,
            Err(e) => {
                eprintln!("Deserialize failed: {}", e);
                eprintln!("Serialized was: {}", text);
                false
            }
        },
        Err(e) => {
            eprintln!("Serialize failed: {}", e);
            false
        }
    }
}

fn json5_roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(
    value: &T,
) -> bool {
    match json5::to_string(value) {
        Ok(text) => match json5::from_str::<T>(&text) {
            Ok(back) => *value == back,
            Err(e) => {
                eprintln!("Deserialize failed: {}", e);
                eprintln!("Serialized was: {}", text);
                false
            }
        },
        Err(e) => {
            eprintln!("Serialize failed: {}", e);
            false
        }
    }
}

proptest! {
    #[test]
    fn prop_record_toml(r in record()) {
        prop_assert!(toml_roundtrip(&r));
    }

    #[test]
    fn prop_record_json5(r in record()) {
        prop_assert!(json5_roundtrip(&r));
    }

    #[test]
    fn prop_i128_json5(n in any::<i128>()) {
        prop_assert!(json5_roundtrip(&vec![n]));
    }

    #[test]
    fn prop_strings_toml(s in ".*") {
        let map = BTreeMap::from([("value".to_string(), s)]);
        prop_assert!(toml_roundtrip(&map));
    }

    #[test]
    fn prop_keys_toml(keys in prop::collection::btree_set(".+", 1..5)) {
        let map: BTreeMap<String, u8> = keys.into_iter().map(|k| (k, 1)).collect();
        prop_assert!(toml_roundtrip(&map));
    }

    #[test]
    fn prop_fresh_output_replays_exactly(r in record()) {
        let text = toml::to_string(&r).unwrap();
        prop_assert_eq!(toml::parse(&text).unwrap().to_string(), text);

        let text = json5::to_string(&r).unwrap();
        prop_assert_eq!(json5::parse(&text).unwrap().to_string(), text);
    }

    #[test]
    fn prop_replay_with_comments(
        comments in prop::collection::vec("[ -~]{0,20}", 1..4),
        values in prop::collection::vec(any::<i64>(), 1..4),
    ) {
        let mut text = String::new();
        for (i, (comment, value)) in comments.iter().zip(values.iter()).enumerate() {
            text.push_str(&format!("# {}\nkey{} = {}   #{}\n\n", comment, i, value, comment));
        }
        prop_assert_eq!(toml::parse(&text).unwrap().to_string(), text);
    }
}
