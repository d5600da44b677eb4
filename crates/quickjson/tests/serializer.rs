//! Serializer output forms and parse/serialize round-trip properties.

use quickjson::{
    json, parse, parse_with, to_string, to_string_pretty, to_string_with, to_writer,
    ParseOptions, SerializeOptions, Value,
};
use test_case::test_case;

#[test]
fn compact_round_trip_preserves_key_order() {
    let text = r#"{"name":"John","age":30,"active":true,"score":95.5}"#;
    let value = parse(text).unwrap();
    assert_eq!(to_string(&value), text);
}

#[test]
fn pretty_array_exact_form() {
    let value = parse("[1,2,3]").unwrap();
    assert_eq!(
        to_string_with(&value, &SerializeOptions::pretty(2)),
        "[\n  1,\n  2,\n  3\n]"
    );
    assert_eq!(to_string(&value), "[1,2,3]");
}

#[test]
fn pretty_nested_objects() {
    let value = parse(r#"{"a":1,"b":[1,2],"c":{"d":null}}"#).unwrap();
    let expected = "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ],\n  \"c\": {\n    \"d\": null\n  }\n}";
    assert_eq!(to_string_with(&value, &SerializeOptions::pretty(2)), expected);
}

#[test]
fn pretty_zero_indent_still_breaks_lines() {
    let value = parse("[1,2]").unwrap();
    assert_eq!(
        to_string_with(&value, &SerializeOptions::pretty(0)),
        "[\n1,\n2\n]"
    );
}

#[test]
fn empty_containers_have_no_inner_whitespace() {
    let value = parse(r#"{"a":[],"b":{}}"#).unwrap();
    assert_eq!(
        to_string_with(&value, &SerializeOptions::pretty(2)),
        "{\n  \"a\": [],\n  \"b\": {}\n}"
    );
}

#[test_case(0i64, "0")]
#[test_case(-1i64, "-1")]
#[test_case(i64::MAX, "9223372036854775807")]
#[test_case(i64::MIN, "-9223372036854775808")]
fn integer_forms(value: i64, expected: &str) {
    assert_eq!(to_string(&Value::from(value)), expected);
}

#[test]
fn uinteger_and_float_forms() {
    assert_eq!(to_string(&Value::from(u64::MAX)), "18446744073709551615");
    assert_eq!(
        to_string(&parse("9223372036854775808").unwrap()),
        "9223372036854775808"
    );
    assert_eq!(to_string(&Value::from(1.0)), "1.0");
    assert_eq!(to_string(&Value::from(-0.0)), "0.0");
    assert_eq!(to_string(&Value::from(95.5)), "95.5");
    assert_eq!(to_string(&Value::from(0.1)), "0.1");
    assert_eq!(to_string(&Value::from(1e30)), "1e30");
}

#[test]
fn string_escapes() {
    let value = Value::from("a\"b\\c\nd\te\u{8}\u{c}\r");
    assert_eq!(to_string(&value), r#""a\"b\\c\nd\te\b\f\r""#);
    // Forward slash needs no escaping.
    assert_eq!(to_string(&Value::from("a/b")), r#""a/b""#);
}

#[test]
fn every_control_byte_round_trips() {
    for byte in 0u8..0x20 {
        let text = format!("\"\\u{byte:04x}\"");
        let value = parse(&text).unwrap();
        assert_eq!(value.as_str().unwrap().as_bytes(), [byte]);
        let serialized = to_string(&value);
        let reparsed = parse(&serialized).unwrap();
        assert_eq!(value, reparsed, "control byte {byte:#04x}");
    }
}

#[test]
fn ensure_ascii_escapes_non_ascii() {
    let options = SerializeOptions::compact().with_ensure_ascii(true);
    assert_eq!(to_string_with(&Value::from("héllo"), &options), r#""h\u00e9llo""#);
    assert_eq!(to_string_with(&Value::from("😀"), &options), r#""\ud83d\ude00""#);
    // Without the option, UTF-8 passes through.
    assert_eq!(to_string(&Value::from("héllo")), "\"héllo\"");

    let reparsed = parse(&to_string_with(&Value::from("😀"), &options)).unwrap();
    assert_eq!(reparsed.as_str().unwrap(), "😀");
}

#[test]
fn nan_and_infinity_modes() {
    let nan = Value::from(f64::NAN);
    let inf = Value::from(f64::INFINITY);
    let neg_inf = Value::from(f64::NEG_INFINITY);

    assert_eq!(to_string(&nan), "null");
    assert_eq!(to_string(&inf), "null");
    assert_eq!(to_string(&neg_inf), "null");

    let options = SerializeOptions::compact().with_nan_inf(true);
    assert_eq!(to_string_with(&nan, &options), "NaN");
    assert_eq!(to_string_with(&inf, &options), "Infinity");
    assert_eq!(to_string_with(&neg_inf, &options), "-Infinity");

    // The emitted literals parse back under the matching parse option.
    let lenient = ParseOptions::lenient();
    assert!(parse_with(&to_string_with(&nan, &options), &lenient)
        .unwrap()
        .as_float()
        .unwrap()
        .is_nan());
}

#[test]
fn sort_keys_orders_lexicographically() {
    let value = parse(r#"{"b":2,"a":1,"c":3}"#).unwrap();
    let options = SerializeOptions::compact().with_sort_keys(true);
    assert_eq!(to_string_with(&value, &options), r#"{"a":1,"b":2,"c":3}"#);
    // Unsorted output preserves insertion order.
    assert_eq!(to_string(&value), r#"{"b":2,"a":1,"c":3}"#);
}

#[test]
fn sort_keys_beyond_stack_buffer() {
    // More than 64 keys forces the heap path of the sorter.
    let mut object = Value::new_object();
    for i in (0..100).rev() {
        object.insert(format!("key{i:03}"), i as i64).unwrap();
    }
    let options = SerializeOptions::compact().with_sort_keys(true);
    let sorted = to_string_with(&object, &options);
    let reparsed = parse(&sorted).unwrap();
    let keys: Vec<String> = reparsed
        .as_object()
        .unwrap()
        .keys()
        .map(str::to_owned)
        .collect();
    let mut expected = keys.clone();
    expected.sort();
    assert_eq!(keys, expected);
    assert_eq!(reparsed.len(), 100);
}

#[test]
fn to_writer_matches_to_string() {
    let value = json!({"a": [1, 2, 3], "s": "text", "n": 1.5});
    let mut bytes = Vec::new();
    to_writer(&mut bytes, &value, &SerializeOptions::pretty(4)).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        to_string_with(&value, &SerializeOptions::pretty(4))
    );
}

#[test]
fn large_document_through_buffer_boundaries() {
    // Output far larger than the 4 KiB sink buffer.
    let mut array = Value::new_array();
    for i in 0..2000 {
        array.push(format!("padding-string-number-{i}")).unwrap();
    }
    let text = to_string(&array);
    assert!(text.len() > 4096 * 10);
    let reparsed = parse(&text).unwrap();
    assert_eq!(reparsed, array);
}

// ─── Round-trip properties ───

const CORPUS: &[&str] = &[
    "null",
    "true",
    "false",
    "0",
    "-1",
    "9223372036854775807",
    "-9223372036854775808",
    "18446744073709551615",
    "0.5",
    "1e30",
    "-2.25",
    "\"\"",
    "\"plain\"",
    "\"esc\\n\\t\\\"\"",
    "\"日本語テキスト\"",
    "[]",
    "{}",
    "[null,true,1,\"s\",[2],{\"k\":3}]",
    r#"{"nested":{"deep":{"deeper":[1,2,{"x":null}]}},"list":[1.5,2.5]}"#,
];

#[test]
fn parse_serialize_parse_is_identity() {
    for text in CORPUS {
        let first = parse(text).unwrap();
        let second = parse(&to_string(&first)).unwrap();
        assert_eq!(first, second, "{text}");
    }
}

#[test]
fn pretty_and_compact_parse_to_the_same_value() {
    for text in CORPUS {
        let value = parse(text).unwrap();
        for options in [
            SerializeOptions::compact(),
            SerializeOptions::pretty(2),
            SerializeOptions::pretty(7),
            SerializeOptions::compact().with_ensure_ascii(true),
            SerializeOptions::pretty(2).with_ensure_ascii(true),
            SerializeOptions::compact().with_sort_keys(true),
        ] {
            let reparsed = parse(&to_string_with(&value, &options)).unwrap();
            assert_eq!(value, reparsed, "{text} with {options:?}");
        }
    }
}

#[test]
fn built_values_round_trip() {
    let built = json!({
        "ints": [0, -1, 9007199254740993i64],
        "floats": [0.25, 1e-7, 123.456],
        "strings": ["short", "exactly-15-char", "a string well beyond the inline buffer"],
        "misc": {"t": true, "f": false, "n": null}
    });
    let reparsed = parse(&to_string(&built)).unwrap();
    assert_eq!(built, reparsed);
    assert_eq!(
        parse(&to_string_pretty(&built)).unwrap(),
        reparsed
    );
}
