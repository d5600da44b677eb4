//! Parser conformance: strict grammar, extension options, limits, and
//! error reporting.

use quickjson::{
    parse, parse_bytes, parse_with, ErrorKind, JsonType, ParseOptions, Value,
};
use test_case::test_case;

#[test]
fn parses_basic_document() {
    let value = parse(r#"{"name":"John","age":30,"active":true,"score":95.5}"#).unwrap();
    assert!(value.is_object());
    assert_eq!(value.len(), 4);
    assert_eq!(value["name"].as_str().unwrap(), "John");
    assert_eq!(value["age"].as_integer().unwrap(), 30);
    assert!(value["active"].as_bool().unwrap());
    assert_eq!(value["score"].as_float().unwrap(), 95.5);
}

#[test]
fn parses_surrounded_by_whitespace() {
    let value = parse("  [  1  ,  2  ,  3  ]  ").unwrap();
    assert!(value.is_array());
    assert_eq!(value.len(), 3);
    assert_eq!(value[2].as_integer().unwrap(), 3);
}

#[test_case("null", JsonType::Null)]
#[test_case("true", JsonType::Bool)]
#[test_case("false", JsonType::Bool)]
#[test_case("0", JsonType::Integer)]
#[test_case("-42", JsonType::Integer)]
#[test_case("18446744073709551615", JsonType::UInteger)]
#[test_case("3.5", JsonType::Float)]
#[test_case("1e10", JsonType::Float)]
#[test_case("\"s\"", JsonType::String)]
#[test_case("[]", JsonType::Array)]
#[test_case("{}", JsonType::Object)]
fn scalar_dispatch(input: &str, expected: JsonType) {
    assert_eq!(parse(input).unwrap().json_type(), expected);
}

// ─── Numbers ───

#[test]
fn integer_boundaries() {
    assert_eq!(
        parse("9223372036854775807").unwrap().as_integer().unwrap(),
        i64::MAX
    );
    assert_eq!(
        parse("-9223372036854775808").unwrap().as_integer().unwrap(),
        i64::MIN
    );

    // One above signed range: uinteger, not a float.
    let above = parse("9223372036854775808").unwrap();
    assert!(above.is_uinteger());
    assert_eq!(above.as_uinteger().unwrap(), 9223372036854775808);
    assert_eq!(
        above.as_integer().unwrap_err().kind(),
        ErrorKind::IntegerOverflow
    );

    assert_eq!(
        parse("18446744073709551615").unwrap().as_uinteger().unwrap(),
        u64::MAX
    );

    // Beyond unsigned range: falls through to float reconstruction.
    assert!(parse("18446744073709551616").unwrap().is_float());
    assert!(parse("-9223372036854775809").unwrap().is_float());
}

#[test_case("0.5", 0.5; "positive half")]
#[test_case("-0.5", -0.5; "negative half")]
#[test_case("95.5", 95.5; "ninety five point five")]
#[test_case("3.141592653589793", 3.141592653589793; "pi")]
#[test_case("1e5", 1e5; "lowercase exponent")]
#[test_case("1E5", 1e5; "uppercase exponent")]
#[test_case("1e+5", 1e5; "signed positive exponent")]
#[test_case("1e-5", 1e-5; "signed negative exponent")]
#[test_case("2.5e-3", 2.5e-3; "fraction with negative exponent")]
#[test_case("1.7976931348623157e308", f64::MAX; "f64 max")]
#[test_case("5e-324", 5e-324; "f64 min positive")]
#[test_case("37.7749295", 37.7749295; "latitude like value")]
#[test_case("123456789012345678901234567890", 1.2345678901234568e29; "huge integer widened to float")]
fn float_values(input: &str, expected: f64) {
    assert_eq!(parse(input).unwrap().as_float().unwrap(), expected);
}

#[test_case("-"; "lone minus")]
#[test_case("1."; "missing fraction digits")]
#[test_case("1e"; "missing exponent digits")]
#[test_case("1e+"; "missing signed exponent digits")]
#[test_case(".5"; "leading dot")]
#[test_case("1e999"; "overflowing exponent")]
fn invalid_numbers(input: &str) {
    let err = parse(input).unwrap_err();
    assert!(
        matches!(
            err.kind(),
            ErrorKind::InvalidNumber | ErrorKind::UnexpectedCharacter
        ),
        "{input}: {err}"
    );
}

#[test]
fn tiny_exponent_underflows_to_zero() {
    assert_eq!(parse("1e-999").unwrap().as_float().unwrap(), 0.0);
}

// ─── Strings ───

#[test]
fn escape_sequences() {
    let value = parse(r#""a\"b\\c\/d\be\ff\ng\rh\ti""#).unwrap();
    assert_eq!(
        value.as_str().unwrap(),
        "a\"b\\c/d\u{8}e\u{c}f\ng\rh\ti"
    );
}

#[test]
fn unicode_escapes_and_surrogates() {
    assert_eq!(parse(r#""A""#).unwrap().as_str().unwrap(), "A");
    assert_eq!(parse(r#""é""#).unwrap().as_str().unwrap(), "é");

    let smiley = parse(r#""😀""#).unwrap();
    assert_eq!(smiley.as_str().unwrap(), "😀");
    assert_eq!(smiley.as_str().unwrap().len(), 4);

    // Escaped and direct UTF-8 parse to the same value.
    assert_eq!(smiley, parse("\"😀\"").unwrap());
}

#[test_case(r#""\uD83D""#; "lone high surrogate")]
#[test_case(r#""\uD83Dx""#; "high surrogate without low")]
#[test_case(r#""\uDE00""#; "lone low surrogate")]
#[test_case(r#""\uD83DA""#; "high surrogate with non-surrogate")]
#[test_case(r#""\uZZZZ""#; "bad hex digits")]
#[test_case(r#""\u00""#; "truncated escape")]
fn invalid_unicode_escapes(input: &str) {
    assert_eq!(
        parse(input).unwrap_err().kind(),
        ErrorKind::InvalidUnicodeEscape
    );
}

#[test]
fn invalid_escape_and_unterminated_string() {
    assert_eq!(
        parse(r#""\q""#).unwrap_err().kind(),
        ErrorKind::InvalidEscape
    );
    assert_eq!(
        parse(r#""abc"#).unwrap_err().kind(),
        ErrorKind::UnterminatedString
    );
    assert_eq!(
        parse("\"ab\\").unwrap_err().kind(),
        ErrorKind::InvalidEscape
    );
}

#[test]
fn rejects_invalid_utf8_bytes() {
    let err = parse_bytes(b"\"\xFF\xFE\"").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUtf8);
    // Overlong encoding is rejected too.
    let err = parse_bytes(b"\"\xC0\xAF\"").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUtf8);
}

#[test]
fn control_characters_require_option() {
    let input = "\"a\u{1}b\"";
    assert_eq!(
        parse(input).unwrap_err().kind(),
        ErrorKind::UnexpectedCharacter
    );
    let value = parse_with(input, &ParseOptions::json5()).unwrap();
    assert_eq!(value.as_str().unwrap(), "a\u{1}b");
}

#[test]
fn zero_copy_and_escaped_strings_agree() {
    // Same logical content through the fast path and the escape path.
    let fast = parse(r#""hello world, longer than sso""#).unwrap();
    let slow = parse(r#""hello world, longer than sso""#).unwrap();
    assert_eq!(fast, slow);
}

// ─── Containers ───

#[test]
fn nested_containers() {
    let value = parse(r#"{"a":[1,[2,[3,{"b":[4]}]]]}"#).unwrap();
    assert_eq!(value["a"][1][1][1]["b"][0].as_integer().unwrap(), 4);
}

#[test]
fn empty_containers() {
    assert_eq!(parse("[]").unwrap().len(), 0);
    assert_eq!(parse("{}").unwrap().len(), 0);
    assert_eq!(parse("[ ]").unwrap().len(), 0);
    assert_eq!(parse("{ }").unwrap().len(), 0);
}

#[test]
fn depth_limit_is_exact() {
    let options = ParseOptions::strict().with_max_depth(5);
    assert!(parse_with("[[[[[1]]]]]", &options).is_ok());

    let options = ParseOptions::strict().with_max_depth(4);
    let err = parse_with("[[[[[1]]]]]", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MaxDepthExceeded);

    // Objects and arrays count against the same limit.
    let options = ParseOptions::strict().with_max_depth(3);
    assert!(parse_with(r#"{"a":[{"b":1}]}"#, &options).is_ok());
    assert_eq!(
        parse_with(r#"{"a":[{"b":[1]}]}"#, &options).unwrap_err().kind(),
        ErrorKind::MaxDepthExceeded
    );
}

#[test]
fn default_depth_limit_holds() {
    let deep_ok = format!("{}1{}", "[".repeat(512), "]".repeat(512));
    assert!(parse(&deep_ok).is_ok());
    let deep_err = format!("{}1{}", "[".repeat(513), "]".repeat(513));
    assert_eq!(
        parse(&deep_err).unwrap_err().kind(),
        ErrorKind::MaxDepthExceeded
    );
}

#[test_case("[1,2"; "array missing bracket")]
#[test_case("[1,"; "array dangling comma")]
#[test_case("["; "array open only")]
fn unterminated_arrays(input: &str) {
    let err = parse(input).unwrap_err();
    assert!(
        matches!(
            err.kind(),
            ErrorKind::UnterminatedArray | ErrorKind::UnexpectedEndOfInput
        ),
        "{input}: {err}"
    );
}

#[test_case(r#"{"a":1"#; "object missing brace")]
#[test_case(r#"{"a""#; "object missing colon")]
#[test_case(r#"{"#; "object open only")]
#[test_case(r#"{1:2}"#; "non-string key")]
fn malformed_objects(input: &str) {
    let err = parse(input).unwrap_err();
    assert!(
        matches!(
            err.kind(),
            ErrorKind::UnterminatedObject
                | ErrorKind::UnexpectedEndOfInput
                | ErrorKind::UnexpectedCharacter
        ),
        "{input}: {err}"
    );
}

#[test]
fn duplicate_keys_last_value_wins_by_default() {
    let value = parse(r#"{"a":1,"a":2}"#).unwrap();
    assert_eq!(value.len(), 1);
    assert_eq!(value["a"].as_integer().unwrap(), 2);

    // Also across the hash-index finalization path.
    let mut text = String::from("{");
    for i in 0..20 {
        text.push_str(&format!("\"k{i}\":{i},"));
    }
    text.push_str("\"k3\":333}");
    let value = parse(&text).unwrap();
    assert_eq!(value.len(), 20);
    assert_eq!(value["k3"].as_integer().unwrap(), 333);
}

#[test]
fn duplicate_keys_can_be_forbidden() {
    let options = ParseOptions::strict().with_duplicate_keys(false);
    let err = parse_with(r#"{"a":1,"a":2}"#, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    assert!(parse_with(r#"{"a":1,"b":2}"#, &options).is_ok());
}

// ─── Extensions ───

#[test]
fn comments_are_rejected_by_default_and_accepted_when_enabled() {
    let input = "// header\n[1, /* mid */ 2] // tail";
    assert!(parse(input).is_err());
    let value = parse_with(input, &ParseOptions::lenient()).unwrap();
    assert_eq!(value.len(), 2);
}

#[test]
fn trailing_commas() {
    assert!(parse("[1,2,]").is_err());
    let options = ParseOptions::lenient();
    assert_eq!(parse_with("[1,2,]", &options).unwrap().len(), 2);
    assert_eq!(parse_with(r#"{"a":1,}"#, &options).unwrap().len(), 1);
    // A comma alone still is not an element.
    assert!(parse_with("[,]", &options).is_err());
}

#[test]
fn single_quotes_and_unquoted_keys() {
    let options = ParseOptions::lenient();
    let value = parse_with(r#"{key: 'va"lue', $id: 'it\'s'}"#, &options).unwrap();
    assert_eq!(value["key"].as_str().unwrap(), "va\"lue");
    assert_eq!(value["$id"].as_str().unwrap(), "it's");
    assert!(parse(r#"{key: 1}"#).is_err());
    assert!(parse(r#"'s'"#).is_err());
}

#[test]
fn nan_and_infinity_literals() {
    let options = ParseOptions::lenient();
    assert!(parse_with("NaN", &options)
        .unwrap()
        .as_float()
        .unwrap()
        .is_nan());
    assert_eq!(
        parse_with("Infinity", &options).unwrap().as_float().unwrap(),
        f64::INFINITY
    );
    assert_eq!(
        parse_with("-Infinity", &options).unwrap().as_float().unwrap(),
        f64::NEG_INFINITY
    );
    assert!(parse("NaN").is_err());
    assert!(parse("Infinity").is_err());
}

#[test]
fn hex_numbers() {
    let options = ParseOptions::json5();
    assert_eq!(parse_with("0xFF", &options).unwrap().as_integer().unwrap(), 255);
    assert_eq!(parse_with("0x0", &options).unwrap().as_integer().unwrap(), 0);
    assert_eq!(
        parse_with("-0x10", &options).unwrap().as_integer().unwrap(),
        -16
    );
    assert!(parse("0xFF").is_err());
    assert_eq!(
        parse_with("0x", &options).unwrap_err().kind(),
        ErrorKind::InvalidNumber
    );
    assert_eq!(
        parse_with("0x11111111111111111", &options).unwrap_err().kind(),
        ErrorKind::IntegerOverflow
    );
}

// ─── Error surface ───

#[test]
fn trailing_content_is_rejected() {
    for input in ["{} x", "1 2", "[] []", "null,"] {
        assert_eq!(
            parse(input).unwrap_err().kind(),
            ErrorKind::TrailingContent,
            "{input}"
        );
    }
}

#[test]
fn empty_and_garbage_input() {
    assert_eq!(
        parse("").unwrap_err().kind(),
        ErrorKind::UnexpectedEndOfInput
    );
    assert_eq!(
        parse("   ").unwrap_err().kind(),
        ErrorKind::UnexpectedEndOfInput
    );
    assert_eq!(parse("@").unwrap_err().kind(), ErrorKind::UnexpectedCharacter);
    assert_eq!(parse("tru").unwrap_err().kind(), ErrorKind::InvalidLiteral);
    assert_eq!(parse("nul").unwrap_err().kind(), ErrorKind::InvalidLiteral);
}

#[test]
fn error_locations_are_line_and_column_accurate() {
    let input = "{\n  \"a\": 1,\n  x\n}";
    let err = parse(input).unwrap_err();
    let loc = err.location().unwrap();
    assert_eq!(loc.line, 3);
    assert_eq!(loc.column, 3);
    assert_eq!(loc.offset, 14);
}

#[test]
fn failures_are_deterministic() {
    let inputs = [
        "{\"a\": tru}",
        "[1, 2, ",
        "\"unterminated",
        "{\"a\":1,\"a\" 2}",
    ];
    for input in inputs {
        let first = parse(input).unwrap_err();
        assert!(first.kind().is_parse_error());
        assert!(first.location().is_some());
        for _ in 0..3 {
            let again = parse(input).unwrap_err();
            assert_eq!(first.kind(), again.kind());
            assert_eq!(
                first.location().map(|l| l.offset),
                again.location().map(|l| l.offset)
            );
        }
    }
}

#[test]
fn from_str_impl_parses_strict() {
    let value: Value = r#"{"a":1}"#.parse().unwrap();
    assert_eq!(value["a"].as_integer().unwrap(), 1);
    assert!("{bad}".parse::<Value>().is_err());
}

#[test]
fn large_flat_document_exercises_count_ahead() {
    let mut text = String::from("[");
    for i in 0..500 {
        if i > 0 {
            text.push(',');
        }
        text.push_str(&format!("{{\"index\":{i},\"name\":\"item-{i}\"}}"));
    }
    text.push(']');
    let value = parse(&text).unwrap();
    assert_eq!(value.len(), 500);
    assert_eq!(value[499]["index"].as_integer().unwrap(), 499);
    assert_eq!(value[499]["name"].as_str().unwrap(), "item-499");
}
