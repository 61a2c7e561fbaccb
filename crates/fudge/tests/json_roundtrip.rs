use serde_json::json;

use fudge::{
    Envelope, FieldValue, FudgeContext, FudgeJsonStreamReader, FudgeJsonWriter, FudgeMsg,
    JsonSettings, MapTaxonomyResolver, Taxonomy,
};

fn to_json(msg: &FudgeMsg) -> String {
    FudgeJsonWriter::new().message_to_string(msg)
}

fn from_json(text: &str) -> Envelope {
    let mut reader = FudgeJsonStreamReader::new(FudgeContext::new(), text).expect("parse");
    reader.read_envelope().expect("read envelope")
}

#[test]
fn named_only_messages_roundtrip_pointwise() {
    let mut inner = FudgeMsg::new();
    inner.add("nested", "deep").unwrap();
    let mut msg = FudgeMsg::new();
    msg.add("byte", 1i64).unwrap();
    msg.add("short", 1000i64).unwrap();
    msg.add("int", 100_000i64).unwrap();
    msg.add("long", 1i64 << 40).unwrap();
    msg.add("double", 101.25f64).unwrap();
    msg.add("flag", true).unwrap();
    msg.add("name", "value").unwrap();
    msg.add("absent", FieldValue::Indicator).unwrap();
    msg.add("sub", inner).unwrap();

    let decoded = from_json(&to_json(&msg));
    let original: Vec<_> = msg.iter().collect();
    let roundtripped: Vec<_> = decoded.message().iter().collect();
    assert_eq!(original, roundtripped);
}

#[test]
fn envelope_metadata_roundtrips_under_its_keys() {
    let mut msg = FudgeMsg::new();
    msg.add("a", 1i64).unwrap();
    let envelope = Envelope::full(msg, 3, 1, 0);
    let text = FudgeJsonWriter::new().envelope_to_string(&envelope);
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["fudgeSchemaVersion"], json!(3));
    assert_eq!(parsed["fudgeProcessingDirectives"], json!(1));

    let decoded = from_json(&text);
    assert_eq!(decoded, envelope);
}

#[test]
fn heterogeneous_array_collapses_to_repeated_fields() {
    let envelope = from_json(r#"{"x": [1, "two", 3]}"#);
    let fields: Vec<_> = envelope.message().all_by_name("x").collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0].value(), &FieldValue::Byte(1));
    assert_eq!(fields[1].value(), &FieldValue::Str("two".into()));
    assert_eq!(fields[2].value(), &FieldValue::Byte(3));
}

#[test]
fn homogeneous_array_decodes_as_one_primitive_array_field() {
    let envelope = from_json(r#"{"x": [1, 2, 3]}"#);
    assert_eq!(envelope.message().len(), 1);
    assert_eq!(
        envelope.message().by_name("x").unwrap().value(),
        &FieldValue::IntArray(vec![1, 2, 3])
    );
}

#[test]
fn repeated_fields_roundtrip_through_their_array_form() {
    let mut msg = FudgeMsg::new();
    msg.add("x", 1i64).unwrap();
    msg.add("x", "two").unwrap();
    msg.add("x", 3i64).unwrap();
    let text = to_json(&msg);
    assert_eq!(text, r#"{"x":[1,"two",3]}"#);
    let decoded = from_json(&text);
    let original: Vec<_> = msg.iter().collect();
    let roundtripped: Vec<_> = decoded.message().iter().collect();
    assert_eq!(original, roundtripped);
}

#[test]
fn ordinal_keys_roundtrip_as_decimal_strings() {
    let mut msg = FudgeMsg::new();
    msg.add_ordinal(7, "bid").unwrap();
    let text = to_json(&msg);
    assert_eq!(text, r#"{"7":"bid"}"#);
    let decoded = from_json(&text);
    let field = decoded.message().by_ordinal(7).unwrap();
    assert_eq!(field.name(), None);
    assert_eq!(field.value(), &FieldValue::Str("bid".into()));
}

#[test]
fn custom_envelope_keys_are_honoured() {
    let settings = JsonSettings::from_json(
        r#"{"schemaVersionField": "v", "processingDirectivesField": "d", "taxonomyField": "t"}"#,
    )
    .unwrap();
    let context = FudgeContext::new().with_json_settings(settings.clone());

    let mut msg = FudgeMsg::new();
    msg.add("a", 1i64).unwrap();
    let envelope = Envelope::full(msg, 9, 0, 0);
    let text = FudgeJsonWriter::with_settings(settings).envelope_to_string(&envelope);
    assert!(text.contains(r#""v":9"#));

    let mut reader = FudgeJsonStreamReader::new(context, &text).unwrap();
    let decoded = reader.read_envelope().unwrap();
    assert_eq!(decoded.schema_version(), 9);
    assert_eq!(decoded.message().get_i64("a"), Some(1));
}

#[test]
fn taxonomy_fills_names_on_json_decode() {
    let mut resolver = MapTaxonomyResolver::new();
    resolver.add(1, Taxonomy::new([(7, "price".to_owned())]));
    let context = FudgeContext::new().with_taxonomy_resolver(resolver);

    let text = r#"{"fudgeTaxonomy": 1, "7": 42}"#;
    let mut reader = FudgeJsonStreamReader::new(context, text).unwrap();
    let decoded = reader.read_envelope().unwrap();
    assert_eq!(decoded.taxonomy_id(), 1);
    let field = decoded.message().by_ordinal(7).unwrap();
    assert_eq!(field.name(), Some("price"));
    assert_eq!(field.value().as_i64(), Some(42));
}

#[test]
fn numbers_narrow_exactly_like_a_binary_encode() {
    let envelope = from_json(r#"{"a": 1, "b": 1000, "c": 100000, "d": 1099511627776}"#);
    let msg = envelope.message();
    assert_eq!(msg.by_name("a").unwrap().value(), &FieldValue::Byte(1));
    assert_eq!(msg.by_name("b").unwrap().value(), &FieldValue::Short(1000));
    assert_eq!(msg.by_name("c").unwrap().value(), &FieldValue::Int(100_000));
    assert_eq!(
        msg.by_name("d").unwrap().value(),
        &FieldValue::Long(1 << 40)
    );
}

#[test]
fn byte_arrays_render_as_number_arrays_and_return_as_int_arrays() {
    // A documented one-way equivalence: byte arrays have no distinct JSON
    // shape, so they come back as the narrowest numeric array.
    let mut msg = FudgeMsg::new();
    msg.add("bytes", vec![1u8, 2, 3]).unwrap();
    let decoded = from_json(&to_json(&msg));
    assert_eq!(
        decoded.message().by_name("bytes").unwrap().value(),
        &FieldValue::IntArray(vec![1, 2, 3])
    );
}
