//! Tests for core types and model identifiers.

use pretty_assertions::assert_eq;
use parley::models::ModelId;
use parley::types::*;

#[test]
fn turn_constructors_tag_the_role() {
    let user = Turn::user("Hello");
    let assistant = Turn::assistant("Hi there!");
    assert_eq!(user.role(), Role::User);
    assert_eq!(assistant.role(), Role::Assistant);
    assert_eq!(assistant.content(), "Hi there!");
    assert_ne!(user.id(), assistant.id());
}

#[test]
fn turn_serializes_as_one_flat_record() {
    let turn = Turn::user("Hello");
    let value = serde_json::to_value(&turn).unwrap();

    assert_eq!(value["role"], "user");
    assert_eq!(value["content"], "Hello");
    assert!(value["timestamp"].is_string());
    assert!(value["id"].is_string());

    let back: Turn = serde_json::from_value(value).unwrap();
    assert_eq!(back, turn);
}

#[test]
fn model_display_matches_api_identifier() {
    for model in ModelId::supported() {
        assert_eq!(model.to_string(), model.as_str());
    }
    assert_eq!(ModelId::default(), ModelId::Gpt4oMini);
}

#[test]
fn model_parsing_trims_and_rejects_unknown_ids() {
    assert_eq!(ModelId::parse_supported(" gpt-4o ").unwrap(), ModelId::Gpt4o);
    let err = ModelId::parse_supported("openai:gpt-4o").unwrap_err();
    assert!(err.to_string().contains("gpt-3.5-turbo"));
}
