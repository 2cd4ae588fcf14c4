// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn sample_item(description: Option<&str>) -> Item {
    Item {
        id: ItemId(7),
        project_id: ProjectId(1),
        name: "widget".to_string(),
        description: description.map(str::to_string),
        priority: 3,
        removed: false,
        created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
    }
}

#[test]
fn item_serializes_with_camel_case_fields() {
    let json = serde_json::to_value(sample_item(Some("blue"))).unwrap();

    assert_eq!(json["id"], 7);
    assert_eq!(json["projectId"], 1);
    assert_eq!(json["description"], "blue");
    assert_eq!(json["priority"], 3);
    assert_eq!(json["removed"], false);
    assert!(json["createdAt"].is_string());
}

#[test]
fn item_omits_absent_description() {
    let json = serde_json::to_value(sample_item(None)).unwrap();
    assert!(json.get("description").is_none());
}

#[test]
fn item_decodes_without_description() {
    let raw = r#"{"id":1,"projectId":2,"name":"a","priority":1,"removed":true,
        "createdAt":"2026-01-02T03:04:05Z"}"#;
    let item: Item = serde_json::from_str(raw).unwrap();

    assert_eq!(item.id, ItemId(1));
    assert_eq!(item.project_id, ProjectId(2));
    assert_eq!(item.description, None);
    assert!(item.removed);
}

#[test]
fn delta_list_is_not_an_item() {
    let raw = r#"[{"id":1,"priority":2}]"#;
    assert!(serde_json::from_str::<Item>(raw).is_err());
    let deltas: Vec<RankDelta> = serde_json::from_str(raw).unwrap();
    assert_eq!(deltas, vec![RankDelta::new(ItemId(1), 2)]);
}

#[test]
fn page_carries_pagination_in_meta() {
    let page = ItemPage::new(vec![sample_item(None)], 12, 4, Pagination::new(5, 10));
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(json["meta"]["total"], 12);
    assert_eq!(json["meta"]["removed"], 4);
    assert_eq!(json["meta"]["limit"], 5);
    assert_eq!(json["meta"]["offset"], 10);
    assert_eq!(json["items"].as_array().map(Vec::len), Some(1));
}

#[test]
fn pagination_defaults_to_first_ten() {
    let page: Pagination = serde_json::from_str("{}").unwrap();
    assert_eq!(page, Pagination::new(10, 0));
}

#[test]
fn empty_name_is_rejected() {
    assert_eq!(validate_name(""), Err(ValidationError::EmptyName));
    assert_eq!(validate_name(" "), Ok(()));
}

#[test]
fn draft_validates_its_name() {
    assert!(ItemDraft::new("a").with_description("b").validate().is_ok());
    assert_eq!(ItemDraft::default().validate(), Err(ValidationError::EmptyName));
}
