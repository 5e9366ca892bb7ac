use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentItemStatus {
    Active,
    Archived,
    Deleted,
}

impl ContentItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for ContentItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `_meta` block of a content item body. Keys this tool does not touch
/// are carried through `extra` so an update never drops them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContentMeta {
    #[serde(default)]
    pub schema: String,
    #[serde(default, rename = "deliveryKey")]
    pub delivery_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContentBody {
    #[serde(default, rename = "_meta")]
    pub meta: ContentMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub status: ContentItemStatus,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub body: ContentBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_repository_id: Option<String>,
}

impl ContentItem {
    pub fn schema(&self) -> &str {
        &self.body.meta.schema
    }

    /// Delivery key, treating an empty string the same as an absent key.
    pub fn delivery_key(&self) -> Option<&str> {
        self.body
            .meta
            .delivery_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }

    pub fn is_active_flag_set(&self) -> bool {
        self.body.active == Some(true)
    }

    pub fn is_archived(&self) -> bool {
        self.status == ContentItemStatus::Archived
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentRepository {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Handle to a queued publish. The job runs remotely and is never polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishJob {
    pub content_item_id: String,
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ContentItem, ContentItemStatus};

    #[test]
    fn content_item_keeps_unknown_body_fields() {
        let raw = json!({
            "id": "item-1",
            "label": "Header banner",
            "status": "ARCHIVED",
            "version": 4,
            "lastPublishedVersion": 3,
            "body": {
                "_meta": {
                    "schema": "https://schema.example.com/banner.json",
                    "deliveryKey": "home-banner",
                    "name": "banner"
                },
                "active": true,
                "headline": "Hello"
            }
        });

        let item: ContentItem = serde_json::from_value(raw).expect("decode item");
        assert_eq!(item.status, ContentItemStatus::Archived);
        assert_eq!(item.delivery_key(), Some("home-banner"));
        assert!(item.is_active_flag_set());
        assert_eq!(item.last_published_version, Some(3));

        let encoded = serde_json::to_value(&item.body).expect("encode body");
        assert_eq!(encoded["headline"], "Hello");
        assert_eq!(encoded["_meta"]["name"], "banner");
        assert_eq!(encoded["_meta"]["schema"], "https://schema.example.com/banner.json");
    }

    #[test]
    fn cleared_delivery_key_serializes_as_null() {
        let raw = json!({
            "id": "item-2",
            "status": "ARCHIVED",
            "body": { "_meta": { "schema": "s", "deliveryKey": "k" } }
        });
        let mut item: ContentItem = serde_json::from_value(raw).expect("decode item");
        item.body.meta.delivery_key = None;

        let encoded = serde_json::to_value(&item.body).expect("encode body");
        assert!(encoded["_meta"]["deliveryKey"].is_null());
        assert!(encoded["_meta"].get("deliveryKey").is_some());
    }

    #[test]
    fn empty_delivery_key_counts_as_absent() {
        let raw = json!({
            "id": "item-3",
            "status": "ARCHIVED",
            "body": { "_meta": { "schema": "s", "deliveryKey": "" } }
        });
        let item: ContentItem = serde_json::from_value(raw).expect("decode item");
        assert_eq!(item.delivery_key(), None);
        assert!(!item.is_active_flag_set());
    }
}
