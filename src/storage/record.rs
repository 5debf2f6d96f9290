// src/storage/record.rs
// =============================================================================
// The backlink record and the shapes used to create and edit it.
//
// JSON shape (storage file and API payloads use the same camelCase keys):
//
//   {
//     "id": "bl_1718000000000_k3j9x0a2b",
//     "externalUrl": "https://blog.example.com/review",
//     "targetUrl": "https://mying.vercel.app/products/carousel",
//     "language": "en",
//     "status": "Active" | "Lost" | "No-Follow" | "Pending",
//     "linkType": "dofollow" | "nofollow" | "meta",      (optional)
//     "anchorText": "carousel rides",                     (optional)
//     "lastChecked": "2024-06-10T08:00:00Z",              (optional)
//     "createdAt": "2024-06-01T08:00:00Z",
//     "notes": "guest post"                               (optional)
//   }
// =============================================================================

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

/// Where a backlink stands after its most recent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BacklinkStatus {
    Active,
    Lost,
    #[serde(rename = "No-Follow")]
    NoFollow,
    /// Never checked yet
    Pending,
}

/// How the external page links to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Dofollow,
    Nofollow,
    /// Found in a <meta> or <link> tag rather than an anchor
    Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backlink {
    pub id: String,
    pub external_url: String,
    pub target_url: String,
    pub language: String,
    pub status: BacklinkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Everything the caller supplies when adding a backlink.
/// The store fills in id, createdAt and the Pending status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBacklink {
    pub external_url: String,
    pub target_url: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A partial edit of a backlink.
///
/// Outer `None` means "leave the field alone". For the optional fields,
/// `Some(None)` clears the value (JSON `null`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklinkPatch {
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub status: Option<BacklinkStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub link_type: Option<Option<LinkType>>,
    #[serde(default, deserialize_with = "nullable")]
    pub anchor_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

// A present key always lands in Some(..), so `null` becomes Some(None)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The whole storage file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    #[serde(default)]
    pub backlinks: Vec<Backlink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cron_run: Option<DateTime<Utc>>,
}

impl Backlink {
    /// Builds a fresh, never-checked record.
    pub fn new(id: String, new: NewBacklink, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            external_url: new.external_url,
            target_url: new.target_url,
            language: new.language,
            status: BacklinkStatus::Pending,
            link_type: None,
            anchor_text: None,
            last_checked: None,
            created_at,
            notes: new.notes,
        }
    }

    /// Merges a patch into this record. `id` and `created_at` never change.
    pub fn apply(&mut self, patch: BacklinkPatch) {
        if let Some(v) = patch.external_url {
            self.external_url = v;
        }
        if let Some(v) = patch.target_url {
            self.target_url = v;
        }
        if let Some(v) = patch.language {
            self.language = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.link_type {
            self.link_type = v;
        }
        if let Some(v) = patch.anchor_text {
            self.anchor_text = v;
        }
        if let Some(v) = patch.notes {
            self.notes = v;
        }
    }
}

impl BacklinkPatch {
    pub fn is_empty(&self) -> bool {
        *self == BacklinkPatch::default()
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates an id of the form `bl_<unix millis>_<9 base36 chars>`.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("bl_{}_{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample() -> Backlink {
        Backlink::new(
            "bl_1_abc".to_string(),
            NewBacklink {
                external_url: "https://blog.example.com".to_string(),
                target_url: "https://mying.vercel.app/products/a".to_string(),
                language: "en".to_string(),
                notes: Some("guest post".to_string()),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_new_record_is_pending_and_unchecked() {
        let record = sample();
        assert_eq!(record.status, BacklinkStatus::Pending);
        assert!(record.last_checked.is_none());
        assert!(record.link_type.is_none());
    }

    #[test]
    fn test_status_serializes_like_the_api() {
        assert_eq!(
            serde_json::to_string(&BacklinkStatus::NoFollow).unwrap(),
            "\"No-Follow\""
        );
        assert_eq!(
            serde_json::to_string(&LinkType::Dofollow).unwrap(),
            "\"dofollow\""
        );
    }

    #[test]
    fn test_record_uses_camel_case_and_skips_empty_optionals() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("externalUrl").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("linkType").is_none());
        assert!(value.get("lastChecked").is_none());
    }

    #[test]
    fn test_patch_absent_vs_null() {
        let patch: BacklinkPatch =
            serde_json::from_str(r#"{"linkType": null, "notes": "updated"}"#).unwrap();
        assert_eq!(patch.link_type, Some(None));
        assert_eq!(patch.notes, Some(Some("updated".to_string())));
        assert_eq!(patch.anchor_text, None);

        let mut record = sample();
        record.link_type = Some(LinkType::Dofollow);
        record.anchor_text = Some("rides".to_string());
        record.apply(patch);

        assert_eq!(record.link_type, None);
        assert_eq!(record.anchor_text.as_deref(), Some("rides"));
        assert_eq!(record.notes.as_deref(), Some("updated"));
    }

    #[test]
    fn test_patch_ignores_id_and_created_at() {
        let patch: BacklinkPatch =
            serde_json::from_str(r#"{"id": "other", "createdAt": "2020-01-01T00:00:00Z"}"#)
                .unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_generate_id_format_and_uniqueness() {
        let now = Utc::now();
        let ids: HashSet<String> = (0..1000).map(|_| generate_id(now)).collect();
        assert_eq!(ids.len(), 1000);

        let id = ids.iter().next().unwrap();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts[0], "bl");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
    }
}
