//! Snapshot document codec.
//!
//! Current shape: one top-level object mapping community id to
//! `{ "label": <display name>, "configs": [<counter>, ...] }`. Loading also
//! accepts the legacy shape where a community maps directly to its configs
//! array. Labels are diagnostics only and are not restored into the store.

use {
    headcount_platform::CommunityId,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::warn,
};

use crate::config::CounterConfig;

/// Label written when a community's display name cannot be resolved.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommunityRecord {
    #[serde(default)]
    label: String,
    configs: Vec<CounterConfig>,
}

/// Encode store entries into the snapshot document. Label resolution is
/// best effort and never blocks persistence.
pub fn encode(
    entries: &[(CommunityId, Vec<CounterConfig>)],
    label_for: impl Fn(&CommunityId) -> Option<String>,
) -> Value {
    let mut document = serde_json::Map::new();
    for (community, configs) in entries {
        let record = CommunityRecord {
            label: label_for(community).unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            configs: configs.clone(),
        };
        // CounterConfig serialization cannot fail; fall back to an empty
        // record rather than dropping the community.
        let value = serde_json::to_value(&record).unwrap_or_else(|_| Value::Object(Default::default()));
        document.insert(community.to_string(), value);
    }
    Value::Object(document)
}

/// Decode a snapshot document into store entries.
///
/// Entries that match neither the current nor the legacy shape are skipped
/// with a warning; a document that is not an object decodes to nothing.
pub fn decode(document: &Value) -> Vec<(CommunityId, Vec<CounterConfig>)> {
    let Some(map) = document.as_object() else {
        warn!("counter snapshot is not an object, ignoring");
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (community, value) in map {
        if let Ok(record) = serde_json::from_value::<CommunityRecord>(value.clone()) {
            entries.push((CommunityId::new(community.clone()), record.configs));
        } else if let Ok(configs) = serde_json::from_value::<Vec<CounterConfig>>(value.clone()) {
            // Legacy shape: configs array without a label wrapper.
            entries.push((CommunityId::new(community.clone()), configs));
        } else {
            warn!(community = %community, "skipping malformed snapshot entry");
        }
    }
    entries
}
