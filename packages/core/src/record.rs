//! Structural records: key/value zipping, agent records, and the
//! [`Displayable`] capability.
//!
//! The hosting DSL prints values through their JSON form. Any type that
//! implements [`Displayable`] gets its display text from [`to_json`], so the
//! two can never drift apart.
//!
//! [`to_json`]: Displayable::to_json

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Field set to `true` on every agent record.
pub const IS_AGENT_FIELD: &str = "isAgent";

/// A value whose display text is derived from its JSON serialization.
pub trait Displayable {
    /// The single serialization routine for this value.
    fn to_json(&self) -> serde_json::Value;

    /// Display text, recomputed from [`to_json`](Displayable::to_json) on
    /// every call.
    fn display_text(&self) -> String {
        display_from_json(&self.to_json())
    }
}

/// Convert serialized JSON to display text: a JSON string shows as its raw
/// contents, anything else as compact JSON.
pub fn display_from_json(json: &serde_json::Value) -> String {
    match json {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a record by pairing each key with the value at the same position.
///
/// Iteration is driven by `keys`: surplus values are ignored and keys past the
/// end of `values` receive `V::default()`. No length mismatch is reported.
/// A repeated key keeps its last value.
///
/// For the single-key form use `BTreeMap::from([(key, value)])`.
pub fn make_record<K, V>(
    keys: impl IntoIterator<Item = K>,
    values: impl IntoIterator<Item = V>,
) -> BTreeMap<K, V>
where
    K: Ord,
    V: Default,
{
    let mut values = values.into_iter();
    keys.into_iter()
        .map(|k| (k, values.next().unwrap_or_default()))
        .collect()
}

/// A structural record flagged as an agent.
///
/// Serialises as its fields plus `"isAgent": true`; its [`Display`] output
/// is exactly that JSON.
///
/// [`Display`]: fmt::Display
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRecord<V = serde_json::Value> {
    fields: BTreeMap<String, V>,
}

impl<V> AgentRecord<V> {
    pub fn fields(&self) -> &BTreeMap<String, V> {
        &self.fields
    }

    /// Mutable access to the fields. Display text follows any change.
    pub fn fields_mut(&mut self) -> &mut BTreeMap<String, V> {
        &mut self.fields
    }

    pub fn get(&self, field: &str) -> Option<&V> {
        self.fields.get(field)
    }

    /// Always `true`.
    pub fn is_agent(&self) -> bool {
        true
    }

    pub fn into_fields(self) -> BTreeMap<String, V> {
        self.fields
    }
}

/// Wrap `fields` as an [`AgentRecord`]. The fields are not validated.
pub fn mk_agent_record<V>(fields: BTreeMap<String, V>) -> AgentRecord<V> {
    AgentRecord { fields }
}

impl<V: Serialize> Serialize for AgentRecord<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shadowed = self.fields.contains_key(IS_AGENT_FIELD);
        let len = self.fields.len() + usize::from(!shadowed);
        let mut map = serializer.serialize_map(Some(len))?;
        // Keys are emitted in sorted order, marker included, so the output
        // matches `to_json().to_string()` byte for byte.
        let mut marker_written = false;
        for (k, v) in self.fields.iter().filter(|(k, _)| k.as_str() != IS_AGENT_FIELD) {
            if !marker_written && k.as_str() > IS_AGENT_FIELD {
                map.serialize_entry(IS_AGENT_FIELD, &true)?;
                marker_written = true;
            }
            map.serialize_entry(k, v)?;
        }
        if !marker_written {
            map.serialize_entry(IS_AGENT_FIELD, &true)?;
        }
        map.end()
    }
}

impl<V: Serialize> Displayable for AgentRecord<V> {
    fn to_json(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "agent record field failed to serialize");
                serde_json::Value::Null
            }
        }
    }
}

impl<V: Serialize> fmt::Display for AgentRecord<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
