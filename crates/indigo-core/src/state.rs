// ── Device state ──
//
// Last-known property bag for one Indigo device, plus the diff produced
// when a fresh snapshot is merged in. The diff drives change propagation:
// only keys whose value actually changed are reported.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Key carrying the device's display name. Applied on every snapshot but
/// never reported as a change.
pub const NAME_KEY: &str = "name";

/// A primitive property value as Indigo reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Convert a JSON value. Nulls, arrays and objects carry nothing a
    /// characteristic can use and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Loose truthiness: non-zero numbers and non-empty strings other
    /// than `"false"`/`"0"` count as true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty() && s != "false" && s != "0",
        }
    }

    /// Numeric view. Booleans read as 1/0, strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One key whose value differed between the cached state and a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    pub key: String,
    pub old: Option<PropertyValue>,
    pub new: PropertyValue,
}

/// Cached property bag for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    props: BTreeMap<String, PropertyValue>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from a snapshot, discarding the change list.
    pub fn from_snapshot(snapshot: &Map<String, Value>) -> Self {
        let mut state = Self::new();
        state.apply_snapshot(snapshot);
        state
    }

    /// Merge a snapshot and return the keys whose value changed.
    ///
    /// Keys absent from the snapshot are left untouched. The name key is
    /// always overwritten and never appears in the result. Applying the
    /// same snapshot twice yields an empty list the second time.
    pub fn apply_snapshot(&mut self, snapshot: &Map<String, Value>) -> Vec<PropertyChange> {
        let mut changes = Vec::new();

        for (key, raw) in snapshot {
            let Some(new) = PropertyValue::from_json(raw) else {
                continue;
            };

            if key == NAME_KEY {
                self.props.insert(key.clone(), new);
                continue;
            }

            let old = self.props.get(key);
            if old == Some(&new) {
                continue;
            }

            changes.push(PropertyChange {
                key: key.clone(),
                old: old.cloned(),
                new: new.clone(),
            });
            self.props.insert(key.clone(), new);
        }

        changes
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.props.get(key)
    }

    /// Truthiness of a key; missing keys are false.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(PropertyValue::is_truthy)
    }

    /// True if any of the keys is truthy.
    pub fn any_flag(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.flag(k))
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropertyValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    /// The device's display name as Indigo reports it.
    pub fn name(&self) -> Option<&str> {
        self.text(NAME_KEY)
    }

    /// Device id, accepting both numeric and string forms.
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            PropertyValue::Number(n) => Some(format_number(*n)),
            PropertyValue::Text(s) => Some(s.clone()),
            PropertyValue::Bool(_) => None,
        }
    }
}

/// Render a number without a trailing `.0` when it is integral.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn snapshot(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn first_snapshot_reports_every_key_but_name() {
        let mut state = DeviceState::new();
        let changes = state.apply_snapshot(&snapshot(json!({
            "name": "Porch",
            "isOn": true,
            "brightness": 40
        })));

        let mut keys: Vec<_> = changes.iter().map(|c| c.key.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["brightness", "isOn"]);
        assert_eq!(state.name(), Some("Porch"));
        assert!(changes.iter().all(|c| c.old.is_none()));
    }

    #[test]
    fn reapplying_a_snapshot_is_silent() {
        let snap = snapshot(json!({"isOn": true, "brightness": 40}));
        let mut state = DeviceState::new();
        state.apply_snapshot(&snap);
        assert!(state.apply_snapshot(&snap).is_empty());
    }

    #[test]
    fn only_changed_keys_are_reported() {
        let mut state = DeviceState::from_snapshot(&snapshot(json!({
            "isOn": true,
            "brightness": 40
        })));
        let changes = state.apply_snapshot(&snapshot(json!({
            "isOn": true,
            "brightness": 55
        })));

        assert_eq!(
            changes,
            vec![PropertyChange {
                key: "brightness".into(),
                old: Some(PropertyValue::Number(40.0)),
                new: PropertyValue::Number(55.0),
            }]
        );
    }

    #[test]
    fn name_updates_are_applied_but_not_reported() {
        let mut state = DeviceState::from_snapshot(&snapshot(json!({"name": "Old"})));
        let changes = state.apply_snapshot(&snapshot(json!({"name": "New"})));
        assert!(changes.is_empty());
        assert_eq!(state.name(), Some("New"));
    }

    #[test]
    fn absent_keys_keep_their_value() {
        let mut state = DeviceState::from_snapshot(&snapshot(json!({"isOn": true, "speedIndex": 2})));
        state.apply_snapshot(&snapshot(json!({"isOn": false})));
        assert_eq!(state.number("speedIndex"), Some(2.0));
        assert!(!state.flag("isOn"));
    }

    #[test]
    fn nulls_and_nested_values_are_ignored() {
        let state = DeviceState::from_snapshot(&snapshot(json!({
            "brightness": null,
            "states": {"a": 1},
            "ids": [1, 2]
        })));
        assert_eq!(state, DeviceState::new());
    }

    #[test]
    fn truthiness_follows_loose_rules() {
        assert!(PropertyValue::Number(1.0).is_truthy());
        assert!(!PropertyValue::Number(0.0).is_truthy());
        assert!(PropertyValue::Text("on".into()).is_truthy());
        assert!(!PropertyValue::Text(String::new()).is_truthy());
        assert!(!PropertyValue::Text("false".into()).is_truthy());
    }

    #[test]
    fn ids_render_without_fraction() {
        let state = DeviceState::from_snapshot(&snapshot(json!({"id": 1_234_567})));
        assert_eq!(state.id().as_deref(), Some("1234567"));
        assert_eq!(format_number(98.6), "98.6");
        assert_eq!(format_number(20.0), "20");
    }
}
