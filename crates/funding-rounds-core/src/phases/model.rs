use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use crate::coerce;
use crate::types::{Money, Month};

/// Month used when a persisted phase carries no usable month.
pub const DEFAULT_PHASE_MONTH: Month = 12;

/// Phase selected when a project does not name one.
pub const DEFAULT_PHASE_KEY: &str = "weak";

/// A growth milestone on the project timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub month: Month,
    /// Active members expected at this point.
    pub members: u64,
    pub annual_profit: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Phase {
    pub fn new(name: impl Into<String>, month: Month, members: u64, annual_profit: Money) -> Self {
        Self {
            name: name.into(),
            month,
            members,
            annual_profit,
            target: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Lenient load from persisted JSON. Accepts camelCase or snake_case.
    pub fn from_value(key: &str, value: &Value) -> Self {
        let field = |camel: &str, snake: &str| value.get(camel).or_else(|| value.get(snake));

        let month = coerce::positive_u64_or(value.get("month"), u64::from(DEFAULT_PHASE_MONTH));
        Self {
            name: coerce::text_or_none(value.get("name")).unwrap_or_else(|| humanize_key(key)),
            month: Month::try_from(month).unwrap_or(DEFAULT_PHASE_MONTH),
            members: coerce::positive_u64_or(value.get("members"), 0),
            annual_profit: coerce::decimal_or(field("annualProfit", "annual_profit"), Decimal::ZERO),
            target: coerce::text_or_none(value.get("target")),
        }
    }

    /// Persisted (camelCase) representation.
    pub fn to_json(&self) -> Value {
        let mut v = json!({
            "name": self.name,
            "month": self.month,
            "members": self.members,
            "annualProfit": coerce::decimal_to_json(self.annual_profit),
        });
        if let Some(target) = &self.target {
            v["target"] = json!(target);
        }
        v
    }
}

/// `"veryGood"` → `"Very good"`, `"break_even"` → `"Break even"`.
fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c == '_' || c == '-' {
            out.push(' ');
        } else if c.is_uppercase() && i > 0 {
            out.push(' ');
            out.extend(c.to_lowercase());
        } else if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ─── PhaseMap ────────────────────────────────────────────────────────────────

/// Phases keyed by a short identifier, in timeline (insertion) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseMap {
    entries: Vec<(String, Phase)>,
}

impl PhaseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Phase> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Phase> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace the phase under `key` in place, or append it.
    pub fn insert(&mut self, key: impl Into<String>, phase: Phase) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(existing) => *existing = phase,
            None => self.entries.push((key, phase)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Phase)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The final milestone on the timeline.
    pub fn last(&self) -> Option<(&str, &Phase)> {
        self.entries.last().map(|(k, p)| (k.as_str(), p))
    }

    /// Lenient load from a persisted JSON object. Non-object input yields
    /// an empty map.
    pub fn from_json(value: &Value) -> Self {
        let entries = value
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter(|(_, v)| v.is_object())
                    .map(|(k, v)| (k.clone(), Phase::from_value(k, v)))
                    .collect()
            })
            .unwrap_or_default();
        Self { entries }
    }

    /// Persisted (camelCase) representation.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, phase) in &self.entries {
            map.insert(key.clone(), phase.to_json());
        }
        Value::Object(map)
    }

    /// The built-in six-milestone growth plan.
    pub fn defaults() -> Self {
        let mut phases = PhaseMap::new();
        phases.insert(
            "launch",
            Phase::new("Launch", 1, 0, Decimal::ZERO).with_target("Target: launch the app"),
        );
        phases.insert(
            "breakeven",
            Phase::new("Break-even", 11, 2_047, Decimal::ZERO)
                .with_target("Target: 2,047 active members"),
        );
        phases.insert(
            "weak",
            Phase::new("Weak profits", 12, 4_095, dec!(124254))
                .with_target("Target: 4,095 active members"),
        );
        phases.insert(
            "good",
            Phase::new("Good profits", 24, 16_383, dec!(949865))
                .with_target("Target: 16,383 active members"),
        );
        phases.insert(
            "veryGood",
            Phase::new("Very good profits", 36, 32_767, dec!(1985341))
                .with_target("Target: 32,767 active members"),
        );
        phases.insert(
            "excellent",
            Phase::new("Excellent profits", 48, 65_535, dec!(4498647))
                .with_target("Target: 65,535 active members"),
        );
        phases
    }
}

impl Serialize for PhaseMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, phase) in &self.entries {
            map.serialize_entry(key, phase)?;
        }
        map.end()
    }
}

struct PhaseMapVisitor;

impl<'de> Visitor<'de> for PhaseMapVisitor {
    type Value = PhaseMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of phase key to phase")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PhaseMap, A::Error> {
        let mut phases = PhaseMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            if value.is_object() {
                let phase = Phase::from_value(&key, &value);
                phases.insert(key, phase);
            }
        }
        Ok(phases)
    }
}

impl<'de> Deserialize<'de> for PhaseMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PhaseMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_in_timeline_order() {
        let phases = PhaseMap::defaults();
        let keys: Vec<&str> = phases.keys().collect();
        assert_eq!(
            keys,
            vec!["launch", "breakeven", "weak", "good", "veryGood", "excellent"]
        );
        assert_eq!(phases.get("weak").unwrap().annual_profit, dec!(124254));
        assert_eq!(phases.last().unwrap().0, "excellent");
    }

    #[test]
    fn test_lenient_phase_load() {
        // Legacy records carry GTV fields and no month.
        let v = json!({
            "startup": { "monthlyGTV": 200000, "commission": 0.05, "annualProfit": 120000 },
            "veryGood": { "month": "36", "members": 32767, "annualProfit": "1985341" },
            "bogus": 5
        });
        let phases = PhaseMap::from_json(&v);
        assert_eq!(phases.len(), 2);

        let startup = phases.get("startup").unwrap();
        assert_eq!(startup.name, "Startup");
        assert_eq!(startup.month, DEFAULT_PHASE_MONTH);
        assert_eq!(startup.members, 0);
        assert_eq!(startup.annual_profit, dec!(120000));

        let very_good = phases.get("veryGood").unwrap();
        assert_eq!(very_good.name, "Very good");
        assert_eq!(very_good.month, 36);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut phases = PhaseMap::defaults();
        phases.insert("launch", Phase::new("Soft launch", 2, 10, Decimal::ZERO));
        assert_eq!(phases.keys().next(), Some("launch"));
        assert_eq!(phases.get("launch").unwrap().month, 2);
        assert_eq!(phases.len(), 6);
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let phases: PhaseMap =
            serde_json::from_str(r#"{"z": {"month": 3}, "a": {"month": 1}}"#).unwrap();
        let keys: Vec<&str> = phases.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_json_round_trip_keeps_fields() {
        let phases = PhaseMap::defaults();
        let reloaded = PhaseMap::from_json(&phases.to_json());
        assert_eq!(reloaded, phases);
    }
}
