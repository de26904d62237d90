use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use super::state::ProjectState;
use crate::coerce;
use crate::error::FundingRoundsError;
use crate::phases::{PhaseMap, DEFAULT_DISTRIBUTION_RATE, DEFAULT_PHASE_KEY};
use crate::rounds::{compute_rounds, default_round_name, Capitalization, RoundId, RoundInput};
use crate::types::Percent;
use crate::FundingRoundsResult;

/// Project name used when a snapshot does not carry one.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled project";

/// Persisted form of a project.
///
/// Only the editable inputs are authoritative. Computed round fields are
/// written alongside for readers of the file but ignored on load.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub project_name: String,
    pub capitalization: Capitalization,
    pub rounds: Vec<RoundInput>,
    pub round_counter: u64,
    pub phases: PhaseMap,
    pub current_phase: String,
    pub distribution_rate: Percent,
    pub last_modified: DateTime<Utc>,
}

impl ProjectSnapshot {
    pub fn from_state(state: &ProjectState) -> Self {
        Self {
            project_name: state.name().to_string(),
            capitalization: state.capitalization().clone(),
            rounds: state.inputs().to_vec(),
            round_counter: state.round_counter(),
            phases: state.phases().clone(),
            current_phase: state.current_phase().to_string(),
            distribution_rate: state.distribution_rate(),
            last_modified: Utc::now(),
        }
    }

    pub fn into_state(self) -> ProjectState {
        ProjectState::from_parts(
            self.project_name,
            self.capitalization,
            self.rounds,
            self.round_counter,
            self.phases,
            self.current_phase,
            self.distribution_rate,
        )
    }

    /// camelCase JSON document, computed round fields included.
    pub fn to_json(&self) -> Value {
        let computed = compute_rounds(&self.capitalization, &self.rounds);
        let rounds: Vec<Value> = computed
            .iter()
            .map(|r| {
                let mut v = json!({
                    "id": r.id().0,
                    "name": r.name(),
                    "fundingAmount": coerce::decimal_to_json(r.input.funding_amount),
                    "soldPercentage": coerce::decimal_to_json(r.input.sold_percentage),
                    "preValuation": coerce::decimal_to_json(r.pre_valuation),
                    "postValuation": coerce::decimal_to_json(r.post_valuation),
                    "totalShares": coerce::decimal_to_json(r.total_shares),
                    "roundShares": coerce::decimal_to_json(r.round_shares),
                    "stockPrice": coerce::decimal_to_json(r.stock_price),
                    "profitMultiplier": coerce::decimal_to_json(r.profit_multiplier),
                });
                if let Some(timing) = &r.input.timing {
                    v["timing"] = json!(timing);
                }
                if let Some(notes) = &r.input.notes {
                    v["notes"] = json!(notes);
                }
                v
            })
            .collect();

        json!({
            "projectName": self.project_name,
            "initialShares": self.capitalization.initial_shares,
            "initialPrice": coerce::decimal_to_json(self.capitalization.initial_price),
            "rounds": rounds,
            "roundCounter": self.round_counter,
            "phases": self.phases.to_json(),
            "currentPhase": self.current_phase,
            "distributionRate": coerce::decimal_to_json(self.distribution_rate),
            "lastModified": self.last_modified.timestamp_millis(),
        })
    }

    pub fn to_json_string(&self) -> FundingRoundsResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    /// Lenient load. Only a non-object document is an error; every field
    /// falls back to its default and round ids are repaired.
    pub fn from_json(value: &Value) -> FundingRoundsResult<Self> {
        let obj = value.as_object().ok_or_else(|| FundingRoundsError::InvalidInput {
            field: "snapshot".into(),
            reason: "Project snapshot must be a JSON object".into(),
        })?;
        let field = |camel: &str, snake: &str| obj.get(camel).or_else(|| obj.get(snake));

        let capitalization = Capitalization::from_values(
            field("initialShares", "initial_shares"),
            field("initialPrice", "initial_price"),
        );

        let raw_rounds: Vec<RoundInput> = obj
            .get("rounds")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|v| v.is_object())
                    .map(RoundInput::from_value)
                    .collect()
            })
            .unwrap_or_default();
        let stored_counter = coerce::positive_u64_or(field("roundCounter", "round_counter"), 0);
        let (rounds, round_counter) = repair_ids(raw_rounds, stored_counter);

        let mut phases = obj
            .get("phases")
            .map(PhaseMap::from_json)
            .unwrap_or_default();
        if phases.is_empty() {
            phases = PhaseMap::defaults();
        }

        Ok(Self {
            project_name: coerce::text_or_none(field("projectName", "project_name"))
                .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            capitalization,
            rounds,
            round_counter,
            phases,
            current_phase: coerce::text_or_none(field("currentPhase", "current_phase"))
                .unwrap_or_else(|| DEFAULT_PHASE_KEY.to_string()),
            distribution_rate: coerce::decimal_or(
                field("distributionRate", "distribution_rate"),
                DEFAULT_DISTRIBUTION_RATE,
            ),
            last_modified: parse_timestamp(field("lastModified", "last_modified")),
        })
    }

    pub fn from_json_str(text: &str) -> FundingRoundsResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

/// Give every round a unique, assigned id and an empty name its default.
///
/// The first occurrence of an id keeps it; later duplicates and unassigned
/// ids are numbered after the highest id seen. Returns the counter to store.
fn repair_ids(mut rounds: Vec<RoundInput>, stored_counter: u64) -> (Vec<RoundInput>, u64) {
    let max_id = rounds.iter().map(|r| r.id.0).max().unwrap_or(0);
    let mut counter = stored_counter.max(max_id);
    let mut seen: HashSet<RoundId> = HashSet::with_capacity(rounds.len());

    for round in rounds.iter_mut() {
        if !round.id.is_assigned() || !seen.insert(round.id) {
            counter += 1;
            tracing::warn!(old = %round.id, new = counter, "repaired round id");
            round.id = RoundId(counter);
            seen.insert(round.id);
        }
        if round.name.is_empty() {
            round.name = default_round_name(round.id);
        }
    }
    (rounds, counter)
}

/// Epoch milliseconds, or an RFC 3339 string. Anything else is "now".
fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    };
    parsed.unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_camel_case_with_computed_fields() {
        let mut state = ProjectState::new("Demo", Capitalization::default());
        state.add_round_with("Seed", dec!(60000), dec!(5), Some("Founding"));
        let json = ProjectSnapshot::from_state(&state).to_json();

        assert_eq!(json["projectName"], "Demo");
        assert_eq!(json["initialShares"], 1_000_000);
        assert_eq!(json["initialPrice"], 0.05);
        assert_eq!(json["roundCounter"], 1);
        assert_eq!(json["currentPhase"], "weak");
        assert_eq!(json["distributionRate"], 30);
        assert_eq!(json["rounds"][0]["fundingAmount"], 60000);
        assert_eq!(json["rounds"][0]["totalShares"], 1_052_632);
        assert_eq!(json["rounds"][0]["postValuation"], 1_200_000);
        assert!(json["lastModified"].is_i64());
        assert_eq!(json["phases"]["weak"]["annualProfit"], 124254);
    }

    #[test]
    fn test_computed_fields_ignored_on_load() {
        let doc = json!({
            "rounds": [{
                "id": 1, "name": "Seed", "fundingAmount": 60000, "soldPercentage": 5,
                "totalShares": 42, "stockPrice": 999
            }],
            "roundCounter": 1
        });
        let state = ProjectSnapshot::from_json(&doc).unwrap().into_state();
        assert_eq!(state.rounds()[0].total_shares, dec!(1052632));
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let doc = json!({
            "initialShares": "abc",
            "initialPrice": -1,
            "rounds": [{ "id": 1, "fundingAmount": "12abc", "soldPercentage": null }],
            "phases": "broken",
            "distributionRate": "n/a"
        });
        let snap = ProjectSnapshot::from_json(&doc).unwrap();
        assert_eq!(snap.capitalization, Capitalization::default());
        assert_eq!(snap.rounds[0].funding_amount, dec!(12));
        assert_eq!(snap.rounds[0].sold_percentage, Decimal::ZERO);
        assert_eq!(snap.rounds[0].name, "Founding");
        assert_eq!(snap.phases, PhaseMap::defaults());
        assert_eq!(snap.distribution_rate, dec!(30));
        assert_eq!(snap.project_name, DEFAULT_PROJECT_NAME);
    }

    #[test]
    fn test_duplicate_and_missing_ids_repaired() {
        let doc = json!({
            "rounds": [
                { "id": 2, "name": "A" },
                { "id": 2, "name": "B" },
                { "name": "C" }
            ],
            "roundCounter": 1
        });
        let snap = ProjectSnapshot::from_json(&doc).unwrap();
        let ids: Vec<u64> = snap.rounds.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(snap.round_counter, 4);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(ProjectSnapshot::from_json(&json!([1, 2])).is_err());
        assert!(ProjectSnapshot::from_json_str("not json").is_err());
    }

    #[test]
    fn test_string_round_trip_preserves_inputs() {
        let mut state = ProjectState::new("RT", Capitalization::default());
        state.add_round_with("Seed", dec!(60000), dec!(5), Some("Founding"));
        state.add_round_with("A", dec!(400000), dec!(12.5), Some("Month 11"));
        state.delete_round(RoundId(1)).unwrap();
        let snap = ProjectSnapshot::from_state(&state);

        let loaded = ProjectSnapshot::from_json_str(&snap.to_json_string().unwrap()).unwrap();
        assert_eq!(loaded.rounds, snap.rounds);
        assert_eq!(loaded.round_counter, 2);
        assert_eq!(
            loaded.last_modified.timestamp_millis(),
            snap.last_modified.timestamp_millis()
        );
    }
}
