//! Cross-boundary contracts for the quorum governance engine: identifiers,
//! configuration, signals, addresses, input descriptors, and snapshot shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod serde_u64_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

pub type RuleNumber = u64;
pub type PlayerNumber = u64;
pub type EventNumber = u64;
pub type OutputNumber = u64;

/// Rule 0 is the implicit system actor: always treated as active, never
/// stored in the rule list.
pub const SYSTEM_RULE: RuleNumber = 0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    pub schema_version: String,
    pub game_id: String,
    #[serde(with = "serde_u64_string")]
    pub seed: u64,
    #[serde(default = "default_max_trigger_depth")]
    pub max_trigger_depth: u8,
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
    pub notes: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            game_id: "game_local_001".to_string(),
            seed: 1337,
            max_trigger_depth: default_max_trigger_depth(),
            max_log_entries: default_max_log_entries(),
            notes: None,
        }
    }
}

fn default_max_trigger_depth() -> u8 {
    16
}

fn default_max_log_entries() -> usize {
    4_096
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Proposed,
    Active,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Deleted,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Active,
    Deleted,
}

/// Runtime classification of a dynamic payload. The kind of a variable is
/// fixed at creation; writes of another kind are refused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Text,
    List,
    Map,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Int,
            Value::String(_) => Self::Text,
            Value::Array(_) => Self::List,
            Value::Object(_) => Self::Map,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Text => "text",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RulePhase {
    Proposed,
    Activated,
    Rejected,
    Added,
    Modified,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerPhase {
    Arrive,
    Leave,
}

/// Shape of one input control shown to a player. Radio and checkbox choices
/// pair the payload value delivered on selection with a display label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum InputForm {
    Text,
    TextArea,
    Button,
    Radio { choices: Vec<(Value, String)> },
    Checkbox { choices: Vec<(Value, String)> },
}

/// Data echoed back by the UI for one form submission. Choice controls
/// submit indices into the advertised choice list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum InputData {
    Text(String),
    TextArea(String),
    Button,
    Radio(u32),
    Checkbox(Vec<u32>),
}

impl InputForm {
    /// Converts a submission into the payload the owning event receives.
    /// `None` when the data does not fit this form (wrong control type or a
    /// choice index out of range).
    pub fn payload_for(&self, data: &InputData) -> Option<Value> {
        match (self, data) {
            (Self::Text, InputData::Text(text)) => Some(Value::String(text.clone())),
            (Self::TextArea, InputData::TextArea(text)) => Some(Value::String(text.clone())),
            (Self::Button, InputData::Button) => Some(Value::Null),
            (Self::Radio { choices }, InputData::Radio(index)) => {
                choices.get(*index as usize).map(|(value, _)| value.clone())
            }
            (Self::Checkbox { choices }, InputData::Checkbox(indices)) => {
                let mut picked = Vec::with_capacity(indices.len());
                for index in indices {
                    picked.push(choices.get(*index as usize)?.0.clone());
                }
                Some(Value::Array(picked))
            }
            _ => None,
        }
    }

    pub fn field_kind(&self) -> FieldKind {
        match self {
            Self::Text => FieldKind::Text,
            Self::TextArea => FieldKind::TextArea,
            Self::Button => FieldKind::Button,
            Self::Radio { choices } => FieldKind::Radio {
                choices: indexed_labels(choices),
            },
            Self::Checkbox { choices } => FieldKind::Checkbox {
                choices: indexed_labels(choices),
            },
        }
    }
}

fn indexed_labels(choices: &[(Value, String)]) -> Vec<(u32, String)> {
    choices
        .iter()
        .enumerate()
        .map(|(index, (_, label))| (index as u32, label.clone()))
        .collect()
}

/// A primitive observable. Two signals are equal iff their kind and carrier
/// parameters are equal; leaves inside one event are further distinguished
/// by structural address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Input {
        player: PlayerNumber,
        prompt: String,
        form: InputForm,
    },
    Timer {
        fire_at: u64,
    },
    Message {
        name: String,
    },
    RuleLifecycle {
        phase: RulePhase,
    },
    PlayerLifecycle {
        phase: PlayerPhase,
    },
    Victory,
}

/// One step of a structural path through an event combinator tree.
/// `Shortcut` carries the child index so sibling leaves stay distinct.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "tag", content = "index")]
#[serde(rename_all = "snake_case")]
pub enum AddressTag {
    SumL,
    SumR,
    AppL,
    AppR,
    BindL,
    BindR,
    Shortcut(u32),
}

pub type SignalAddress = Vec<AddressTag>;

/// A fired signal with its payload. `address` is `None` at injection time
/// and bound once the resolver matches the occurrence to a leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalOccurrence {
    pub signal: Signal,
    pub payload: Value,
    pub address: Option<SignalAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub player: Option<PlayerNumber>,
    pub tick: u64,
    pub created_at: String,
    pub message: String,
}

/// Choice lists as shown on the wire: index + label, values stay engine-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Button,
    Radio { choices: Vec<(u32, String)> },
    Checkbox { choices: Vec<(u32, String)> },
}

/// Descriptor for one pending input leaf. The UI must echo `event` and
/// `address` verbatim with the submission so the occurrence routes to
/// exactly this leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormField {
    pub event: EventNumber,
    pub address: SignalAddress,
    pub player: PlayerNumber,
    pub prompt: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSnapshot {
    pub number: RuleNumber,
    pub name: String,
    pub description: String,
    pub code: String,
    pub proposed_by: PlayerNumber,
    pub status: RuleStatus,
    pub assessed_by: Option<RuleNumber>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub number: PlayerNumber,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableSnapshot {
    pub owner: RuleNumber,
    pub name: String,
    pub kind: ValueKind,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputSnapshot {
    pub number: OutputNumber,
    pub owner: RuleNumber,
    pub target: Option<PlayerNumber>,
    pub text: String,
    pub status: OutputStatus,
}

/// Externally-visible game state between engine calls. Compiled rule bodies
/// and event handlers are closures and stay engine-side; rule source text is
/// carried verbatim for display and re-compilation by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub schema_version: String,
    pub game_id: String,
    pub tick: u64,
    pub rules: Vec<RuleSnapshot>,
    pub players: Vec<PlayerSnapshot>,
    pub variables: Vec<VariableSnapshot>,
    pub outputs: Vec<OutputSnapshot>,
    pub victory_holders: Vec<PlayerNumber>,
    pub pending_inputs: Vec<FormField>,
    pub log: Vec<LogEntry>,
    #[serde(with = "serde_u64_string")]
    pub rng_state: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: GameConfig = serde_json::from_str(
            r#"{"schema_version":"1.0","game_id":"g1","seed":"7","notes":null}"#,
        )
        .expect("config parses");
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_trigger_depth, 16);
        assert_eq!(config.max_log_entries, 4_096);
    }

    #[test]
    fn radio_payload_selects_choice_value() {
        let form = InputForm::Radio {
            choices: vec![
                (json!(true), "For".to_string()),
                (json!(false), "Against".to_string()),
            ],
        };
        assert_eq!(form.payload_for(&InputData::Radio(1)), Some(json!(false)));
        assert_eq!(form.payload_for(&InputData::Radio(5)), None);
        assert_eq!(form.payload_for(&InputData::Button), None);
    }

    #[test]
    fn checkbox_payload_collects_values_in_submission_order() {
        let form = InputForm::Checkbox {
            choices: vec![
                (json!("a"), "A".to_string()),
                (json!("b"), "B".to_string()),
                (json!("c"), "C".to_string()),
            ],
        };
        assert_eq!(
            form.payload_for(&InputData::Checkbox(vec![2, 0])),
            Some(json!(["c", "a"]))
        );
        assert_eq!(form.payload_for(&InputData::Checkbox(vec![3])), None);
    }

    #[test]
    fn field_kind_exposes_indices_not_values() {
        let form = InputForm::Radio {
            choices: vec![
                (json!(true), "For".to_string()),
                (json!(false), "Against".to_string()),
            ],
        };
        match form.field_kind() {
            FieldKind::Radio { choices } => {
                assert_eq!(
                    choices,
                    vec![(0, "For".to_string()), (1, "Against".to_string())]
                );
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn signal_equality_is_structural() {
        let a = Signal::Input {
            player: 1,
            prompt: "vote".to_string(),
            form: InputForm::Button,
        };
        let b = Signal::Input {
            player: 1,
            prompt: "vote".to_string(),
            form: InputForm::Button,
        };
        let c = Signal::Input {
            player: 2,
            prompt: "vote".to_string(),
            form: InputForm::Button,
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
