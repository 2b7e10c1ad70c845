use contracts::{
    GameSnapshot, OutputSnapshot, PlayerSnapshot, RuleSnapshot, VariableSnapshot,
    SCHEMA_VERSION_V1,
};

use super::*;

impl Game {
    /// One-way view of the externally-visible state for host persistence
    /// between calls. Compiled bodies and handlers stay engine-side; rule
    /// source text travels verbatim.
    pub fn snapshot_for_current_tick(&self) -> GameSnapshot {
        GameSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            game_id: self.config.game_id.clone(),
            tick: self.current_tick,
            rules: self
                .rules
                .iter()
                .map(|rule| RuleSnapshot {
                    number: rule.number,
                    name: rule.name.clone(),
                    description: rule.description.clone(),
                    code: rule.code.clone(),
                    proposed_by: rule.proposed_by,
                    status: rule.status,
                    assessed_by: rule.assessed_by,
                })
                .collect(),
            players: self
                .players
                .iter()
                .map(|player| PlayerSnapshot {
                    number: player.number,
                    name: player.name.clone(),
                })
                .collect(),
            variables: self
                .variables
                .iter()
                .map(|variable| VariableSnapshot {
                    owner: variable.owner,
                    name: variable.name.clone(),
                    kind: variable.kind,
                    value: variable.value.clone(),
                })
                .collect(),
            outputs: self
                .outputs
                .iter()
                .map(|output| OutputSnapshot {
                    number: output.number,
                    owner: output.owner,
                    target: output.target,
                    text: self.render_output(output.number).unwrap_or_default(),
                    status: output.status,
                })
                .collect(),
            victory_holders: self.read_victory(),
            pending_inputs: self.pending_inputs(None),
            log: self.log.clone(),
            rng_state: self.rng_state,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshot_for_current_tick()
    }
}
