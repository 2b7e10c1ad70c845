use contracts::PlayerPhase;

use super::*;

impl Game {
    /// Host entry: seat a new player and announce the arrival.
    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerNumber {
        let number = self
            .players
            .iter()
            .map(|player| player.number)
            .max()
            .unwrap_or(0)
            + 1;
        self.players.push(Player {
            number,
            name: name.into(),
        });
        self.emit_player_phase(PlayerPhase::Arrive, number);
        number
    }

    pub(crate) fn rename_player_as(
        &mut self,
        acting_rule: RuleNumber,
        number: PlayerNumber,
        name: &str,
    ) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        match self.players.iter_mut().find(|player| player.number == number) {
            Some(player) => {
                player.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_player_as(&mut self, acting_rule: RuleNumber, number: PlayerNumber) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        let before = self.players.len();
        self.players.retain(|player| player.number != number);
        if self.players.len() == before {
            return false;
        }
        self.emit_player_phase(PlayerPhase::Leave, number);
        true
    }
}
