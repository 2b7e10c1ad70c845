use contracts::FormField;

use super::*;
use crate::resolve;

impl Game {
    pub(crate) fn output(&self, number: OutputNumber) -> Option<&Output> {
        self.outputs.iter().find(|output| output.number == number)
    }

    /// Returns the allocated output number, or 0 when rule-gated away.
    pub(crate) fn new_output(
        &mut self,
        acting_rule: RuleNumber,
        target: Option<PlayerNumber>,
        expr: PureExpr,
    ) -> OutputNumber {
        if !self.rule_active(acting_rule) {
            return 0;
        }
        let number = self
            .outputs
            .iter()
            .map(|output| output.number)
            .max()
            .unwrap_or(0)
            + 1;
        self.outputs.push(Output {
            number,
            owner: acting_rule,
            target,
            expr,
            status: OutputStatus::Active,
        });
        number
    }

    pub(crate) fn update_output(
        &mut self,
        acting_rule: RuleNumber,
        number: OutputNumber,
        expr: PureExpr,
    ) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        match self
            .outputs
            .iter_mut()
            .find(|output| output.number == number)
        {
            Some(output) if output.status == OutputStatus::Active => {
                output.expr = expr;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn delete_output(&mut self, acting_rule: RuleNumber, number: OutputNumber) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        match self
            .outputs
            .iter_mut()
            .find(|output| output.number == number)
        {
            Some(output) if output.status == OutputStatus::Active => {
                output.status = OutputStatus::Deleted;
                true
            }
            _ => false,
        }
    }

    /// Re-evaluates the producer expression on demand. An evaluation error
    /// renders inline rather than failing the read.
    pub(crate) fn render_output(&self, number: OutputNumber) -> Option<String> {
        let output = self.output(number)?;
        if output.status != OutputStatus::Active {
            return None;
        }
        Some(match self.eval_pure(&output.expr, output.owner) {
            Ok(Value::String(text)) => text,
            Ok(value) => value.to_string(),
            Err(message) => format!("<output error: {message}>"),
        })
    }

    /// Active outputs visible to `player`: broadcasts plus, when a player is
    /// given, the ones targeted at them.
    pub fn read_outputs(&self, player: Option<PlayerNumber>) -> Vec<String> {
        self.outputs
            .iter()
            .filter(|output| output.status == OutputStatus::Active)
            .filter(|output| match (output.target, player) {
                (None, _) => true,
                (Some(target), Some(player)) => target == player,
                (Some(_), None) => false,
            })
            .filter_map(|output| self.render_output(output.number))
            .collect()
    }

    pub(crate) fn declare_victory(&mut self, acting_rule: RuleNumber, expr: PureExpr) {
        if !self.rule_active(acting_rule) {
            return;
        }
        self.victory = Some(Victory {
            declared_by: acting_rule,
            expr,
        });
        self.emit_victory(acting_rule);
    }

    /// Current winners per the declared victory expression; empty when no
    /// victory stands or its expression misbehaves.
    pub fn read_victory(&self) -> Vec<PlayerNumber> {
        let Some(victory) = &self.victory else {
            return Vec::new();
        };
        match self.eval_pure(&victory.expr, victory.declared_by) {
            Ok(Value::Array(items)) => items.iter().filter_map(Value::as_u64).collect(),
            _ => Vec::new(),
        }
    }

    /// Form descriptors for every input leaf still awaited by a live event,
    /// in trigger order. `player` narrows to one player's forms; `None`
    /// lists all of them.
    pub fn pending_inputs(&self, player: Option<PlayerNumber>) -> Vec<FormField> {
        let mut ordered: Vec<&EventInfo> = self
            .events
            .iter()
            .filter(|event| event.status == EventStatus::Active)
            .collect();
        ordered.sort_unstable_by_key(|event| (event.owner, event.number));

        let mut fields = Vec::new();
        for event in ordered {
            let Ok(remaining) = resolve::remaining_signals(&event.expr, &event.env, self, event.owner)
            else {
                continue;
            };
            for (address, signal) in remaining {
                if let contracts::Signal::Input {
                    player: target,
                    prompt,
                    form,
                } = signal
                {
                    if player.map_or(true, |wanted| wanted == target) {
                        fields.push(FormField {
                            event: event.number,
                            address,
                            player: target,
                            prompt,
                            kind: form.field_kind(),
                        });
                    }
                }
            }
        }
        fields
    }
}
