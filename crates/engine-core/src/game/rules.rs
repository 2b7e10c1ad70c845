use contracts::RulePhase;

use super::*;
use crate::expr::RuleDef;

impl Game {
    pub(crate) fn rule(&self, number: RuleNumber) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.number == number)
    }

    pub(crate) fn rule_mut(&mut self, number: RuleNumber) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|rule| rule.number == number)
    }

    /// Host entry: submit a proposal under the system actor.
    pub fn propose_rule(&mut self, def: RuleDef) -> bool {
        self.propose_rule_as(SYSTEM_RULE, def)
    }

    /// Host entry: activate a proposed rule under the system actor.
    pub fn activate_rule(&mut self, number: RuleNumber) -> bool {
        self.activate_rule_as(SYSTEM_RULE, number)
    }

    /// Host entry: reject a proposed or active rule under the system actor.
    pub fn reject_rule(&mut self, number: RuleNumber) -> bool {
        self.reject_rule_as(SYSTEM_RULE, number)
    }

    /// Host entry: install a rule as active without a proposal phase.
    pub fn add_rule(&mut self, def: RuleDef) -> bool {
        self.add_rule_as(SYSTEM_RULE, def)
    }

    pub(crate) fn propose_rule_as(&mut self, acting_rule: RuleNumber, def: RuleDef) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        if def.number == SYSTEM_RULE || self.rule(def.number).is_some() {
            return false;
        }
        let number = def.number;
        self.rules.push(Rule {
            number,
            name: def.name,
            description: def.description,
            code: def.code,
            body: *def.body,
            proposed_by: def.proposed_by,
            status: RuleStatus::Proposed,
            assessed_by: None,
        });
        self.emit_rule_phase(RulePhase::Proposed, number);
        true
    }

    /// Proposed -> Active. The freshly activated body runs under the rule's
    /// own number; a failing body is logged, the activation stands.
    pub(crate) fn activate_rule_as(&mut self, acting_rule: RuleNumber, number: RuleNumber) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        let body = match self.rule_mut(number) {
            Some(rule) if rule.status == RuleStatus::Proposed => {
                rule.status = RuleStatus::Active;
                rule.assessed_by = Some(acting_rule);
                rule.body.clone()
            }
            _ => return false,
        };
        if let Err(message) = self.eval_effect(&body, number) {
            self.push_log(None, format!("error in rule {number}: {message}"));
        }
        self.emit_rule_phase(RulePhase::Activated, number);
        true
    }

    /// Proposed/Active -> Rejected, purging everything the rule owns.
    pub(crate) fn reject_rule_as(&mut self, acting_rule: RuleNumber, number: RuleNumber) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        match self.rule_mut(number) {
            Some(rule) if rule.status != RuleStatus::Rejected => {
                rule.status = RuleStatus::Rejected;
                rule.assessed_by = Some(acting_rule);
            }
            _ => return false,
        }
        self.purge_rule_dependents(number);
        self.emit_rule_phase(RulePhase::Rejected, number);
        true
    }

    pub(crate) fn add_rule_as(&mut self, acting_rule: RuleNumber, def: RuleDef) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        if def.number == SYSTEM_RULE || self.rule(def.number).is_some() {
            return false;
        }
        let number = def.number;
        self.rules.push(Rule {
            number,
            name: def.name,
            description: def.description,
            code: def.code,
            body: *def.body,
            proposed_by: def.proposed_by,
            status: RuleStatus::Active,
            assessed_by: Some(acting_rule),
        });
        self.emit_rule_phase(RulePhase::Added, number);
        true
    }

    /// Replaces a rule's text and body in place; number and status survive.
    pub(crate) fn modify_rule_as(
        &mut self,
        acting_rule: RuleNumber,
        number: RuleNumber,
        def: RuleDef,
    ) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        match self.rule_mut(number) {
            Some(rule) if rule.status != RuleStatus::Rejected => {
                rule.name = def.name;
                rule.description = def.description;
                rule.code = def.code;
                rule.body = *def.body;
                rule.proposed_by = def.proposed_by;
            }
            _ => return false,
        }
        self.emit_rule_phase(RulePhase::Modified, number);
        true
    }

    /// Rejection cascade: variables vanish, events and outputs are
    /// tombstoned, the victory record is cleared iff this rule declared it.
    fn purge_rule_dependents(&mut self, number: RuleNumber) {
        self.variables.retain(|variable| variable.owner != number);
        for event in self
            .events
            .iter_mut()
            .filter(|event| event.owner == number && event.status == EventStatus::Active)
        {
            event.status = EventStatus::Deleted;
            event.env.clear();
        }
        for output in self
            .outputs
            .iter_mut()
            .filter(|output| output.owner == number && output.status == OutputStatus::Active)
        {
            output.status = OutputStatus::Deleted;
        }
        if self
            .victory
            .as_ref()
            .is_some_and(|victory| victory.declared_by == number)
        {
            self.victory = None;
        }
    }
}
