use super::*;

impl Game {
    pub(crate) fn new_var(
        &mut self,
        acting_rule: RuleNumber,
        name: &str,
        kind: ValueKind,
        init: Value,
    ) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        if self.variables.iter().any(|variable| variable.name == name) {
            return false;
        }
        if ValueKind::of(&init) != kind {
            return false;
        }
        self.variables.push(Variable {
            owner: acting_rule,
            name: name.to_string(),
            kind,
            value: init,
        });
        true
    }

    /// The kind is fixed at creation; a write of another kind is refused
    /// without mutating.
    pub(crate) fn write_var(&mut self, acting_rule: RuleNumber, name: &str, value: Value) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        match self
            .variables
            .iter_mut()
            .find(|variable| variable.name == name)
        {
            Some(variable) if ValueKind::of(&value) == variable.kind => {
                variable.value = value;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn del_var(&mut self, acting_rule: RuleNumber, name: &str) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        let before = self.variables.len();
        self.variables.retain(|variable| variable.name != name);
        self.variables.len() != before
    }

    pub(crate) fn read_var(&self, name: &str) -> Value {
        self.variables
            .iter()
            .find(|variable| variable.name == name)
            .map(|variable| variable.value.clone())
            .unwrap_or(Value::Null)
    }
}
