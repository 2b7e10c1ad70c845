use super::*;
use crate::resolve::{self, Todo};

impl Game {
    pub(crate) fn event(&self, number: EventNumber) -> Option<&EventInfo> {
        self.events.iter().find(|event| event.number == number)
    }

    pub(crate) fn event_mut(&mut self, number: EventNumber) -> Option<&mut EventInfo> {
        self.events.iter_mut().find(|event| event.number == number)
    }

    /// Installs an observer owned by the acting rule. Returns the allocated
    /// event number, or 0 when the write was rule-gated away. An expression
    /// that needs no signals completes right here.
    pub(crate) fn register_event(
        &mut self,
        acting_rule: RuleNumber,
        expr: EventExpr,
        handler: Handler,
    ) -> EventNumber {
        if !self.rule_active(acting_rule) {
            return 0;
        }
        let number = self
            .events
            .iter()
            .map(|event| event.number)
            .max()
            .unwrap_or(0)
            + 1;
        self.events.push(EventInfo {
            number,
            owner: acting_rule,
            expr,
            handler,
            status: EventStatus::Active,
            env: Vec::new(),
        });
        self.check_event_completion(number);
        number
    }

    /// Tombstones an event; the number stays burned.
    pub(crate) fn delete_event(&mut self, acting_rule: RuleNumber, number: EventNumber) -> bool {
        if !self.rule_active(acting_rule) {
            return false;
        }
        match self.event_mut(number) {
            Some(event) if event.status == EventStatus::Active => {
                event.status = EventStatus::Deleted;
                event.env.clear();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn check_event_completion(&mut self, number: EventNumber) {
        let Some((expr, env, owner, status)) = self
            .event(number)
            .map(|event| (event.expr.clone(), event.env.clone(), event.owner, event.status))
        else {
            return;
        };
        if status != EventStatus::Active {
            return;
        }
        match resolve::resolve(&expr, &env, self, owner) {
            Ok(Todo::Done(value)) => self.complete_event(number, value),
            Ok(Todo::Pending(_)) => {}
            Err(message) => self.push_log(
                None,
                format!("error resolving event {number} of rule {owner}: {message}"),
            ),
        }
    }

    /// Completion is one-shot: the environment is dropped, the event
    /// tombstoned, and the handler runs once under the owning rule. A
    /// raised error that reaches this frame is absorbed into the log and
    /// the trigger loop continues with the next event.
    fn complete_event(&mut self, number: EventNumber, value: Value) {
        let (owner, handler) = match self.event_mut(number) {
            Some(event) => {
                event.status = EventStatus::Deleted;
                event.env.clear();
                (event.owner, event.handler.clone())
            }
            None => return,
        };
        if self.trigger_depth >= self.config.max_trigger_depth {
            self.push_log(
                None,
                format!("trigger depth exceeded, dropping handler of event {number}"),
            );
            return;
        }
        self.trigger_depth += 1;
        let outcome = self.eval_effect(&handler(value), owner);
        self.trigger_depth -= 1;
        if let Err(message) = outcome {
            self.push_log(
                None,
                format!("error in rule {owner} (triggered by event {number}): {message}"),
            );
        }
    }
}
