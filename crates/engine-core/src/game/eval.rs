use serde_json::json;

use super::*;

impl Game {
    /// Evaluates an effect-free expression against the current state.
    /// `Simulate` is the one arm that runs the effect evaluator, always
    /// against a clone of the game; the clone (including its random word)
    /// is discarded before returning.
    pub fn eval_pure(&self, expr: &PureExpr, acting_rule: RuleNumber) -> Result<Value, String> {
        match expr {
            PureExpr::Const(value) => Ok(value.clone()),
            PureExpr::ReadVar(name) => Ok(self.read_var(name)),
            PureExpr::ReadOutput(number) => Ok(self
                .render_output(*number)
                .map(Value::String)
                .unwrap_or(Value::Null)),
            PureExpr::AllRules => Ok(self.rules_view()),
            PureExpr::AllPlayers => Ok(self.players_view()),
            PureExpr::AllEvents => Ok(self.events_view()),
            PureExpr::SelfNumber => Ok(json!(acting_rule)),
            PureExpr::CurrentTime => Ok(json!(self.current_tick)),
            PureExpr::Bind(inner, k) => {
                let value = self.eval_pure(inner, acting_rule)?;
                self.eval_pure(&k(value), acting_rule)
            }
            PureExpr::Simulate(effect, predicate) => {
                let mut sandbox = self.clone();
                match sandbox.eval_effect(effect, acting_rule) {
                    Ok(_) => sandbox.eval_pure(predicate, acting_rule),
                    Err(_) => Ok(json!(false)),
                }
            }
        }
    }

    /// Evaluates an effectful expression under `acting_rule`. Writes only
    /// land while the acting rule is active (or is the system, rule 0);
    /// gated-away operations report failure without touching state, so a
    /// rejected rule's still-pending continuations run out harmlessly.
    pub fn eval_effect(&mut self, expr: &Expr, acting_rule: RuleNumber) -> Result<Value, String> {
        match expr {
            Expr::Return(value) => Ok(value.clone()),
            Expr::Bind(inner, k) => {
                let value = self.eval_effect(inner, acting_rule)?;
                self.eval_effect(&k(value), acting_rule)
            }
            Expr::Lift(pure) => self.eval_pure(pure, acting_rule),
            Expr::NewVar(name, kind, init) => {
                Ok(json!(self.new_var(acting_rule, name, *kind, init.clone())))
            }
            Expr::WriteVar(name, value) => {
                Ok(json!(self.write_var(acting_rule, name, value.clone())))
            }
            Expr::DelVar(name) => Ok(json!(self.del_var(acting_rule, name))),
            Expr::OnEvent(event_expr, handler) => Ok(json!(self.register_event(
                acting_rule,
                event_expr.clone(),
                handler.clone()
            ))),
            Expr::DelEvent(number) => Ok(json!(self.delete_event(acting_rule, *number))),
            Expr::NewOutput(target, pure) => {
                Ok(json!(self.new_output(acting_rule, *target, pure.clone())))
            }
            Expr::UpdateOutput(number, pure) => {
                Ok(json!(self.update_output(acting_rule, *number, pure.clone())))
            }
            Expr::DelOutput(number) => Ok(json!(self.delete_output(acting_rule, *number))),
            Expr::ProposeRule(def) => Ok(json!(self.propose_rule_as(acting_rule, def.clone()))),
            Expr::ActivateRule(number) => Ok(json!(self.activate_rule_as(acting_rule, *number))),
            Expr::RejectRule(number) => Ok(json!(self.reject_rule_as(acting_rule, *number))),
            Expr::AddRule(def) => Ok(json!(self.add_rule_as(acting_rule, def.clone()))),
            Expr::ModifyRule(number, def) => {
                Ok(json!(self.modify_rule_as(acting_rule, *number, def.clone())))
            }
            Expr::RenamePlayer(number, name) => {
                Ok(json!(self.rename_player_as(acting_rule, *number, name)))
            }
            Expr::RemovePlayer(number) => Ok(json!(self.remove_player_as(acting_rule, *number))),
            Expr::DeclareVictory(pure) => {
                self.declare_victory(acting_rule, pure.clone());
                Ok(Value::Null)
            }
            Expr::SendMessage(name, payload) => {
                if self.rule_active(acting_rule) {
                    self.inject_message(name.clone(), payload.clone());
                }
                Ok(Value::Null)
            }
            Expr::Random(lo, hi) => {
                if self.rule_active(acting_rule) {
                    Ok(json!(self.next_random(*lo, *hi)))
                } else {
                    // no draw: a dead rule must not perturb the live stream
                    Ok(json!(*lo))
                }
            }
            Expr::ThrowError(message) => Err(message.clone()),
            Expr::CatchError(body, handler) => match self.eval_effect(body, acting_rule) {
                Err(message) => self.eval_effect(&handler(message), acting_rule),
                ok => ok,
            },
            Expr::Log(message) => {
                if self.rule_active(acting_rule) {
                    self.push_log(None, message.clone());
                }
                Ok(Value::Null)
            }
        }
    }

    fn rules_view(&self) -> Value {
        Value::Array(
            self.rules
                .iter()
                .map(|rule| {
                    json!({
                        "number": rule.number,
                        "name": rule.name,
                        "description": rule.description,
                        "proposed_by": rule.proposed_by,
                        "status": serde_json::to_value(rule.status).unwrap_or(Value::Null),
                        "assessed_by": rule.assessed_by,
                    })
                })
                .collect(),
        )
    }

    fn players_view(&self) -> Value {
        Value::Array(
            self.players
                .iter()
                .map(|player| json!({ "number": player.number, "name": player.name }))
                .collect(),
        )
    }

    fn events_view(&self) -> Value {
        Value::Array(
            self.events
                .iter()
                .map(|event| {
                    json!({
                        "number": event.number,
                        "owner": event.owner,
                        "status": serde_json::to_value(event.status).unwrap_or(Value::Null),
                        "env": event
                            .env
                            .iter()
                            .map(|occurrence| {
                                json!({
                                    "address": serde_json::to_value(&occurrence.address)
                                        .unwrap_or(Value::Null),
                                    "payload": occurrence.payload,
                                })
                            })
                            .collect::<Vec<_>>(),
                    })
                })
                .collect(),
        )
    }
}
