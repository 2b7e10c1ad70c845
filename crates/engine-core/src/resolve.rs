//! Incremental resolution of event expressions. Resolution is structural:
//! the recursion threads a signal address down the combinator tree, so any
//! leaf is identified by exactly one path and an occurrence bound at one
//! address can never satisfy another.

use contracts::{AddressTag, RuleNumber, Signal, SignalAddress, SignalOccurrence};
use serde_json::Value;

use crate::event::EventExpr;
use crate::game::Game;

/// Outcome of one resolution pass: a final value, or the signals still
/// needed together with the addresses they must arrive at.
#[derive(Debug, Clone, PartialEq)]
pub enum Todo {
    Done(Value),
    Pending(Vec<(SignalAddress, Signal)>),
}

/// Resolves `expr` against the bound occurrences in `env`. Fallible because
/// `LiftPure` runs the pure evaluator under `acting_rule`.
pub fn resolve(
    expr: &EventExpr,
    env: &[SignalOccurrence],
    game: &Game,
    acting_rule: RuleNumber,
) -> Result<Todo, String> {
    let mut path = Vec::new();
    resolve_at(expr, &mut path, env, game, acting_rule)
}

/// The pending half of [`resolve`]: empty when the event is complete.
pub fn remaining_signals(
    expr: &EventExpr,
    env: &[SignalOccurrence],
    game: &Game,
    acting_rule: RuleNumber,
) -> Result<Vec<(SignalAddress, Signal)>, String> {
    match resolve(expr, env, game, acting_rule)? {
        Todo::Done(_) => Ok(Vec::new()),
        Todo::Pending(pending) => Ok(pending),
    }
}

fn resolve_at(
    expr: &EventExpr,
    path: &mut SignalAddress,
    env: &[SignalOccurrence],
    game: &Game,
    acting_rule: RuleNumber,
) -> Result<Todo, String> {
    match expr {
        EventExpr::Pure(value) => Ok(Todo::Done(value.clone())),
        EventExpr::Empty => Ok(Todo::Pending(Vec::new())),
        EventExpr::Signal(signal) => {
            for occurrence in env {
                if occurrence.signal == *signal
                    && occurrence.address.as_deref() == Some(path.as_slice())
                {
                    return Ok(Todo::Done(occurrence.payload.clone()));
                }
            }
            Ok(Todo::Pending(vec![(path.clone(), signal.clone())]))
        }
        EventExpr::Sum(a, b) => {
            path.push(AddressTag::SumL);
            let left = resolve_at(a, path, env, game, acting_rule)?;
            path.pop();
            if matches!(left, Todo::Done(_)) {
                return Ok(left);
            }
            path.push(AddressTag::SumR);
            let right = resolve_at(b, path, env, game, acting_rule)?;
            path.pop();
            if matches!(right, Todo::Done(_)) {
                return Ok(right);
            }
            match (left, right) {
                (Todo::Pending(mut pending), Todo::Pending(more)) => {
                    pending.extend(more);
                    Ok(Todo::Pending(pending))
                }
                _ => unreachable!("done sides returned above"),
            }
        }
        EventExpr::App(a, b, combine) => {
            path.push(AddressTag::AppL);
            let left = resolve_at(a, path, env, game, acting_rule)?;
            path.pop();
            path.push(AddressTag::AppR);
            let right = resolve_at(b, path, env, game, acting_rule)?;
            path.pop();
            match (left, right) {
                (Todo::Done(va), Todo::Done(vb)) => Ok(Todo::Done(combine(va, vb))),
                (Todo::Pending(pending), Todo::Done(_))
                | (Todo::Done(_), Todo::Pending(pending)) => Ok(Todo::Pending(pending)),
                (Todo::Pending(mut pending), Todo::Pending(more)) => {
                    pending.extend(more);
                    Ok(Todo::Pending(pending))
                }
            }
        }
        EventExpr::Bind(a, k) => {
            path.push(AddressTag::BindL);
            let left = resolve_at(a, path, env, game, acting_rule)?;
            path.pop();
            match left {
                Todo::Done(value) => {
                    // The right arm only exists once the left completed; its
                    // leaves live under BindR so stale occurrences from the
                    // left arm cannot rebind.
                    let continued = k(value);
                    path.push(AddressTag::BindR);
                    let result = resolve_at(&continued, path, env, game, acting_rule);
                    path.pop();
                    result
                }
                pending => Ok(pending),
            }
        }
        EventExpr::Shortcut(children, pred) => {
            let mut results = Vec::with_capacity(children.len());
            let mut pending = Vec::new();
            for (index, child) in children.iter().enumerate() {
                path.push(AddressTag::Shortcut(index as u32));
                let resolved = resolve_at(child, path, env, game, acting_rule)?;
                path.pop();
                match resolved {
                    Todo::Done(value) => results.push(Some(value)),
                    Todo::Pending(more) => {
                        results.push(None);
                        pending.extend(more);
                    }
                }
            }
            if pred(&results) {
                let values = results
                    .into_iter()
                    .map(|slot| slot.unwrap_or(Value::Null))
                    .collect();
                Ok(Todo::Done(Value::Array(values)))
            } else {
                Ok(Todo::Pending(pending))
            }
        }
        EventExpr::LiftPure(pure) => game.eval_pure(pure, acting_rule).map(Todo::Done),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{self, EventExpr};
    use contracts::{GameConfig, SYSTEM_RULE};
    use serde_json::json;
    use std::sync::Arc;

    fn game() -> Game {
        Game::new(GameConfig::default())
    }

    fn button(player: u64) -> EventExpr {
        event::input_button(player, "go")
    }

    fn occurrence(signal: &EventExpr, address: SignalAddress, payload: Value) -> SignalOccurrence {
        let EventExpr::Signal(signal) = signal else {
            panic!("not a signal leaf");
        };
        SignalOccurrence {
            signal: signal.clone(),
            payload,
            address: Some(address),
        }
    }

    #[test]
    fn leaf_matches_only_its_own_address() {
        let game = game();
        let expr = button(1).or(button(1));
        let bound_right = occurrence(&button(1), vec![AddressTag::SumR], json!("right"));
        let resolved = resolve(&expr, &[bound_right], &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(resolved, Todo::Done(json!("right")));

        let unbound = SignalOccurrence {
            signal: match button(1) {
                EventExpr::Signal(signal) => signal,
                _ => unreachable!(),
            },
            payload: json!("nowhere"),
            address: None,
        };
        let resolved = resolve(&expr, &[unbound], &game, SYSTEM_RULE).expect("resolve");
        assert!(matches!(resolved, Todo::Pending(pending) if pending.len() == 2));
    }

    #[test]
    fn sum_is_left_biased() {
        let game = game();
        let expr = button(1).or(button(2));
        let env = vec![
            occurrence(&button(2), vec![AddressTag::SumR], json!("two")),
            occurrence(&button(1), vec![AddressTag::SumL], json!("one")),
        ];
        let resolved = resolve(&expr, &env, &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(resolved, Todo::Done(json!("one")));
    }

    #[test]
    fn app_requires_both_sides_and_combines() {
        let game = game();
        let expr = button(1).paired_with(button(2), |a, b| json!([a, b]));
        let left_only = vec![occurrence(&button(1), vec![AddressTag::AppL], json!(null))];
        let resolved = resolve(&expr, &left_only, &game, SYSTEM_RULE).expect("resolve");
        match resolved {
            Todo::Pending(pending) => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].0, vec![AddressTag::AppR]);
            }
            other => panic!("expected pending: {other:?}"),
        }

        let both = vec![
            occurrence(&button(1), vec![AddressTag::AppL], json!("l")),
            occurrence(&button(2), vec![AddressTag::AppR], json!("r")),
        ];
        let resolved = resolve(&expr, &both, &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(resolved, Todo::Done(json!(["l", "r"])));
    }

    #[test]
    fn bind_materialises_right_arm_lazily() {
        let game = game();
        let expr = button(1).and_then(|payload| {
            if payload == json!(null) {
                button(2)
            } else {
                EventExpr::Empty
            }
        });

        let resolved = resolve(&expr, &[], &game, SYSTEM_RULE).expect("resolve");
        match resolved {
            Todo::Pending(pending) => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].0, vec![AddressTag::BindL]);
            }
            other => panic!("expected pending left arm: {other:?}"),
        }

        let env = vec![occurrence(&button(1), vec![AddressTag::BindL], json!(null))];
        let resolved = resolve(&expr, &env, &game, SYSTEM_RULE).expect("resolve");
        match resolved {
            Todo::Pending(pending) => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].0, vec![AddressTag::BindR]);
            }
            other => panic!("expected pending right arm: {other:?}"),
        }
    }

    #[test]
    fn shortcut_children_have_distinct_addresses() {
        let game = game();
        let expr = EventExpr::Shortcut(
            vec![button(1), button(1)],
            Arc::new(|results: &[Option<Value>]| results.iter().all(Option::is_some)),
        );
        let env = vec![occurrence(
            &button(1),
            vec![AddressTag::Shortcut(0)],
            json!(null),
        )];
        let resolved = resolve(&expr, &env, &game, SYSTEM_RULE).expect("resolve");
        match resolved {
            Todo::Pending(pending) => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].0, vec![AddressTag::Shortcut(1)]);
            }
            other => panic!("expected second child pending: {other:?}"),
        }
    }

    #[test]
    fn shortcut_completes_with_null_for_pending_children() {
        let game = game();
        let expr = EventExpr::Shortcut(
            vec![button(1), button(2)],
            Arc::new(|results: &[Option<Value>]| results.iter().any(Option::is_some)),
        );
        let env = vec![occurrence(
            &button(2),
            vec![AddressTag::Shortcut(1)],
            json!("hit"),
        )];
        let resolved = resolve(&expr, &env, &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(resolved, Todo::Done(json!([null, "hit"])));
    }

    #[test]
    fn adding_occurrences_never_regresses_done() {
        let game = game();
        let expr = button(1).or(button(2));
        let mut env = vec![occurrence(&button(1), vec![AddressTag::SumL], json!("one"))];
        let before = resolve(&expr, &env, &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(before, Todo::Done(json!("one")));

        env.push(occurrence(&button(2), vec![AddressTag::SumR], json!("two")));
        let after = resolve(&expr, &env, &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(after, Todo::Done(json!("one")));
    }

    #[test]
    fn empty_never_completes_and_needs_nothing() {
        let game = game();
        let resolved = resolve(&EventExpr::Empty, &[], &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(resolved, Todo::Pending(Vec::new()));
    }

    #[test]
    fn lift_pure_is_done_immediately() {
        let game = game();
        let expr = EventExpr::LiftPure(crate::expr::PureExpr::CurrentTime);
        let resolved = resolve(&expr, &[], &game, SYSTEM_RULE).expect("resolve");
        assert_eq!(resolved, Todo::Done(json!(0)));
    }
}
