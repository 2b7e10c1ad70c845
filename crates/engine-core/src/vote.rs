//! Polls layered on the event language: a shortcut over one timer and one
//! radio ballot per player, terminated as soon as the assess function can
//! decide, with a live tally output while ballots are open.

use std::sync::Arc;

use contracts::{AddressTag, PlayerNumber};
use serde_json::{json, Value};

use crate::event::{self, EventExpr};
use crate::expr::{Expr, Handler, PureExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteStats {
    pub votes_for: usize,
    pub votes_against: usize,
    pub participants: usize,
    pub finished: bool,
}

impl VoteStats {
    pub fn voted(&self) -> usize {
        self.votes_for + self.votes_against
    }

    /// The denominator quotas are measured against: everyone called while
    /// ballots are open, only those who voted once the poll finished.
    pub fn voters(&self) -> usize {
        if self.finished {
            self.voted()
        } else {
            self.participants
        }
    }

    /// Reads a poll's results vector: slot 0 is the timer, the rest one
    /// ballot per called player.
    pub fn from_results(results: &[Option<Value>]) -> Self {
        let timer_fired = results.first().map_or(false, Option::is_some);
        let ballots = results.get(1..).unwrap_or(&[]);
        let mut votes_for = 0;
        let mut votes_against = 0;
        for ballot in ballots {
            match ballot {
                Some(Value::Bool(true)) => votes_for += 1,
                Some(Value::Bool(false)) => votes_against += 1,
                _ => {}
            }
        }
        Self {
            votes_for,
            votes_against,
            participants: ballots.len(),
            finished: timer_fired || ballots.iter().all(Option::is_some),
        }
    }
}

/// Decides a poll outcome from the running tally, or stays pending.
pub type AssessFn = Arc<dyn Fn(&VoteStats) -> Option<bool> + Send + Sync>;

/// Invoked exactly once with the assessed outcome.
pub type OnResult = Arc<dyn Fn(bool) -> Expr + Send + Sync>;

/// Quota decision: passed once `q` ayes exist, failed as soon as the
/// remaining possible ayes cannot reach `q`, pending otherwise.
pub fn vote_quota(quota: usize, stats: &VoteStats) -> Option<bool> {
    if stats.votes_for >= quota {
        Some(true)
    } else if stats.votes_against > stats.voters().saturating_sub(quota) {
        Some(false)
    } else {
        None
    }
}

pub fn unanimity() -> AssessFn {
    Arc::new(|stats| vote_quota(stats.voters(), stats))
}

pub fn majority() -> AssessFn {
    Arc::new(|stats| vote_quota(stats.voters() / 2 + 1, stats))
}

pub fn majority_with(percent: usize) -> AssessFn {
    Arc::new(move |stats| vote_quota(stats.voters() * percent / 100 + 1, stats))
}

pub fn number_votes(count: usize) -> AssessFn {
    Arc::new(move |stats| vote_quota(count, stats))
}

/// Delegates to `inner` once at least `minimum` ballots are in; a finished
/// poll below the quorum fails outright.
pub fn with_quorum(inner: AssessFn, minimum: usize) -> AssessFn {
    Arc::new(move |stats| {
        if stats.voted() >= minimum {
            inner(stats)
        } else if stats.finished {
            Some(false)
        } else {
            None
        }
    })
}

/// Builds the expression that opens a poll over every current player:
/// registers the poll event, installs the live tally output, and evaluates
/// to the poll's event number (0 when the acting rule was gated away).
pub fn call_vote(
    assess: AssessFn,
    deadline: u64,
    title: impl Into<String>,
    on_result: OnResult,
) -> Expr {
    let title = title.into();
    Expr::Lift(PureExpr::AllPlayers).bind(move |players| {
        let voters = player_numbers(&players);
        let poll = poll_event(&voters, deadline, assess.clone(), &title);
        let handler = completion_handler(assess.clone(), on_result.clone(), title.clone());
        let display_voters = voters.clone();
        let display_title = title.clone();
        Expr::OnEvent(poll, handler).bind(move |number| {
            let Some(number) = number.as_u64().filter(|allocated| *allocated > 0) else {
                return Expr::Return(json!(0));
            };
            let display = tally_output(number, display_voters.clone(), display_title.clone());
            Expr::NewOutput(None, display).bind(move |_| Expr::Return(json!(number)))
        })
    })
}

fn player_numbers(players: &Value) -> Vec<PlayerNumber> {
    players
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|player| player.get("number").and_then(Value::as_u64))
                .collect()
        })
        .unwrap_or_default()
}

fn single_vote(player: PlayerNumber, title: &str) -> EventExpr {
    event::input_radio(
        player,
        format!("{title}: your vote"),
        vec![
            (json!(true), "For".to_string()),
            (json!(false), "Against".to_string()),
        ],
    )
}

fn poll_event(
    voters: &[PlayerNumber],
    deadline: u64,
    assess: AssessFn,
    title: &str,
) -> EventExpr {
    let mut children = Vec::with_capacity(voters.len() + 1);
    children.push(event::timer(deadline));
    for &voter in voters {
        children.push(single_vote(voter, title));
    }
    EventExpr::Shortcut(
        children,
        Arc::new(move |results: &[Option<Value>]| {
            let stats = VoteStats::from_results(results);
            stats.finished || assess(&stats).is_some()
        }),
    )
}

fn completion_handler(assess: AssessFn, on_result: OnResult, title: String) -> Handler {
    Arc::new(move |results_value| {
        let results: Vec<Option<Value>> = results_value
            .as_array()
            .map(|list| {
                list.iter()
                    .map(|slot| if slot.is_null() { None } else { Some(slot.clone()) })
                    .collect()
            })
            .unwrap_or_default();
        let stats = VoteStats::from_results(&results);
        let verdict = assess(&stats).unwrap_or(false);
        let note = format!(
            "vote '{title}' {}: {} for / {} against of {}",
            if verdict { "passed" } else { "failed" },
            stats.votes_for,
            stats.votes_against,
            stats.participants,
        );
        Expr::Log(note).then(on_result(verdict))
    })
}

/// Broadcast output reading the poll's live environment: one line per
/// called voter, `for` / `against` / `not voted`.
fn tally_output(event_number: u64, voters: Vec<PlayerNumber>, title: String) -> PureExpr {
    PureExpr::Bind(
        Box::new(PureExpr::AllEvents),
        Arc::new(move |events| {
            let closed = PureExpr::Const(json!(format!("vote '{title}': closed")));
            let Some(entry) = events.as_array().and_then(|list| {
                list.iter()
                    .find(|event| event.get("number").and_then(Value::as_u64) == Some(event_number))
            }) else {
                return closed;
            };
            if entry.get("status").and_then(Value::as_str) != Some("active") {
                return closed;
            }
            let env = entry
                .get("env")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let mut lines = vec![format!("vote '{title}'")];
            for (slot, player) in voters.iter().enumerate() {
                let address =
                    serde_json::to_value(vec![AddressTag::Shortcut(slot as u32 + 1)])
                        .unwrap_or(Value::Null);
                let state = env
                    .iter()
                    .find(|occurrence| occurrence.get("address") == Some(&address))
                    .map(|occurrence| match occurrence.get("payload") {
                        Some(Value::Bool(true)) => "for",
                        Some(Value::Bool(false)) => "against",
                        _ => "voted",
                    })
                    .unwrap_or("not voted");
                lines.push(format!("player {player}: {state}"));
            }
            PureExpr::Const(json!(lines.join("\n")))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(votes_for: usize, votes_against: usize, participants: usize, finished: bool) -> VoteStats {
        VoteStats {
            votes_for,
            votes_against,
            participants,
            finished,
        }
    }

    #[test]
    fn quota_passes_on_enough_ayes() {
        assert_eq!(vote_quota(2, &stats(2, 0, 5, false)), Some(true));
    }

    #[test]
    fn quota_fails_when_ayes_become_unreachable() {
        // 5 voters, quota 4: two nays leave at most 3 ayes
        assert_eq!(vote_quota(4, &stats(1, 2, 5, false)), Some(false));
    }

    #[test]
    fn quota_stays_pending_while_either_side_can_still_win() {
        assert_eq!(vote_quota(3, &stats(2, 2, 5, false)), None);
    }

    #[test]
    fn unanimity_fails_on_first_nay() {
        assert_eq!(unanimity()(&stats(0, 1, 5, false)), Some(false));
    }

    #[test]
    fn unanimity_of_expressed_votes_after_deadline() {
        assert_eq!(unanimity()(&stats(2, 0, 5, true)), Some(true));
    }

    #[test]
    fn majority_decides_at_half_plus_one() {
        assert_eq!(majority()(&stats(3, 0, 5, false)), Some(true));
        assert_eq!(majority()(&stats(2, 3, 5, false)), Some(false));
        assert_eq!(majority()(&stats(2, 2, 5, false)), None);
    }

    #[test]
    fn quorum_blocks_inner_until_enough_ballots() {
        let assess = with_quorum(majority(), 4);
        assert_eq!(assess(&stats(2, 0, 5, false)), None);
        assert_eq!(assess(&stats(2, 0, 5, true)), Some(false));
        assert_eq!(assess(&stats(3, 1, 5, false)), Some(true));
    }

    #[test]
    fn results_vector_reads_timer_and_ballots() {
        let results = vec![
            None,
            Some(json!(true)),
            Some(json!(false)),
            None,
        ];
        let stats = VoteStats::from_results(&results);
        assert_eq!(stats.votes_for, 1);
        assert_eq!(stats.votes_against, 1);
        assert_eq!(stats.participants, 3);
        assert!(!stats.finished);

        let timer_fired = vec![Some(json!(9)), Some(json!(true)), None, None];
        assert!(VoteStats::from_results(&timer_fired).finished);
    }
}
