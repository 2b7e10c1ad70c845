use std::sync::Arc;

use contracts::{GameConfig, InputData, RuleStatus, SYSTEM_RULE};
use engine_core::expr::{Expr, RuleDef};
use engine_core::vote::{self, VoteStats};
use engine_core::Game;
use proptest::prelude::*;
use serde_json::Value;

proptest! {
    #[test]
    fn quota_decision_law(
        participants in 0usize..10,
        votes_for in 0usize..10,
        votes_against in 0usize..10,
        quota in 0usize..12,
        finished in proptest::bool::ANY,
    ) {
        prop_assume!(votes_for + votes_against <= participants);
        let stats = VoteStats {
            votes_for,
            votes_against,
            participants,
            finished,
        };
        match vote::vote_quota(quota, &stats) {
            Some(true) => prop_assert!(stats.votes_for >= quota),
            Some(false) => {
                prop_assert!(stats.votes_against > stats.voters().saturating_sub(quota))
            }
            None => {
                prop_assert!(stats.votes_for < quota);
                prop_assert!(stats.votes_against <= stats.voters().saturating_sub(quota));
            }
        }
    }

    #[test]
    fn assess_functions_agree_with_their_quota(
        votes_for in 0usize..8,
        votes_against in 0usize..8,
        extra in 0usize..4,
    ) {
        let participants = votes_for + votes_against + extra;
        let stats = VoteStats {
            votes_for,
            votes_against,
            participants,
            finished: extra == 0,
        };
        prop_assert_eq!(
            vote::majority()(&stats),
            vote::vote_quota(stats.voters() / 2 + 1, &stats)
        );
        prop_assert_eq!(
            vote::unanimity()(&stats),
            vote::vote_quota(stats.voters(), &stats)
        );
        prop_assert_eq!(
            vote::number_votes(2)(&stats),
            vote::vote_quota(2, &stats)
        );
    }
}

fn open_vote(game: &mut Game, rule_number: u64, assess: vote::AssessFn) {
    assert!(game.propose_rule(RuleDef {
        number: rule_number,
        name: format!("rule {rule_number}"),
        description: String::new(),
        code: String::new(),
        body: Box::new(Expr::Return(Value::Null)),
        proposed_by: 1,
    }));
    let deadline = game.current_tick() + 24;
    let on_result: vote::OnResult = Arc::new(move |passed| {
        if passed {
            Expr::ActivateRule(rule_number)
        } else {
            Expr::RejectRule(rule_number)
        }
    });
    let ballot = vote::call_vote(assess, deadline, format!("rule {rule_number}"), on_result);
    game.eval_effect(&ballot, SYSTEM_RULE).expect("vote opens");
}

fn cast_ballot(game: &mut Game, player: u64, aye: bool) -> bool {
    match game.pending_inputs(Some(player)).pop() {
        Some(field) => {
            let choice = if aye { 0 } else { 1 };
            game.inject_input(field.event, field.address, InputData::Radio(choice))
        }
        None => false,
    }
}

#[test]
fn decision_is_reached_once_and_later_ballots_bounce() {
    let mut game = Game::new(GameConfig::default());
    for name in ["ada", "ben", "cas", "dee", "eli"] {
        game.add_player(name);
    }
    open_vote(&mut game, 7, vote::unanimity());

    assert!(cast_ballot(&mut game, 1, false));
    assert_eq!(
        game.rules().iter().find(|rule| rule.number == 7).expect("rule").status,
        RuleStatus::Rejected
    );

    // the poll event is tombstoned: every later ballot is a no-op
    for player in 2..=5 {
        assert!(!cast_ballot(&mut game, player, true));
    }
    assert_eq!(
        game.rules().iter().find(|rule| rule.number == 7).expect("rule").status,
        RuleStatus::Rejected
    );

    let decisions = game
        .log()
        .iter()
        .filter(|entry| entry.message.starts_with("vote 'rule 7'"))
        .count();
    assert_eq!(decisions, 1);
}

#[test]
fn timer_after_the_decision_changes_nothing() {
    let mut game = Game::new(GameConfig::default());
    for name in ["ada", "ben", "cas"] {
        game.add_player(name);
    }
    open_vote(&mut game, 4, vote::majority());

    assert!(cast_ballot(&mut game, 1, true));
    assert!(cast_ballot(&mut game, 2, true));
    assert_eq!(
        game.rules().iter().find(|rule| rule.number == 4).expect("rule").status,
        RuleStatus::Active
    );

    let log_len = game.log().len();
    game.inject_time(game.current_tick() + 48);
    assert_eq!(
        game.rules().iter().find(|rule| rule.number == 4).expect("rule").status,
        RuleStatus::Active
    );
    let decisions = game
        .log()
        .iter()
        .filter(|entry| entry.message.starts_with("vote 'rule 4'"))
        .count();
    assert_eq!(decisions, 1);
    assert!(game.log().len() >= log_len);
}

#[test]
fn zero_voter_poll_decides_at_registration() {
    let mut game = Game::new(GameConfig::default());
    open_vote(&mut game, 3, vote::unanimity());
    // no players were called: the poll finished empty and unanimity of the
    // expressed votes holds vacuously
    assert_eq!(
        game.rules().iter().find(|rule| rule.number == 3).expect("rule").status,
        RuleStatus::Active
    );
}
