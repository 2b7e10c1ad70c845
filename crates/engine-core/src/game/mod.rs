//! The `Game` aggregate: rules, players, variables, events, outputs,
//! victory, log, clock, and the seeded random word. All engine entry points
//! are methods on [`Game`], split across this module's files by concern.

use std::fmt;

use contracts::{
    EventNumber, EventStatus, GameConfig, LogEntry, OutputNumber, OutputStatus, PlayerNumber,
    RuleNumber, RuleStatus, SignalOccurrence, ValueKind, SYSTEM_RULE,
};
use serde_json::Value;

mod eval;
mod events;
mod init;
mod outputs;
mod players;
mod rules;
mod snapshot;
mod triggers;
mod variables;


use crate::event::EventExpr;
use crate::expr::{Expr, Handler, PureExpr};

#[derive(Debug, Clone)]
pub struct Rule {
    pub number: RuleNumber,
    pub name: String,
    pub description: String,
    pub code: String,
    pub body: Expr,
    pub proposed_by: PlayerNumber,
    pub status: RuleStatus,
    /// The rule under whose authority this rule was activated or rejected;
    /// 0 for the system actor. `None` while still proposed.
    pub assessed_by: Option<RuleNumber>,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub number: PlayerNumber,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub owner: RuleNumber,
    pub name: String,
    pub kind: ValueKind,
    pub value: Value,
}

#[derive(Clone)]
pub struct EventInfo {
    pub number: EventNumber,
    pub owner: RuleNumber,
    pub expr: EventExpr,
    pub handler: Handler,
    pub status: EventStatus,
    /// Occurrences already bound to this event's leaves.
    pub env: Vec<SignalOccurrence>,
}

impl fmt::Debug for EventInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInfo")
            .field("number", &self.number)
            .field("owner", &self.owner)
            .field("expr", &self.expr)
            .field("status", &self.status)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    pub number: OutputNumber,
    pub owner: RuleNumber,
    /// `None` broadcasts to every player.
    pub target: Option<PlayerNumber>,
    pub expr: PureExpr,
    pub status: OutputStatus,
}

#[derive(Debug, Clone)]
pub struct Victory {
    pub declared_by: RuleNumber,
    pub expr: PureExpr,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) config: GameConfig,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) rules: Vec<Rule>,
    pub(crate) players: Vec<Player>,
    pub(crate) variables: Vec<Variable>,
    pub(crate) events: Vec<EventInfo>,
    pub(crate) outputs: Vec<Output>,
    pub(crate) victory: Option<Victory>,
    pub(crate) log: Vec<LogEntry>,
    pub(crate) current_tick: u64,
    pub(crate) rng_state: u64,
    pub(crate) trigger_depth: u8,
}

impl Game {
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn events(&self) -> &[EventInfo] {
        &self.events
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn victory(&self) -> Option<&Victory> {
        self.victory.as_ref()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Rule 0 (the system) is implicitly active; every other actor must be
    /// a currently active rule for its writes to land.
    pub(crate) fn rule_active(&self, acting_rule: RuleNumber) -> bool {
        acting_rule == SYSTEM_RULE
            || self
                .rules
                .iter()
                .any(|rule| rule.number == acting_rule && rule.status == RuleStatus::Active)
    }

    pub(crate) fn push_log(&mut self, player: Option<PlayerNumber>, message: impl Into<String>) {
        let sequence = self.log.len() as u64;
        self.log.push(LogEntry {
            player,
            tick: self.current_tick,
            created_at: synthetic_timestamp(self.current_tick, sequence),
            message: message.into(),
        });
        let cap = self.config.max_log_entries.max(1);
        if self.log.len() > cap {
            let excess = self.log.len() - cap;
            self.log.drain(..excess);
        }
    }

    pub(crate) fn next_random(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng_state = mix_word(self.rng_state);
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as u64;
        lo + (self.rng_state % span) as i64
    }
}

pub(crate) fn synthetic_timestamp(tick: u64, sequence: u64) -> String {
    format!(
        "1970-01-01T{:02}:{:02}:{:02}Z",
        (tick / 3600) % 24,
        (tick / 60) % 60,
        (tick + sequence) % 60
    )
}

pub(crate) fn mix_word(state: u64) -> u64 {
    let mut value = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    value ^= value >> 30;
    value = value.wrapping_mul(0x517C_C1B7_2722_0A95);
    value ^= value >> 27;
    value = value.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    value ^ (value >> 31)
}
