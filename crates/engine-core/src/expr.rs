//! The two expression languages rules are compiled to: effect-free
//! [`PureExpr`] reads a consistent view of the game, effectful [`Expr`]
//! mutates it. Dynamic payloads are `serde_json::Value`; continuations and
//! handlers are shared closures so compiled rules stay cheaply cloneable.

use std::fmt;
use std::sync::Arc;

use contracts::{EventNumber, OutputNumber, PlayerNumber, RuleNumber, ValueKind};
use serde_json::Value;

use crate::event::EventExpr;

/// Monadic continuation of an effectful expression.
pub type Continuation = Arc<dyn Fn(Value) -> Expr + Send + Sync>;

/// Monadic continuation of a pure expression.
pub type PureContinuation = Arc<dyn Fn(Value) -> PureExpr + Send + Sync>;

/// Body run when an event completes; receives the event's result value.
pub type Handler = Arc<dyn Fn(Value) -> Expr + Send + Sync>;

/// Recovery body of a catch frame; receives the raised message.
pub type ErrorHandler = Arc<dyn Fn(String) -> Expr + Send + Sync>;

/// Effect-free expressions, evaluated against a read-only view of the game.
#[derive(Clone)]
pub enum PureExpr {
    Const(Value),
    ReadVar(String),
    /// Rendered text of an output, `Null` if the output is gone.
    ReadOutput(OutputNumber),
    AllRules,
    AllPlayers,
    /// Event list including each event's bound environment; the vote tally
    /// display reads intermediate results through this.
    AllEvents,
    SelfNumber,
    CurrentTime,
    Bind(Box<PureExpr>, PureContinuation),
    /// Runs the effectful expression against a clone of the game, then the
    /// predicate against the clone; the live game is never touched.
    Simulate(Box<Expr>, Box<PureExpr>),
}

/// Effectful expressions. Entity-creating operations evaluate to the
/// allocated number (0 when the write was rule-gated away), expected
/// failures evaluate to `false`, unit operations to `Null`.
#[derive(Clone)]
pub enum Expr {
    Return(Value),
    Bind(Box<Expr>, Continuation),
    Lift(PureExpr),
    NewVar(String, ValueKind, Value),
    WriteVar(String, Value),
    DelVar(String),
    OnEvent(EventExpr, Handler),
    DelEvent(EventNumber),
    NewOutput(Option<PlayerNumber>, PureExpr),
    UpdateOutput(OutputNumber, PureExpr),
    DelOutput(OutputNumber),
    ProposeRule(RuleDef),
    ActivateRule(RuleNumber),
    RejectRule(RuleNumber),
    AddRule(RuleDef),
    ModifyRule(RuleNumber, RuleDef),
    RenamePlayer(PlayerNumber, String),
    RemovePlayer(PlayerNumber),
    DeclareVictory(PureExpr),
    SendMessage(String, Value),
    Random(i64, i64),
    ThrowError(String),
    CatchError(Box<Expr>, ErrorHandler),
    Log(String),
}

/// A rule as submitted by the host: opaque source text plus the compiled
/// body. The number is chosen by the proposer and must be unused.
#[derive(Debug, Clone)]
pub struct RuleDef {
    pub number: RuleNumber,
    pub name: String,
    pub description: String,
    pub code: String,
    pub body: Box<Expr>,
    pub proposed_by: PlayerNumber,
}

impl Expr {
    pub fn bind(self, k: impl Fn(Value) -> Expr + Send + Sync + 'static) -> Expr {
        Expr::Bind(Box::new(self), Arc::new(k))
    }

    /// Sequences two expressions, discarding the first result.
    pub fn then(self, next: Expr) -> Expr {
        self.bind(move |_| next.clone())
    }
}

impl PureExpr {
    pub fn bind(self, k: impl Fn(Value) -> PureExpr + Send + Sync + 'static) -> PureExpr {
        PureExpr::Bind(Box::new(self), Arc::new(k))
    }
}

impl fmt::Debug for PureExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "Const({value})"),
            Self::ReadVar(name) => write!(f, "ReadVar({name:?})"),
            Self::ReadOutput(number) => write!(f, "ReadOutput({number})"),
            Self::AllRules => f.write_str("AllRules"),
            Self::AllPlayers => f.write_str("AllPlayers"),
            Self::AllEvents => f.write_str("AllEvents"),
            Self::SelfNumber => f.write_str("SelfNumber"),
            Self::CurrentTime => f.write_str("CurrentTime"),
            Self::Bind(inner, _) => write!(f, "Bind({inner:?}, <fn>)"),
            Self::Simulate(effect, pred) => write!(f, "Simulate({effect:?}, {pred:?})"),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return(value) => write!(f, "Return({value})"),
            Self::Bind(inner, _) => write!(f, "Bind({inner:?}, <fn>)"),
            Self::Lift(pure) => write!(f, "Lift({pure:?})"),
            Self::NewVar(name, kind, init) => write!(f, "NewVar({name:?}, {kind:?}, {init})"),
            Self::WriteVar(name, value) => write!(f, "WriteVar({name:?}, {value})"),
            Self::DelVar(name) => write!(f, "DelVar({name:?})"),
            Self::OnEvent(expr, _) => write!(f, "OnEvent({expr:?}, <handler>)"),
            Self::DelEvent(number) => write!(f, "DelEvent({number})"),
            Self::NewOutput(target, expr) => write!(f, "NewOutput({target:?}, {expr:?})"),
            Self::UpdateOutput(number, expr) => write!(f, "UpdateOutput({number}, {expr:?})"),
            Self::DelOutput(number) => write!(f, "DelOutput({number})"),
            Self::ProposeRule(def) => write!(f, "ProposeRule({})", def.number),
            Self::ActivateRule(number) => write!(f, "ActivateRule({number})"),
            Self::RejectRule(number) => write!(f, "RejectRule({number})"),
            Self::AddRule(def) => write!(f, "AddRule({})", def.number),
            Self::ModifyRule(number, _) => write!(f, "ModifyRule({number})"),
            Self::RenamePlayer(number, name) => write!(f, "RenamePlayer({number}, {name:?})"),
            Self::RemovePlayer(number) => write!(f, "RemovePlayer({number})"),
            Self::DeclareVictory(expr) => write!(f, "DeclareVictory({expr:?})"),
            Self::SendMessage(name, payload) => write!(f, "SendMessage({name:?}, {payload})"),
            Self::Random(lo, hi) => write!(f, "Random({lo}, {hi})"),
            Self::ThrowError(message) => write!(f, "ThrowError({message:?})"),
            Self::CatchError(body, _) => write!(f, "CatchError({body:?}, <handler>)"),
            Self::Log(message) => write!(f, "Log({message:?})"),
        }
    }
}
