//! The algebraic event language. An [`EventExpr`] composes primitive
//! signals into an observer that eventually resolves to a value; resolution
//! against an environment of bound occurrences lives in [`crate::resolve`].

use std::fmt;
use std::sync::Arc;

use contracts::{InputForm, PlayerNumber, PlayerPhase, RulePhase, Signal};
use serde_json::Value;

use crate::expr::PureExpr;

/// Combines both completed sides of an applicative pair.
pub type Combine = Arc<dyn Fn(Value, Value) -> Value + Send + Sync>;

/// Materialises the right arm of a bind once the left arm completes.
pub type EventContinuation = Arc<dyn Fn(Value) -> EventExpr + Send + Sync>;

/// Decides completion of a shortcut from the children's current results
/// (`None` for still-pending children).
pub type ShortcutPred = Arc<dyn Fn(&[Option<Value>]) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum EventExpr {
    /// Completes immediately with the value.
    Pure(Value),
    /// Never completes.
    Empty,
    Signal(Signal),
    /// First side to complete wins, left bias on tie.
    Sum(Box<EventExpr>, Box<EventExpr>),
    /// Both sides must complete; their values are merged with the combiner.
    App(Box<EventExpr>, Box<EventExpr>, Combine),
    Bind(Box<EventExpr>, EventContinuation),
    /// Completes as soon as the predicate holds over the current results;
    /// the value is the results vector with `Null` for pending children.
    Shortcut(Vec<EventExpr>, ShortcutPred),
    /// Completes with the pure expression's current value, never pending.
    LiftPure(PureExpr),
}

impl EventExpr {
    pub fn or(self, other: EventExpr) -> EventExpr {
        EventExpr::Sum(Box::new(self), Box::new(other))
    }

    pub fn and_then(self, k: impl Fn(Value) -> EventExpr + Send + Sync + 'static) -> EventExpr {
        EventExpr::Bind(Box::new(self), Arc::new(k))
    }

    pub fn paired_with(
        self,
        other: EventExpr,
        combine: impl Fn(Value, Value) -> Value + Send + Sync + 'static,
    ) -> EventExpr {
        EventExpr::App(Box::new(self), Box::new(other), Arc::new(combine))
    }
}

pub fn input_text(player: PlayerNumber, prompt: impl Into<String>) -> EventExpr {
    input(player, prompt, InputForm::Text)
}

pub fn input_textarea(player: PlayerNumber, prompt: impl Into<String>) -> EventExpr {
    input(player, prompt, InputForm::TextArea)
}

pub fn input_button(player: PlayerNumber, prompt: impl Into<String>) -> EventExpr {
    input(player, prompt, InputForm::Button)
}

pub fn input_radio(
    player: PlayerNumber,
    prompt: impl Into<String>,
    choices: Vec<(Value, String)>,
) -> EventExpr {
    input(player, prompt, InputForm::Radio { choices })
}

pub fn input_checkbox(
    player: PlayerNumber,
    prompt: impl Into<String>,
    choices: Vec<(Value, String)>,
) -> EventExpr {
    input(player, prompt, InputForm::Checkbox { choices })
}

fn input(player: PlayerNumber, prompt: impl Into<String>, form: InputForm) -> EventExpr {
    EventExpr::Signal(Signal::Input {
        player,
        prompt: prompt.into(),
        form,
    })
}

pub fn timer(fire_at: u64) -> EventExpr {
    EventExpr::Signal(Signal::Timer { fire_at })
}

pub fn message(name: impl Into<String>) -> EventExpr {
    EventExpr::Signal(Signal::Message { name: name.into() })
}

pub fn rule_phase(phase: RulePhase) -> EventExpr {
    EventExpr::Signal(Signal::RuleLifecycle { phase })
}

pub fn player_phase(phase: PlayerPhase) -> EventExpr {
    EventExpr::Signal(Signal::PlayerLifecycle { phase })
}

pub fn victory() -> EventExpr {
    EventExpr::Signal(Signal::Victory)
}

impl fmt::Debug for EventExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pure(value) => write!(f, "Pure({value})"),
            Self::Empty => f.write_str("Empty"),
            Self::Signal(signal) => write!(f, "Signal({signal:?})"),
            Self::Sum(a, b) => write!(f, "Sum({a:?}, {b:?})"),
            Self::App(a, b, _) => write!(f, "App({a:?}, {b:?}, <fn>)"),
            Self::Bind(a, _) => write!(f, "Bind({a:?}, <fn>)"),
            Self::Shortcut(children, _) => write!(f, "Shortcut({children:?}, <pred>)"),
            Self::LiftPure(pure) => write!(f, "LiftPure({pure:?})"),
        }
    }
}
