//! Deterministic evaluation engine for a programmable governance game.
//!
//! Participants submit executable rules that mutate a shared [`game::Game`],
//! install observers built from the algebraic event language in [`event`],
//! and call time-bounded polls from [`vote`]. The engine is single-threaded
//! and deterministic per input: all entry points run to completion, and the
//! only randomness is the seeded generator carried inside the game state.

pub mod event;
pub mod expr;
pub mod game;
pub mod resolve;
pub mod vote;

pub use game::Game;
