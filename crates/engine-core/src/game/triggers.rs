use contracts::{InputData, PlayerPhase, RulePhase, Signal, SignalAddress};
use serde_json::json;

use super::*;
use crate::resolve;

impl Game {
    /// Routes a form submission to one input leaf of one event. The address
    /// must name a pending input signal of that event and the data must fit
    /// its form; anything else drops the submission with a diagnostic log
    /// line and leaves the game untouched.
    pub fn inject_input(
        &mut self,
        event_number: EventNumber,
        address: SignalAddress,
        data: InputData,
    ) -> bool {
        let Some((expr, env, owner, status)) = self
            .event(event_number)
            .map(|event| (event.expr.clone(), event.env.clone(), event.owner, event.status))
        else {
            self.push_log(None, format!("input dropped: no event {event_number}"));
            return false;
        };
        if status != EventStatus::Active {
            self.push_log(
                None,
                format!("input dropped: event {event_number} is not live"),
            );
            return false;
        }
        let remaining = match resolve::remaining_signals(&expr, &env, self, owner) {
            Ok(remaining) => remaining,
            Err(message) => {
                self.push_log(
                    None,
                    format!("error resolving event {event_number} of rule {owner}: {message}"),
                );
                return false;
            }
        };
        let Some((_, signal)) = remaining.iter().find(|(needed, _)| *needed == address) else {
            self.push_log(
                None,
                format!("input dropped: event {event_number} expects nothing at that address"),
            );
            return false;
        };
        let Signal::Input { form, .. } = signal else {
            self.push_log(
                None,
                format!("input dropped: event {event_number} leaf is not an input"),
            );
            return false;
        };
        let Some(payload) = form.payload_for(&data) else {
            self.push_log(
                None,
                format!("input dropped: data does not fit the form of event {event_number}"),
            );
            return false;
        };
        let occurrence = contracts::SignalOccurrence {
            signal: signal.clone(),
            payload,
            address: Some(address),
        };
        if let Some(event) = self.event_mut(event_number) {
            event.env.push(occurrence);
        }
        self.check_event_completion(event_number);
        true
    }

    /// Advances the clock, then fires every timer deadline that has come
    /// due somewhere in a live event, each with its own signal value so
    /// leaf equality holds even when the host's clock overshoots.
    pub fn inject_time(&mut self, now: u64) {
        if now > self.current_tick {
            self.current_tick = now;
        }
        let candidates = self.live_event_numbers();
        let mut due = Vec::new();
        for number in candidates {
            let Some((expr, env, owner)) = self
                .event(number)
                .map(|event| (event.expr.clone(), event.env.clone(), event.owner))
            else {
                continue;
            };
            let Ok(remaining) = resolve::remaining_signals(&expr, &env, self, owner) else {
                continue;
            };
            for (_, signal) in remaining {
                if let Signal::Timer { fire_at } = signal {
                    if fire_at <= now {
                        due.push(fire_at);
                    }
                }
            }
        }
        due.sort_unstable();
        due.dedup();
        for fire_at in due {
            self.broadcast(Signal::Timer { fire_at }, json!(fire_at));
        }
    }

    pub fn inject_message(&mut self, name: impl Into<String>, payload: Value) {
        self.broadcast(Signal::Message { name: name.into() }, payload);
    }

    /// Offers an occurrence to every live event, ascending owning rule then
    /// event number. Handler cascades recurse depth-first through this same
    /// path; the depth guard bounds runaway feedback.
    pub(crate) fn broadcast(&mut self, signal: Signal, payload: Value) {
        if self.trigger_depth >= self.config.max_trigger_depth {
            self.push_log(None, "trigger depth exceeded, dropping signal");
            return;
        }
        self.trigger_depth += 1;
        for number in self.live_event_numbers() {
            self.offer_occurrence(number, &signal, &payload);
        }
        self.trigger_depth -= 1;
    }

    /// Live events in trigger order: ascending owner, then event number.
    fn live_event_numbers(&self) -> Vec<EventNumber> {
        let mut candidates: Vec<(RuleNumber, EventNumber)> = self
            .events
            .iter()
            .filter(|event| event.status == EventStatus::Active)
            .map(|event| (event.owner, event.number))
            .collect();
        candidates.sort_unstable();
        candidates.into_iter().map(|(_, number)| number).collect()
    }

    /// Binds the occurrence at the event's first matching remaining address,
    /// if any; an occurrence the event does not currently need is dropped so
    /// environments cannot grow without bound.
    fn offer_occurrence(&mut self, number: EventNumber, signal: &Signal, payload: &Value) {
        let Some((expr, env, owner, status)) = self
            .event(number)
            .map(|event| (event.expr.clone(), event.env.clone(), event.owner, event.status))
        else {
            return;
        };
        if status != EventStatus::Active {
            return;
        }
        let remaining = match resolve::remaining_signals(&expr, &env, self, owner) {
            Ok(remaining) => remaining,
            Err(message) => {
                self.push_log(
                    None,
                    format!("error resolving event {number} of rule {owner}: {message}"),
                );
                return;
            }
        };
        let Some((address, _)) = remaining
            .into_iter()
            .find(|(_, needed)| needed == signal)
        else {
            return;
        };
        if let Some(event) = self.event_mut(number) {
            event.env.push(contracts::SignalOccurrence {
                signal: signal.clone(),
                payload: payload.clone(),
                address: Some(address),
            });
        }
        self.check_event_completion(number);
    }

    pub(crate) fn emit_rule_phase(&mut self, phase: RulePhase, rule_number: RuleNumber) {
        self.broadcast(Signal::RuleLifecycle { phase }, json!(rule_number));
    }

    pub(crate) fn emit_player_phase(&mut self, phase: PlayerPhase, player_number: PlayerNumber) {
        self.broadcast(Signal::PlayerLifecycle { phase }, json!(player_number));
    }

    pub(crate) fn emit_victory(&mut self, declared_by: RuleNumber) {
        self.broadcast(Signal::Victory, json!(declared_by));
    }
}
