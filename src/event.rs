//! Contact Event Collection
//!
//! Tracks which body pairs are touching across consecutive ticks and turns
//! the difference into begin / persist / end events for game logic (impact
//! sounds, damage triggers, scripted contacts).
//!
//! The collector is double-buffered: the narrow phase reports every
//! overlapping pair into the current set, and `finish_tick()` diffs it
//! against the previous tick's set.

use std::collections::BTreeMap;

use crate::body::BodyId;
use crate::math::Vec3;

/// Phase of a contact relative to the previous tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    /// Pair started touching this tick
    Begin,
    /// Pair was already touching last tick
    Persist,
    /// Pair stopped touching this tick
    End,
}

/// One contact event emitted by [`EventCollector::finish_tick`].
///
/// `End` events carry the axis and depth from the pair's last overlapping
/// tick.
#[derive(Clone, Copy, Debug)]
pub struct ContactEvent {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub kind: ContactKind,
    /// Separation axis, oriented from `body_a` toward `body_b`
    pub axis: Vec3,
    /// Penetration depth along `axis`
    pub depth: f32,
}

/// Canonical pair key, order-independent.
fn pair_key(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Clone, Copy)]
struct ContactInfo {
    axis: Vec3,
    depth: f32,
}

/// Double-buffered contact pair tracker.
///
/// Pair sets are ordered maps so `finish_tick()` emits events in a stable
/// order (all `Begin`/`Persist` in canonical pair order, then all `End`),
/// keeping replays bit-identical for consumers that react to contacts.
#[derive(Default)]
pub struct EventCollector {
    prev: BTreeMap<(BodyId, BodyId), ContactInfo>,
    curr: BTreeMap<(BodyId, BodyId), ContactInfo>,
    events: Vec<ContactEvent>,
}

impl EventCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an overlapping pair for the current tick. The axis is expected
    /// oriented from `body_a` toward `body_b`; the key is order-independent
    /// so reporting (a, b) and (b, a) across ticks matches up.
    pub fn report(&mut self, body_a: BodyId, body_b: BodyId, axis: Vec3, depth: f32) {
        let key = pair_key(body_a, body_b);
        let info = if key.0 == body_a {
            ContactInfo { axis, depth }
        } else {
            ContactInfo { axis: -axis, depth }
        };
        self.curr.insert(key, info);
    }

    /// Diff current contacts against the previous tick and emit events.
    /// Events stay available through [`events`](Self::events) until the next
    /// tick's narrow phase starts reporting.
    pub fn finish_tick(&mut self) {
        self.events.clear();

        for (&(a, b), info) in &self.curr {
            let kind = if self.prev.contains_key(&(a, b)) {
                ContactKind::Persist
            } else {
                ContactKind::Begin
            };
            self.events.push(ContactEvent {
                body_a: a,
                body_b: b,
                kind,
                axis: info.axis,
                depth: info.depth,
            });
        }
        for (&(a, b), info) in &self.prev {
            if !self.curr.contains_key(&(a, b)) {
                self.events.push(ContactEvent {
                    body_a: a,
                    body_b: b,
                    kind: ContactKind::End,
                    axis: info.axis,
                    depth: info.depth,
                });
            }
        }

        std::mem::swap(&mut self.prev, &mut self.curr);
        self.curr.clear();
    }

    /// Events produced by the most recent `finish_tick()`.
    #[must_use]
    pub fn events(&self) -> &[ContactEvent] {
        &self.events
    }

    /// Drop a body from pair tracking so its removal does not emit a
    /// spurious `End` event on the next tick.
    pub fn forget_body(&mut self, id: BodyId) {
        self.prev.retain(|&(a, b), _| a != id && b != id);
        self.curr.retain(|&(a, b), _| a != id && b != id);
    }

    /// Reset all tracked state, including pending events.
    pub fn clear(&mut self) {
        self.prev.clear();
        self.curr.clear();
        self.events.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
