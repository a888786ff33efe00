//! Typed, per-entity event delivery.
//!
//! One `EventChannel<E>` exists per event type (damage, death, aggro
//! triggered, …).  Entities subscribe to the channels they care about;
//! publishing to an entity that has not subscribed is a no-op, the same way
//! an event sent to an object with no handler simply vanishes.
//!
//! Delivery is deferred: `publish` queues, and the owner of the channel
//! drains it at a fixed point in the tick.  That keeps a handler from
//! mutating state that the publisher is still iterating.

use std::collections::{BTreeSet, VecDeque};

use crate::EntityId;

#[derive(Debug)]
pub struct EventChannel<E> {
    subscribers: BTreeSet<EntityId>,
    pending:     VecDeque<(EntityId, E)>,
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self {
            subscribers: BTreeSet::new(),
            pending:     VecDeque::new(),
        }
    }
}

impl<E> EventChannel<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, entity: EntityId) {
        self.subscribers.insert(entity);
    }

    /// Remove `entity` and discard any events still queued for it.
    pub fn unsubscribe(&mut self, entity: EntityId) {
        self.subscribers.remove(&entity);
        self.pending.retain(|(target, _)| *target != entity);
    }

    #[inline]
    pub fn is_subscribed(&self, entity: EntityId) -> bool {
        self.subscribers.contains(&entity)
    }

    /// Queue `event` for `target`.  Returns `false` (and drops the event)
    /// when `target` is not subscribed.
    pub fn publish(&mut self, target: EntityId, event: E) -> bool {
        if !self.subscribers.contains(&target) {
            return false;
        }
        self.pending.push_back((target, event));
        true
    }

    /// Take every queued event in publish order.
    pub fn drain(&mut self) -> Vec<(EntityId, E)> {
        self.pending.drain(..).collect()
    }

    /// Take the events queued for one entity, leaving the rest in place.
    pub fn drain_for(&mut self, target: EntityId) -> Vec<E> {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for (who, event) in self.pending.drain(..) {
            if who == target {
                taken.push(event);
            } else {
                kept.push_back((who, event));
            }
        }
        self.pending = kept;
        taken
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every subscriber and queued event.
    pub fn clear(&mut self) {
        self.subscribers.clear();
        self.pending.clear();
    }
}

impl<E: Clone> EventChannel<E> {
    /// Queue `event` for every subscriber.  Returns how many received it.
    pub fn broadcast(&mut self, event: &E) -> usize {
        for &who in &self.subscribers {
            self.pending.push_back((who, event.clone()));
        }
        self.subscribers.len()
    }
}
