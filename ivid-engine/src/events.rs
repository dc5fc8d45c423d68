//! Observer plumbing composed into engine components

use std::fmt;

/// An event that can be filtered by kind
pub trait Event {
    type Kind: Copy + PartialEq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Handle returned by [`EventEmitter::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Dispatches events to handlers subscribed by kind
pub struct EventEmitter<E: Event> {
    next_token: u64,
    handlers: Vec<(SubscriptionToken, E::Kind, Handler<E>)>,
}

impl<E: Event> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            next_token: 0,
            handlers: Vec::new(),
        }
    }

    /// Registers a handler for one kind of event
    pub fn subscribe(
        &mut self,
        kind: E::Kind,
        handler: impl FnMut(&E) + 'static,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.handlers.push((token, kind, Box::new(handler)));
        token
    }

    /// Removes a handler. Returns false if the token was unknown.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(t, _, _)| *t != token);
        self.handlers.len() != before
    }

    /// Calls every handler subscribed to the event's kind, in subscription order
    pub fn emit(&mut self, event: &E) -> usize {
        let kind = event.kind();
        let mut called = 0;
        for (_, _, handler) in self.handlers.iter_mut().filter(|(_, k, _)| *k == kind) {
            handler(event);
            called += 1;
        }
        called
    }

    pub fn listener_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.handlers.len())
            .finish()
    }
}
