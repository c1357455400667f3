// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::args::{EventId, GameEvent, Sender};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type Callback = dyn Fn(&Sender, &dyn GameEvent);

/// A subscribable event callback.
///
/// Handlers compare by identity: a clone of a handler is the same handler,
/// two handlers built from identical closures are not. Keep a clone around to
/// unsubscribe later. `EventHandler::default()` has no callback and is
/// rejected with [`KernelError::InvalidHandler`](crate::KernelError::InvalidHandler).
#[derive(Clone, Default)]
pub struct EventHandler {
    callback: Option<Rc<Callback>>,
}

impl EventHandler {
    /// Wraps a callback.
    ///
    /// ## Arguments
    /// * `callback` - Invoked with the sender and the payload of each event
    ///   dispatched to this handler.
    ///
    /// ## Returns
    /// A valid handler. Its clones compare equal to it and to nothing else.
    pub fn new(callback: impl Fn(&Sender, &dyn GameEvent) + 'static) -> Self {
        Self {
            callback: Some(Rc::new(callback)),
        }
    }

    /// Returns `false` if the handler has no callback.
    pub fn is_valid(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn invoke(&self, sender: &Sender, event: &dyn GameEvent) {
        if let Some(callback) = &self.callback {
            callback(sender, event);
        }
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        match (&self.callback, &other.callback) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for EventHandler {}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.callback {
            Some(callback) => write!(f, "EventHandler({:p})", Rc::as_ptr(callback) as *const ()),
            None => f.write_str("EventHandler(<empty>)"),
        }
    }
}

/// Subscription table: event id to handlers in subscription order.
///
/// Ids whose last handler is removed are dropped from the table, so
/// [`len`](Self::len) counts only ids with at least one handler.
#[derive(Debug, Default)]
pub(crate) struct HandlerTable {
    handlers: HashMap<EventId, Vec<EventHandler>>,
}

impl HandlerTable {
    pub fn subscribe(&mut self, id: EventId, handler: EventHandler) {
        self.handlers.entry(id).or_default().push(handler);
    }

    /// Removes the most recent subscription of `handler` to `id`.
    pub fn unsubscribe(&mut self, id: EventId, handler: &EventHandler) -> bool {
        let Some(chain) = self.handlers.get_mut(&id) else {
            return false;
        };
        let Some(position) = chain.iter().rposition(|h| h == handler) else {
            return false;
        };
        chain.remove(position);
        if chain.is_empty() {
            self.handlers.remove(&id);
        }
        true
    }

    /// Copies the chain for `id` so that dispatch is unaffected by
    /// subscriptions made while it runs.
    pub fn snapshot(&self, id: EventId) -> Vec<EventHandler> {
        self.handlers.get(&id).cloned().unwrap_or_default()
    }

    pub fn subscriber_count(&self, id: EventId) -> usize {
        self.handlers.get(&id).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}
