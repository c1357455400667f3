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

//! Decoupled communication between producers and consumers of events.
//!
//! Handlers subscribe to an [`EventId`]. Publishers either dispatch right away
//! ([`EventManager::publish_immediate`]) or queue the event for the bus's next
//! update ([`EventManager::publish_deferred`]).

mod args;
mod bus;
mod handler;

pub use self::args::{EventArgs, EventId, GameEvent, Sender};
pub use self::bus::{EventBus, EventEmitter};
pub use self::handler::EventHandler;

use crate::error::Result;

/// The event capability, as requested from the module registry.
///
/// Every method takes `&self`: the subscription table and the pending queue
/// are shared with the [`EventEmitter`] handles given out by
/// [`emitter`](Self::emitter).
pub trait EventManager: 'static {
    /// Number of event ids with at least one handler.
    fn handler_count(&self) -> usize;

    /// Number of queued events not yet dispatched.
    fn event_count(&self) -> usize;

    /// Number of handlers subscribed to `id`.
    fn subscriber_count(&self, id: EventId) -> usize;

    /// Appends `handler` to the chain for `id`.
    fn subscribe(&self, id: EventId, handler: EventHandler) -> Result<()>;

    /// Removes `handler` from the chain for `id`, if it is there.
    fn unsubscribe(&self, id: EventId, handler: &EventHandler) -> Result<()>;

    /// Queues `event` for dispatch on the next update.
    fn publish_deferred(&self, sender: Sender, event: EventArgs) -> Result<()>;

    /// Dispatches `event` to its current handlers before returning.
    fn publish_immediate(&self, sender: Sender, event: EventArgs) -> Result<()>;

    /// Returns a handle sharing this manager's table and queue.
    fn emitter(&self) -> EventEmitter;
}
