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

use super::args::{EventArgs, EventId, Sender};
use super::handler::{EventHandler, HandlerTable};
use super::EventManager;
use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::module::Module;
use std::cell::RefCell;
use std::rc::Rc;

/// A deferred publish waiting for the next drain.
struct EventRecord {
    sender: Sender,
    event: EventArgs,
}

/// A cloneable handle onto an [`EventBus`].
///
/// Every clone shares the bus's subscription table and pending queue, so a
/// handler can keep one and publish, subscribe or unsubscribe from inside a
/// dispatch. Changes to the subscription table made during a dispatch apply
/// from the next dispatch of the affected id onwards.
#[derive(Clone)]
pub struct EventEmitter {
    handlers: Rc<RefCell<HandlerTable>>,
    queue: flume::Sender<EventRecord>,
}

impl EventEmitter {
    /// Appends `handler` to the chain for `id`.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidHandler`] if the handler has no callback.
    pub fn subscribe(&self, id: EventId, handler: EventHandler) -> Result<()> {
        if !handler.is_valid() {
            return Err(KernelError::InvalidHandler { id });
        }
        log::debug!("EventBus: Subscribing {handler:?} to {id}");
        self.handlers.borrow_mut().subscribe(id, handler);
        Ok(())
    }

    /// Removes `handler` from the chain for `id`. Does nothing if it is not
    /// subscribed.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidHandler`] if the handler has no callback.
    pub fn unsubscribe(&self, id: EventId, handler: &EventHandler) -> Result<()> {
        if !handler.is_valid() {
            return Err(KernelError::InvalidHandler { id });
        }
        if self.handlers.borrow_mut().unsubscribe(id, handler) {
            log::debug!("EventBus: Unsubscribed {handler:?} from {id}");
        }
        Ok(())
    }

    /// Queues `event` for the bus's next update.
    ///
    /// ## Arguments
    /// * `sender` - Who published the event, handed to every handler.
    /// * `event` - The payload to dispatch on the next update.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidEvent`] if the event has no payload, or if the
    /// bus this emitter belongs to has been dropped.
    pub fn publish_deferred(&self, sender: Sender, event: EventArgs) -> Result<()> {
        if !event.is_valid() {
            return Err(KernelError::InvalidEvent {
                reason: "the event has no payload",
            });
        }
        log::trace!("EventBus: Queueing {event:?}");
        self.queue.send(EventRecord { sender, event }).map_err(|e| {
            log::error!("Failed to queue event: {e}. The event bus was likely dropped.");
            KernelError::InvalidEvent {
                reason: "the event bus is gone",
            }
        })
    }

    /// Runs every handler subscribed to the event's id before returning.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidEvent`] if the event has no payload, or if the
    /// payload is being modified through [`EventArgs::with_mut`]. No handler
    /// runs in either case.
    pub fn publish_immediate(&self, sender: Sender, event: EventArgs) -> Result<()> {
        self.dispatch(&sender, &event)
    }

    /// Number of event ids with at least one handler.
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Number of handlers subscribed to `id`.
    pub fn subscriber_count(&self, id: EventId) -> usize {
        self.handlers.borrow().subscriber_count(id)
    }

    /// Number of queued events not yet dispatched.
    pub fn event_count(&self) -> usize {
        self.queue.len()
    }

    fn dispatch(&self, sender: &Sender, event: &EventArgs) -> Result<()> {
        let Some(payload) = event.payload() else {
            return Err(KernelError::InvalidEvent {
                reason: "the event has no payload",
            });
        };
        let Ok(payload) = payload.try_borrow() else {
            return Err(KernelError::InvalidEvent {
                reason: "the payload is being modified",
            });
        };

        let id = payload.id();
        // Released before any handler runs, handlers may edit the table.
        let chain = self.handlers.borrow().snapshot(id);
        log::trace!("EventBus: Dispatching {id} to {} handler(s)", chain.len());
        for handler in &chain {
            handler.invoke(sender, &*payload);
        }
        Ok(())
    }
}

/// The built-in [`EventManager`] module.
///
/// Deferred events wait on an unbounded `flume` channel and are dispatched
/// during the bus's update, in publish order. The drain keeps going until the
/// channel is empty, so events queued by handlers during the drain are
/// dispatched in the same update.
pub struct EventBus {
    emitter: EventEmitter,
    pending: flume::Receiver<EventRecord>,
    queue_warn_depth: usize,
}

impl EventBus {
    /// Update priority of the bus. It runs ahead of default-priority modules
    /// so that they observe the events of the previous tick.
    pub const PRIORITY: i32 = 100;

    /// Creates an empty bus using the default configuration.
    ///
    /// ## Returns
    /// A bus with no subscription and an empty queue. The warn depth is
    /// replaced by the kernel's on [`Module::attach`].
    pub fn new() -> Self {
        let (queue, pending) = flume::unbounded();
        log::info!("EventBus initialized.");
        Self {
            emitter: EventEmitter {
                handlers: Rc::new(RefCell::new(HandlerTable::default())),
                queue,
            },
            pending,
            queue_warn_depth: KernelConfig::default().events.queue_warn_depth,
        }
    }

    fn drain(&mut self) {
        let mut dispatched = 0usize;
        let mut warned = false;
        while let Ok(record) = self.pending.try_recv() {
            let backlog = self.pending.len();
            if !warned && backlog > self.queue_warn_depth {
                log::warn!(
                    "EventBus: {backlog} events still queued during drain (warn depth {})",
                    self.queue_warn_depth
                );
                warned = true;
            }
            if let Err(e) = self.emitter.dispatch(&record.sender, &record.event) {
                log::error!("EventBus: Dropping a deferred event: {e}");
                continue;
            }
            dispatched += 1;
        }
        if dispatched > 0 {
            log::trace!("EventBus: Drained {dispatched} deferred event(s)");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for EventBus {
    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn attach(&mut self, config: &KernelConfig) {
        self.queue_warn_depth = config.events.queue_warn_depth;
    }

    fn update(&mut self, _elapsed: f32, _real_elapsed: f32) {
        self.drain();
    }

    fn shutdown(&mut self) {
        let dropped = self.pending.drain().count();
        let mut handlers = self.emitter.handlers.borrow_mut();
        log::info!(
            "EventBus: Shutting down, dropping {dropped} queued event(s) and {} subscription(s)",
            handlers.len()
        );
        handlers.clear();
    }
}

impl EventManager for EventBus {
    fn handler_count(&self) -> usize {
        self.emitter.handler_count()
    }

    fn event_count(&self) -> usize {
        self.emitter.event_count()
    }

    fn subscriber_count(&self, id: EventId) -> usize {
        self.emitter.subscriber_count(id)
    }

    fn subscribe(&self, id: EventId, handler: EventHandler) -> Result<()> {
        self.emitter.subscribe(id, handler)
    }

    fn unsubscribe(&self, id: EventId, handler: &EventHandler) -> Result<()> {
        self.emitter.unsubscribe(id, handler)
    }

    fn publish_deferred(&self, sender: Sender, event: EventArgs) -> Result<()> {
        self.emitter.publish_deferred(sender, event)
    }

    fn publish_immediate(&self, sender: Sender, event: EventArgs) -> Result<()> {
        self.emitter.publish_immediate(sender, event)
    }

    fn emitter(&self) -> EventEmitter {
        self.emitter.clone()
    }
}
