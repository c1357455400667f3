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

//! Event payloads, their dispatch key and the opaque sender reference.

use crate::module::AsAny;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Stable integer identifying an event kind. Used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub i32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event #{}", self.0)
    }
}

/// An application-level event.
pub trait GameEvent: AsAny + 'static {
    /// The kind of this event.
    fn id(&self) -> EventId;

    /// Drops any references the payload holds so it can be reused.
    ///
    /// The bus never calls this; it is meant for callers that pool payloads.
    fn clear(&mut self) {}
}

impl dyn GameEvent {
    /// Returns the payload as `T` if it is one.
    pub fn downcast_ref<T: GameEvent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A shared, possibly empty, event payload.
///
/// Cloning is cheap and keeps pointing at the same payload, so the same
/// `EventArgs` can be published, kept by its producer and later refilled.
/// Equality and hashing follow identity, which makes `EventArgs` usable as a
/// pooled element. `EventArgs::default()` holds no payload and is rejected by
/// the bus with [`KernelError::InvalidEvent`](crate::KernelError::InvalidEvent).
#[derive(Clone, Default)]
pub struct EventArgs(Option<Rc<RefCell<dyn GameEvent>>>);

impl EventArgs {
    /// Wraps a payload.
    pub fn new<E: GameEvent>(event: E) -> Self {
        Self(Some(Rc::new(RefCell::new(event))))
    }

    /// Returns `false` if there is no payload.
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Returns the payload's id, if there is a payload.
    pub fn id(&self) -> Option<EventId> {
        self.0.as_ref().map(|payload| payload.borrow().id())
    }

    /// Runs `f` against the payload if it is an `E`.
    ///
    /// Returns `None` if there is no payload, if it has another type, or if
    /// it is currently being dispatched.
    pub fn with_mut<E: GameEvent, R>(&self, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        let payload = self.0.as_ref()?;
        let mut event = payload.try_borrow_mut().ok()?;
        (*event).as_any_mut().downcast_mut::<E>().map(f)
    }

    /// Calls [`GameEvent::clear`] on the payload.
    ///
    /// Returns `false` if there is no payload or if it is currently being
    /// dispatched.
    pub fn clear(&self) -> bool {
        match self.0.as_ref().map(|payload| payload.try_borrow_mut()) {
            Some(Ok(mut event)) => {
                event.clear();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn payload(&self) -> Option<&Rc<RefCell<dyn GameEvent>>> {
        self.0.as_ref()
    }

    fn address(&self) -> *const () {
        self.0
            .as_ref()
            .map_or(std::ptr::null(), |payload| Rc::as_ptr(payload) as *const ())
    }
}

impl PartialEq for EventArgs {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for EventArgs {}

impl Hash for EventArgs {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for EventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref().map(|payload| payload.try_borrow()) {
            Some(Ok(event)) => write!(f, "EventArgs({})", event.id()),
            Some(Err(_)) => f.write_str("EventArgs(<in use>)"),
            None => f.write_str("EventArgs(<empty>)"),
        }
    }
}

/// Opaque reference to whoever published an event.
///
/// Handlers may inspect it with [`downcast_ref`](Self::downcast_ref); the bus
/// only carries it along.
#[derive(Clone, Default)]
pub struct Sender(Option<Rc<dyn Any>>);

impl Sender {
    /// A sender that refers to nobody.
    pub fn none() -> Self {
        Self(None)
    }

    /// Wraps `value` as the sender.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Rc::new(value)))
    }

    /// Uses an already shared object as the sender.
    pub fn from_rc(value: Rc<dyn Any>) -> Self {
        Self(Some(value))
    }

    /// Returns `true` if the sender refers to nobody.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the sender as `T` if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => write!(f, "Sender({:p})", Rc::as_ptr(value) as *const ()),
            None => f.write_str("Sender(<none>)"),
        }
    }
}
