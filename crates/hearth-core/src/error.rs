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

//! Error taxonomy shared by every kernel subsystem.
//!
//! All variants describe caller-side contract violations. None of them is
//! transient, so the kernel never retries; it reports the violation at the
//! point of the offending call and leaves no partial state behind.

use crate::event::EventId;
use thiserror::Error;

/// A specialized `Result` type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

/// Every failure the kernel can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// No concrete module is registered for the requested contract.
    #[error("no module is registered for contract '{contract}'")]
    ModuleNotFound {
        /// The contract that was requested.
        contract: &'static str,
    },
    /// Several concrete modules provide the contract; the caller must name one.
    #[error("contract '{contract}' is provided by several modules ({}), name the concrete type", .candidates.join(", "))]
    AmbiguousModule {
        /// The contract that was requested.
        contract: &'static str,
        /// The concrete modules that all provide it.
        candidates: Vec<&'static str>,
    },
    /// The event handler carries no callback.
    #[error("event handler for {id} is invalid")]
    InvalidHandler {
        /// The event id the handler was (un)subscribed to.
        id: EventId,
    },
    /// The event cannot be dispatched.
    #[error("event is invalid: {reason}")]
    InvalidEvent {
        /// Why the event was rejected.
        reason: &'static str,
    },
    /// The object, or the pool it was handed to, is unusable.
    #[error("object handed to pool '{pool}' is invalid: {reason}")]
    InvalidObject {
        /// The pool the object was handed to.
        pool: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The object is not currently checked out of the pool.
    #[error("object is not spawned from pool '{pool}'")]
    NotOwned {
        /// The pool the object was returned to.
        pool: String,
    },
    /// A pool with the same element type and name already exists.
    #[error("object pool '{key}' already exists")]
    PoolAlreadyExists {
        /// The `type.name` key of the existing pool.
        key: String,
    },
    /// The pool factory produced no usable instance.
    #[error("factory of pool '{pool}' failed: {reason}")]
    FactoryFailed {
        /// The pool whose factory failed.
        pool: String,
        /// What was wrong with the produced instance.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_module_lists_every_candidate() {
        let error = KernelError::AmbiguousModule {
            contract: "dyn Renderer",
            candidates: vec!["Forward", "Deferred"],
        };
        let message = error.to_string();
        assert!(message.contains("Forward, Deferred"), "got: {message}");
    }

    #[test]
    fn handler_error_names_the_event_id() {
        let error = KernelError::InvalidHandler { id: EventId(1001) };
        assert_eq!(error.to_string(), "event handler for event #1001 is invalid");
    }

    #[test]
    fn event_and_object_errors_carry_their_reason() {
        let event = KernelError::InvalidEvent {
            reason: "the event bus is gone",
        };
        assert_eq!(event.to_string(), "event is invalid: the event bus is gone");

        let object = KernelError::InvalidObject {
            pool: "u32.".into(),
            reason: "the pool name is empty".into(),
        };
        assert_eq!(
            object.to_string(),
            "object handed to pool 'u32.' is invalid: the pool name is empty"
        );
    }
}
