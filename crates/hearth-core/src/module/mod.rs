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

//! Pluggable kernel subsystems and the registry that drives them.
//!
//! A [`Module`] is a unit of engine-independent state with a priority, a
//! per-tick update hook and a shutdown hook. Callers never name concrete
//! modules: they ask the [`ModuleRegistry`] for a *contract* (a trait object
//! type such as `dyn EventManager`) and the registry resolves it through a
//! [`ContractTable`] populated with [`register_module!`](crate::register_module).

mod contract;
mod registry;

pub use self::contract::{ContractCaster, ContractTable, ModuleRegistration};
pub use self::registry::ModuleRegistry;

use crate::config::KernelConfig;
use std::any::Any;

/// Type-erasure helper implemented for every `'static` type.
///
/// It is a supertrait of [`Module`] so that a `&dyn Module` can be turned back
/// into its concrete type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The foundational interface of every kernel subsystem.
///
/// Modules are created lazily by the [`ModuleRegistry`] through their
/// `Default` constructor, live until the registry shuts down and are never
/// re-created.
pub trait Module: AsAny {
    /// Returns the module priority.
    ///
    /// Higher priorities update first and shut down last. The value is read
    /// once, when the module is inserted, and must not change afterwards.
    fn priority(&self) -> i32 {
        0
    }

    /// Called once, right after construction and before the first update.
    fn attach(&mut self, _config: &KernelConfig) {}

    /// Called once per host tick, in descending priority order.
    ///
    /// Creating other modules from inside `update` is not supported.
    fn update(&mut self, _elapsed: f32, _real_elapsed: f32) {}

    /// Called once at teardown, in ascending priority order.
    fn shutdown(&mut self) {}
}
