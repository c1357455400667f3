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

//! The kernel context object handed to host drivers and adapters.

use crate::config::KernelConfig;
use crate::error::Result;
use crate::event::EventManager;
use crate::module::{ContractTable, Module, ModuleRegistry};
use crate::pool::ObjectPoolManager;

/// A snapshot of the kernel's state, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelStats {
    /// Number of completed updates.
    pub frames: u64,
    /// Live modules as `(name, priority)`, in update order.
    pub modules: Vec<(&'static str, i32)>,
    /// Event ids with at least one handler, if the event bus is live.
    pub handler_count: usize,
    /// Deferred events not yet dispatched, if the event bus is live.
    pub queued_events: usize,
    /// Number of object pools, if the pool registry is live.
    pub pool_count: usize,
}

/// Owns the module registry for the lifetime of the process.
///
/// Build one at startup, drive it with [`update`](Self::update) once per
/// frame and let it go (or call [`shutdown`](Self::shutdown)) at exit.
///
/// ```rust
/// use hearth_core::{Kernel, KernelConfig};
///
/// let mut kernel = Kernel::new(KernelConfig::default());
/// assert_eq!(kernel.events().unwrap().handler_count(), 0);
/// kernel.update(0.016, 0.016);
/// kernel.shutdown();
/// assert!(kernel.stats().modules.is_empty());
/// ```
pub struct Kernel {
    registry: ModuleRegistry,
    frames: u64,
}

impl Kernel {
    /// Creates a kernel resolving contracts against every registered module.
    ///
    /// ## Arguments
    /// * `config` - Settings handed to each module when it is attached.
    ///
    /// ## Returns
    /// A kernel with no live module. Modules are created on first lookup.
    pub fn new(config: KernelConfig) -> Self {
        Self::with_table(config, ContractTable::collected())
    }

    /// Creates a kernel resolving contracts against `table` only.
    ///
    /// ## Arguments
    /// * `config` - Settings handed to each module when it is attached.
    /// * `table` - The only registrations lookups may resolve to.
    pub fn with_table(config: KernelConfig, table: ContractTable) -> Self {
        log::info!("Kernel: Starting with {} contract registration(s)", table.len());
        Self {
            registry: ModuleRegistry::with_table(table, config),
            frames: 0,
        }
    }

    /// The configuration handed to modules.
    pub fn config(&self) -> &KernelConfig {
        self.registry.config()
    }

    /// The underlying registry.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Returns the module providing contract `C`, creating it if needed.
    ///
    /// See [`ModuleRegistry::get_or_create`].
    pub fn module<C: ?Sized + 'static>(&mut self) -> Result<&mut C> {
        self.registry.get_or_create::<C>()
    }

    /// Returns the module providing contract `C`, creating `T` if needed.
    ///
    /// See [`ModuleRegistry::get_or_create_with`].
    pub fn module_with<C: ?Sized + 'static, T: Module>(&mut self) -> Result<&mut C> {
        self.registry.get_or_create_with::<C, T>()
    }

    /// The event capability.
    pub fn events(&mut self) -> Result<&mut dyn EventManager> {
        self.module::<dyn EventManager>()
    }

    /// The object-pool capability.
    pub fn pools(&mut self) -> Result<&mut dyn ObjectPoolManager> {
        self.module::<dyn ObjectPoolManager>()
    }

    /// Advances every live module by one frame.
    pub fn update(&mut self, elapsed: f32, real_elapsed: f32) {
        self.registry.update(elapsed, real_elapsed);
        self.frames += 1;
    }

    /// Shuts every live module down. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        log::info!("Kernel: Shutting down after {} frame(s)", self.frames);
        self.registry.shutdown();
    }

    /// Number of completed updates.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Takes a [`KernelStats`] snapshot without creating any module.
    pub fn stats(&self) -> KernelStats {
        let events = self.registry.get::<dyn EventManager>();
        KernelStats {
            frames: self.frames,
            modules: self.registry.modules().collect(),
            handler_count: events.map_or(0, |e| e.handler_count()),
            queued_events: events.map_or(0, |e| e.event_count()),
            pool_count: self
                .registry
                .get::<dyn ObjectPoolManager>()
                .map_or(0, |p| p.count()),
        }
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::pool::ObjectPoolRegistry;

    fn builtin_table() -> ContractTable {
        ContractTable::builtin()
    }

    #[test]
    fn builtin_modules_are_ordered_by_priority() {
        let mut kernel = Kernel::with_table(KernelConfig::default(), builtin_table());
        kernel.pools().unwrap();
        kernel.events().unwrap();

        assert_eq!(
            kernel.stats().modules,
            vec![
                ("EventBus", EventBus::PRIORITY),
                ("ObjectPoolRegistry", ObjectPoolRegistry::PRIORITY)
            ]
        );
    }

    #[test]
    fn stats_do_not_create_modules() {
        let kernel = Kernel::with_table(KernelConfig::default(), builtin_table());
        assert_eq!(kernel.stats(), KernelStats::default());
        assert!(kernel.registry().is_empty());
    }

    #[test]
    fn update_counts_frames_and_shutdown_is_repeatable() {
        let mut kernel = Kernel::with_table(KernelConfig::default(), builtin_table());
        kernel.events().unwrap();
        kernel.update(0.016, 0.016);
        kernel.update(0.016, 0.016);
        assert_eq!(kernel.frame_count(), 2);

        kernel.shutdown();
        kernel.shutdown();
        assert!(kernel.registry().is_empty());
    }

    #[test]
    fn modules_receive_the_kernel_config() {
        let mut config = KernelConfig::default();
        config.pools.destroy_live_on_teardown = true;
        let mut kernel = Kernel::with_table(config, builtin_table());
        assert!(kernel.pools().unwrap().config().destroy_live_on_teardown);
    }
}
