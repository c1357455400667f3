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

//! Module registry with lazy creation and priority ordering.

use super::contract::{ContractCaster, ContractTable, ModuleRegistration};
use super::Module;
use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// A live module together with the data read once at insertion.
struct ModuleEntry {
    priority: i32,
    name: &'static str,
    concrete: TypeId,
    module: Box<dyn Module>,
    /// One boxed `ContractCaster<C>` per contract the module provides.
    casters: HashMap<TypeId, Box<dyn Any>>,
}

impl ModuleEntry {
    fn provides(&self, contract: TypeId) -> bool {
        self.casters.contains_key(&contract)
    }

    fn cast<C: ?Sized + 'static>(&self) -> Option<&C> {
        let caster = self
            .casters
            .get(&TypeId::of::<C>())?
            .downcast_ref::<ContractCaster<C>>()?;
        (caster.get)(self.module.as_ref())
    }

    fn cast_mut<C: ?Sized + 'static>(&mut self) -> Option<&mut C> {
        let get_mut = self
            .casters
            .get(&TypeId::of::<C>())?
            .downcast_ref::<ContractCaster<C>>()?
            .get_mut;
        get_mut(self.module.as_mut())
    }
}

/// Registry that owns every live module, sorted by descending priority.
///
/// At most one instance of each concrete module exists. Instances are created
/// on first lookup and only dropped by [`shutdown`](Self::shutdown).
///
/// Among modules of equal priority the most recently created one updates first
/// and shuts down last.
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
    table: ContractTable,
    config: KernelConfig,
}

impl ModuleRegistry {
    /// Creates an empty registry resolving contracts against every
    /// registration submitted with [`register_module!`](crate::register_module).
    pub fn new(config: KernelConfig) -> Self {
        Self::with_table(ContractTable::collected(), config)
    }

    /// Creates an empty registry resolving contracts against `table`.
    pub fn with_table(table: ContractTable, config: KernelConfig) -> Self {
        Self {
            entries: Vec::new(),
            table,
            config,
        }
    }

    /// Returns the module providing contract `C`, creating it if needed.
    ///
    /// # Errors
    ///
    /// * [`KernelError::ModuleNotFound`] if no module is registered for `C`.
    /// * [`KernelError::AmbiguousModule`] if `C` is not live yet and several
    ///   modules are registered for it. Use
    ///   [`get_or_create_with`](Self::get_or_create_with) to pick one.
    pub fn get_or_create<C: ?Sized + 'static>(&mut self) -> Result<&mut C> {
        let contract = TypeId::of::<C>();
        if let Some(index) = self.position(contract) {
            return self.cast_at::<C>(index);
        }

        let registration = {
            let mut providers = self.table.providers(contract);
            match (providers.next(), providers.next()) {
                (Some(registration), None) => *registration,
                (None, _) => {
                    return Err(KernelError::ModuleNotFound {
                        contract: type_name::<C>(),
                    })
                }
                (Some(_), Some(_)) => {
                    return Err(KernelError::AmbiguousModule {
                        contract: type_name::<C>(),
                        candidates: self
                            .table
                            .providers(contract)
                            .map(|r| r.module_name)
                            .collect(),
                    })
                }
            }
        };

        let index = self.create(&registration);
        self.cast_at::<C>(index)
    }

    /// Returns the module providing contract `C`, creating the concrete
    /// module `T` if no module provides `C` yet.
    ///
    /// # Errors
    ///
    /// [`KernelError::ModuleNotFound`] if `T` is not registered as a provider
    /// of `C`.
    pub fn get_or_create_with<C: ?Sized + 'static, T: Module>(&mut self) -> Result<&mut C> {
        let contract = TypeId::of::<C>();
        if let Some(index) = self.position(contract) {
            return self.cast_at::<C>(index);
        }

        let concrete = TypeId::of::<T>();
        if let Some(index) = self.entries.iter().position(|e| e.concrete == concrete) {
            return self.cast_at::<C>(index);
        }

        let registration = self
            .table
            .providers(contract)
            .find(|r| r.builds(concrete))
            .copied()
            .ok_or(KernelError::ModuleNotFound {
                contract: type_name::<C>(),
            })?;

        let index = self.create(&registration);
        self.cast_at::<C>(index)
    }

    /// Returns the live module providing contract `C`, without creating it.
    pub fn get<C: ?Sized + 'static>(&self) -> Option<&C> {
        let index = self.position(TypeId::of::<C>())?;
        self.entries[index].cast::<C>()
    }

    /// Returns `true` if a live module provides contract `C`.
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.position(TypeId::of::<C>()).is_some()
    }

    /// Drives every live module's update, highest priority first.
    ///
    /// Modules must not create other modules from inside their update.
    pub fn update(&mut self, elapsed: f32, real_elapsed: f32) {
        for entry in &mut self.entries {
            entry.module.update(elapsed, real_elapsed);
        }
    }

    /// Shuts every live module down, lowest priority first, then empties
    /// the registry. Calling it on an empty registry does nothing.
    pub fn shutdown(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        log::info!(
            "ModuleRegistry: Shutting down {} module(s)...",
            self.entries.len()
        );
        for entry in self.entries.iter_mut().rev() {
            log::debug!(
                "ModuleRegistry: Shutting down {} (priority={})",
                entry.name,
                entry.priority
            );
            entry.module.shutdown();
        }
        self.entries.clear();
    }

    /// Returns the number of live modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no module is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(module name, priority)` in update order.
    pub fn modules(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.entries.iter().map(|e| (e.name, e.priority))
    }

    /// Returns the configuration handed to modules on attach.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn position(&self, contract: TypeId) -> Option<usize> {
        self.entries.iter().position(|e| e.provides(contract))
    }

    fn cast_at<C: ?Sized + 'static>(&mut self, index: usize) -> Result<&mut C> {
        self.entries[index]
            .cast_mut::<C>()
            .ok_or(KernelError::ModuleNotFound {
                contract: type_name::<C>(),
            })
    }

    /// Builds the module, attaches it and inserts it before the first entry
    /// whose priority is lower than or equal to its own.
    fn create(&mut self, registration: &ModuleRegistration) -> usize {
        let mut module = (registration.create)();
        module.attach(&self.config);
        let priority = module.priority();

        let concrete = (registration.concrete)();
        let casters = self
            .table
            .contracts_of(concrete)
            .map(|r| ((r.contract)(), (r.caster)()))
            .collect();

        let index = self
            .entries
            .iter()
            .position(|e| e.priority <= priority)
            .unwrap_or(self.entries.len());

        self.entries.insert(
            index,
            ModuleEntry {
                priority,
                name: registration.module_name,
                concrete,
                module,
                casters,
            },
        );

        log::info!(
            "ModuleRegistry: Created {} for {} (priority={})",
            registration.module_name,
            registration.contract_name,
            priority
        );
        index
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_registration;
    use std::cell::RefCell;

    thread_local! {
        static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn record(line: String) {
        JOURNAL.with(|j| j.borrow_mut().push(line));
    }

    fn reset_journal() {
        JOURNAL.with(|j| j.borrow_mut().clear());
    }

    fn journal() -> Vec<String> {
        JOURNAL.with(|j| j.borrow().clone())
    }

    trait Ticking {
        fn ticks(&self) -> u32;
    }

    trait Named {
        fn label(&self) -> &'static str;
    }

    trait Unregistered {}

    macro_rules! ticking_module {
        ($name:ident, $priority:expr) => {
            #[derive(Default)]
            struct $name {
                ticks: u32,
            }

            impl Ticking for $name {
                fn ticks(&self) -> u32 {
                    self.ticks
                }
            }

            impl Named for $name {
                fn label(&self) -> &'static str {
                    stringify!($name)
                }
            }

            impl Module for $name {
                fn priority(&self) -> i32 {
                    $priority
                }

                fn update(&mut self, _elapsed: f32, _real_elapsed: f32) {
                    self.ticks += 1;
                    record(format!("update {}", stringify!($name)));
                }

                fn shutdown(&mut self) {
                    record(format!("shutdown {}", stringify!($name)));
                }
            }
        };
    }

    ticking_module!(High, 100);
    ticking_module!(Low, 50);
    ticking_module!(Mid, 75);
    ticking_module!(Peer, 75);

    trait HighOnly {}
    impl HighOnly for High {}
    trait LowOnly {}
    impl LowOnly for Low {}
    trait MidOnly {}
    impl MidOnly for Mid {}
    trait PeerOnly {}
    impl PeerOnly for Peer {}

    fn ordered_table() -> ContractTable {
        ContractTable::new()
            .with(module_registration!(dyn HighOnly => High))
            .with(module_registration!(dyn LowOnly => Low))
            .with(module_registration!(dyn MidOnly => Mid))
    }

    #[test]
    fn get_or_create_returns_the_same_instance() {
        let table = ContractTable::new().with(module_registration!(dyn Ticking => High));
        let mut registry = ModuleRegistry::with_table(table, KernelConfig::default());

        let first = registry.get_or_create::<dyn Ticking>().unwrap() as *const dyn Ticking;
        let second = registry.get_or_create::<dyn Ticking>().unwrap() as *const dyn Ticking;

        assert!(std::ptr::addr_eq(first, second), "lookup must not re-create");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_contract_is_reported() {
        let mut registry = ModuleRegistry::with_table(ordered_table(), KernelConfig::default());
        let error = registry.get_or_create::<dyn Unregistered>().err();
        assert!(matches!(error, Some(KernelError::ModuleNotFound { .. })));
        assert!(registry.is_empty(), "a failed lookup must not create anything");
    }

    #[test]
    fn ambiguous_contract_requires_a_concrete_type() {
        let table = ContractTable::new()
            .with(module_registration!(dyn Ticking => High))
            .with(module_registration!(dyn Ticking => Low));
        let mut registry = ModuleRegistry::with_table(table, KernelConfig::default());

        match registry.get_or_create::<dyn Ticking>() {
            Err(KernelError::AmbiguousModule { candidates, .. }) => {
                assert_eq!(candidates, vec!["High", "Low"]);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("ambiguous lookup should fail"),
        }

        registry.get_or_create_with::<dyn Ticking, Low>().unwrap();
        assert_eq!(registry.modules().collect::<Vec<_>>(), vec![("Low", 50)]);

        // Once live, the contract resolves to the chosen module.
        assert!(registry.get_or_create::<dyn Ticking>().is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concrete_lookup_rejects_unregistered_pairs() {
        let table = ContractTable::new().with(module_registration!(dyn Ticking => High));
        let mut registry = ModuleRegistry::with_table(table, KernelConfig::default());
        let error = registry.get_or_create_with::<dyn Ticking, Low>().err();
        assert!(matches!(error, Some(KernelError::ModuleNotFound { .. })));
    }

    #[test]
    fn one_module_serves_all_of_its_contracts() {
        let table = ContractTable::new()
            .with(module_registration!(dyn Ticking => Mid))
            .with(module_registration!(dyn Named => Mid));
        let mut registry = ModuleRegistry::with_table(table, KernelConfig::default());

        registry.get_or_create::<dyn Ticking>().unwrap();
        registry.update(0.016, 0.016);

        assert_eq!(registry.get_or_create::<dyn Named>().unwrap().label(), "Mid");
        assert_eq!(registry.get::<dyn Ticking>().map(|p| p.ticks()), Some(1));
        assert_eq!(registry.len(), 1, "both contracts share one instance");
    }

    #[test]
    fn update_runs_by_descending_priority_and_shutdown_in_reverse() {
        reset_journal();
        let mut registry = ModuleRegistry::with_table(ordered_table(), KernelConfig::default());
        registry.get_or_create::<dyn LowOnly>().unwrap();
        registry.get_or_create::<dyn HighOnly>().unwrap();
        registry.get_or_create::<dyn MidOnly>().unwrap();

        let priorities: Vec<i32> = registry.modules().map(|(_, p)| p).collect();
        assert_eq!(priorities, vec![100, 75, 50]);

        registry.update(0.016, 0.016);
        registry.shutdown();

        assert_eq!(
            journal(),
            vec![
                "update High",
                "update Mid",
                "update Low",
                "shutdown Low",
                "shutdown Mid",
                "shutdown High",
            ]
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn equal_priorities_update_newest_first_and_shut_down_oldest_first() {
        reset_journal();
        let table = ordered_table().with(module_registration!(dyn PeerOnly => Peer));
        let mut registry = ModuleRegistry::with_table(table, KernelConfig::default());
        registry.get_or_create::<dyn MidOnly>().unwrap();
        registry.get_or_create::<dyn PeerOnly>().unwrap();

        assert_eq!(
            registry.modules().collect::<Vec<_>>(),
            vec![("Peer", 75), ("Mid", 75)]
        );

        registry.update(0.016, 0.016);
        registry.shutdown();

        assert_eq!(
            journal(),
            vec!["update Peer", "update Mid", "shutdown Mid", "shutdown Peer"]
        );
    }

    #[test]
    fn shutdown_is_idempotent() {
        reset_journal();
        let mut registry = ModuleRegistry::with_table(ordered_table(), KernelConfig::default());
        registry.shutdown();
        registry.get_or_create::<dyn HighOnly>().unwrap();
        registry.shutdown();
        registry.shutdown();
        assert_eq!(journal(), vec!["shutdown High"]);
    }

    #[test]
    fn get_does_not_create() {
        let registry = ModuleRegistry::with_table(ordered_table(), KernelConfig::default());
        assert!(registry.get::<dyn HighOnly>().is_none());
        assert!(!registry.contains::<dyn HighOnly>());
    }
}
