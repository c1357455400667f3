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

//! The explicit contract-to-module mapping.
//!
//! Each [`ModuleRegistration`] ties one contract (a trait object type) to one
//! concrete [`Module`] type. Registrations are plain `Copy` data built from
//! function pointers, so they can be collected at link time with `inventory`
//! or assembled by hand into a [`ContractTable`].

use super::Module;
use std::any::{Any, TypeId};
use std::fmt;

/// Converts a type-erased module into a reference to contract `C`.
///
/// Built by [`module_registration!`](crate::module_registration), where both
/// the contract and the concrete type are known and the unsizing coercion
/// can be written out.
pub struct ContractCaster<C: ?Sized + 'static> {
    /// Shared view of the module through the contract.
    pub get: for<'a> fn(&'a (dyn Module + 'static)) -> Option<&'a C>,
    /// Exclusive view of the module through the contract.
    pub get_mut: for<'a> fn(&'a mut (dyn Module + 'static)) -> Option<&'a mut C>,
}

/// One entry of the contract table: "contract X is provided by module Y".
#[derive(Clone, Copy)]
pub struct ModuleRegistration {
    /// `TypeId` of the contract trait object.
    pub contract: fn() -> TypeId,
    /// Readable contract name, for diagnostics.
    pub contract_name: &'static str,
    /// `TypeId` of the concrete module.
    pub concrete: fn() -> TypeId,
    /// Readable module name, for diagnostics.
    pub module_name: &'static str,
    /// Builds the module through its zero-argument constructor.
    pub create: fn() -> Box<dyn Module>,
    /// Builds the boxed [`ContractCaster`] for this contract.
    pub caster: fn() -> Box<dyn Any>,
}

impl ModuleRegistration {
    /// Returns `true` if this registration provides the given contract.
    pub fn provides(&self, contract: TypeId) -> bool {
        (self.contract)() == contract
    }

    /// Returns `true` if this registration builds the given concrete module.
    pub fn builds(&self, concrete: TypeId) -> bool {
        (self.concrete)() == concrete
    }
}

impl fmt::Debug for ModuleRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistration")
            .field("contract", &self.contract_name)
            .field("module", &self.module_name)
            .finish()
    }
}

inventory::collect!(ModuleRegistration);

/// Builds a [`ModuleRegistration`] for `dyn Contract => Concrete`.
///
/// The concrete type must implement [`Module`], `Default` and the contract.
///
/// ```rust
/// use hearth_core::module::{ContractTable, Module, ModuleRegistry};
/// use hearth_core::{module_registration, KernelConfig};
///
/// trait Clock {
///     fn now(&self) -> f32;
/// }
///
/// #[derive(Default)]
/// struct FrameClock {
///     time: f32,
/// }
///
/// impl Clock for FrameClock {
///     fn now(&self) -> f32 {
///         self.time
///     }
/// }
///
/// impl Module for FrameClock {
///     fn update(&mut self, elapsed: f32, _real_elapsed: f32) {
///         self.time += elapsed;
///     }
/// }
///
/// let table = ContractTable::new().with(module_registration!(dyn Clock => FrameClock));
/// let mut registry = ModuleRegistry::with_table(table, KernelConfig::default());
/// registry.update(0.5, 0.5);
/// assert_eq!(registry.get_or_create::<dyn Clock>().unwrap().now(), 0.0);
/// registry.update(0.5, 0.5);
/// assert_eq!(registry.get_or_create::<dyn Clock>().unwrap().now(), 0.5);
/// ```
#[macro_export]
macro_rules! module_registration {
    ($contract:ty => $concrete:ty) => {{
        fn __create() -> ::std::boxed::Box<dyn $crate::module::Module> {
            ::std::boxed::Box::new(<$concrete as ::std::default::Default>::default())
        }

        #[allow(clippy::manual_map)]
        fn __caster() -> ::std::boxed::Box<dyn ::std::any::Any> {
            ::std::boxed::Box::new($crate::module::ContractCaster::<$contract> {
                get: |module| match $crate::module::AsAny::as_any(module)
                    .downcast_ref::<$concrete>()
                {
                    Some(concrete) => Some(concrete),
                    None => None,
                },
                get_mut: |module| match $crate::module::AsAny::as_any_mut(module)
                    .downcast_mut::<$concrete>()
                {
                    Some(concrete) => Some(concrete),
                    None => None,
                },
            })
        }

        $crate::module::ModuleRegistration {
            contract: ::std::any::TypeId::of::<$contract>,
            contract_name: ::std::stringify!($contract),
            concrete: ::std::any::TypeId::of::<$concrete>,
            module_name: ::std::stringify!($concrete),
            create: __create,
            caster: __caster,
        }
    }};
}

/// Submits `dyn Contract => Concrete` to the link-time contract table read by
/// [`ContractTable::collected`].
#[macro_export]
macro_rules! register_module {
    ($contract:ty => $concrete:ty) => {
        $crate::inventory::submit! {
            $crate::module_registration!($contract => $concrete)
        }
    };
}

/// The set of registrations a [`ModuleRegistry`](super::ModuleRegistry)
/// resolves contracts against.
#[derive(Debug, Clone, Default)]
pub struct ContractTable {
    registrations: Vec<ModuleRegistration>,
}

impl ContractTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Creates a table holding the kernel's own modules: the event bus and
    /// the object-pool registry.
    #[must_use]
    pub fn builtin() -> Self {
        use crate::event::{EventBus, EventManager};
        use crate::pool::{ObjectPoolManager, ObjectPoolRegistry};

        Self::new()
            .with(crate::module_registration!(dyn EventManager => EventBus))
            .with(crate::module_registration!(dyn ObjectPoolManager => ObjectPoolRegistry))
    }

    /// Creates a table holding the [`builtin`](Self::builtin) modules and
    /// every registration submitted with
    /// [`register_module!`](crate::register_module) anywhere in the program.
    ///
    /// ## Returns
    /// The built-in registrations first, then the collected ones. The order
    /// among collected registrations is unspecified.
    #[must_use]
    pub fn collected() -> Self {
        let mut table = Self::builtin();
        for registration in inventory::iter::<ModuleRegistration> {
            table.insert(*registration);
        }
        table
    }

    /// Adds a registration. A second registration of the same
    /// contract/module pair is ignored.
    pub fn insert(&mut self, registration: ModuleRegistration) {
        let contract = (registration.contract)();
        let concrete = (registration.concrete)();
        if self
            .registrations
            .iter()
            .any(|r| r.provides(contract) && r.builds(concrete))
        {
            log::debug!(
                "ContractTable: {} => {} is already registered",
                registration.contract_name,
                registration.module_name
            );
            return;
        }
        self.registrations.push(registration);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, registration: ModuleRegistration) -> Self {
        self.insert(registration);
        self
    }

    /// Iterates over the registrations providing `contract`, in insertion order.
    pub fn providers(&self, contract: TypeId) -> impl Iterator<Item = &ModuleRegistration> {
        self.registrations
            .iter()
            .filter(move |r| r.provides(contract))
    }

    /// Iterates over the registrations whose concrete module is `concrete`.
    pub fn contracts_of(&self, concrete: TypeId) -> impl Iterator<Item = &ModuleRegistration> {
        self.registrations
            .iter()
            .filter(move |r| r.builds(concrete))
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if the table holds no registration.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
