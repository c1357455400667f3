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

use super::object_pool::AnyPool;
use super::ObjectPoolManager;
use crate::config::{KernelConfig, PoolConfig};
use crate::error::{KernelError, Result};
use crate::module::Module;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a pool by element type and name.
#[derive(Clone)]
pub struct PoolKey {
    element: TypeId,
    element_name: &'static str,
    name: String,
}

impl PoolKey {
    /// The key of the pool of `T` called `name`.
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            element: TypeId::of::<T>(),
            element_name: type_name::<T>(),
            name: name.into(),
        }
    }

    /// The pool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Readable name of the element type.
    pub fn element_name(&self) -> &'static str {
        self.element_name
    }
}

impl PartialEq for PoolKey {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element && self.name == other.name
    }
}

impl Eq for PoolKey {}

impl Hash for PoolKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.element_name, self.name)
    }
}

impl fmt::Debug for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolKey({self})")
    }
}

/// The built-in [`ObjectPoolManager`] module.
///
/// Owns every pool until it is destroyed by name or until the module shuts
/// down, which destroys whatever is left.
#[derive(Default)]
pub struct ObjectPoolRegistry {
    pools: HashMap<PoolKey, Box<dyn AnyPool>>,
    config: PoolConfig,
}

impl ObjectPoolRegistry {
    /// Update priority of the pool registry.
    pub const PRIORITY: i32 = 50;

    /// Creates an empty registry using the default configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for ObjectPoolRegistry {
    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn attach(&mut self, config: &KernelConfig) {
        self.config = config.pools.clone();
    }

    fn shutdown(&mut self) {
        if self.pools.is_empty() {
            return;
        }
        log::info!("ObjectPoolRegistry: Destroying {} pool(s)...", self.pools.len());
        for (key, mut pool) in self.pools.drain() {
            log::debug!("ObjectPoolRegistry: Destroying pool {key}");
            pool.destroy();
        }
    }
}

impl ObjectPoolManager for ObjectPoolRegistry {
    fn count(&self) -> usize {
        self.pools.len()
    }

    fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn pool(&self, key: &PoolKey) -> Option<&dyn AnyPool> {
        self.pools.get(key).map(|pool| &**pool)
    }

    fn pool_mut(&mut self, key: &PoolKey) -> Option<&mut dyn AnyPool> {
        match self.pools.get_mut(key) {
            Some(pool) => Some(&mut **pool),
            None => None,
        }
    }

    fn insert_pool(&mut self, key: PoolKey, pool: Box<dyn AnyPool>) -> Result<&mut dyn AnyPool> {
        use std::collections::hash_map::Entry;

        match self.pools.entry(key) {
            Entry::Occupied(entry) => Err(KernelError::PoolAlreadyExists {
                key: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                log::info!("ObjectPoolRegistry: Created pool {}", entry.key());
                Ok(&mut **entry.insert(pool))
            }
        }
    }

    fn destroy_pool_by_key(&mut self, key: &PoolKey) -> bool {
        match self.pools.remove(key) {
            Some(mut pool) => {
                pool.destroy();
                log::info!("ObjectPoolRegistry: Destroyed pool {key}");
                true
            }
            None => false,
        }
    }

    fn release_all_unused(&mut self) {
        for pool in self.pools.values_mut() {
            pool.release_all_unused();
        }
    }

    fn unspawn_any(&mut self, key: &PoolKey, instance: Box<dyn Any>) -> Result<()> {
        match self.pools.get_mut(key) {
            Some(pool) => pool.unspawn_any(instance),
            None => Err(KernelError::InvalidObject {
                pool: key.to_string(),
                reason: format!("there is no pool of '{}' with that name", key.element_name()),
            }),
        }
    }
}
