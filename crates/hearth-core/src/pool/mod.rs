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

//! Recycling of frequently allocated objects.
//!
//! An [`ObjectPool`] owns the instances of one element type. Pools live in an
//! [`ObjectPoolManager`], keyed by element type and name ([`PoolKey`]), and are
//! recovered with their element type through `get_pool`.

mod object_pool;
mod registry;

pub use self::object_pool::{AnyPool, ObjectPool, PoolDescriptor};
pub use self::registry::{ObjectPoolRegistry, PoolKey};

use crate::config::PoolConfig;
use crate::error::{KernelError, Result};
use std::any::{type_name, Any};
use std::hash::Hash;

/// The object-pool capability, as requested from the module registry.
///
/// The methods here work on type-erased pools; the typed operations live on
/// `dyn ObjectPoolManager` itself.
pub trait ObjectPoolManager: 'static {
    /// Number of pools.
    fn count(&self) -> usize;

    /// Defaults applied to pools created through this manager.
    fn config(&self) -> &PoolConfig;

    /// Looks a pool up by key.
    fn pool(&self, key: &PoolKey) -> Option<&dyn AnyPool>;

    /// Looks a pool up by key, mutably.
    fn pool_mut(&mut self, key: &PoolKey) -> Option<&mut dyn AnyPool>;

    /// Takes ownership of `pool` under `key`.
    ///
    /// # Errors
    ///
    /// [`KernelError::PoolAlreadyExists`] if the key is taken.
    fn insert_pool(&mut self, key: PoolKey, pool: Box<dyn AnyPool>) -> Result<&mut dyn AnyPool>;

    /// Destroys and removes the pool under `key`. Returns `false` if there was
    /// none.
    fn destroy_pool_by_key(&mut self, key: &PoolKey) -> bool;

    /// Destroys the free instances of every pool.
    fn release_all_unused(&mut self);

    /// Returns a boxed instance to the pool under `key`.
    ///
    /// # Errors
    ///
    /// * [`KernelError::InvalidObject`] if there is no such pool or the
    ///   instance is not of its element type.
    /// * [`KernelError::NotOwned`] if the instance is not live in that pool.
    fn unspawn_any(&mut self, key: &PoolKey, instance: Box<dyn Any>) -> Result<()>;
}

impl dyn ObjectPoolManager {
    /// Creates the pool described by `descriptor`.
    ///
    /// ## Arguments
    /// * `descriptor` - The pool name, factory and hooks. The name must not be
    ///   empty.
    ///
    /// ## Returns
    /// The new pool, owned by this manager.
    ///
    /// # Errors
    ///
    /// * [`KernelError::InvalidObject`] if the name is empty.
    /// * [`KernelError::PoolAlreadyExists`] if a pool of `T` with the same
    ///   name exists.
    pub fn create_pool<T: Clone + Eq + Hash + 'static>(
        &mut self,
        descriptor: PoolDescriptor<T>,
    ) -> Result<&mut ObjectPool<T>> {
        let key = PoolKey::of::<T>(descriptor.name());
        if key.name().is_empty() {
            return Err(KernelError::InvalidObject {
                pool: key.to_string(),
                reason: "the pool name is empty".to_string(),
            });
        }
        let pool = ObjectPool::with_config(descriptor, self.config());
        let name = key.to_string();
        self.insert_pool(key, Box::new(pool))?
            .as_any_mut()
            .downcast_mut::<ObjectPool<T>>()
            .ok_or_else(|| KernelError::InvalidObject {
                pool: name,
                reason: format!("the stored pool does not hold '{}'", type_name::<T>()),
            })
    }

    /// Returns the pool of `T` called `name`, if any.
    pub fn get_pool<T: Clone + Eq + Hash + 'static>(
        &mut self,
        name: &str,
    ) -> Option<&mut ObjectPool<T>> {
        self.pool_mut(&PoolKey::of::<T>(name))?
            .as_any_mut()
            .downcast_mut::<ObjectPool<T>>()
    }

    /// Returns `true` if a pool of `T` called `name` exists.
    pub fn has_pool<T: 'static>(&self, name: &str) -> bool {
        self.pool(&PoolKey::of::<T>(name)).is_some()
    }

    /// Destroys the pool of `T` called `name`. Does nothing if there is none.
    pub fn destroy_pool<T: 'static>(&mut self, name: &str) {
        self.destroy_pool_by_key(&PoolKey::of::<T>(name));
    }
}
