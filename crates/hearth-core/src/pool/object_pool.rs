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

use crate::config::PoolConfig;
use crate::error::{KernelError, Result};
use crate::module::AsAny;
use std::any::{type_name, Any};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

type Factory<T> = Box<dyn FnMut() -> Option<T>>;
type Hook<T> = Box<dyn FnMut(&mut T)>;
type Destructor<T> = Box<dyn FnMut(T)>;

/// Everything needed to build an [`ObjectPool`].
///
/// ```rust
/// use hearth_core::pool::{ObjectPool, PoolDescriptor};
///
/// let mut next = 0u32;
/// let mut pool = ObjectPool::new(PoolDescriptor::new("ids", move || {
///     next += 1;
///     next
/// }));
///
/// let first = pool.spawn().unwrap();
/// pool.unspawn(first).unwrap();
/// assert_eq!(pool.spawn().unwrap(), first);
/// ```
pub struct PoolDescriptor<T> {
    name: String,
    factory: Factory<T>,
    on_spawn: Option<Hook<T>>,
    on_unspawn: Option<Hook<T>>,
    on_destroy: Option<Destructor<T>>,
    destroy_live_on_teardown: Option<bool>,
}

impl<T: 'static> PoolDescriptor<T> {
    /// Describes a pool whose factory always produces an instance.
    ///
    /// ## Arguments
    /// * `name` - The pool name, unique per element type within a manager.
    /// * `factory` - Builds a new instance when no free one is left.
    pub fn new(name: impl Into<String>, mut factory: impl FnMut() -> T + 'static) -> Self {
        Self::fallible(name, move || Some(factory()))
    }

    /// Describes a pool whose factory may fail by returning `None`.
    ///
    /// ## Arguments
    /// * `name` - The pool name, unique per element type within a manager.
    /// * `factory` - Builds a new instance, or returns `None` when it cannot.
    ///
    /// ## Returns
    /// A descriptor with no hooks and the teardown policy left to the
    /// manager's [`PoolConfig`].
    pub fn fallible(name: impl Into<String>, factory: impl FnMut() -> Option<T> + 'static) -> Self {
        Self {
            name: name.into(),
            factory: Box::new(factory),
            on_spawn: None,
            on_unspawn: None,
            on_destroy: None,
            destroy_live_on_teardown: None,
        }
    }

    /// Called on every instance handed out by [`ObjectPool::spawn`].
    #[must_use]
    pub fn on_spawn(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_spawn = Some(Box::new(hook));
        self
    }

    /// Called on every instance returned through [`ObjectPool::unspawn`].
    #[must_use]
    pub fn on_unspawn(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_unspawn = Some(Box::new(hook));
        self
    }

    /// Called on every instance the pool lets go of.
    #[must_use]
    pub fn on_destroy(mut self, hook: impl FnMut(T) + 'static) -> Self {
        self.on_destroy = Some(Box::new(hook));
        self
    }

    /// Overrides [`PoolConfig::destroy_live_on_teardown`] for this pool.
    #[must_use]
    pub fn destroy_live_on_teardown(mut self, enabled: bool) -> Self {
        self.destroy_live_on_teardown = Some(enabled);
        self
    }

    /// The pool name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A pool of reusable `T` instances with an explicit spawn/unspawn lifecycle.
///
/// Instances are either *free* (on a LIFO stack, ready to be spawned again) or
/// *live* (checked out). Instance identity is the `Eq`/`Hash` of `T`, so `T`
/// is typically a handle such as an id or an `Rc`.
///
/// The pool never resets an instance itself; that is what the spawn and
/// unspawn hooks are for.
pub struct ObjectPool<T> {
    name: String,
    free: Vec<T>,
    live: HashSet<T>,
    factory: Factory<T>,
    on_spawn: Option<Hook<T>>,
    on_unspawn: Option<Hook<T>>,
    on_destroy: Option<Destructor<T>>,
    destroy_live_on_teardown: bool,
}

impl<T: Clone + Eq + Hash + 'static> ObjectPool<T> {
    /// Builds a pool with the default [`PoolConfig`].
    pub fn new(descriptor: PoolDescriptor<T>) -> Self {
        Self::with_config(descriptor, &PoolConfig::default())
    }

    /// Builds a pool, taking defaults the descriptor leaves open from `config`.
    ///
    /// ## Arguments
    /// * `descriptor` - Name, factory and hooks of the pool.
    /// * `config` - Supplies the teardown policy if the descriptor sets none.
    ///
    /// ## Returns
    /// An empty pool. Instances are produced on the first spawns.
    pub fn with_config(descriptor: PoolDescriptor<T>, config: &PoolConfig) -> Self {
        Self {
            destroy_live_on_teardown: descriptor
                .destroy_live_on_teardown
                .unwrap_or(config.destroy_live_on_teardown),
            name: descriptor.name,
            free: Vec::new(),
            live: HashSet::new(),
            factory: descriptor.factory,
            on_spawn: descriptor.on_spawn,
            on_unspawn: descriptor.on_unspawn,
            on_destroy: descriptor.on_destroy,
        }
    }

    /// The pool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of instances the pool tracks, free and live.
    pub fn count(&self) -> usize {
        self.free.len() + self.live.len()
    }

    /// Number of free instances.
    pub fn can_spawn_count(&self) -> usize {
        self.free.len()
    }

    /// Number of checked-out instances.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if `instance` is currently checked out of this pool.
    pub fn is_live(&self, instance: &T) -> bool {
        self.live.contains(instance)
    }

    /// Checks an instance out, reusing the most recently returned one if any.
    ///
    /// The spawn hook runs on the instance before it is recorded as live, so
    /// the hook may change its identity.
    ///
    /// # Errors
    ///
    /// * [`KernelError::FactoryFailed`] if a new instance was needed and the
    ///   factory produced none, or produced one the pool already tracks.
    /// * [`KernelError::InvalidObject`] if the spawn hook turned the instance
    ///   into one the pool already tracks.
    ///
    /// The pool is left unchanged on error.
    pub fn spawn(&mut self) -> Result<T> {
        let (instance, reused) = match self.free.pop() {
            Some(instance) => (instance, true),
            None => (self.produce()?, false),
        };
        let mut spawned = instance.clone();
        if let Some(hook) = self.on_spawn.as_mut() {
            hook(&mut spawned);
        }
        if self.live.contains(&spawned) || self.free.contains(&spawned) {
            if reused {
                self.free.push(instance);
            }
            return Err(KernelError::InvalidObject {
                pool: self.name.clone(),
                reason: "the spawn hook turned it into an instance the pool already tracks"
                    .to_string(),
            });
        }
        self.live.insert(spawned.clone());
        Ok(spawned)
    }

    /// Returns a checked-out instance to the free stack.
    ///
    /// The unspawn hook runs on the instance before it is recorded as free.
    ///
    /// # Errors
    ///
    /// * [`KernelError::NotOwned`] if `instance` is not live in this pool,
    ///   including when it was already returned.
    /// * [`KernelError::InvalidObject`] if the unspawn hook turned it into
    ///   another instance the pool already tracks. It stays live.
    pub fn unspawn(&mut self, instance: T) -> Result<()> {
        if !self.live.contains(&instance) {
            return Err(KernelError::NotOwned {
                pool: self.name.clone(),
            });
        }
        let mut returned = instance.clone();
        if let Some(hook) = self.on_unspawn.as_mut() {
            hook(&mut returned);
        }
        if self.free.contains(&returned) || (returned != instance && self.live.contains(&returned)) {
            return Err(KernelError::InvalidObject {
                pool: self.name.clone(),
                reason: "the unspawn hook turned it into an instance the pool already tracks"
                    .to_string(),
            });
        }
        self.live.remove(&instance);
        self.free.push(returned);
        Ok(())
    }

    /// Destroys every free instance. Live instances are untouched.
    pub fn release_all_unused(&mut self) {
        let released = self.free.len();
        while let Some(instance) = self.free.pop() {
            self.destroy_instance(instance);
        }
        if released > 0 {
            log::debug!("ObjectPool '{}': Released {released} unused instance(s)", self.name);
        }
    }

    /// Destroys every free instance and forgets the live ones.
    ///
    /// Live instances only go through the destroy hook when the pool was
    /// built with `destroy_live_on_teardown`; otherwise the caller is expected
    /// to have returned them first.
    pub fn destroy(&mut self) {
        self.release_all_unused();
        if self.live.is_empty() {
            return;
        }

        if self.destroy_live_on_teardown {
            log::debug!(
                "ObjectPool '{}': Destroying {} live instance(s)",
                self.name,
                self.live.len()
            );
            let live: Vec<T> = self.live.drain().collect();
            for instance in live {
                self.destroy_instance(instance);
            }
        } else {
            log::warn!(
                "ObjectPool '{}': Destroyed with {} live instance(s) still spawned; their destroy hook will not run",
                self.name,
                self.live.len()
            );
            self.live.clear();
        }
    }

    fn produce(&mut self) -> Result<T> {
        let instance = (self.factory)().ok_or_else(|| KernelError::FactoryFailed {
            pool: self.name.clone(),
            reason: "the factory produced no instance",
        })?;
        if self.live.contains(&instance) || self.free.contains(&instance) {
            return Err(KernelError::FactoryFailed {
                pool: self.name.clone(),
                reason: "the factory produced an instance the pool already tracks",
            });
        }
        Ok(instance)
    }

    fn destroy_instance(&mut self, instance: T) {
        if let Some(hook) = self.on_destroy.as_mut() {
            hook(instance);
        }
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("name", &self.name)
            .field("element", &type_name::<T>())
            .field("free", &self.free.len())
            .field("live", &self.live.len())
            .finish()
    }
}

/// The element-type-independent face of an [`ObjectPool`], as stored by an
/// [`ObjectPoolManager`](super::ObjectPoolManager).
pub trait AnyPool: AsAny + 'static {
    /// The pool name.
    fn name(&self) -> &str;
    /// Readable name of the element type.
    fn element_type(&self) -> &'static str;
    /// Number of instances the pool tracks, free and live.
    fn count(&self) -> usize;
    /// Number of free instances.
    fn can_spawn_count(&self) -> usize;
    /// Number of checked-out instances.
    fn live_count(&self) -> usize;
    /// See [`ObjectPool::release_all_unused`].
    fn release_all_unused(&mut self);
    /// See [`ObjectPool::destroy`].
    fn destroy(&mut self);
    /// Returns a boxed instance to the pool.
    ///
    /// Fails with [`KernelError::InvalidObject`] if it is not of the element
    /// type, otherwise behaves like [`ObjectPool::unspawn`].
    fn unspawn_any(&mut self, instance: Box<dyn Any>) -> Result<()>;
}

impl<T: Clone + Eq + Hash + 'static> AnyPool for ObjectPool<T> {
    fn name(&self) -> &str {
        ObjectPool::name(self)
    }

    fn element_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn count(&self) -> usize {
        ObjectPool::count(self)
    }

    fn can_spawn_count(&self) -> usize {
        ObjectPool::can_spawn_count(self)
    }

    fn live_count(&self) -> usize {
        ObjectPool::live_count(self)
    }

    fn release_all_unused(&mut self) {
        ObjectPool::release_all_unused(self);
    }

    fn destroy(&mut self) {
        ObjectPool::destroy(self);
    }

    fn unspawn_any(&mut self, instance: Box<dyn Any>) -> Result<()> {
        match instance.downcast::<T>() {
            Ok(instance) => self.unspawn(*instance),
            Err(_) => Err(KernelError::InvalidObject {
                pool: self.name.clone(),
                reason: format!("expected a '{}'", type_name::<T>()),
            }),
        }
    }
}
