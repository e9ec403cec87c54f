//! The injector: bindings table, scope registry and resolution entry point.

use crate::binding::{Binder, Module};
use crate::error::InjectorError;
use crate::guard;
use crate::key::Key;
use crate::provider::{Deferred, Instance, Provider};
use crate::scope::{
  ScopeFactory, ScopeMarker, SingletonCache, SingletonScopeFactory, ThreadCellPool,
  ThreadScopeFactory,
};

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

/// Notification for one successful construction-provider build.
pub struct ProvisionEvent<'a> {
  /// Concrete type produced by the provider that fired the event.
  pub type_name: &'static str,
  /// The provider that performed the build.
  pub provider: &'a dyn Provider,
  /// The produced instance.
  pub instance: &'a Instance,
}

/// Observer of construction-provider builds.
///
/// Listeners run synchronously on the building thread, in registration
/// order, inside the producing provider's construction frame. For a
/// singleton binding that frame is inside the decorator's build lock, so a
/// listener must never resolve the key being provisioned, synchronously,
/// from its callback; that recurses into the construction in progress.
pub trait ProvisionListener: Send + Sync {
  fn on_provision(&self, event: &ProvisionEvent<'_>);
}

struct InjectorCore {
  bindings: OnceCell<HashMap<Key, Arc<dyn Provider>>>,
  scope_factories: DashMap<ScopeMarker, Arc<dyn ScopeFactory>>,
  singletons: Arc<SingletonCache>,
  thread_cells: Arc<ThreadCellPool>,
  listeners: RwLock<Vec<Arc<dyn ProvisionListener>>>,
}

/// The dependency-injection registry.
///
/// An injector owns the key-to-provider bindings table, the singleton and
/// thread-bound caches, and the registered scope factories. It is cheap to
/// clone; clones share the same underlying registry, which is how
/// constructed objects and [`Deferred`] handles keep a reference back to it.
///
/// The lifecycle has two phases: a one-time [`Injector::configure`] call that
/// builds the bindings table from modules, then concurrent resolution from
/// any number of threads. The table is immutable after configuration, so the
/// resolution read path takes no locks.
#[derive(Clone)]
pub struct Injector {
  core: Arc<InjectorCore>,
}

impl Injector {
  /// Creates an unconfigured injector with the built-in singleton and thread
  /// scope factories registered.
  pub fn new() -> Self {
    log::trace!("Injector()");
    let injector = Self {
      core: Arc::new(InjectorCore {
        bindings: OnceCell::new(),
        scope_factories: DashMap::new(),
        singletons: Arc::new(SingletonCache::default()),
        thread_cells: Arc::new(ThreadCellPool::default()),
        listeners: RwLock::new(Vec::new()),
      }),
    };
    injector.register_scope_factory(ScopeMarker::singleton(), Arc::new(SingletonScopeFactory));
    injector.register_scope_factory(ScopeMarker::thread(), Arc::new(ThreadScopeFactory));
    injector
  }

  // --- CONFIGURATION ---

  /// Builds the bindings table from the given modules.
  ///
  /// Runs once per injector instance, before resolution traffic begins; a
  /// second call fails with [`InjectorError::AlreadyConfigured`]. The
  /// injector binds itself under `Key::of::<Injector>()`, so constructed
  /// objects may declare the injector as a dependency. Scope decoration is
  /// applied here: every binding with a scope selection is wrapped by the
  /// decorator produced by the matching scope factory.
  pub fn configure(&self, modules: &[&dyn Module]) -> Result<(), InjectorError> {
    log::trace!("configure()");
    if self.core.bindings.get().is_some() {
      return Err(InjectorError::AlreadyConfigured);
    }

    let mut binder = Binder::new();
    binder.bind::<Injector>().to_instance(self.clone());
    for module in modules {
      module.configure(&mut binder)?;
    }

    let mut table: HashMap<Key, Arc<dyn Provider>> = HashMap::new();
    for binding in binder.into_bindings() {
      let provider = match binding.scope {
        Some(marker) => {
          let factory = self
            .scope_factory(marker)
            .ok_or(InjectorError::UnknownScope(marker.name()))?;
          factory.scoped_provider(self, binding.key.clone(), binding.provider)?
        }
        None => binding.provider,
      };
      log::debug!("Bind {} to provider `{}`.", binding.key, provider.type_name());
      // Last binding wins on duplicate keys.
      table.insert(binding.key, provider);
    }

    self
      .core
      .bindings
      .set(table)
      .map_err(|_| InjectorError::AlreadyConfigured)
  }

  // --- RESOLUTION ---

  /// Resolves an unqualified binding for `T`.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>, InjectorError> {
    self.resolve_key(&Key::of::<T>())
  }

  /// Resolves a binding for `T` under a named qualifier.
  pub fn resolve_named<T: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Arc<T>, InjectorError> {
    self.resolve_key(&Key::named::<T>(name))
  }

  /// Resolves a binding by key. Fails with [`InjectorError::NoBinding`] when
  /// no provider is registered for the key.
  pub fn resolve_key<T: ?Sized + Any + Send + Sync>(
    &self,
    key: &Key,
  ) -> Result<Arc<T>, InjectorError> {
    let instance = self.provide_key(key)?;
    instance.downcast::<T>().ok_or_else(|| {
      InjectorError::provision(format!(
        "provider for {} produced an instance not assignable to `{}`",
        key,
        type_name::<T>()
      ))
    })
  }

  /// Untyped resolution: looks up the provider for the key and invokes it.
  /// This is the entry point construction providers re-enter recursively for
  /// their dependencies.
  pub(crate) fn provide_key(&self, key: &Key) -> Result<Instance, InjectorError> {
    let provider = self
      .provider(key)
      .ok_or_else(|| InjectorError::NoBinding(key.clone()))?;
    provider.provide(self)
  }

  /// Provider registered for the key, if any.
  pub fn provider(&self, key: &Key) -> Option<Arc<dyn Provider>> {
    self.core.bindings.get()?.get(key).cloned()
  }

  // --- SCOPE INTROSPECTION ---

  /// Cached instance of an unqualified scoped binding for `T`, without ever
  /// triggering a build. `None` when the key is unbound, the binding is not
  /// scoped, or the scope has not built yet.
  pub fn peek_scoped<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.peek_scoped_key(&Key::of::<T>())
  }

  /// [`Injector::peek_scoped`] for a named binding.
  pub fn peek_scoped_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
    self.peek_scoped_key(&Key::named::<T>(name))
  }

  /// [`Injector::peek_scoped`] by key.
  pub fn peek_scoped_key<T: ?Sized + Any + Send + Sync>(&self, key: &Key) -> Option<Arc<T>> {
    self.provider(key)?.scope_instance()?.downcast::<T>()
  }

  // --- SCOPE FACTORIES ---

  /// Registers a scope factory under a marker. Built-in markers are
  /// pre-registered; re-registering a marker replaces its factory.
  pub fn register_scope_factory(&self, marker: ScopeMarker, factory: Arc<dyn ScopeFactory>) {
    log::debug!("Register scope factory for `{}`.", marker.name());
    self.core.scope_factories.insert(marker, factory);
  }

  /// Factory registered for the marker, if any.
  pub fn scope_factory(&self, marker: ScopeMarker) -> Option<Arc<dyn ScopeFactory>> {
    self
      .core
      .scope_factories
      .get(&marker)
      .map(|entry| entry.value().clone())
  }

  // --- PROVISION LISTENERS ---

  /// Registers a listener notified of every construction-provider build.
  /// Instance-provider returns and scope-cache hits do not notify.
  pub fn add_provision_listener(&self, listener: Arc<dyn ProvisionListener>) {
    self.core.listeners.write().push(listener);
  }

  /// Removes a previously registered listener, by pointer identity.
  pub fn remove_provision_listener(&self, listener: &Arc<dyn ProvisionListener>) {
    self
      .core
      .listeners
      .write()
      .retain(|registered| !Arc::ptr_eq(registered, listener));
  }

  pub(crate) fn fire_provision(&self, provider: &dyn Provider, instance: &Instance) {
    // Snapshot under the read lock, notify outside it, so a listener may
    // itself register or remove listeners.
    let listeners = self.core.listeners.read().clone();
    let event = ProvisionEvent {
      type_name: provider.type_name(),
      provider,
      instance,
    };
    for listener in listeners {
      listener.on_provision(&event);
    }
  }

  // --- DEFERRED RESOLUTION ---

  /// Deferred handle for an unqualified binding. The binding is not looked
  /// up until [`Deferred::get`] is called.
  pub fn deferred<T: ?Sized + Any + Send + Sync>(&self) -> Deferred<T> {
    Deferred::new(self.clone(), Key::of::<T>())
  }

  /// Deferred handle for a named binding.
  pub fn deferred_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Deferred<T> {
    Deferred::new(self.clone(), Key::named::<T>(name))
  }

  /// Deferred handle for an explicit key.
  pub fn deferred_key<T: ?Sized + Any + Send + Sync>(&self, key: Key) -> Deferred<T> {
    Deferred::new(self.clone(), key)
  }

  // --- TEST SUPPORT ---

  /// Empties the singleton cache, the thread-bound cells and the calling
  /// thread's construction stack. Intended for tests, not production call
  /// sites.
  pub fn clear_scope_caches(&self) {
    log::debug!("Clear scope caches.");
    self.core.singletons.clear();
    self.core.thread_cells.clear();
    guard::reset();
  }

  pub(crate) fn singleton_cache(&self) -> Arc<SingletonCache> {
    self.core.singletons.clone()
  }

  pub(crate) fn thread_cells(&self) -> Arc<ThreadCellPool> {
    self.core.thread_cells.clone()
  }
}

impl Default for Injector {
  fn default() -> Self {
    Self::new()
  }
}
