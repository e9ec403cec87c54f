//! Scope decorators controlling instance reuse, and the caches behind them.

use crate::error::InjectorError;
use crate::injector::Injector;
use crate::key::Key;
use crate::provider::{Instance, Provider};

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use parking_lot::Mutex;

/// Built-in marker for the singleton scope: one instance per injector.
pub struct Singleton;

/// Built-in marker for the thread scope: one instance per key per thread.
pub struct ThreadScoped;

/// Identity of a scope, derived from a marker type.
///
/// Scope markers map the open-ended scope-annotation identity of a reflective
/// container onto marker types with `TypeId` equality. The built-in markers
/// are [`Singleton`] and [`ThreadScoped`]; custom scopes register their own
/// marker type together with a [`ScopeFactory`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeMarker {
  id: TypeId,
  name: &'static str,
}

impl ScopeMarker {
  pub fn of<S: Any>() -> Self {
    Self {
      id: TypeId::of::<S>(),
      name: type_name::<S>(),
    }
  }

  pub fn singleton() -> Self {
    Self::of::<Singleton>()
  }

  pub fn thread() -> Self {
    Self::of::<ThreadScoped>()
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl fmt::Debug for ScopeMarker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ScopeMarker({})", self.name)
  }
}

/// Produces a scope decorator over an unscoped binding.
pub trait ScopeFactory: Send + Sync {
  /// Wraps the provider of the given binding in a scope decorator. Fails
  /// with [`InjectorError::NestedScope`] when the provider is already a
  /// scope decorator.
  fn scoped_provider(
    &self,
    injector: &Injector,
    key: Key,
    provider: Arc<dyn Provider>,
  ) -> Result<Arc<dyn Provider>, InjectorError>;
}

/// Cache shared by all singleton-scoped bindings of one injector. Keyed by
/// the stable bucket form of the binding key; entries are created at most
/// once per key and live as long as the injector.
#[derive(Default)]
pub(crate) struct SingletonCache {
  entries: DashMap<String, Instance>,
}

impl SingletonCache {
  pub(crate) fn get(&self, key: &Key) -> Option<Instance> {
    self.entries.get(&key.bucket()).map(|entry| entry.value().clone())
  }

  pub(crate) fn put(&self, key: &Key, instance: Instance) {
    self.entries.insert(key.bucket(), instance);
  }

  pub(crate) fn clear(&self) {
    self.entries.clear();
  }
}

/// One thread-bound storage cell, holding an independent value per thread.
#[derive(Default)]
struct ThreadCell {
  slots: DashMap<ThreadId, Instance>,
}

/// Pool of thread-bound cells, one per key, shared by all thread-scoped
/// bindings of one injector. Cells are created at most once per key; values
/// inside a cell are per-thread and are not inherited by child threads.
#[derive(Default)]
pub(crate) struct ThreadCellPool {
  cells: DashMap<String, Arc<ThreadCell>>,
}

impl ThreadCellPool {
  fn cell(&self, key: &Key) -> Arc<ThreadCell> {
    self
      .cells
      .entry(key.bucket())
      .or_insert_with(Default::default)
      .value()
      .clone()
  }

  /// Calling thread's cached instance, without creating the cell.
  fn peek(&self, key: &Key) -> Option<Instance> {
    let cell = self.cells.get(&key.bucket())?.value().clone();
    let slot = cell.slots.get(&thread::current().id())?.value().clone();
    Some(slot)
  }

  pub(crate) fn clear(&self) {
    self.cells.clear();
  }
}

/// Singleton scope decorator: at most one instance per key, shared by all
/// threads of one injector.
///
/// The first `provide` call builds through the wrapped provider and publishes
/// the result in the injector's singleton cache; later calls, from any
/// thread, return the cached instance without further work. Concurrent
/// first-time callers are serialized by a per-decorator build lock with a
/// re-check of the cache under the lock, which is what keeps the build count
/// at exactly one.
pub(crate) struct SingletonScopeProvider {
  key: Key,
  cache: Arc<SingletonCache>,
  build_lock: Mutex<()>,
  provider: Arc<dyn Provider>,
}

impl SingletonScopeProvider {
  /// Scoped providers do not nest, so this fails when the wrapped provider
  /// is itself a scope decorator.
  pub(crate) fn new(
    cache: Arc<SingletonCache>,
    key: Key,
    provider: Arc<dyn Provider>,
  ) -> Result<Self, InjectorError> {
    if provider.is_scoped() {
      return Err(InjectorError::NestedScope(key));
    }
    Ok(Self {
      key,
      cache,
      build_lock: Mutex::new(()),
      provider,
    })
  }
}

impl Provider for SingletonScopeProvider {
  fn provide(&self, injector: &Injector) -> Result<Instance, InjectorError> {
    if let Some(instance) = self.cache.get(&self.key) {
      return Ok(instance);
    }

    let _build = self.build_lock.lock();
    // Another thread may have built and published while we waited.
    if let Some(instance) = self.cache.get(&self.key) {
      return Ok(instance);
    }

    let instance = self.provider.provide(injector)?;
    self.cache.put(&self.key, instance.clone());
    Ok(instance)
  }

  fn type_name(&self) -> &'static str {
    self.provider.type_name()
  }

  fn is_scoped(&self) -> bool {
    true
  }

  fn scope_instance(&self) -> Option<Instance> {
    self.cache.get(&self.key)
  }
}

/// Thread scope decorator: one instance per key per thread.
///
/// The instance is created on the fly on each thread's first `provide` call
/// and reused from the thread's cell afterwards. Values are bound to the
/// creating thread only; child threads build their own.
pub(crate) struct ThreadScopeProvider {
  key: Key,
  pool: Arc<ThreadCellPool>,
  provider: Arc<dyn Provider>,
}

impl ThreadScopeProvider {
  /// Scoped providers do not nest, so this fails when the wrapped provider
  /// is itself a scope decorator.
  pub(crate) fn new(
    pool: Arc<ThreadCellPool>,
    key: Key,
    provider: Arc<dyn Provider>,
  ) -> Result<Self, InjectorError> {
    if provider.is_scoped() {
      return Err(InjectorError::NestedScope(key));
    }
    Ok(Self { key, pool, provider })
  }
}

impl Provider for ThreadScopeProvider {
  fn provide(&self, injector: &Injector) -> Result<Instance, InjectorError> {
    let cell = self.pool.cell(&self.key);
    let thread_id = thread::current().id();

    if let Some(slot) = cell.slots.get(&thread_id) {
      return Ok(slot.value().clone());
    }

    // No cross-thread race here: only the calling thread writes its slot.
    let instance = self.provider.provide(injector)?;
    cell.slots.insert(thread_id, instance.clone());
    Ok(instance)
  }

  fn type_name(&self) -> &'static str {
    self.provider.type_name()
  }

  fn is_scoped(&self) -> bool {
    true
  }

  fn scope_instance(&self) -> Option<Instance> {
    self.pool.peek(&self.key)
  }
}

/// Factory for the built-in singleton scope, registered at injector
/// construction under [`ScopeMarker::singleton`].
pub(crate) struct SingletonScopeFactory;

impl ScopeFactory for SingletonScopeFactory {
  fn scoped_provider(
    &self,
    injector: &Injector,
    key: Key,
    provider: Arc<dyn Provider>,
  ) -> Result<Arc<dyn Provider>, InjectorError> {
    Ok(Arc::new(SingletonScopeProvider::new(
      injector.singleton_cache(),
      key,
      provider,
    )?))
  }
}

/// Factory for the built-in thread scope, registered at injector
/// construction under [`ScopeMarker::thread`].
pub(crate) struct ThreadScopeFactory;

impl ScopeFactory for ThreadScopeFactory {
  fn scoped_provider(
    &self,
    injector: &Injector,
    key: Key,
    provider: Arc<dyn Provider>,
  ) -> Result<Arc<dyn Provider>, InjectorError> {
    Ok(Arc::new(ThreadScopeProvider::new(
      injector.thread_cells(),
      key,
      provider,
    )?))
  }
}
