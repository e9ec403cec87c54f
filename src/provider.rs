//! Providers: capability objects that produce instances on demand.

use crate::error::InjectorError;
use crate::guard::ConstructionGuard;
use crate::injector::Injector;
use crate::key::Key;
use crate::scope::ScopeMarker;

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type-erased, shareable service instance.
///
/// Internally this is an `Arc<T>` (where `T` may be unsized, e.g. a trait
/// object) erased behind `dyn Any`. Cloning is cheap and shares the
/// underlying value, which is what lets scope decorators cache instances
/// without knowing their concrete type.
#[derive(Clone)]
pub struct Instance {
  value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
  /// Erases a shared value. The inner `Arc` is recovered by
  /// [`Instance::downcast`] with the same `T`.
  pub fn new<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      value: Arc::new(value),
    }
  }

  /// Recovers the shared value, or `None` when `T` is not the type this
  /// instance was erased from.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.value.downcast_ref::<Arc<T>>().cloned()
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Instance(..)")
  }
}

/// Capability that produces an instance of a bound type on demand.
pub trait Provider: Send + Sync {
  /// Produces an instance. Whether this is a fresh build, a fixed value or a
  /// cached one depends on the provider variant.
  fn provide(&self, injector: &Injector) -> Result<Instance, InjectorError>;

  /// Concrete type this provider produces, for diagnostics and default-scope
  /// discovery.
  fn type_name(&self) -> &'static str;

  /// True for scope decorators. Used to reject nested scoping.
  fn is_scoped(&self) -> bool {
    false
  }

  /// Cached instance of a scope decorator, without triggering a build.
  /// `None` for unscoped providers and for scoped providers that have not
  /// built yet.
  fn scope_instance(&self) -> Option<Instance> {
    None
  }

  /// Scope declared by the provided concrete type, honored by the binder
  /// when no explicit scope is selected.
  fn default_scope(&self) -> Option<ScopeMarker> {
    None
  }
}

/// Declarative construction plan for a concrete type.
///
/// This is the registration-time equivalent of reflective injection-point
/// discovery: the implementing type spells out, in code, which binding keys
/// its constructor consumes and which members are populated after
/// construction. The [`injectable!`](crate::injectable) macro generates the
/// common struct-literal form of [`Injectable::construct`].
pub trait Injectable: Sized + Send + Sync + 'static {
  /// Designated injection constructor: resolves every constructor dependency
  /// through the injector, in declaration order, and builds the value.
  /// Dependencies declared as [`Deferred`] are obtained with
  /// [`Injector::deferred`] instead of being resolved eagerly.
  fn construct(injector: &Injector) -> Result<Self, InjectorError>;

  /// Post-construction member injection: populate fields and invoke
  /// setter-like methods, each resolving its own key. Runs on every build,
  /// after [`Injectable::construct`].
  fn inject_members(&mut self, injector: &Injector) -> Result<(), InjectorError> {
    let _ = injector;
    Ok(())
  }

  /// Scope declared by this type, honored when the binding does not select
  /// one explicitly.
  fn default_scope() -> Option<ScopeMarker> {
    None
  }
}

/// Provider wrapping one fixed value; every call returns the same reference.
pub struct InstanceProvider {
  instance: Instance,
  type_name: &'static str,
}

impl InstanceProvider {
  pub fn new<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      instance: Instance::new(value),
      type_name: type_name::<T>(),
    }
  }
}

impl Provider for InstanceProvider {
  fn provide(&self, _injector: &Injector) -> Result<Instance, InjectorError> {
    Ok(self.instance.clone())
  }

  fn type_name(&self) -> &'static str {
    self.type_name
  }
}

/// Construction provider: builds a fresh instance of `T` on every call, with
/// no caching of its own.
///
/// Every build runs under the circular-dependency guard, resolves the
/// declared constructor dependencies, performs member injection and then
/// notifies provision listeners, in that order.
pub struct ClassProvider<T: Injectable> {
  erase: fn(Arc<T>) -> Instance,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> ClassProvider<T> {
  /// Provider for a type bound to itself.
  pub fn new() -> Self {
    Self {
      erase: Instance::new::<T>,
      _marker: PhantomData,
    }
  }

  /// Provider for a concrete type bound under an interface key. The erasure
  /// function performs the unsizing coercion from `Arc<T>` to the bound
  /// interface; use the [`provide_as!`](crate::provide_as) macro to build it.
  pub fn for_interface(erase: fn(Arc<T>) -> Instance) -> Self {
    Self {
      erase,
      _marker: PhantomData,
    }
  }
}

impl<T: Injectable> Default for ClassProvider<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Injectable> Provider for ClassProvider<T> {
  fn provide(&self, injector: &Injector) -> Result<Instance, InjectorError> {
    // Guard stays live until the provision event has fired, so listeners run
    // inside the same construction frame as the build itself.
    let _guard = ConstructionGuard::enter::<T>()?;

    let mut value = T::construct(injector)?;
    value.inject_members(injector)?;

    let instance = (self.erase)(Arc::new(value));
    log::trace!("Create instance `{}`.", type_name::<T>());
    injector.fire_provision(self, &instance);
    Ok(instance)
  }

  fn type_name(&self) -> &'static str {
    type_name::<T>()
  }

  fn default_scope(&self) -> Option<ScopeMarker> {
    T::default_scope()
  }
}

/// Provider backed by a user-supplied factory closure. Like a
/// [`ClassProvider`] it builds on every call; unlike one, the construction
/// plan is opaque to the container, so builds are not observed by the
/// circular-dependency guard or by provision listeners.
pub struct FactoryProvider<S: ?Sized + Any + Send + Sync> {
  factory: Box<dyn Fn(&Injector) -> Result<Arc<S>, InjectorError> + Send + Sync>,
}

impl<S: ?Sized + Any + Send + Sync> FactoryProvider<S> {
  pub fn new(
    factory: impl Fn(&Injector) -> Result<Arc<S>, InjectorError> + Send + Sync + 'static,
  ) -> Self {
    Self {
      factory: Box::new(factory),
    }
  }
}

impl<S: ?Sized + Any + Send + Sync> Provider for FactoryProvider<S> {
  fn provide(&self, injector: &Injector) -> Result<Instance, InjectorError> {
    Ok(Instance::new((self.factory)(injector)?))
  }

  fn type_name(&self) -> &'static str {
    type_name::<S>()
  }
}

/// Delegating provider: wraps a key and re-enters the injector at call time.
///
/// Used for alias bindings, where one key is bound to resolve through
/// another. The typed face of the same idea is [`Deferred`].
pub struct ProxyProvider {
  key: Key,
}

impl ProxyProvider {
  pub fn new(key: Key) -> Self {
    Self { key }
  }
}

impl Provider for ProxyProvider {
  fn provide(&self, injector: &Injector) -> Result<Instance, InjectorError> {
    injector.provide_key(&self.key)
  }

  fn type_name(&self) -> &'static str {
    self.key.type_name()
  }
}

/// Deferred dependency: a handle that resolves its key through the injector
/// only when [`Deferred::get`] is called.
///
/// Declaring a dependency as `Deferred<T>` instead of `Arc<T>` defers its
/// resolution past construction time. Because nothing recurses while the
/// holder is being built, a `Deferred` edge intentionally escapes
/// circular-dependency detection and is the supported way to break a cycle.
pub struct Deferred<T: ?Sized + Any + Send + Sync> {
  injector: Injector,
  key: Key,
  _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Any + Send + Sync> Deferred<T> {
  pub(crate) fn new(injector: Injector, key: Key) -> Self {
    Self {
      injector,
      key,
      _marker: PhantomData,
    }
  }

  /// Resolves the wrapped key. Every call goes through the injector, so the
  /// binding's scope decides whether repeated calls share an instance.
  pub fn get(&self) -> Result<Arc<T>, InjectorError> {
    self.injector.resolve_key(&self.key)
  }

  pub fn key(&self) -> &Key {
    &self.key
  }
}

impl<T: ?Sized + Any + Send + Sync> Clone for Deferred<T> {
  fn clone(&self) -> Self {
    Self {
      injector: self.injector.clone(),
      key: self.key.clone(),
      _marker: PhantomData,
    }
  }
}

impl<T: ?Sized + Any + Send + Sync> fmt::Debug for Deferred<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Deferred({})", self.key)
  }
}
