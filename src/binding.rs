//! Binding configuration: modules, the binder and the fluent builder.

use crate::error::InjectorError;
use crate::injector::Injector;
use crate::key::{Key, Qualifier};
use crate::provider::{
  ClassProvider, FactoryProvider, Injectable, InstanceProvider, Provider, ProxyProvider,
};
use crate::scope::ScopeMarker;

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// A set of bindings contributed to the injector during configuration.
///
/// Implemented by configuration objects, or directly by closures:
///
/// ```
/// use wirebox::{Binder, Injector, InjectorError};
///
/// let injector = Injector::new();
/// injector
///   .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
///     binder.bind::<String>().to_instance("hello".to_string());
///     Ok(())
///   }])
///   .unwrap();
///
/// assert_eq!(*injector.resolve::<String>().unwrap(), "hello");
/// ```
pub trait Module {
  fn configure(&self, binder: &mut Binder) -> Result<(), InjectorError>;
}

impl<F> Module for F
where
  F: Fn(&mut Binder) -> Result<(), InjectorError>,
{
  fn configure(&self, binder: &mut Binder) -> Result<(), InjectorError> {
    self(binder)
  }
}

/// One declared binding, before scope decoration is applied.
pub(crate) struct PendingBinding {
  pub(crate) key: Key,
  pub(crate) provider: Arc<dyn Provider>,
  pub(crate) scope: Option<ScopeMarker>,
}

/// Collects bindings from modules during the configuration phase.
pub struct Binder {
  bindings: Vec<PendingBinding>,
}

impl Binder {
  pub(crate) fn new() -> Self {
    Self {
      bindings: Vec::new(),
    }
  }

  /// Starts a binding for the request type `S`, which may be a concrete type
  /// or a trait object (`dyn Trait`).
  pub fn bind<S: ?Sized + Any + Send + Sync>(&mut self) -> BindingBuilder<'_, S> {
    BindingBuilder {
      binder: self,
      key: Key::of::<S>(),
      scope: None,
      _marker: PhantomData,
    }
  }

  pub(crate) fn push(&mut self, binding: PendingBinding) {
    self.bindings.push(binding);
  }

  pub(crate) fn into_bindings(self) -> Vec<PendingBinding> {
    self.bindings
  }
}

/// Fluent builder for one binding.
///
/// Qualifier and scope are selected first; a terminal `to_*` call supplies
/// the provider and commits the binding into the binder. When the same key is
/// bound more than once, the last binding wins.
pub struct BindingBuilder<'b, S: ?Sized + Any + Send + Sync> {
  binder: &'b mut Binder,
  key: Key,
  scope: Option<ScopeMarker>,
  _marker: PhantomData<fn(&S)>,
}

impl<'b, S: ?Sized + Any + Send + Sync> BindingBuilder<'b, S> {
  /// Qualifies this binding with a named qualifier.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.key = self.key.with_qualifier(Qualifier::named(name));
    self
  }

  /// Qualifies this binding with an arbitrary qualifier.
  pub fn qualified(mut self, qualifier: Qualifier) -> Self {
    self.key = self.key.with_qualifier(qualifier);
    self
  }

  /// Selects the scope for this binding. Selecting a scope a second time
  /// replaces the previous selection; scopes never stack.
  pub fn in_scope(mut self, marker: ScopeMarker) -> Self {
    self.scope = Some(marker);
    self
  }

  /// Shorthand for `in_scope(ScopeMarker::singleton())`.
  pub fn in_singleton(self) -> Self {
    self.in_scope(ScopeMarker::singleton())
  }

  /// Shorthand for `in_scope(ScopeMarker::thread())`.
  pub fn in_thread_scope(self) -> Self {
    self.in_scope(ScopeMarker::thread())
  }

  // --- TERMINAL METHODS ---

  /// Binds to a fixed value; every resolution returns the same reference.
  pub fn to_instance(self, value: S)
  where
    S: Sized,
  {
    self.to_shared(Arc::new(value));
  }

  /// Binds to an already-shared value. This is the `to_instance` form for
  /// unsized request types such as trait objects.
  pub fn to_shared(self, value: Arc<S>) {
    self.commit(Arc::new(InstanceProvider::new(value)));
  }

  /// Binds a concrete type to its own construction plan.
  pub fn to_self(self)
  where
    S: Injectable,
  {
    self.commit(Arc::new(ClassProvider::<S>::new()));
  }

  /// Binds to an explicit provider. Combine with
  /// [`provide_as!`](crate::provide_as) to bind a concrete implementation
  /// under a trait-object request type.
  pub fn to_provider(self, provider: impl Provider + 'static) {
    self.commit(Arc::new(provider));
  }

  /// Binds to a factory closure, which may itself resolve dependencies.
  pub fn to_factory(
    self,
    factory: impl Fn(&Injector) -> Result<Arc<S>, InjectorError> + Send + Sync + 'static,
  ) {
    self.commit(Arc::new(FactoryProvider::new(factory)));
  }

  /// Aliases this binding to another key: resolutions re-enter the injector
  /// with the target key at call time.
  pub fn to_key(self, target: Key) {
    self.commit(Arc::new(ProxyProvider::new(target)));
  }

  fn commit(self, provider: Arc<dyn Provider>) {
    // An explicit scope selection wins over the scope declared by the
    // provided type.
    let scope = self.scope.or_else(|| provider.default_scope());
    self.binder.push(PendingBinding {
      key: self.key,
      provider,
      scope,
    });
  }
}
