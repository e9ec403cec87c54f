//! Error taxonomy for configuration and resolution failures.

use crate::key::Key;

use thiserror::Error;

/// All failure modes surfaced by the injector.
///
/// None of these are retried; a dependency-injection container has no
/// meaningful partial-success mode for a single resolution, so every failure
/// propagates to the caller of `configure` or `resolve`.
#[derive(Debug, Error)]
pub enum InjectorError {
  /// `configure` invoked on an injector that already holds a bindings table.
  #[error("injector instance already configured")]
  AlreadyConfigured,

  /// A binding requested a scope marker with no registered scope factory.
  #[error("no scope factory registered for `{0}`")]
  UnknownScope(&'static str),

  /// A scope decorator was asked to wrap a provider that is itself a scope
  /// decorator. Scoped providers do not nest.
  #[error("scoped providers do not nest; binding for {0} is already scoped")]
  NestedScope(Key),

  /// `resolve` called for a key with no registered provider.
  #[error("no injector binding for {0}")]
  NoBinding(Key),

  /// Re-entrant construction of a type already being built on this thread.
  /// The chain lists the construction stack in dependency order, outermost
  /// first, ending with the offending type.
  #[error("circular dependency on `{type_name}`; dependencies trace: {}", .chain.join(" -> "))]
  CircularDependency {
    type_name: &'static str,
    chain: Vec<&'static str>,
  },

  /// A provider failed to produce an instance. Wraps the root cause when one
  /// is available.
  #[error("provisioning failure: {context}")]
  Provision {
    context: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
  },
}

impl InjectorError {
  /// Provisioning error with a message only.
  pub fn provision(context: impl Into<String>) -> Self {
    InjectorError::Provision {
      context: context.into(),
      source: None,
    }
  }

  /// Provisioning error wrapping a root cause.
  pub fn provision_with(
    context: impl Into<String>,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    InjectorError::Provision {
      context: context.into(),
      source: Some(Box::new(source)),
    }
  }
}
