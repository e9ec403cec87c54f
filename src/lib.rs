//! # Wirebox
//!
//! A flexible, thread-safe dependency injection container for Rust.
//!
//! Wirebox maps request keys, a type plus an optional qualifier, to
//! providers: strategies that produce instances on demand. Bindings are
//! declared once, in modules, during a one-time configuration phase; after
//! that any number of threads may resolve concurrently with no locking on
//! the lookup path.
//!
//! ## Core Concepts
//!
//! - **Injector**: the registry. Owns the bindings table, the scope caches
//!   and the scope factories, and is the resolution entry point.
//! - **Key**: `(type, optional qualifier)` identity addressing a binding.
//!   The same type may be bound several times under different qualifiers.
//! - **Provider**: produces an instance when invoked. Fixed instances,
//!   declarative construction plans ([`Injectable`]), factory closures and
//!   key aliases are the base variants.
//! - **Scope**: a decorator over a provider controlling instance reuse.
//!   Unscoped bindings build fresh on every resolution; `Singleton` shares
//!   one instance per injector; `ThreadScoped` shares one per thread.
//!   Custom scopes plug in through [`ScopeFactory`].
//! - **Deferred**: a lazy handle resolved on demand rather than at
//!   construction time, and the supported way to break dependency cycles.
//!
//! Construction runs under a per-thread guard that detects circular
//! dependency chains and reports the full chain in dependency order instead
//! of overflowing the stack.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use wirebox::{injectable, provide_as, Binder, Injector, InjectorError};
//!
//! trait Database: Send + Sync {
//!   fn query(&self) -> String;
//! }
//!
//! struct Postgres;
//! injectable!(Postgres);
//!
//! impl Database for Postgres {
//!   fn query(&self) -> String {
//!     "42 rows".to_string()
//!   }
//! }
//!
//! struct UserService {
//!   db: Arc<dyn Database>,
//! }
//! injectable!(UserService { db: (dyn Database) });
//!
//! fn main() -> Result<(), InjectorError> {
//!   let injector = Injector::new();
//!   injector.configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
//!     binder
//!       .bind::<dyn Database>()
//!       .in_singleton()
//!       .to_provider(provide_as!(Postgres => dyn Database));
//!     binder.bind::<UserService>().to_self();
//!     Ok(())
//!   }])?;
//!
//!   let users = injector.resolve::<UserService>()?;
//!   assert_eq!(users.db.query(), "42 rows");
//!   Ok(())
//! }
//! ```

mod binding;
mod error;
mod guard;
mod injector;
mod key;
mod macros;
mod provider;
mod scope;

pub use binding::{Binder, BindingBuilder, Module};
pub use error::InjectorError;
pub use injector::{Injector, ProvisionEvent, ProvisionListener};
pub use key::{Key, Qualifier};
pub use provider::{
  ClassProvider, Deferred, FactoryProvider, Injectable, Instance, InstanceProvider, Provider,
  ProxyProvider,
};
pub use scope::{ScopeFactory, ScopeMarker, Singleton, ThreadScoped};
