//! Public macros for declaring construction plans and interface providers.

/// Implements [`Injectable`](crate::Injectable) for a struct from a declared
/// dependency list.
///
/// Each field names its dependency inside parentheses: a bare type resolves
/// the unqualified binding, a type followed by a name expression resolves a
/// named binding, and the `deferred` prefix injects a
/// [`Deferred`](crate::Deferred) handle instead of resolving eagerly. Field
/// types must match what the injector hands back: `Arc<T>` for resolved
/// dependencies, `Deferred<T>` for deferred ones.
///
/// An optional trailing `in Scope` declares the type's default scope, honored
/// by the binder when the binding does not select a scope explicitly.
///
/// ```
/// use std::sync::Arc;
/// use wirebox::{injectable, Binder, Injector, InjectorError};
///
/// struct Config {
///   url: String,
/// }
/// injectable!(Config);
///
/// struct Repository {
///   config: Arc<Config>,
/// }
/// injectable!(Repository { config: (Config) });
///
/// let injector = Injector::new();
/// injector
///   .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
///     binder.bind::<Config>().to_instance(Config {
///       url: "postgres://localhost".to_string(),
///     });
///     binder.bind::<Repository>().to_self();
///     Ok(())
///   }])
///   .unwrap();
///
/// let repository = injector.resolve::<Repository>().unwrap();
/// assert_eq!(repository.config.url, "postgres://localhost");
/// ```
#[macro_export]
macro_rules! injectable {
  // Zero-dependency construction plan.
  ($type:ty) => {
    $crate::injectable!($type {});
  };

  ($type:ty { $($field:ident: ($($dep:tt)+)),* $(,)? }) => {
    impl $crate::Injectable for $type {
      fn construct(
        injector: &$crate::Injector,
      ) -> ::std::result::Result<Self, $crate::InjectorError> {
        Ok(Self {
          $($field: $crate::__inject_dep!(injector, $($dep)+)),*
        })
      }
    }
  };

  // Same, with a declared default scope.
  ($type:ty { $($field:ident: ($($dep:tt)+)),* $(,)? } in $scope:ty) => {
    impl $crate::Injectable for $type {
      fn construct(
        injector: &$crate::Injector,
      ) -> ::std::result::Result<Self, $crate::InjectorError> {
        Ok(Self {
          $($field: $crate::__inject_dep!(injector, $($dep)+)),*
        })
      }

      fn default_scope() -> ::std::option::Option<$crate::ScopeMarker> {
        ::std::option::Option::Some($crate::ScopeMarker::of::<$scope>())
      }
    }
  };
}

/// One dependency expression inside [`injectable!`]. Not public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __inject_dep {
  ($injector:ident, deferred $type:ty, $name:expr) => {
    $injector.deferred_named::<$type>($name)
  };
  ($injector:ident, deferred $type:ty) => {
    $injector.deferred::<$type>()
  };
  ($injector:ident, $type:ty, $name:expr) => {
    $injector.resolve_named::<$type>($name)?
  };
  ($injector:ident, $type:ty) => {
    $injector.resolve::<$type>()?
  };
}

/// Builds a [`ClassProvider`](crate::ClassProvider) that constructs a
/// concrete type and provides it under a trait-object request type.
///
/// The unsizing coercion from `Arc<Impl>` to `Arc<dyn Trait>` cannot be
/// written generically on stable Rust, so it is captured here at the
/// registration site where both types are spelled out.
///
/// ```
/// use wirebox::{injectable, provide_as, Binder, Injector, InjectorError};
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// struct EnglishGreeter;
/// injectable!(EnglishGreeter);
///
/// impl Greeter for EnglishGreeter {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// let injector = Injector::new();
/// injector
///   .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
///     binder
///       .bind::<dyn Greeter>()
///       .to_provider(provide_as!(EnglishGreeter => dyn Greeter));
///     Ok(())
///   }])
///   .unwrap();
///
/// let greeter = injector.resolve::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! provide_as {
  ($implementation:ty => $interface:ty) => {
    $crate::ClassProvider::<$implementation>::for_interface(|value| {
      let value: ::std::sync::Arc<$interface> = value;
      $crate::Instance::new(value)
    })
  };
}
