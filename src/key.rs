//! Binding keys: a qualified type identity used to address a binding.

use std::any::{type_name, Any, TypeId};
use std::fmt;

/// Secondary discriminator distinguishing multiple bindings of the same type.
///
/// A qualifier is either a marker type (compared by type identity) or a named
/// value (compared by its string payload). Both forms have structural equality
/// and hashing, so two independently created qualifiers with the same payload
/// address the same binding.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
  /// Qualifier expressed as a marker type.
  Marker {
    id: TypeId,
    name: &'static str,
  },
  /// Qualifier expressed as a named value.
  Named(String),
}

impl Qualifier {
  /// Creates a marker qualifier from an arbitrary marker type.
  pub fn marker<Q: Any>() -> Self {
    Qualifier::Marker {
      id: TypeId::of::<Q>(),
      name: type_name::<Q>(),
    }
  }

  /// Creates a named qualifier with value equality over its payload.
  pub fn named(name: impl Into<String>) -> Self {
    Qualifier::Named(name.into())
  }
}

impl fmt::Debug for Qualifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Qualifier::Marker { name, .. } => write!(f, "@{}", name),
      Qualifier::Named(name) => write!(f, "@named({})", name),
    }
  }
}

/// Instance key: a qualified type used to uniquely identify a binding.
///
/// A key is a compound of a mandatory instance type and an optional
/// [`Qualifier`]. The type is immutable; the qualifier may be set once during
/// the binding-builder phase, via [`Key::with_qualifier`], and is immutable
/// during resolution. Two keys with the same type but different qualifiers are
/// distinct bindings.
///
/// When used with a scoped provider the key also identifies the cached
/// instance, through the stable string form returned by [`Key::bucket`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
  type_id: TypeId,
  type_name: &'static str,
  qualifier: Option<Qualifier>,
}

impl Key {
  /// Creates an unqualified key for `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: type_name::<T>(),
      qualifier: None,
    }
  }

  /// Creates a key for `T` qualified by the given qualifier.
  pub fn qualified<T: ?Sized + Any>(qualifier: Qualifier) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: type_name::<T>(),
      qualifier: Some(qualifier),
    }
  }

  /// Creates a key for `T` with a named qualifier. Shorthand for
  /// `Key::qualified::<T>(Qualifier::named(name))`.
  pub fn named<T: ?Sized + Any>(name: impl Into<String>) -> Self {
    Self::qualified::<T>(Qualifier::named(name))
  }

  /// Consumes this key and returns it with the qualifier set. Used by the
  /// binding builder, which starts from an unqualified key.
  pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
    self.qualifier = Some(qualifier);
    self
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn qualifier(&self) -> Option<&Qualifier> {
    self.qualifier.as_ref()
  }

  /// Stable string form used by scoped providers to identify a cached
  /// instance.
  ///
  /// Uniqueness is critical here, otherwise instances could be mixed between
  /// scope buckets. Type names alone are diagnostic-only and not guaranteed
  /// unique, so each type contribution folds in its `TypeId`; named
  /// qualifiers contribute their literal value. The form is stable for the
  /// life of the process, which is as long as any scope cache lives.
  pub fn bucket(&self) -> String {
    match &self.qualifier {
      None => format!("{}:{:?}", self.type_name, self.type_id),
      Some(Qualifier::Marker { id, name }) => {
        format!("{}:{:?}+{}:{:?}", self.type_name, self.type_id, name, id)
      }
      Some(Qualifier::Named(name)) => {
        format!("{}:{:?}#{}", self.type_name, self.type_id, name)
      }
    }
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.qualifier {
      Some(qualifier) => write!(f, "Key({}, {:?})", self.type_name, qualifier),
      None => write!(f, "Key({})", self.type_name),
    }
  }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.qualifier {
      Some(qualifier) => write!(f, "{} {:?}", self.type_name, qualifier),
      None => f.write_str(self.type_name),
    }
  }
}
