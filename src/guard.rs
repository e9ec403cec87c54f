//! Per-thread construction stack used to detect circular dependencies.

use crate::error::InjectorError;

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;

thread_local! {
  // The types currently being constructed on this thread, outermost first.
  // The vector is reused across independent resolutions to avoid
  // reallocation; it is emptied only by the circular-dependency error path
  // and by explicit test-support clearing.
  static CONSTRUCTION_STACK: RefCell<Vec<(TypeId, &'static str)>> = RefCell::new(Vec::new());
}

/// RAII guard over one construction-provider build step.
///
/// [`ConstructionGuard::enter`] pushes the type under construction onto the
/// current thread's stack and fails if that type is already present anywhere
/// on it. Dropping the guard pops the entry, so the stack unwinds naturally
/// with the recursive resolution call chain.
#[derive(Debug)]
pub(crate) struct ConstructionGuard {
  _private: (),
}

impl ConstructionGuard {
  /// Enters a build step for `T`.
  ///
  /// On re-entry of a type already on the stack, returns a
  /// [`InjectorError::CircularDependency`] carrying the full dependency trace
  /// and clears this thread's stack, so a subsequent unrelated resolution on
  /// the same thread starts clean.
  pub(crate) fn enter<T: ?Sized + Any>() -> Result<Self, InjectorError> {
    let type_id = TypeId::of::<T>();
    let type_name = type_name::<T>();

    CONSTRUCTION_STACK.with(|cell| {
      let mut stack = cell.borrow_mut();
      if stack.iter().any(|(id, _)| *id == type_id) {
        // Append the offending type so the trace reveals which dependency
        // closed the cycle.
        let mut chain: Vec<&'static str> = stack.iter().map(|(_, name)| *name).collect();
        chain.push(type_name);
        stack.clear();

        log::error!(
          "Circular dependency on `{}`. Dependencies trace: {}",
          type_name,
          chain.join(" -> ")
        );
        return Err(InjectorError::CircularDependency { type_name, chain });
      }

      stack.push((type_id, type_name));
      Ok(())
    })?;

    Ok(Self { _private: () })
  }
}

impl Drop for ConstructionGuard {
  fn drop(&mut self) {
    CONSTRUCTION_STACK.with(|cell| {
      // The stack may already be empty if an inner build step hit the error
      // path and cleared it while this outer guard was still live.
      let _ = cell.borrow_mut().pop();
    });
  }
}

/// Empties the current thread's construction stack. Test support, invoked
/// from `Injector::clear_scope_caches`.
pub(crate) fn reset() {
  CONSTRUCTION_STACK.with(|cell| cell.borrow_mut().clear());
}
