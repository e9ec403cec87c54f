use std::sync::Arc;

use wirebox::{injectable, Binder, Injectable, Injector, InjectorError};

// --- Test Fixtures ---

// A three-link cycle through construction plans: A -> B -> C -> A.
#[derive(Debug)]
struct ServiceA {
  _b: Arc<ServiceB>,
}
#[derive(Debug)]
struct ServiceB {
  _c: Arc<ServiceC>,
}
#[derive(Debug)]
struct ServiceC {
  _a: Arc<ServiceA>,
}

injectable!(ServiceA { _b: (ServiceB) });
injectable!(ServiceB { _c: (ServiceC) });
injectable!(ServiceC { _a: (ServiceA) });

fn cyclic_injector() -> Injector {
  let injector = Injector::new();
  injector
    .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
      binder.bind::<ServiceA>().to_self();
      binder.bind::<ServiceB>().to_self();
      binder.bind::<ServiceC>().to_self();
      Ok(())
    }])
    .unwrap();
  injector
}

// --- Circular Dependency Tests ---

#[test]
fn test_self_cycle_is_detected() {
  #[derive(Debug)]
  struct Narcissus {
    _own: Arc<Narcissus>,
  }
  injectable!(Narcissus { _own: (Narcissus) });

  // Arrange
  let injector = Injector::new();
  injector
    .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
      binder.bind::<Narcissus>().to_self();
      Ok(())
    }])
    .unwrap();

  // Act
  let error = injector.resolve::<Narcissus>().unwrap_err();

  // Assert
  assert!(matches!(error, InjectorError::CircularDependency { .. }));
  assert!(error.to_string().contains("Narcissus"));
}

#[test]
fn test_cycle_chain_is_reported_in_dependency_order() {
  // Arrange
  let injector = cyclic_injector();

  // Act
  let error = injector.resolve::<ServiceA>().unwrap_err();

  // Assert: the trace lists A, B, C in dependency order, with the
  // offending type closing the cycle.
  match &error {
    InjectorError::CircularDependency { type_name, chain } => {
      assert!(type_name.ends_with("ServiceA"));
      assert_eq!(chain.len(), 4);
      assert!(chain[0].ends_with("ServiceA"));
      assert!(chain[1].ends_with("ServiceB"));
      assert!(chain[2].ends_with("ServiceC"));
      assert!(chain[3].ends_with("ServiceA"));
    }
    other => panic!("unexpected error: {other}"),
  }

  let message = error.to_string();
  let a = message.find("ServiceA").unwrap();
  let b = message.find("ServiceB").unwrap();
  let c = message.find("ServiceC").unwrap();
  assert!(a < b && b < c);
}

#[test]
fn test_detection_entered_mid_cycle_reports_from_that_link() {
  // Arrange
  let injector = cyclic_injector();

  // Act: resolving B walks B -> C -> A -> B.
  let error = injector.resolve::<ServiceB>().unwrap_err();

  // Assert
  match error {
    InjectorError::CircularDependency { type_name, chain } => {
      assert!(type_name.ends_with("ServiceB"));
      assert!(chain[0].ends_with("ServiceB"));
      assert!(chain[chain.len() - 1].ends_with("ServiceB"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_guard_state_is_clean_after_a_cycle_error() {
  // Arrange: a healthy binding next to the cyclic ones.
  struct Standalone;
  injectable!(Standalone);

  let injector = Injector::new();
  injector
    .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
      binder.bind::<ServiceA>().to_self();
      binder.bind::<ServiceB>().to_self();
      binder.bind::<ServiceC>().to_self();
      binder.bind::<Standalone>().to_self();
      Ok(())
    }])
    .unwrap();

  // Act: trip the guard, then resolve something unrelated on the same
  // thread.
  let _ = injector.resolve::<ServiceA>().unwrap_err();
  let standalone = injector.resolve::<Standalone>();

  // Assert: the failed resolution left no residue behind.
  assert!(standalone.is_ok());

  // And the cycle still reports the same clean trace the second time.
  let error = injector.resolve::<ServiceA>().unwrap_err();
  match error {
    InjectorError::CircularDependency { chain, .. } => assert_eq!(chain.len(), 4),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_cycle_error_propagates_through_member_injection() {
  // The cycle is closed by a member-injection edge rather than a
  // constructor edge.
  #[derive(Debug)]
  struct Host {
    plugin: Option<Arc<Plugin>>,
  }
  #[derive(Debug)]
  struct Plugin {
    _host: Arc<Host>,
  }
  injectable!(Plugin { _host: (Host) });

  impl Injectable for Host {
    fn construct(_injector: &Injector) -> Result<Self, InjectorError> {
      Ok(Self { plugin: None })
    }

    fn inject_members(&mut self, injector: &Injector) -> Result<(), InjectorError> {
      self.plugin = Some(injector.resolve::<Plugin>()?);
      Ok(())
    }
  }

  // Arrange
  let injector = Injector::new();
  injector
    .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
      binder.bind::<Host>().to_self();
      binder.bind::<Plugin>().to_self();
      Ok(())
    }])
    .unwrap();

  // Act & Assert
  let error = injector.resolve::<Host>().unwrap_err();
  assert!(matches!(error, InjectorError::CircularDependency { .. }));
}
