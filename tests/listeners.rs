use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use wirebox::{
  injectable, Binder, Injector, InjectorError, ProvisionEvent, ProvisionListener,
};

// --- Test Fixtures ---

struct Widget;
injectable!(Widget);

struct Gadget;
injectable!(Gadget);

/// Records the type name of every provisioned instance.
struct Recorder {
  seen: Mutex<Vec<String>>,
}

impl Recorder {
  fn new() -> Arc<Self> {
    Arc::new(Self {
      seen: Mutex::new(Vec::new()),
    })
  }

  fn count(&self) -> usize {
    self.seen.lock().unwrap().len()
  }
}

impl ProvisionListener for Recorder {
  fn on_provision(&self, event: &ProvisionEvent<'_>) {
    self.seen.lock().unwrap().push(event.type_name.to_string());
  }
}

fn widget_injector() -> Injector {
  let injector = Injector::new();
  injector
    .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
      binder.bind::<Widget>().to_self();
      binder.bind::<Gadget>().in_singleton().to_self();
      binder.bind::<String>().to_instance("fixed".to_string());
      Ok(())
    }])
    .unwrap();
  injector
}

// --- Provision Listener Tests ---

#[test]
fn test_listener_observes_every_construction_build() {
  // Arrange
  let injector = widget_injector();
  let recorder = Recorder::new();
  injector.add_provision_listener(recorder.clone());

  // Act: two unscoped resolutions are two builds.
  let _one = injector.resolve::<Widget>().unwrap();
  let _two = injector.resolve::<Widget>().unwrap();

  // Assert
  assert_eq!(recorder.count(), 2);
  assert!(recorder.seen.lock().unwrap()[0].ends_with("Widget"));
}

#[test]
fn test_instance_provider_returns_do_not_notify() {
  // Arrange
  let injector = widget_injector();
  let recorder = Recorder::new();
  injector.add_provision_listener(recorder.clone());

  // Act
  let _fixed = injector.resolve::<String>().unwrap();

  // Assert: nothing was constructed.
  assert_eq!(recorder.count(), 0);
}

#[test]
fn test_singleton_cache_hits_do_not_notify() {
  // Arrange
  let injector = widget_injector();
  let recorder = Recorder::new();
  injector.add_provision_listener(recorder.clone());

  // Act: first resolution builds, the second is a cache hit.
  let _first = injector.resolve::<Gadget>().unwrap();
  let _second = injector.resolve::<Gadget>().unwrap();

  // Assert
  assert_eq!(recorder.count(), 1);
}

#[test]
fn test_listeners_run_in_registration_order() {
  // Two listeners share one log and tag their entries.
  struct Tagged {
    tag: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
  }
  impl ProvisionListener for Tagged {
    fn on_provision(&self, _event: &ProvisionEvent<'_>) {
      self.log.lock().unwrap().push(self.tag);
    }
  }

  // Arrange
  let injector = widget_injector();
  let log = Arc::new(Mutex::new(Vec::new()));
  injector.add_provision_listener(Arc::new(Tagged {
    tag: "first",
    log: log.clone(),
  }));
  injector.add_provision_listener(Arc::new(Tagged {
    tag: "second",
    log: log.clone(),
  }));

  // Act
  let _widget = injector.resolve::<Widget>().unwrap();

  // Assert
  assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_removed_listener_is_no_longer_notified() {
  // Arrange
  let injector = widget_injector();
  let recorder = Recorder::new();
  let handle: Arc<dyn ProvisionListener> = recorder.clone();
  injector.add_provision_listener(handle.clone());

  let _first = injector.resolve::<Widget>().unwrap();
  assert_eq!(recorder.count(), 1);

  // Act
  injector.remove_provision_listener(&handle);
  let _second = injector.resolve::<Widget>().unwrap();

  // Assert
  assert_eq!(recorder.count(), 1);
}

#[test]
fn test_listener_receives_the_produced_instance() {
  struct Inspector {
    matched: Mutex<bool>,
  }
  impl ProvisionListener for Inspector {
    fn on_provision(&self, event: &ProvisionEvent<'_>) {
      if event.instance.downcast::<Widget>().is_some() {
        *self.matched.lock().unwrap() = true;
      }
    }
  }

  // Arrange
  let injector = widget_injector();
  let inspector = Arc::new(Inspector {
    matched: Mutex::new(false),
  });
  injector.add_provision_listener(inspector.clone());

  // Act
  let _widget = injector.resolve::<Widget>().unwrap();

  // Assert: the event carried the same erased instance the caller got.
  assert!(*inspector.matched.lock().unwrap());
}

#[test]
fn test_event_exposes_the_producing_provider() {
  // A listener can reach the provider object that performed the build, not
  // just the produced type's name.
  struct ProviderWatcher {
    provider_type: Mutex<Option<String>>,
  }
  impl ProvisionListener for ProviderWatcher {
    fn on_provision(&self, event: &ProvisionEvent<'_>) {
      let name = event.provider.type_name().to_string();
      *self.provider_type.lock().unwrap() = Some(name);
    }
  }

  // Arrange
  let injector = widget_injector();
  let watcher = Arc::new(ProviderWatcher {
    provider_type: Mutex::new(None),
  });
  injector.add_provision_listener(watcher.clone());

  // Act
  let _widget = injector.resolve::<Widget>().unwrap();

  // Assert: the provider on the event is the one that built the widget.
  let seen = watcher.provider_type.lock().unwrap().clone().unwrap();
  assert!(seen.ends_with("Widget"));
}

#[test]
fn test_nested_builds_notify_innermost_first() {
  // Construction of Outer resolves Inner, so Inner's build completes, and
  // notifies, before Outer's does.
  struct Inner;
  injectable!(Inner);
  struct Outer {
    _inner: Arc<Inner>,
  }
  injectable!(Outer { _inner: (Inner) });

  // Arrange
  let injector = Injector::new();
  injector
    .configure(&[&|binder: &mut Binder| -> Result<(), InjectorError> {
      binder.bind::<Inner>().to_self();
      binder.bind::<Outer>().to_self();
      Ok(())
    }])
    .unwrap();
  let recorder = Recorder::new();
  injector.add_provision_listener(recorder.clone());

  // Act
  let _outer = injector.resolve::<Outer>().unwrap();

  // Assert
  let seen = recorder.seen.lock().unwrap();
  assert_eq!(seen.len(), 2);
  assert!(seen[0].ends_with("Inner"));
  assert!(seen[1].ends_with("Outer"));
}
