use ferrous_container::{injectable, Concrete, Container, DiError, Key, Lifetime};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counter_from(start: usize) -> (Arc<AtomicUsize>, Concrete) {
    let counter = Arc::new(AtomicUsize::new(start));
    let c = counter.clone();
    let factory = Concrete::factory(move |_| Ok(c.fetch_add(1, Ordering::SeqCst) + 1));
    (counter, factory)
}

#[test]
fn test_named_instance() {
    let container = Container::new();
    container.instance("a", 123usize).unwrap();
    assert_eq!(*container.make_as::<usize>("a").unwrap(), 123);
}

#[test]
fn test_setter_with_closure() {
    let container = Container::new();
    let (_, factory) = counter_from(123);
    container.bind("a", factory).unwrap();
    assert_eq!(*container.make_as::<usize>("a").unwrap(), 124);
}

#[test]
fn test_transient_advances_every_time() {
    let container = Container::new();
    let (counter, factory) = counter_from(123);
    container.bind("a", factory).unwrap();

    assert_eq!(*container.make_as::<usize>("a").unwrap(), 124);
    assert_eq!(*container.make_as::<usize>("a").unwrap(), 125);
    assert_eq!(counter.load(Ordering::SeqCst), 125);
    assert!(!container.is_shared("a"));
}

#[test]
fn test_singleton_resolves_once() {
    let container = Container::new();
    let (counter, factory) = counter_from(123);
    container.singleton("a", factory).unwrap();

    let first = container.make_as::<usize>("a").unwrap();
    let second = container.make_as::<usize>("a").unwrap();
    assert_eq!(*first, 124);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counter.load(Ordering::SeqCst), 124);
    assert!(container.is_shared("a"));
}

#[test]
fn test_factory_reading_other_binding() {
    let container = Container::new();
    container.instance("a", 123usize).unwrap();
    container
        .bind_factory("b", |c| Ok(*c.make_as::<usize>("a")? + 1))
        .unwrap();
    assert_eq!(*container.make_as::<usize>("b").unwrap(), 124);
}

#[test]
fn test_alias() {
    let container = Container::new();
    container.bind_factory("a", |_| Ok(124usize)).unwrap();
    container.alias("a", "b");

    assert_eq!(*container.make_as::<usize>("b").unwrap(), 124);
    assert!(container.is_alias("b"));
    assert!(container.bound("b"));
}

#[test]
fn test_binding_to_another_identifier() {
    let container = Container::new();
    container.set("impl", String::from("concrete")).unwrap();
    container.bind("abstract", Key::from("impl")).unwrap();
    assert_eq!(*container.make_as::<String>("abstract").unwrap(), "concrete");
}

#[test]
fn test_class_self_construction() {
    struct A;
    injectable!(A {});

    let container = Container::new();
    let a1 = container.make_type::<A>().unwrap();
    let a2 = container.make_type::<A>().unwrap();
    assert!(!Arc::ptr_eq(&a1, &a2));
}

#[test]
fn test_class_injection() {
    struct A;
    injectable!(A {});

    struct B {
        a: Arc<A>,
    }
    injectable!(B { a: A });

    let container = Container::new();
    let b = container.make_type::<B>().unwrap();
    let _: &A = &b.a;
}

#[test]
fn test_singleton_dependency_shared_between_transients() {
    struct Store;
    injectable!(Store {});

    struct Handler {
        store: Arc<Store>,
    }
    injectable!(Handler { store: Store });

    let container = Container::new();
    container.singleton_type::<Store>().unwrap();
    container.bind_type::<Handler>().unwrap();

    let h1 = container.make_type::<Handler>().unwrap();
    let h2 = container.make_type::<Handler>().unwrap();
    assert!(!Arc::ptr_eq(&h1, &h2));
    assert!(Arc::ptr_eq(&h1.store, &h2.store));
}

#[test]
fn test_get_requires_entry() {
    let container = Container::new();
    assert_eq!(
        container.get("missing").unwrap_err(),
        DiError::EntryNotFound("missing".into())
    );

    container.set("present", 1u8).unwrap();
    assert!(container.get("present").is_ok());
}

#[test]
fn test_get_does_not_self_construct() {
    struct A;
    injectable!(A {});

    let container = Container::new();
    assert!(matches!(
        container.get(Key::of::<A>()),
        Err(DiError::EntryNotFound(_))
    ));
    assert!(container.make_type::<A>().is_ok());
}

#[test]
fn test_bind_if_keeps_first_binding() {
    let container = Container::new();
    container.set("name", "first").unwrap();
    container.bind_if("name", Concrete::constant("second")).unwrap();
    assert_eq!(*container.make_as::<&'static str>("name").unwrap(), "first");

    container.singleton_if("other", Concrete::constant(5u8)).unwrap();
    assert!(container.is_shared("other"));
}

#[test]
fn test_instance_replaces_alias() {
    let container = Container::new();
    container.set("real", 1u32).unwrap();
    container.alias("real", "nick");
    container.instance("nick", 2u32).unwrap();

    assert!(!container.is_alias("nick"));
    assert_eq!(*container.make_as::<u32>("nick").unwrap(), 2);
    assert_eq!(*container.make_as::<u32>("real").unwrap(), 1);
}

#[test]
fn test_rebinding_drops_cached_instance() {
    let container = Container::new();
    container.singleton_factory("a", |_| Ok(1u8)).unwrap();
    assert_eq!(*container.make_as::<u8>("a").unwrap(), 1);

    container.singleton_factory("a", |_| Ok(2u8)).unwrap();
    assert_eq!(*container.make_as::<u8>("a").unwrap(), 2);
}

#[test]
fn test_indexer_sugar() {
    let container = Container::new();
    container.set("answer", 42i32).unwrap();
    assert!(container.contains("answer"));
    assert_eq!(*container.make_as::<i32>("answer").unwrap(), 42);
    assert!(container.resolved("answer").unwrap());

    container.unset("answer");
    assert!(!container.contains("answer"));
    assert!(!container.resolved("answer").unwrap());
    assert!(container.make("answer").unwrap_err().is_binding_resolution());
}

#[test]
fn test_flush_resets_bindings() {
    struct A;
    injectable!(A {});

    let container = Container::new();
    container.set("a", 1u8).unwrap();
    container.instance("b", 2u8).unwrap();
    container.alias("a", "c");
    container.bind_type::<A>().unwrap();

    container.flush();

    for key in ["a", "b", "c"] {
        assert!(!container.bound(key), "{} still bound", key);
    }
    assert!(!container.bound(Key::of::<A>()));
    assert!(container.make("b").unwrap_err().is_binding_resolution());
    // Type identifiers still self-construct
    assert!(container.make_type::<A>().is_ok());
}

#[test]
fn test_forget_instances() {
    let container = Container::new();
    let (counter, factory) = counter_from(0);
    container.singleton("a", factory).unwrap();
    container.make("a").unwrap();

    container.forget_instance("a");
    container.make("a").unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    container.forget_instances();
    container.make("a").unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn test_factory_closure_defers_resolution() {
    let container = Container::new();
    let (counter, factory) = counter_from(0);
    container.bind("a", factory).unwrap();

    let make_a = container.factory("a");
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    make_a().unwrap();
    make_a().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_tagged_in_registration_order() {
    let container = Container::new();
    container.set("cpu", "cpu-report").unwrap();
    container.set("memory", "memory-report").unwrap();
    container.set("disk", "disk-report").unwrap();
    container.tag(["cpu", "memory"], &["reports"]);
    container.tag(["disk"], &["reports", "storage"]);

    let reports: Vec<&'static str> = container
        .tagged("reports")
        .unwrap()
        .into_iter()
        .map(|r| *r.downcast::<&'static str>().unwrap())
        .collect();
    assert_eq!(reports, vec!["cpu-report", "memory-report", "disk-report"]);
    assert_eq!(container.tagged("storage").unwrap().len(), 1);
    assert!(container.tagged("unknown").unwrap().is_empty());
}

#[test]
fn test_trait_object_binding() {
    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct Fixed(u64);
    impl Clock for Fixed {
        fn now(&self) -> u64 {
            self.0
        }
    }

    let container = Container::new();
    container
        .singleton_dyn::<dyn Clock, _>(|_| Ok(Arc::new(Fixed(7)) as Arc<dyn Clock>))
        .unwrap();

    let clock = container.make_dyn::<dyn Clock>().unwrap();
    assert_eq!(clock.now(), 7);
    assert!(Arc::ptr_eq(&clock, &container.make_dyn::<dyn Clock>().unwrap()));
}

#[test]
fn test_binding_descriptors() {
    struct A;
    injectable!(A {});

    let container = Container::new();
    container.singleton_type::<A>().unwrap();
    container.bind("alias.target", Key::from("other")).unwrap();
    container.set("value", 1u8).unwrap();

    let descriptors = container.bindings();
    assert_eq!(descriptors.len(), 3);

    let a = descriptors.iter().find(|d| d.key == Key::of::<A>()).unwrap();
    assert!(a.is_self_binding());
    assert_eq!(a.lifetime, Lifetime::Singleton);
    assert!(!a.has_instance);

    container.make_type::<A>().unwrap();
    let a = container
        .bindings()
        .into_iter()
        .find(|d| d.key == Key::of::<A>())
        .unwrap();
    assert!(a.has_instance);

    let value = descriptors.iter().find(|d| d.key == Key::from("value")).unwrap();
    assert!(value.is_factory());
    assert!(value.to_string().contains("<factory>"));
}

#[test]
fn test_register_with_shared_flag() {
    let container = Container::new();
    let (_, factory) = counter_from(0);
    container.register("shared", Some(factory), true).unwrap();
    let (_, factory) = counter_from(0);
    container.register("fresh", Some(factory), false).unwrap();

    assert!(container.is_shared("shared"));
    assert!(!container.is_shared("fresh"));
    assert_eq!(*container.make_as::<usize>("shared").unwrap(), 1);
    assert_eq!(*container.make_as::<usize>("shared").unwrap(), 1);
    assert_eq!(*container.make_as::<usize>("fresh").unwrap(), 1);
    assert_eq!(*container.make_as::<usize>("fresh").unwrap(), 2);
}
