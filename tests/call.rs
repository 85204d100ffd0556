use ferrous_container::{
    injectable, AnyArc, CallTarget, Callable, Container, DiError, Key, MethodKey, Parameter,
    Parameters,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Mailer {
    sent: AtomicUsize,
}

impl Mailer {
    fn send(&self, to: &str) -> String {
        self.sent.fetch_add(1, Ordering::SeqCst);
        format!("sent to {}", to)
    }
}

fn container_with_mailer() -> Container {
    let container = Container::new();
    container
        .singleton_factory("Mailer", |_| {
            Ok(Mailer {
                sent: AtomicUsize::new(0),
            })
        })
        .unwrap();
    container.bind_method_as::<Mailer, _, _>("Mailer@send".parse().unwrap(), |mailer, _| {
        Ok(mailer.send("admin"))
    });
    container
}

#[test]
fn test_call_with_injected_dependencies() {
    let container = Container::new();
    container.set("base", 40i64).unwrap();

    let add = Callable::returning(
        vec![Parameter::keyed("base", "base"), Parameter::primitive("delta")],
        |args| Ok(*args.get::<i64>("base")? + *args.get::<i64>("delta")?),
    );

    let out = container
        .call(add, Parameters::new().with("delta", 2i64), None)
        .unwrap();
    assert_eq!(*out.downcast::<i64>().unwrap(), 42);
}

#[test]
fn test_call_uses_defaults_and_positional_values() {
    let container = Container::new();
    let greet = Callable::returning(
        vec![
            Parameter::primitive("greeting").default_value("hello"),
            Parameter::primitive("name"),
        ],
        |args| {
            Ok(format!(
                "{} {}",
                args.get::<&'static str>("greeting")?,
                args.get::<&'static str>("name")?
            ))
        },
    );

    let out = container
        .call(greet.clone(), Parameters::new().with("name", "world"), None)
        .unwrap();
    assert_eq!(*out.downcast::<String>().unwrap(), "hello world");

    let out = container
        .call(greet, Parameters::new().push("hi").push("rust"), None)
        .unwrap();
    assert_eq!(*out.downcast::<String>().unwrap(), "hi rust");
}

#[test]
fn test_call_injects_self_constructed_types() {
    struct Clock;
    injectable!(Clock {});

    let container = Container::new();
    let callable = Callable::new(vec![Parameter::typed::<Clock>("clock")], |args, _| {
        args.get::<Clock>("clock")?;
        Ok(Arc::new(true) as AnyArc)
    });
    let out = container.call(callable, Parameters::new(), None).unwrap();
    assert!(*out.downcast::<bool>().unwrap());
}

#[test]
fn test_call_unresolvable_parameter() {
    let container = Container::new();
    let callable = Callable::returning(vec![Parameter::primitive("missing")], |_| Ok(()));
    let err = container.call(callable, Parameters::new(), None).unwrap_err();
    assert_eq!(
        err,
        DiError::BindingResolution("Unresolvable dependency resolving [missing]".into())
    );
}

#[test]
fn test_call_type_at_method() {
    let container = container_with_mailer();
    let out = container.call("Mailer@send", Parameters::new(), None).unwrap();
    assert_eq!(*out.downcast::<String>().unwrap(), "sent to admin");

    let mailer = container.make_as::<Mailer>("Mailer").unwrap();
    assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
}

#[test]
fn test_call_with_default_method() {
    let container = container_with_mailer();
    let out = container.call("Mailer", Parameters::new(), Some("send")).unwrap();
    assert_eq!(*out.downcast::<String>().unwrap(), "sent to admin");
}

#[test]
fn test_call_without_method() {
    let container = container_with_mailer();
    assert_eq!(
        container.call("Mailer", Parameters::new(), None).unwrap_err(),
        DiError::MethodNotSpecified("Mailer".into())
    );
    assert_eq!(
        container.call("Mailer@", Parameters::new(), None).unwrap_err(),
        DiError::MethodNotSpecified("Mailer".into())
    );
}

#[test]
fn test_call_unbound_method() {
    let container = container_with_mailer();
    assert_eq!(
        container.call("Mailer@queue", Parameters::new(), None).unwrap_err(),
        DiError::BindingResolution("Method [Mailer@queue] has no binding".into())
    );
}

#[test]
fn test_method_binding_with_injected_parameters() {
    let container = container_with_mailer();
    container.set("default.recipient", "ops").unwrap();
    container.bind_method_with(
        "Mailer@send_to".parse().unwrap(),
        vec![Parameter::keyed("to", "default.recipient")],
        |instance, args, _| {
            let mailer = instance.downcast::<Mailer>().map_err(|_| DiError::TypeMismatch("Mailer"))?;
            let to = args.get::<&'static str>("to")?;
            Ok(Arc::new(mailer.send(&to)) as AnyArc)
        },
    );

    let out = container.call("Mailer@send_to", Parameters::new(), None).unwrap();
    assert_eq!(*out.downcast::<String>().unwrap(), "sent to ops");

    let out = container
        .call(
            CallTarget::method("Mailer", "send_to"),
            Parameters::new().with("to", "dev"),
            None,
        )
        .unwrap();
    assert_eq!(*out.downcast::<String>().unwrap(), "sent to dev");
}

#[test]
fn test_call_on_instance_uses_runtime_type() {
    struct Report;

    let container = Container::new();
    container.bind_method_as::<Report, _, _>(MethodKey::of::<Report>("render"), |_, _| {
        Ok("rendered")
    });

    let report: AnyArc = Arc::new(Report);
    let out = container
        .call(CallTarget::on_instance(report, "render"), Parameters::new(), None)
        .unwrap();
    assert_eq!(*out.downcast::<&'static str>().unwrap(), "rendered");
}

#[test]
fn test_method_binding_registry() {
    let container = container_with_mailer();
    let key: MethodKey = "Mailer@send".parse().unwrap();
    assert!(container.has_method_binding(&key));
    assert!(!container.has_method_binding(&MethodKey::new("Mailer", "queue")));

    let mailer = container.make("Mailer").unwrap();
    let out = container.call_method_binding(&key, mailer).unwrap();
    assert_eq!(*out.downcast::<String>().unwrap(), "sent to admin");

    // Method bindings are not container bindings
    container.flush();
    assert!(container.has_method_binding(&key));
    assert!(!container.bound(Key::from("Mailer")));
}

#[test]
fn test_wrap_defers_the_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container.set("x", 2u32).unwrap();

    let counter = calls.clone();
    let double = Callable::returning(vec![Parameter::keyed("x", "x")], move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(*args.get::<u32>("x")? * 2)
    });

    let wrapped = container.wrap(double, Parameters::new());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(*wrapped().unwrap().downcast::<u32>().unwrap(), 4);
    assert_eq!(*wrapped().unwrap().downcast::<u32>().unwrap(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
