//! # ferrous-container
//!
//! Reflective dependency-resolution container: give it an abstract identifier
//! (a name or a type) and it produces a fully constructed object graph,
//! resolving constructor dependencies recursively.
//!
//! ## Features
//!
//! - **Bindings**: transient and shared (singleton) bindings, pre-built instances
//! - **Aliases**: any identifier can stand for another, with cycle detection
//! - **Contextual bindings**: `when(A).needs(B).give(C)` overrides a dependency
//!   only while `A` is being built
//! - **Constructor injection**: types describe their constructor through
//!   [`Injectable`]; unbound injectable types construct themselves
//! - **Parameter overrides**: per-call values that win over injection
//! - **Extenders and callbacks**: post-construction decorators, resolving and
//!   after-resolving hooks, rebound notifications
//! - **Method bindings**: `Type@method` targets dispatched through [`Container::call`]
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_container::{injectable, Container, Key};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let container = Container::new();
//!
//! // Named bindings
//! let counter = Arc::new(AtomicUsize::new(123));
//! let c = counter.clone();
//! container
//!     .bind_factory("a", move |_| Ok(c.fetch_add(1, Ordering::SeqCst) + 1))
//!     .unwrap();
//! assert_eq!(*container.make_as::<usize>("a").unwrap(), 124);
//! assert_eq!(*container.make_as::<usize>("a").unwrap(), 125);
//!
//! container.alias("a", "b");
//! assert_eq!(*container.make_as::<usize>("b").unwrap(), 126);
//!
//! // Constructor injection
//! struct A;
//! injectable!(A {});
//!
//! struct B {
//!     a: Arc<A>,
//! }
//! injectable!(B { a: A });
//!
//! let b = container.make_type::<B>().unwrap();
//! let _: &A = &b.a;
//! ```
//!
//! ## Contextual Bindings
//!
//! ```rust
//! use ferrous_container::{Arguments, Concrete, Container, DiResult, Injectable, Parameter};
//! use std::sync::Arc;
//!
//! struct Report {
//!     title: Arc<String>,
//! }
//!
//! impl Injectable for Report {
//!     fn dependencies() -> Vec<Parameter> {
//!         vec![Parameter::keyed("title", "title")]
//!     }
//!     fn construct(args: &Arguments) -> DiResult<Self> {
//!         Ok(Report { title: args.get("title")? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.set("title", String::from("Default")).unwrap();
//! container
//!     .when(ferrous_container::Key::of::<Report>()).unwrap()
//!     .needs("title")
//!     .give(Concrete::constant(String::from("Quarterly")))
//!     .unwrap();
//!
//! assert_eq!(*container.make_type::<Report>().unwrap().title, "Quarterly");
//! assert_eq!(*container.make_as::<String>("title").unwrap(), "Default");
//! ```
//!
//! ## Threading
//!
//! A `Container` is `Send` but not `Sync`: one container per thread of
//! control. Resolved instances are `Arc<dyn Any + Send + Sync>` and can be
//! shared freely.

// Module declarations
pub mod alias;
pub mod callbacks;
pub mod config;
pub mod container;
pub mod contextual;
pub mod decoration;
pub mod descriptors;
pub mod error;
pub mod injectable;
pub mod key;
pub mod lifetime;
pub mod method;
pub mod parameters;
pub mod registration;

mod internal;

pub use callbacks::{ReboundCallback, ResolvingCallback};
pub use config::ContainerConfig;
pub use container::Container;
pub use contextual::ContextualBindingBuilder;
pub use decoration::{ExtenderFn, ServiceDecorator};
pub use descriptors::BindingDescriptor;
pub use error::{DiError, DiResult};
pub use injectable::{Arguments, Blueprint, Injectable, Parameter};
pub use key::{key_of_type, Key};
pub use lifetime::Lifetime;
pub use method::{CallTarget, Callable, MethodCallback, MethodKey, Receiver};
pub use parameters::Parameters;
pub use registration::{downcast, downcast_dyn, AnyArc, Concrete, FactoryFn};
