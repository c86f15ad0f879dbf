//! # wirebox - Lazy, String-Keyed Dependency Container
//!
//! A runtime dependency-resolution container: identifiers map to values or
//! factories, factories run once on first access, and types registered for
//! autowiring are constructed from their declared constructor parameters.
//!
//! ## Features
//!
//! - 🔑 **String identifiers** - Values, factories and types share one namespace
//! - 🏭 **Lazy singletons** - Factories run on first `get`, results are cached
//! - ♻️ **Fresh instances** - `create` builds a new value, with per-call overrides
//! - 🔌 **Autowiring** - Constructor parameters bound by type, then by name, then default
//! - 🔄 **Cycle detection** - Re-entrant resolution fails instead of recursing
//! - 🧊 **Immutable copies** - `with` returns an independent container
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use wirebox::{Container, Factory, Parameter};
//!
//! let container = Container::builder()
//!     .value("count", 5_i64)
//!     .factory("double", Factory::with_parameters(
//!         vec![Parameter::new("count")],
//!         |_, args| Ok(args.cloned::<i64>(0)? * 2),
//!     ))
//!     .build();
//!
//! // Resolve - returns Arc<T>, the same instance every time
//! let first = container.get_as::<i64>("double").unwrap();
//! let second = container.get_as::<i64>("double").unwrap();
//! assert_eq!(*first, 10);
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```
//!
//! ## Autowiring
//!
//! ```rust
//! # #[cfg(feature = "derive")] {
//! use std::sync::Arc;
//! use wirebox::{Autowire, Container, Injectable, Overrides};
//!
//! #[derive(Autowire)]
//! struct Database {
//!     #[autowire(default = "sqlite::memory:".to_string())]
//!     dsn: String,
//! }
//!
//! #[derive(Autowire)]
//! struct Users {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::builder()
//!     .register::<Database>()
//!     .register::<Users>()
//!     .build();
//!
//! let users = container.resolve::<Users>().unwrap();
//! assert_eq!(users.db.dsn, "sqlite::memory:");
//!
//! // create() never caches and honours overrides
//! let other = container
//!     .create_as::<Database>(Database::class_id(), &Overrides::new().with("dsn", "pg".to_string()))
//!     .unwrap();
//! assert_eq!(other.dsn, "pg");
//! # }
//! ```
//!
//! ## Immutable Copies
//!
//! ```rust
//! use wirebox::{Container, Entry};
//!
//! let base = Container::new();
//! let test = base.with("mode", Entry::value("test".to_string()));
//!
//! assert!(!base.has("mode"));
//! assert_eq!(test.entries(), ["mode"]);
//! ```

// `::wirebox` paths emitted by the derive macro resolve inside this crate too
extern crate self as wirebox;

mod binder;
mod container;
mod error;
mod factory;
mod introspect;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod resolution;
mod storage;
mod value;

pub use binder::{Arguments, Overrides};
pub use container::*;
pub use error::*;
pub use factory::*;
pub use introspect::{
    ClassInfo, Parameter, Signature, TypeIntrospector, TypeRef, TypeRegistry, is_builtin,
};
pub use provider::*;
pub use storage::Entry;
pub use value::*;

#[cfg(feature = "derive")]
pub use wirebox_derive::Autowire;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Arguments, Constructible, Container, ContainerBuilder, DiError, Entry, Factory,
        Injectable, Lookup, Overrides, Parameter, Result, TypeRegistry, Value,
    };
    #[cfg(feature = "derive")]
    pub use crate::Autowire;
    pub use std::sync::Arc;
}
