//! Factories: deferred construction of entries
//!
//! A factory is either a closure registered by the caller or a plan compiled
//! from a type's constructor table. Both carry their declared parameters and
//! go through the same binder when invoked.

use crate::binder::{self, Arguments, Overrides};
use crate::introspect::{ClassInfo, ConstructFn};
use crate::{Container, Injectable, Parameter, Result, Signature, Value};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Type-erased factory closure
type CallFn = dyn Fn(&Container, &Arguments) -> Result<Value> + Send + Sync;

/// Name used for closure factories until bound to an identifier
const CLOSURE: &str = "factory";

enum Kind {
    /// Caller-supplied closure; the signature is renamed to the identifier
    /// it resolves
    Closure {
        signature: Result<Signature>,
        call: Box<CallFn>,
    },
    /// Compiled constructor plan
    Class {
        signature: Signature,
        construct: ConstructFn,
    },
}

/// A deferred entry.
///
/// Cloning shares the factory; a compiled plan is never re-introspected.
///
/// # Examples
///
/// ```rust
/// use wirebox::{Container, Factory, Parameter};
///
/// let container = Container::builder()
///     .value("count", 5_i64)
///     .factory("double", Factory::with_parameters(
///         vec![Parameter::typed::<i64>("count")],
///         |_, args| Ok(args.cloned::<i64>(0)? * 2),
///     ))
///     .build();
///
/// let double = container.get_as::<i64>("double").unwrap();
/// assert_eq!(*double, 10);
/// ```
#[derive(Clone)]
pub struct Factory {
    kind: Arc<Kind>,
}

impl Factory {
    /// A factory with no declared parameters
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Injectable,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Self::closure(Vec::new(), move |container, _| factory(container).map(Value::new))
    }

    /// A factory producing an already shared value, stored without another
    /// allocation
    pub fn shared<T, F>(factory: F) -> Self
    where
        T: Injectable,
        F: Fn(&Container) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self::closure(Vec::new(), move |container, _| {
            factory(container).map(Value::from_arc)
        })
    }

    /// A factory whose declared parameters are bound like constructor
    /// parameters before it runs
    pub fn with_parameters<T, F>(parameters: Vec<Parameter>, factory: F) -> Self
    where
        T: Injectable,
        F: Fn(&Container, &Arguments) -> Result<T> + Send + Sync + 'static,
    {
        Self::closure(parameters, move |container, args| {
            factory(container, args).map(Value::new)
        })
    }

    /// A factory returning type-erased values directly
    pub fn raw<F>(parameters: Vec<Parameter>, factory: F) -> Self
    where
        F: Fn(&Container, &Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        Self::closure(parameters, factory)
    }

    fn closure<F>(parameters: Vec<Parameter>, call: F) -> Self
    where
        F: Fn(&Container, &Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            kind: Arc::new(Kind::Closure {
                signature: Signature::new(CLOSURE, None, parameters),
                call: Box::new(call),
            }),
        }
    }

    /// Compile the construction plan of a known type.
    ///
    /// Fails with `NotInstantiable` for declared-only types, before any
    /// parameter is looked at.
    pub(crate) fn class(class: &ClassInfo) -> Result<Self> {
        let signature = class.signature()?;
        let construct = class.construct_fn()?;
        Ok(Self {
            kind: Arc::new(Kind::Class {
                signature,
                construct,
            }),
        })
    }

    /// Bind arguments and run.
    ///
    /// `id` names closure factories in diagnostics. A parameter failure
    /// leaving a class plan gets the class appended to its owner path.
    pub(crate) fn invoke(
        &self,
        container: &Container,
        id: &str,
        overrides: &Overrides,
    ) -> Result<Value> {
        match &*self.kind {
            Kind::Closure { signature, call } => {
                let signature = signature.clone()?.renamed(id.to_owned());
                let args = binder::bind(container, &signature, overrides)?;

                #[cfg(feature = "logging")]
                trace!(target: "wirebox", id = id, arguments = args.len(), "Invoking factory");

                call(container, &args)
            }
            Kind::Class {
                signature,
                construct,
            } => {
                let owner = signature.owner().unwrap_or(id);
                let args = binder::bind(container, signature, overrides)
                    .map_err(|err| err.within(owner))?;

                #[cfg(feature = "logging")]
                trace!(target: "wirebox", id = id, arguments = args.len(), "Invoking constructor");

                construct(&args)
            }
        }
    }

    /// True for plans compiled from a type's constructor
    #[inline]
    pub fn is_class(&self) -> bool {
        matches!(&*self.kind, Kind::Class { .. })
    }

    /// Identity comparison
    #[inline]
    pub fn ptr_eq(a: &Factory, b: &Factory) -> bool {
        Arc::ptr_eq(&a.kind, &b.kind)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Factory");
        match &*self.kind {
            Kind::Closure { signature, .. } => debug
                .field("kind", &"closure")
                .field(
                    "parameters",
                    &signature.as_ref().map_or(0, |s| s.parameters().len()),
                ),
            Kind::Class { signature, .. } => debug
                .field("kind", &"class")
                .field("owner", &signature.owner())
                .field("parameters", &signature.parameters().len()),
        };
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Constructible, DiError, ErrorKind};

    struct Greeter {
        name: String,
    }

    impl Constructible for Greeter {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::typed::<String>("name")]
        }

        fn construct(args: &Arguments) -> Result<Self> {
            Ok(Self {
                name: args.cloned::<String>(0)?,
            })
        }
    }

    #[test]
    fn test_closure_factory_receives_container() {
        let container = Container::builder().value("base", 40_i32).build();
        let factory = Factory::new(|c: &Container| Ok(*c.get_as::<i32>("base")? + 2));

        let value = factory.invoke(&container, "answer", &Overrides::new()).unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 42);
        assert!(!factory.is_class());
    }

    #[test]
    fn test_closure_parameter_error_names_identifier() {
        let container = Container::new();
        let factory = Factory::with_parameters(vec![Parameter::new("missing")], |_, _| Ok(()));

        let err = factory.invoke(&container, "needs.missing", &Overrides::new()).unwrap_err();
        assert_eq!(err, DiError::unresolved_parameter("missing", "needs.missing"));
    }

    #[test]
    fn test_invalid_parameter_table_fails_on_invoke() {
        let container = Container::new();
        let factory = Factory::with_parameters(
            vec![Parameter::new("x"), Parameter::new("x")],
            |_, _| Ok(()),
        );

        let err = factory.invoke(&container, "dup", &Overrides::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Introspection);
    }

    #[test]
    fn test_class_plan_appends_owner() {
        let container = Container::new();
        let plan = Factory::class(&ClassInfo::of::<Greeter>()).unwrap();
        assert!(plan.is_class());

        let err = plan.invoke(&container, "greeter", &Overrides::new()).unwrap_err();
        assert_eq!(
            err,
            DiError::unresolved_parameter("name", "new").within(std::any::type_name::<Greeter>())
        );

        let greeter = plan
            .invoke(&container, "greeter", &Overrides::new().with("name", "Ada".to_string()))
            .unwrap()
            .downcast::<Greeter>()
            .unwrap();
        assert_eq!(greeter.name, "Ada");
    }

    #[test]
    fn test_shared_factory_keeps_instance() {
        let shared = Arc::new(Greeter { name: "x".into() });
        let inner = Arc::clone(&shared);
        let factory = Factory::shared(move |_| Ok(Arc::clone(&inner)));

        let value = factory.invoke(&Container::new(), "g", &Overrides::new()).unwrap();
        assert!(Arc::ptr_eq(&value.downcast::<Greeter>().unwrap(), &shared));
    }
}
