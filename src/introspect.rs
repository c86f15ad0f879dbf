//! Type introspection over compile-time descriptor tables
//!
//! Rust has no runtime reflection, so each constructible type carries a
//! table of its constructor parameters (see [`Constructible`]). The
//! [`TypeRegistry`] collects these tables and answers the two questions the
//! resolver asks: "does this identifier name a type?" and "what does its
//! constructor take?".

use crate::{Arguments, Constructible, DiError, Injectable, Result, Value};
use ahash::RandomState;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Scalar value types, plus `Option<T>` and `Vec<T>` of each
macro_rules! value_types {
    ($($ty:ty),* $(,)?) => {
        [$(
            TypeId::of::<$ty>(),
            TypeId::of::<Option<$ty>>(),
            TypeId::of::<Vec<$ty>>(),
        )*]
    };
}

/// Built-in types never take part in typed lookup
static BUILTIN_TYPES: Lazy<HashSet<TypeId, RandomState>> = Lazy::new(|| {
    let scalars = value_types![
        (),
        bool,
        char,
        i8,
        i16,
        i32,
        i64,
        i128,
        isize,
        u8,
        u16,
        u32,
        u64,
        u128,
        usize,
        f32,
        f64,
        String,
        &'static str,
        Box<str>,
        Duration,
        PathBuf,
    ];
    let unsized_types = [TypeId::of::<str>()];

    scalars.into_iter().chain(unsized_types).collect()
});

/// Check whether `T` is a primitive or built-in type
#[inline]
pub fn is_builtin<T: ?Sized + 'static>() -> bool {
    BUILTIN_TYPES.contains(&TypeId::of::<T>())
}

/// Reference to a declared parameter type, by class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    id: &'static str,
}

impl TypeRef {
    /// Reference `T`, or `None` for built-in types
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Option<Self> {
        if is_builtin::<T>() {
            None
        } else {
            Some(Self {
                id: std::any::type_name::<T>(),
            })
        }
    }

    /// Reference an arbitrary identifier, e.g. an entry registered under an
    /// interface name
    #[inline]
    pub const fn named(id: &'static str) -> Self {
        Self { id }
    }

    /// The identifier resolved for this type
    #[inline]
    pub fn id(&self) -> &'static str {
        self.id
    }
}

/// One declared parameter of a constructor or factory
#[derive(Debug, Clone)]
pub struct Parameter {
    name: Cow<'static, str>,
    declared_type: Option<TypeRef>,
    default: Option<Value>,
}

impl Parameter {
    /// A required parameter with no declared type
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            default: None,
        }
    }

    /// A required parameter declared as `T`
    pub fn typed<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            declared_type: TypeRef::of::<T>(),
            ..Self::new(name)
        }
    }

    /// Override the declared type
    pub fn with_type(mut self, declared_type: Option<TypeRef>) -> Self {
        self.declared_type = declared_type;
        self
    }

    /// Make the parameter optional with a default value
    pub fn with_default<T: Injectable>(self, default: T) -> Self {
        self.with_default_value(Value::new(default))
    }

    /// Make the parameter optional with an already wrapped default
    pub fn with_default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<TypeRef> {
        self.declared_type
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Reject descriptor tables the binder cannot work with
pub(crate) fn validate(target: &str, parameters: &[Parameter]) -> Result<()> {
    let mut seen = HashSet::with_capacity_and_hasher(parameters.len(), RandomState::new());
    for parameter in parameters {
        if parameter.name().is_empty() {
            return Err(DiError::introspection(target, "parameter with an empty name"));
        }
        if !seen.insert(parameter.name()) {
            return Err(DiError::introspection(
                target,
                format!("duplicate parameter `{}`", parameter.name()),
            ));
        }
    }
    Ok(())
}

/// Introspected signature of a constructor or factory.
///
/// Produced once per plan compilation; cloning shares the parameter list.
#[derive(Debug, Clone)]
pub struct Signature {
    function: Cow<'static, str>,
    owner: Option<&'static str>,
    parameters: Arc<[Parameter]>,
}

impl Signature {
    pub(crate) fn new(
        function: impl Into<Cow<'static, str>>,
        owner: Option<&'static str>,
        parameters: Vec<Parameter>,
    ) -> Result<Self> {
        let function = function.into();
        validate(owner.unwrap_or(function.as_ref()), &parameters)?;
        Ok(Self {
            function,
            owner,
            parameters: parameters.into(),
        })
    }

    /// Same parameters under another function name
    pub(crate) fn renamed(mut self, function: impl Into<Cow<'static, str>>) -> Self {
        self.function = function.into();
        self
    }

    /// Constructor or factory name
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Owning type, for constructors
    pub fn owner(&self) -> Option<&'static str> {
        self.owner
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

/// Type-erased constructor call
pub(crate) type ConstructFn = fn(&Arguments) -> Result<Value>;

fn construct_erased<T: Constructible>(args: &Arguments) -> Result<Value> {
    T::construct(args).map(Value::new)
}

#[derive(Clone, Copy)]
struct Constructor {
    name: &'static str,
    parameters: fn() -> Vec<Parameter>,
    construct: ConstructFn,
}

/// Metadata about one known type
#[derive(Clone)]
pub struct ClassInfo {
    id: &'static str,
    constructor: Option<Constructor>,
}

impl ClassInfo {
    /// Metadata for a constructible type
    pub fn of<T: Constructible>() -> Self {
        Self {
            id: T::class_id(),
            constructor: Some(Constructor {
                name: T::CONSTRUCTOR,
                parameters: T::parameters,
                construct: construct_erased::<T>,
            }),
        }
    }

    /// Metadata for a known type without an accessible constructor
    /// (trait objects, abstract types, private constructors)
    pub fn declared<T: ?Sized + 'static>() -> Self {
        Self {
            id: std::any::type_name::<T>(),
            constructor: None,
        }
    }

    /// Class identifier
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Ordered constructor parameters.
    ///
    /// Fails with `NotInstantiable` before looking at any parameter when the
    /// type has no accessible constructor.
    pub fn signature(&self) -> Result<Signature> {
        let constructor = self
            .constructor
            .ok_or_else(|| DiError::not_instantiable(self.id))?;
        Signature::new(constructor.name, Some(self.id), (constructor.parameters)())
    }

    pub(crate) fn construct_fn(&self) -> Result<ConstructFn> {
        self.constructor
            .map(|constructor| constructor.construct)
            .ok_or_else(|| DiError::not_instantiable(self.id))
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("id", &self.id)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// Read-only source of type metadata consumed by the resolver
pub trait TypeIntrospector: Send + Sync {
    /// Metadata for the type named by `id`, if it is known at all
    fn class(&self, id: &str) -> Option<&ClassInfo>;

    /// True when `id` names a type with an accessible constructor
    fn can_create(&self, id: &str) -> bool {
        self.class(id).is_some_and(ClassInfo::is_instantiable)
    }
}

/// Registry of known types, keyed by class identifier.
///
/// # Examples
///
/// ```rust
/// use wirebox::{Arguments, Constructible, Parameter, Result, TypeIntrospector, TypeRegistry};
///
/// struct Clock;
///
/// impl Constructible for Clock {
///     fn parameters() -> Vec<Parameter> { Vec::new() }
///     fn construct(_: &Arguments) -> Result<Self> { Ok(Clock) }
/// }
///
/// trait Mailer {}
///
/// let types = TypeRegistry::new()
///     .register::<Clock>()
///     .declare::<dyn Mailer>();
///
/// assert!(types.can_create(std::any::type_name::<Clock>()));
/// assert!(!types.can_create(std::any::type_name::<dyn Mailer>()));
/// ```
#[derive(Clone, Default)]
pub struct TypeRegistry {
    classes: HashMap<&'static str, ClassInfo, RandomState>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructible type
    pub fn register<T: Constructible>(mut self) -> Self {
        self.insert(ClassInfo::of::<T>());
        self
    }

    /// Declare a known type that cannot be constructed
    pub fn declare<T: ?Sized + 'static>(mut self) -> Self {
        self.insert(ClassInfo::declared::<T>());
        self
    }

    /// Insert metadata, replacing any previous entry for the same identifier
    pub fn insert(&mut self, class: ClassInfo) {
        self.classes.insert(class.id(), class);
    }

    /// Merge another registry into this one
    pub fn extend(&mut self, other: TypeRegistry) {
        self.classes.extend(other.classes);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeIntrospector for TypeRegistry {
    fn class(&self, id: &str) -> Option<&ClassInfo> {
        self.classes.get(id)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("count", &self.classes.len())
            .finish()
    }
}
