//! The resolving container
//!
//! The `Container` stores entries, compiles construction plans for known
//! types on demand and resolves identifiers with cycle detection.

use crate::binder::Overrides;
use crate::introspect::{ClassInfo, TypeIntrospector, TypeRegistry};
use crate::resolution::ResolutionGuard;
use crate::storage::{Entry, EntrySlot, EntryStore};
use crate::{Constructible, DiError, Factory, Injectable, Result, Value};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// The `get`/`has` contract, as consumed from a delegate container
pub trait Lookup: Send + Sync {
    /// Resolve `id`
    fn get(&self, id: &str) -> Result<Value>;

    /// True if `id` can be resolved, without constructing anything
    fn has(&self, id: &str) -> bool;
}

/// Instance tags keep resolution stacks of distinct containers apart
fn next_instance() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct Inner {
    instance: u64,
    store: EntryStore,
    types: Arc<dyn TypeIntrospector>,
    autowire: bool,
    delegate: Option<Arc<dyn Lookup>>,
}

/// Lazy, string-keyed dependency container.
///
/// Entries are values or factories. Factories run on first [`get`] and their
/// result is cached; [`create`] runs them again every time. With autowiring
/// enabled, identifiers naming a registered type are constructed from the
/// type's constructor parameters.
///
/// `Clone` returns another handle to the same container. Use [`with`] for an
/// independent copy.
///
/// # Examples
///
/// ```rust
/// use wirebox::{Container, Factory};
///
/// let container = Container::builder()
///     .value("db.dsn", "sqlite::memory:".to_string())
///     .factory("db.label", Factory::new(|c: &Container| {
///         Ok(format!("db at {}", c.get_as::<String>("db.dsn")?))
///     }))
///     .build();
///
/// let label = container.get_as::<String>("db.label").unwrap();
/// assert_eq!(*label, "db at sqlite::memory:");
/// ```
///
/// [`get`]: Container::get
/// [`create`]: Container::create
/// [`with`]: Container::with
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    /// Create an empty container with autowiring enabled and no known types.
    #[inline]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a container
    #[inline]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Identifier under which every container resolves to itself
    #[inline]
    pub fn self_id() -> &'static str {
        std::any::type_name::<Container>()
    }

    /// Identifier under which every container resolves to itself as an
    /// `Arc<dyn Lookup>`
    #[inline]
    pub fn lookup_id() -> &'static str {
        std::any::type_name::<dyn Lookup>()
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve `id`, constructing and caching it on first access.
    ///
    /// Lookup order: declared entries and compiled plans, the container
    /// itself (under [`self_id`] and [`lookup_id`]), the delegate, then
    /// autowiring.
    ///
    /// [`self_id`]: Container::self_id
    /// [`lookup_id`]: Container::lookup_id
    pub fn get(&self, id: &str) -> Result<Value> {
        let store = &self.inner.store;

        if let Some(slot) = store.slot(id) {
            if let Some(value) = slot.value() {
                #[cfg(feature = "logging")]
                trace!(target: "wirebox", id = id, location = "cache", "Entry resolved from cache");
                return Ok(value);
            }
            return self.resolve_slot(id, &slot);
        }

        if let Some(plan) = store.plan(id) {
            let slot = store.slot_for_plan(id, plan);
            return self.resolve_slot(id, &slot);
        }

        if id == Self::self_id() {
            return Ok(Value::new(self.clone()));
        }
        if id == Self::lookup_id() {
            let lookup: Arc<dyn Lookup> = Arc::new(self.clone());
            return Ok(Value::new(lookup));
        }

        if let Some(delegate) = self.delegate_for(id) {
            #[cfg(feature = "logging")]
            debug!(target: "wirebox", id = id, "Delegating resolution");
            return delegate.get(id);
        }

        if self.inner.autowire {
            if let Some(class) = self.inner.types.class(id) {
                let plan = self.compile(id, class)?;
                let slot = store.slot_for_plan(id, plan);
                return self.resolve_slot(id, &slot);
            }
        }

        #[cfg(feature = "logging")]
        debug!(target: "wirebox", id = id, "Entry not found");

        Err(DiError::not_found(id))
    }

    /// Resolve `id` and downcast it to `T`
    pub fn get_as<T: Injectable>(&self, id: &str) -> Result<Arc<T>> {
        self.get(id)?.downcast_for::<T>(id)
    }

    /// Resolve the entry registered under `T`'s class identifier
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>> {
        self.get_as::<T>(T::class_id())
    }

    /// Build a fresh value for `id`, never touching the value cache.
    ///
    /// Works on declared factories and on registered types; the compiled
    /// plan of a type is cached and reused. `overrides` bind constructor or
    /// factory parameters by name and beat every other binding rule.
    pub fn create(&self, id: &str, overrides: &Overrides) -> Result<Value> {
        let factory = match self.inner.store.factory(id) {
            Some(factory) => factory,
            None => match self.inner.types.class(id) {
                Some(class) => self.compile(id, class)?,
                None => return Err(DiError::not_found(id)),
            },
        };

        let _guard = ResolutionGuard::enter(self.inner.instance, id)?;

        #[cfg(feature = "logging")]
        trace!(
            target: "wirebox",
            id = id,
            overrides = overrides.len(),
            "Creating new instance"
        );

        factory.invoke(self, id, overrides)
    }

    /// [`create`](Container::create) and downcast to `T`
    pub fn create_as<T: Injectable>(&self, id: &str, overrides: &Overrides) -> Result<Arc<T>> {
        self.create(id, overrides)?.downcast_for::<T>(id)
    }

    /// Build a fresh `T` from its constructor
    pub fn make<T: Constructible>(&self, overrides: &Overrides) -> Result<Arc<T>> {
        self.create_as::<T>(T::class_id(), overrides)
    }

    fn resolve_slot(&self, id: &str, slot: &EntrySlot) -> Result<Value> {
        let _guard = ResolutionGuard::enter(self.inner.instance, id)?;

        slot.get_or_try_init(|| {
            let factory = slot.factory().ok_or_else(|| DiError::not_found(id))?;

            #[cfg(feature = "logging")]
            debug!(
                target: "wirebox",
                id = id,
                class = factory.is_class(),
                "Resolving entry on first access"
            );

            factory.invoke(self, id, &Overrides::new())
        })
    }

    fn compile(&self, id: &str, class: &ClassInfo) -> Result<Factory> {
        let plan = Factory::class(class)?;

        #[cfg(feature = "logging")]
        debug!(target: "wirebox", id = id, "Compiled construction plan");

        Ok(self.inner.store.insert_plan(id, plan))
    }

    fn delegate_for(&self, id: &str) -> Option<&Arc<dyn Lookup>> {
        self.inner
            .delegate
            .as_ref()
            .filter(|delegate| delegate.has(id))
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// True if `id` can be resolved. Never constructs anything.
    pub fn has(&self, id: &str) -> bool {
        self.inner.store.contains(id)
            || id == Self::self_id()
            || id == Self::lookup_id()
            || self.delegate_for(id).is_some()
            || (self.inner.autowire && self.inner.types.can_create(id))
    }

    /// Every declared entry and compiled plan, in natural case-insensitive
    /// order
    pub fn entries(&self) -> Vec<String> {
        self.inner.store.ids()
    }

    /// Number of declared and resolved entries
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_autowiring(&self) -> bool {
        self.inner.autowire
    }

    /// True if both handles refer to the same container
    #[inline]
    pub fn same(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Store an entry, replacing whatever was under `id`.
    ///
    /// Affects this container and its other handles, never copies made with
    /// [`with`](Container::with).
    pub fn set(&self, id: impl Into<String>, entry: impl Into<Entry>) {
        let id = id.into();

        #[cfg(feature = "logging")]
        debug!(target: "wirebox", id = %id, "Registering entry");

        self.inner.store.set(id, entry.into());
    }

    /// Copy of this container with one entry replaced.
    ///
    /// The copy shares no mutable state with `self`: resolving, setting or
    /// compiling in one is never observed by the other.
    ///
    /// ```rust
    /// use wirebox::{Container, Entry};
    ///
    /// let base = Container::new();
    /// let extended = base.with("x", Entry::value(1_i32));
    ///
    /// assert!(base.get("x").is_err());
    /// assert_eq!(*extended.get_as::<i32>("x").unwrap(), 1);
    /// ```
    pub fn with(&self, id: impl Into<String>, entry: impl Into<Entry>) -> Container {
        let copy = self.duplicate(self.inner.autowire);
        copy.inner.store.set(id, entry.into());
        copy
    }

    /// Copy of this container with autowiring switched on or off
    pub fn with_autowiring(&self, autowire: bool) -> Container {
        self.duplicate(autowire)
    }

    fn duplicate(&self, autowire: bool) -> Container {
        let instance = next_instance();

        #[cfg(feature = "logging")]
        debug!(
            target: "wirebox",
            from = self.inner.instance,
            to = instance,
            entries = self.inner.store.len(),
            "Copying container"
        );

        Container {
            inner: Arc::new(Inner {
                instance,
                store: self.inner.store.duplicate(),
                types: Arc::clone(&self.inner.types),
                autowire,
                delegate: self.inner.delegate.clone(),
            }),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Lookup for Container {
    fn get(&self, id: &str) -> Result<Value> {
        Container::get(self, id)
    }

    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("instance", &self.inner.instance)
            .field("store", &self.inner.store)
            .field("autowire", &self.inner.autowire)
            .field("delegate", &self.inner.delegate.is_some())
            .finish()
    }
}

/// Configuration for a new [`Container`].
///
/// ```rust
/// use wirebox::{Container, Factory};
///
/// let fallback = Container::builder().value("region", "eu-west".to_string()).build();
///
/// let container = Container::builder()
///     .value("name", "wirebox".to_string())
///     .factory("answer", Factory::new(|_| Ok(42_u32)))
///     .autowire(false)
///     .delegate(fallback)
///     .build();
///
/// assert!(container.has("region"));
/// assert!(!container.is_autowiring());
/// ```
pub struct ContainerBuilder {
    entries: Vec<(String, Entry)>,
    types: TypeRegistry,
    introspector: Option<Arc<dyn TypeIntrospector>>,
    autowire: bool,
    delegate: Option<Arc<dyn Lookup>>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            types: TypeRegistry::new(),
            introspector: None,
            autowire: true,
            delegate: None,
        }
    }
}

impl ContainerBuilder {
    /// Add a plain value
    pub fn value<T: Injectable>(self, id: impl Into<String>, value: T) -> Self {
        self.entry(id, Entry::value(value))
    }

    /// Add a factory
    pub fn factory(self, id: impl Into<String>, factory: Factory) -> Self {
        self.entry(id, Entry::Factory(factory))
    }

    /// Add an entry; later entries under the same identifier win
    pub fn entry(mut self, id: impl Into<String>, entry: impl Into<Entry>) -> Self {
        self.entries.push((id.into(), entry.into()));
        self
    }

    /// Register a constructible type for autowiring
    pub fn register<T: Constructible>(mut self) -> Self {
        self.types = self.types.register::<T>();
        self
    }

    /// Declare a known type that cannot be constructed
    pub fn declare<T: ?Sized + 'static>(mut self) -> Self {
        self.types = self.types.declare::<T>();
        self
    }

    /// Merge a prepared type registry
    pub fn types(mut self, types: TypeRegistry) -> Self {
        self.types.extend(types);
        self
    }

    /// Use a custom introspector instead of the built-in registry
    pub fn introspector(mut self, introspector: impl TypeIntrospector + 'static) -> Self {
        self.introspector = Some(Arc::new(introspector));
        self
    }

    /// Enable or disable autowiring (enabled by default)
    pub fn autowire(mut self, autowire: bool) -> Self {
        self.autowire = autowire;
        self
    }

    /// Fall back to `delegate` for identifiers this container does not know
    pub fn delegate(mut self, delegate: impl Lookup + 'static) -> Self {
        self.delegate = Some(Arc::new(delegate));
        self
    }

    pub fn build(self) -> Container {
        let instance = next_instance();
        let store = EntryStore::new();
        for (id, entry) in self.entries {
            store.set(id, entry);
        }
        let types = self
            .introspector
            .unwrap_or_else(|| Arc::new(self.types) as Arc<dyn TypeIntrospector>);

        #[cfg(feature = "logging")]
        debug!(
            target: "wirebox",
            instance = instance,
            entries = store.len(),
            autowire = self.autowire,
            delegate = self.delegate.is_some(),
            "Creating new container"
        );

        Container {
            inner: Arc::new(Inner {
                instance,
                store,
                types,
                autowire: self.autowire,
                delegate: self.delegate,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arguments, ErrorKind, Parameter};
    use std::sync::Barrier;
    use std::sync::atomic::AtomicUsize;

    struct Clock;

    impl Constructible for Clock {
        fn parameters() -> Vec<Parameter> {
            Vec::new()
        }

        fn construct(_: &Arguments) -> Result<Self> {
            Ok(Clock)
        }
    }

    #[test]
    fn test_self_id_resolves_to_same_container() {
        let container = Container::new();
        let handle = container.resolve::<Container>().unwrap();

        assert!(handle.same(&container));
        assert!(container.has(Container::self_id()));
        assert!(!container.entries().contains(&Container::self_id().to_string()));
    }

    #[test]
    fn test_lookup_id_resolves_to_same_container() {
        struct Audit {
            lookup: Arc<dyn Lookup>,
        }

        impl Constructible for Audit {
            fn parameters() -> Vec<Parameter> {
                vec![Parameter::typed::<dyn Lookup>("lookup")]
            }

            fn construct(args: &Arguments) -> Result<Self> {
                Ok(Audit {
                    lookup: args.cloned::<Arc<dyn Lookup>>(0)?,
                })
            }
        }

        let container = Container::builder()
            .register::<Audit>()
            .value("region", "eu".to_string())
            .build();

        assert!(container.has(Container::lookup_id()));
        assert!(container.entries().iter().all(|id| id != Container::lookup_id()));

        let audit = container.resolve::<Audit>().unwrap();
        assert!(audit.lookup.has("region"));
        assert_eq!(
            *audit.lookup.get("region").unwrap().downcast::<String>().unwrap(),
            "eu"
        );

        let lookup = container
            .get_as::<Arc<dyn Lookup>>(Container::lookup_id())
            .unwrap();
        assert!(lookup.has(Audit::class_id()));
    }

    #[test]
    fn test_self_id_can_be_overridden() {
        let container = Container::new();
        let other = container.with(
            Container::self_id(),
            Factory::new(|_| Ok(Container::new())),
        );

        let resolved = other.resolve::<Container>().unwrap();
        assert!(!resolved.same(&other));
        assert!(!resolved.same(&container));
    }

    #[test]
    fn test_self_handle_in_copy_is_the_copy() {
        let container = Container::new();
        let copy = container.with("x", Entry::null());

        assert!(copy.resolve::<Container>().unwrap().same(&copy));
    }

    #[test]
    fn test_delegate_consulted_for_unknown_ids() {
        let fallback = Container::builder().value("region", "eu".to_string()).build();
        let container = Container::builder().delegate(fallback).build();

        assert!(container.has("region"));
        assert_eq!(*container.get_as::<String>("region").unwrap(), "eu");
        assert!(!container.has("missing"));
        assert_eq!(container.get("missing").unwrap_err(), DiError::not_found("missing"));
        assert!(container.entries().is_empty());
    }

    #[test]
    fn test_local_entries_shadow_delegate() {
        let fallback = Container::builder().value("region", "eu".to_string()).build();
        let container = Container::builder()
            .value("region", "us".to_string())
            .delegate(fallback)
            .build();

        assert_eq!(*container.get_as::<String>("region").unwrap(), "us");
    }

    #[test]
    fn test_delegate_factory_reaches_back_into_front() {
        // "loop" resolves in the delegate, whose factory then reads "leaf"
        // from the front container while "loop" is still on the stack.
        let front_id = "front";
        let back = Container::builder()
            .factory(
                "loop",
                Factory::new(move |c: &Container| {
                    let front = c.get_as::<Container>(front_id)?;
                    front.get("leaf").map(|_| 1_u8)
                }),
            )
            .build();
        let front = Container::builder()
            .value("leaf", ())
            .delegate(back.clone())
            .build();
        back.set(front_id, Entry::value(front.clone()));

        assert_eq!(*front.get_as::<u8>("loop").unwrap(), 1);
    }

    #[test]
    fn test_autowire_disabled_reports_not_found() {
        let container = Container::builder().register::<Clock>().autowire(false).build();
        let id = Clock::class_id();

        assert!(!container.has(id));
        assert_eq!(container.get(id).unwrap_err().kind(), ErrorKind::NotFound);

        // explicit creation still works from the registered constructor
        assert!(container.make::<Clock>(&Overrides::new()).is_ok());

        let enabled = container.with_autowiring(true);
        assert!(enabled.has(id));
        assert!(enabled.resolve::<Clock>().is_ok());
    }

    #[test]
    fn test_create_records_plan_for_get() {
        let container = Container::builder().register::<Clock>().build();
        let id = Clock::class_id();

        let created = container.create(id, &Overrides::new()).unwrap();
        assert_eq!(container.entries(), [id]);

        let first = container.get(id).unwrap();
        let second = container.get(id).unwrap();
        assert!(Value::ptr_eq(&first, &second));
        assert!(!Value::ptr_eq(&first, &created));
    }

    #[test]
    fn test_plan_introspected_once() {
        static INTROSPECTED: AtomicUsize = AtomicUsize::new(0);

        struct Meter;

        impl Constructible for Meter {
            fn parameters() -> Vec<Parameter> {
                INTROSPECTED.fetch_add(1, Ordering::SeqCst);
                vec![Parameter::typed::<u32>("scale").with_default(1_u32)]
            }

            fn construct(_: &Arguments) -> Result<Self> {
                Ok(Meter)
            }
        }

        let container = Container::builder().register::<Meter>().build();
        for scale in 0..3_u32 {
            container
                .make::<Meter>(&Overrides::new().with("scale", scale))
                .unwrap();
        }
        container.resolve::<Meter>().unwrap();
        container.resolve::<Meter>().unwrap();
        container
            .with_autowiring(true)
            .make::<Meter>(&Overrides::new())
            .unwrap();

        assert_eq!(INTROSPECTED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_create_unknown_is_not_found() {
        let container = Container::builder().value("plain", 1_u8).build();

        assert_eq!(
            container.create("plain", &Overrides::new()).unwrap_err(),
            DiError::not_found("plain")
        );
        assert_eq!(
            container.create("nothing", &Overrides::new()).unwrap_err(),
            DiError::not_found("nothing")
        );
    }

    #[test]
    fn test_set_replaces_resolved_value() {
        let container = Container::builder().value("n", 1_i32).build();
        assert_eq!(*container.get_as::<i32>("n").unwrap(), 1);

        container.set("n", Factory::new(|_| Ok(2_i32)));
        assert_eq!(*container.get_as::<i32>("n").unwrap(), 2);
    }

    #[test]
    fn test_get_as_type_mismatch() {
        let container = Container::builder().value("n", 1_i32).build();
        assert_eq!(
            container.get_as::<String>("n").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);

        let container = Container::builder()
            .factory(
                "slow",
                Factory::new(|_| {
                    BUILT.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    Ok(String::from("built"))
                }),
            )
            .build();

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    container.get("slow").unwrap()
                })
            })
            .collect();

        let values: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Value::ptr_eq(v, &values[0])));
    }

    #[test]
    fn test_concurrent_unrelated_resolutions_are_not_cycles() {
        let container = Container::builder()
            .factory("a", Factory::new(|c: &Container| c.get_as::<u8>("leaf").map(|v| *v)))
            .factory("b", Factory::new(|c: &Container| c.get_as::<u8>("leaf").map(|v| *v)))
            .value("leaf", 3_u8)
            .build();

        let handles: Vec<_> = ["a", "b", "a", "b"]
            .into_iter()
            .map(|id| {
                let container = container.clone();
                std::thread::spawn(move || container.create(id, &Overrides::new()))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    }
}
