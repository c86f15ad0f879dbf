//! Parameter binding
//!
//! Turns a declared parameter list into concrete arguments. Each parameter is
//! bound by the first rule that applies:
//!
//! 1. an override keyed by the parameter name (null included),
//! 2. the declared non-primitive type, resolved through the container,
//! 3. an entry named like the parameter,
//! 4. the parameter's default value.
//!
//! Anything else is a [`DiError::ParameterResolve`].

use crate::{Container, DiError, Injectable, Parameter, Result, Signature, Value};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Caller-supplied arguments for [`Container::create`], keyed by parameter
/// name.
///
/// # Examples
///
/// ```rust
/// use wirebox::{Overrides, Value};
///
/// let overrides = Overrides::new()
///     .with("count", 55_i64)
///     .with_value("label", Value::null());
///
/// assert_eq!(overrides.len(), 2);
/// assert!(overrides.get("label").unwrap().is_null());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: HashMap<String, Value, RandomState>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override, replacing one with the same name
    pub fn with<T: Injectable>(self, name: impl Into<String>, value: T) -> Self {
        self.with_value(name, Value::new(value))
    }

    /// Add an already wrapped override
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// Bound arguments, one per declared parameter, in declaration order
#[derive(Debug, Clone)]
pub struct Arguments {
    signature: Signature,
    values: Vec<Value>,
}

impl Arguments {
    /// Number of bound arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Raw argument bound to the parameter called `name`
    pub fn by_name(&self, name: &str) -> Option<&Value> {
        self.signature
            .parameters()
            .iter()
            .position(|parameter| parameter.name() == name)
            .and_then(|index| self.values.get(index))
    }

    /// Shared argument at `index`, checked against `T`
    pub fn shared<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.values.get(index).ok_or_else(|| self.missing(index))?;
        value.downcast_for::<T>(self.parameter_name(index))
    }

    /// Cloned argument at `index`, checked against `T`
    pub fn cloned<T: Injectable + Clone>(&self, index: usize) -> Result<T> {
        self.shared::<T>(index).map(|value| T::clone(&value))
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    fn parameter_name(&self, index: usize) -> &str {
        self.signature
            .parameters()
            .get(index)
            .map_or("?", Parameter::name)
    }

    fn missing(&self, index: usize) -> DiError {
        DiError::introspection(
            self.signature.owner().unwrap_or(self.signature.function()),
            format!(
                "argument {index} requested, {} declared",
                self.values.len()
            ),
        )
    }
}

/// Bind every parameter of `signature`.
///
/// Typed and name-matched parameters recurse into `container.get`, which is
/// where object graphs get built. Errors from those nested lookups propagate
/// unchanged.
pub(crate) fn bind(
    container: &Container,
    signature: &Signature,
    overrides: &Overrides,
) -> Result<Arguments> {
    let values = signature
        .parameters()
        .iter()
        .map(|parameter| bind_one(container, signature, parameter, overrides))
        .collect::<Result<Vec<_>>>()?;

    Ok(Arguments {
        signature: signature.clone(),
        values,
    })
}

fn bind_one(
    container: &Container,
    signature: &Signature,
    parameter: &Parameter,
    overrides: &Overrides,
) -> Result<Value> {
    let name = parameter.name();

    if let Some(value) = overrides.get(name) {
        #[cfg(feature = "logging")]
        trace!(target: "wirebox", parameter = name, rule = "override", "Parameter bound");
        return Ok(value.clone());
    }

    if let Some(declared) = parameter.declared_type() {
        #[cfg(feature = "logging")]
        trace!(
            target: "wirebox",
            parameter = name,
            rule = "type",
            declared = declared.id(),
            "Parameter bound"
        );
        return container.get(declared.id());
    }

    if container.has(name) {
        #[cfg(feature = "logging")]
        trace!(target: "wirebox", parameter = name, rule = "name", "Parameter bound");
        return container.get(name);
    }

    if let Some(default) = parameter.default_value() {
        #[cfg(feature = "logging")]
        trace!(target: "wirebox", parameter = name, rule = "default", "Parameter bound");
        return Ok(default.clone());
    }

    Err(DiError::unresolved_parameter(name, signature.function()))
}
