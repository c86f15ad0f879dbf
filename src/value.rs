//! Type-erased values held by the container

use crate::{DiError, Injectable, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased value.
///
/// Cloning a `Value` clones the `Arc`, so clones are the same instance as far
/// as [`Value::ptr_eq`] is concerned.
///
/// # Examples
///
/// ```rust
/// use wirebox::Value;
///
/// let answer = Value::new(42_i32);
/// assert_eq!(*answer.downcast::<i32>().unwrap(), 42);
/// assert!(answer.downcast::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap an owned value
    #[inline]
    pub fn new<T: Injectable>(value: T) -> Self {
        Self {
            inner: Arc::new(value) as Arc<dyn Any + Send + Sync>,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an already shared value without re-allocating
    #[inline]
    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Self {
            inner: value as Arc<dyn Any + Send + Sync>,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The null value (unit)
    #[inline]
    pub fn null() -> Self {
        Self::new(())
    }

    /// Check for the null value
    #[inline]
    pub fn is_null(&self) -> bool {
        self.inner.is::<()>()
    }

    /// Check the stored type
    #[inline]
    pub fn is<T: Injectable>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Name of the stored type
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Get the shared value if it holds a `T`
    #[inline]
    pub fn downcast<T: Injectable>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Like [`Value::downcast`], reporting a mismatch against `id`
    pub fn downcast_for<T: Injectable>(&self, id: &str) -> Result<Arc<T>> {
        self.downcast::<T>()
            .ok_or_else(|| DiError::type_mismatch::<T>(id, self.type_name))
    }

    /// Identity comparison
    #[inline]
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&a.inner), Arc::as_ptr(&b.inner))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl<T: Injectable> From<Arc<T>> for Value {
    fn from(value: Arc<T>) -> Self {
        Self::from_arc(value)
    }
}
