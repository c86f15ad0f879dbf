//! Provider traits for autowiring
//!
//! These traits define what types can be stored and which types the
//! container can construct on its own.

use crate::{Arguments, Parameter, Result};

/// Marker trait for types that can be stored in the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {
    /// Returns the class identifier of this type
    #[inline]
    fn class_id() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type the container can build from its constructor's declared parameters.
///
/// This is the descriptor table standing in for runtime reflection. It is
/// usually generated by `#[derive(Autowire)]`, but can be written by hand.
///
/// # Examples
///
/// ```rust
/// use wirebox::{Arguments, Constructible, Parameter, Result};
/// use std::sync::Arc;
///
/// struct Config { url: String }
///
/// struct Database {
///     config: Arc<Config>,
///     pool_size: u32,
/// }
///
/// impl Constructible for Database {
///     fn parameters() -> Vec<Parameter> {
///         vec![
///             Parameter::typed::<Config>("config"),
///             Parameter::typed::<u32>("pool_size").with_default(8_u32),
///         ]
///     }
///
///     fn construct(args: &Arguments) -> Result<Self> {
///         Ok(Self {
///             config: args.shared::<Config>(0)?,
///             pool_size: args.cloned::<u32>(1)?,
///         })
///     }
/// }
/// ```
pub trait Constructible: Injectable + Sized {
    /// Name reported for the constructor in diagnostics
    const CONSTRUCTOR: &'static str = "new";

    /// Ordered constructor parameters
    fn parameters() -> Vec<Parameter>;

    /// Build an instance from bound arguments, one per parameter
    fn construct(args: &Arguments) -> Result<Self>;
}
