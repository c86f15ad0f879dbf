//! Error types for container operations

use thiserror::Error;

/// Errors that can occur while resolving or creating entries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// No entry, plan, delegate or constructible type matches the identifier
    #[error("Entry for `{id}` could not be resolved")]
    NotFound { id: String },

    /// The type is known but has no accessible constructor
    #[error("Unable to create `{id}`, not instantiable")]
    NotInstantiable { id: String },

    /// A parameter had no override, typed dependency, name match or default
    #[error("Unable to resolve `{parameter}` for `{function}`{}", owner_path(.owners))]
    ParameterResolve {
        parameter: String,
        function: String,
        /// Owning types, innermost first
        owners: Vec<String>,
    },

    /// An identifier re-entered its own resolution path
    #[error("Circular reference detected: {}", .path.join(" -> "))]
    CircularReference { path: Vec<String> },

    /// A resolved value did not hold the requested type
    #[error("Entry `{id}` holds `{found}`, expected `{expected}`")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The descriptor table of a type or factory is malformed
    #[error("Unable to introspect `{target}`: {reason}")]
    Introspection { target: String, reason: String },

    /// A factory reported a failure of its own
    #[error("Failed to create `{id}`: {reason}")]
    CreationFailed { id: String, reason: String },
}

/// Coarse classification of [`DiError`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotInstantiable,
    ParameterResolve,
    CircularReference,
    TypeMismatch,
    Introspection,
    CreationFailed,
}

fn owner_path(owners: &[String]) -> String {
    owners.iter().map(|owner| format!(" of `{owner}`")).collect()
}

impl DiError {
    /// Create a NotFound error for an identifier
    #[inline]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a NotInstantiable error for an identifier
    #[inline]
    pub fn not_instantiable(id: impl Into<String>) -> Self {
        Self::NotInstantiable { id: id.into() }
    }

    /// Create a ParameterResolve error without an owning type
    #[inline]
    pub fn unresolved_parameter(parameter: impl Into<String>, function: impl Into<String>) -> Self {
        Self::ParameterResolve {
            parameter: parameter.into(),
            function: function.into(),
            owners: Vec::new(),
        }
    }

    /// Create a CircularReference error from the offending path
    #[inline]
    pub fn circular(path: Vec<String>) -> Self {
        Self::CircularReference { path }
    }

    /// Create a TypeMismatch error
    #[inline]
    pub fn type_mismatch<T: ?Sized>(id: impl Into<String>, found: &'static str) -> Self {
        Self::TypeMismatch {
            id: id.into(),
            expected: std::any::type_name::<T>(),
            found,
        }
    }

    /// Create an Introspection error
    #[inline]
    pub fn introspection(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Introspection {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Append an owning type to a ParameterResolve error.
    ///
    /// Other variants pass through unchanged.
    pub fn within(self, owner: &str) -> Self {
        match self {
            Self::ParameterResolve {
                parameter,
                function,
                mut owners,
            } => {
                owners.push(owner.to_owned());
                Self::ParameterResolve {
                    parameter,
                    function,
                    owners,
                }
            }
            other => other,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotInstantiable { .. } => ErrorKind::NotInstantiable,
            Self::ParameterResolve { .. } => ErrorKind::ParameterResolve,
            Self::CircularReference { .. } => ErrorKind::CircularReference,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Introspection { .. } => ErrorKind::Introspection,
            Self::CreationFailed { .. } => ErrorKind::CreationFailed,
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_resolve_message_carries_owner_path() {
        let err = DiError::unresolved_parameter("name", "new")
            .within("DepB")
            .within("DepC");

        assert_eq!(
            err.to_string(),
            "Unable to resolve `name` for `new` of `DepB` of `DepC`"
        );
    }

    #[test]
    fn test_within_leaves_other_errors_alone() {
        let err = DiError::not_found("db.dsn").within("Repo");
        assert_eq!(err, DiError::not_found("db.dsn"));
    }

    #[test]
    fn test_circular_message() {
        let err = DiError::circular(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "Circular reference detected: a -> b -> a");
        assert_eq!(err.kind(), ErrorKind::CircularReference);
    }
}
