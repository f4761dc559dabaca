//! Endpoint failures and their static type hierarchy.
//!
//! Fault resolution matches a failure against a table keyed by failure-type
//! names, preferring the nearest ancestor. Rust has no class hierarchy to walk,
//! so failures carry an explicit [`FailureType`] node: a name, an optional
//! parent and any number of interface types.
//!
//! ```
//! use herald_core::{EndpointFailure, FailureType};
//!
//! static EXCEPTION: FailureType = FailureType::root("Exception");
//! static RUNTIME: FailureType = FailureType::extends("RuntimeException", &EXCEPTION);
//! static ILLEGAL_ARGUMENT: FailureType = FailureType::extends("IllegalArgumentException", &RUNTIME);
//!
//! let failure = EndpointFailure::new(&ILLEGAL_ARGUMENT, "negative quantity");
//! assert_eq!(failure.kind().depth_to("RuntimeException"), Some(1));
//! assert_eq!(failure.kind().depth_to("Exception"), Some(2));
//! ```

use crate::error::MessageError;
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// A node in the failure type hierarchy.
#[derive(Debug)]
pub struct FailureType {
    name: &'static str,
    parent: Option<&'static FailureType>,
    interfaces: &'static [&'static FailureType],
}

/// Root of every failure raised by Herald itself.
pub static FAILURE: FailureType = FailureType::root("Failure");

/// Failures caused by a message that could not be read or written.
pub static MESSAGE_FAILURE: FailureType = FailureType::extends("MessageFailure", &FAILURE);

impl FailureType {
    /// Declares a type with no parent.
    pub const fn root(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            interfaces: &[],
        }
    }

    /// Declares a type extending `parent`.
    pub const fn extends(name: &'static str, parent: &'static FailureType) -> Self {
        Self {
            name,
            parent: Some(parent),
            interfaces: &[],
        }
    }

    /// Declares a type with a parent and implemented interfaces.
    pub const fn with_interfaces(
        name: &'static str,
        parent: Option<&'static FailureType>,
        interfaces: &'static [&'static FailureType],
    ) -> Self {
        Self {
            name,
            parent,
            interfaces,
        }
    }

    /// Returns the type name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parent type.
    pub const fn parent(&self) -> Option<&'static FailureType> {
        self.parent
    }

    /// Returns the interfaces declared directly on this type.
    pub const fn interfaces(&self) -> &'static [&'static FailureType] {
        self.interfaces
    }

    /// Returns the number of hierarchy edges from this type to the type named
    /// `ancestor`, or `None` when it is not reachable.
    ///
    /// Parent and interface links both count as one edge. The search is
    /// breadth-first so the shortest path wins when an interface is reachable
    /// along several routes.
    pub fn depth_to(&self, ancestor: &str) -> Option<usize> {
        let mut queue: VecDeque<(&FailureType, usize)> = VecDeque::new();
        let mut seen: HashSet<&'static str> = HashSet::new();
        queue.push_back((self, 0));
        seen.insert(self.name);

        while let Some((current, depth)) = queue.pop_front() {
            if current.name == ancestor {
                return Some(depth);
            }
            let next = current.parent.into_iter().chain(current.interfaces.iter().copied());
            for candidate in next {
                if seen.insert(candidate.name) {
                    queue.push_back((candidate, depth + 1));
                }
            }
        }
        None
    }

    /// Returns true when this type is, or descends from, the named type.
    pub fn is_a(&self, ancestor: &str) -> bool {
        self.depth_to(ancestor).is_some()
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A failure raised by an endpoint or interceptor.
///
/// Endpoints return `Result<_, EndpointFailure>`; `?` converts from
/// [`anyhow::Error`] and [`MessageError`].
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EndpointFailure {
    kind: &'static FailureType,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

impl EndpointFailure {
    /// Creates a failure of the given type.
    pub fn new(kind: &'static FailureType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the failure type.
    pub fn kind(&self) -> &'static FailureType {
        self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for EndpointFailure {
    fn from(err: anyhow::Error) -> Self {
        Self {
            kind: &FAILURE,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<MessageError> for EndpointFailure {
    fn from(err: MessageError) -> Self {
        Self {
            kind: &MESSAGE_FAILURE,
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}
