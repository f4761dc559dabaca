//! Qualified XML names.
//!
//! A [`QName`] pairs a namespace URI with a local name. The prefix is kept
//! as a serialization hint only and never takes part in equality or hashing.

use crate::error::MessageError;
use std::fmt;
use std::hash::{Hash, Hasher};
use xmltree::Element;

/// A namespace-qualified XML name.
///
/// # Example
///
/// ```
/// use herald_core::QName;
///
/// let name: QName = "{urn:orders}PlaceOrder".parse().unwrap();
/// assert_eq!(name.namespace(), "urn:orders");
/// assert_eq!(name.local_name(), "PlaceOrder");
/// assert_eq!(name.to_string(), "{urn:orders}PlaceOrder");
/// ```
#[derive(Debug, Clone)]
pub struct QName {
    namespace: String,
    local_name: String,
    prefix: Option<String>,
}

impl QName {
    /// Creates a qualified name without a prefix hint.
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Creates a name in no namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self::new(String::new(), local_name)
    }

    /// Attaches a preferred prefix used when the name is written out.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Returns the namespace URI (empty when unqualified).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the local part.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns the preferred prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Parses Clark notation: `{namespace}local` or a bare `local`.
    pub fn from_clark(value: &str) -> Result<Self, MessageError> {
        let value = value.trim();
        if let Some(rest) = value.strip_prefix('{') {
            let (namespace, local) = rest
                .split_once('}')
                .ok_or_else(|| MessageError::invalid_qname(value, "missing closing brace"))?;
            if local.is_empty() {
                return Err(MessageError::invalid_qname(value, "empty local name"));
            }
            return Ok(Self::new(namespace, local));
        }
        if value.is_empty() || value.contains(['{', '}']) {
            return Err(MessageError::invalid_qname(value, "not in {namespace}local form"));
        }
        Ok(Self::local(value))
    }

    /// Returns the qualified name of an element.
    pub fn of(element: &Element) -> Self {
        let mut name = Self::new(
            element.namespace.clone().unwrap_or_default(),
            element.name.clone(),
        );
        name.prefix = element.prefix.clone();
        name
    }

    /// Returns true when the element carries this name.
    pub fn matches(&self, element: &Element) -> bool {
        element.name == self.local_name
            && element.namespace.as_deref().unwrap_or_default() == self.namespace
    }

    /// Creates an empty element with this name, declaring its namespace.
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(&self.local_name);
        if !self.namespace.is_empty() {
            element.namespace = Some(self.namespace.clone());
            match &self.prefix {
                Some(prefix) => {
                    element.prefix = Some(prefix.clone());
                    element
                        .attributes
                        .insert(format!("xmlns:{prefix}"), self.namespace.clone());
                }
                None => {
                    element
                        .attributes
                        .insert("xmlns".to_string(), self.namespace.clone());
                }
            }
        }
        element
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

impl std::str::FromStr for QName {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_clark(s)
    }
}
