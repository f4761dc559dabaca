//! Body payload backends.
//!
//! Two implementations sit behind the [`Payload`] trait:
//!
//! - [`TreePayload`] holds a fully built `xmltree` element.
//! - [`StreamingPayload`] holds the raw bytes cut from the inbound document
//!   plus the namespaces in scope where they were cut. Its root name is read
//!   by a start-tag lookahead; the tree is only built when someone asks for it.
//!   With caching enabled the tree is built when the payload is created.

use crate::error::{MessageError, MessageResult};
use crate::qname::QName;
use crate::xml::{self, NamespaceBinding};
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;
use std::sync::OnceLock;
use xmltree::Element;

/// A body payload.
pub trait Payload: Send + Sync + fmt::Debug {
    /// Returns the qualified name of the payload root without building a tree
    /// where the backend allows it.
    fn root_name(&self) -> MessageResult<QName>;

    /// Returns the payload as a tree, materializing it if needed.
    fn element(&self) -> MessageResult<&Element>;

    /// Returns true once a tree exists for this payload.
    fn is_materialized(&self) -> bool;
}

/// A payload backed by a built element tree.
#[derive(Debug, Clone)]
pub struct TreePayload {
    element: Element,
}

impl TreePayload {
    /// Wraps an element.
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Returns the owned element.
    pub fn into_element(self) -> Element {
        self.element
    }
}

impl Payload for TreePayload {
    fn root_name(&self) -> MessageResult<QName> {
        Ok(QName::of(&self.element))
    }

    fn element(&self) -> MessageResult<&Element> {
        Ok(&self.element)
    }

    fn is_materialized(&self) -> bool {
        true
    }
}

/// A payload backed by raw bytes from the inbound document.
pub struct StreamingPayload {
    source: Bytes,
    namespaces: Vec<NamespaceBinding>,
    root: QName,
    caching: bool,
    tree: OnceLock<Element>,
}

impl StreamingPayload {
    /// Creates a payload over `source`, which must start at the payload's
    /// start tag. `namespaces` are the bindings in scope at that point.
    ///
    /// With `caching` set the tree is built immediately; otherwise on first
    /// read or when the message is written.
    pub fn new(source: Bytes, namespaces: Vec<NamespaceBinding>, caching: bool) -> MessageResult<Self> {
        let root = peek_root_name(&source, &namespaces)?;
        let payload = Self {
            source,
            namespaces,
            root,
            caching,
            tree: OnceLock::new(),
        };
        if caching {
            payload.materialize()?;
        }
        Ok(payload)
    }

    /// Returns the raw payload bytes as received.
    pub fn source(&self) -> &Bytes {
        &self.source
    }

    /// Returns whether this payload caches eagerly.
    pub fn is_caching(&self) -> bool {
        self.caching
    }

    fn materialize(&self) -> MessageResult<&Element> {
        if let Some(tree) = self.tree.get() {
            return Ok(tree);
        }
        let element = xml::parse_fragment(&self.source, &self.namespaces)?;
        tracing::trace!(root = %self.root, bytes = self.source.len(), "materialized streaming payload");
        Ok(self.tree.get_or_init(|| element))
    }
}

impl Payload for StreamingPayload {
    fn root_name(&self) -> MessageResult<QName> {
        Ok(self.root.clone())
    }

    fn element(&self) -> MessageResult<&Element> {
        self.materialize()
    }

    fn is_materialized(&self) -> bool {
        self.tree.get().is_some()
    }
}

impl fmt::Debug for StreamingPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingPayload")
            .field("root", &self.root)
            .field("bytes", &self.source.len())
            .field("caching", &self.caching)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

/// Reads the first start tag of `source` and resolves its qualified name.
pub(crate) fn peek_root_name(source: &[u8], namespaces: &[NamespaceBinding]) -> MessageResult<QName> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) | Event::Empty(start) => {
                let mut scope = namespaces.to_vec();
                scope.extend(xml::declarations(&start)?);
                return xml::resolve_tag_name(start.name().as_ref(), &scope);
            }
            Event::Eof => return Err(MessageError::malformed("payload contains no element")),
            _ => {}
        }
        buf.clear();
    }
}
