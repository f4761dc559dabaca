//! XML parsing and small helpers over `xmltree` shared by the message backends.

use crate::error::{MessageError, MessageResult};
use crate::qname::QName;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use xmltree::{Element, EmitterConfig, Namespace, XMLNode};

/// The namespace permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An in-scope namespace binding: `(prefix, uri)`, prefix empty for the default namespace.
pub type NamespaceBinding = (String, String);

/// Collapses runs of whitespace and trims both ends.
pub fn normalize_space(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the concatenated text content of an element.
pub fn text_of(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

/// Looks up an attribute by qualified name. Prefixed keys are resolved
/// against the element's namespaces; unprefixed keys are in no namespace.
pub fn attribute<'a>(element: &'a Element, name: &QName) -> Option<&'a str> {
    element
        .attributes
        .iter()
        .find_map(|(key, value)| (attribute_name(element, key).as_ref() == Some(name)).then_some(value.as_str()))
}

/// Resolves an attribute key to its qualified name. Namespace declarations
/// and keys with an unbound prefix resolve to `None`.
pub fn attribute_name(element: &Element, key: &str) -> Option<QName> {
    match key.split_once(':') {
        None if key == "xmlns" => None,
        None => Some(QName::local(key)),
        Some(("xmlns", _)) => None,
        Some(("xml", local)) => Some(QName::new(XML_NAMESPACE, local)),
        Some((prefix, local)) => {
            let namespace = element
                .namespaces
                .as_ref()
                .and_then(|ns| ns.get(prefix))
                .or_else(|| element.attributes.get(&format!("xmlns:{prefix}")).map(String::as_str))?;
            Some(QName::new(namespace, local).with_prefix(prefix))
        }
    }
}

/// Binds `prefix` to `uri` on the element itself, replacing any binding
/// the element already carries for that prefix.
pub fn declare_namespace(element: &mut Element, prefix: &str, uri: &str) {
    element.attributes.remove(&format!("xmlns:{prefix}"));
    element
        .namespaces
        .get_or_insert_with(Namespace::empty)
        .force_put(prefix, uri);
}

/// Iterates the element children of an element.
pub fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

/// Returns the first element child, skipping text and comments.
pub fn first_child_element(element: &Element) -> Option<&Element> {
    child_elements(element).next()
}

/// Finds the first child element with the given qualified name.
pub fn find_child<'a>(element: &'a Element, name: &QName) -> Option<&'a Element> {
    child_elements(element).find(|child| name.matches(child))
}

/// Creates an element with the given name and text content.
pub fn text_element(name: &QName, text: &str) -> Element {
    let mut element = name.to_element();
    element.children.push(XMLNode::Text(text.to_string()));
    element
}

/// Creates an element whose text is a prefixed QName value, declaring the prefix.
pub fn qname_value_element(name: &QName, value: &QName) -> Element {
    let mut element = name.to_element();
    let text = if value.namespace().is_empty() {
        value.local_name().to_string()
    } else {
        let prefix = value.prefix().unwrap_or("ns0");
        if name.prefix() != Some(prefix) || name.namespace() != value.namespace() {
            element
                .attributes
                .insert(format!("xmlns:{prefix}"), value.namespace().to_string());
        }
        format!("{prefix}:{}", value.local_name())
    };
    element.children.push(XMLNode::Text(text));
    element
}

/// Resolves a `prefix:local` text value against the element's in-scope namespaces.
pub fn resolve_qname_value(element: &Element, value: &str) -> Option<QName> {
    let value = value.trim();
    let (prefix, local) = value.split_once(':').unwrap_or(("", value));
    if local.is_empty() {
        return None;
    }
    let declared = element
        .namespaces
        .as_ref()
        .and_then(|ns| ns.get(prefix))
        .map(str::to_string)
        .or_else(|| {
            let key = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{prefix}")
            };
            element.attributes.get(&key).cloned()
        });
    match declared {
        Some(namespace) => {
            let name = QName::new(namespace, local);
            Some(if prefix.is_empty() { name } else { name.with_prefix(prefix) })
        }
        None if prefix.is_empty() => Some(QName::local(local)),
        None => None,
    }
}

/// Parses a complete XML document into its root element.
pub fn parse_element(bytes: &[u8]) -> MessageResult<Element> {
    TreeBuilder::new(&[]).build(bytes)
}

/// Parses a detached fragment, resolving prefixes against the namespaces
/// that were in scope where it was cut from.
pub fn parse_fragment(fragment: &[u8], namespaces: &[NamespaceBinding]) -> MessageResult<Element> {
    TreeBuilder::new(namespaces).build(fragment)
}

/// Collects the `xmlns` declarations on a start tag.
pub(crate) fn declarations(start: &BytesStart<'_>) -> MessageResult<Vec<NamespaceBinding>> {
    let mut bindings = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| MessageError::malformed(e.to_string()))?;
        let key = attribute.key.as_ref();
        let prefix = if key == b"xmlns" {
            String::new()
        } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            String::from_utf8_lossy(prefix).into_owned()
        } else {
            continue;
        };
        bindings.push((prefix, String::from_utf8_lossy(&attribute.value).into_owned()));
    }
    Ok(bindings)
}

/// Resolves a raw `prefix:local` tag name against bindings; later bindings win.
pub(crate) fn resolve_tag_name(raw: &[u8], scope: &[NamespaceBinding]) -> MessageResult<QName> {
    let raw = std::str::from_utf8(raw).map_err(|e| MessageError::malformed(e.to_string()))?;
    let (prefix, local) = raw.split_once(':').unwrap_or(("", raw));
    let namespace = scope
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.clone());
    match namespace {
        Some(uri) if prefix.is_empty() => Ok(QName::new(uri, local)),
        Some(uri) => Ok(QName::new(uri, local).with_prefix(prefix)),
        None if prefix.is_empty() => Ok(QName::local(local)),
        None => Err(MessageError::malformed(format!("unbound namespace prefix '{prefix}'"))),
    }
}

/// Builds `xmltree` elements from quick-xml events.
///
/// Attribute keys are stored as written, prefix included, and every element
/// records the namespaces in scope at its start tag so that writing the tree
/// back out re-declares whatever its attributes and text refer to.
struct TreeBuilder {
    scope: Vec<NamespaceBinding>,
    open: Vec<(Element, usize)>,
    text: String,
    root: Option<Element>,
}

impl TreeBuilder {
    fn new(inherited: &[NamespaceBinding]) -> Self {
        Self {
            scope: inherited.to_vec(),
            open: Vec::new(),
            text: String::new(),
            root: None,
        }
    }

    fn build(mut self, source: &[u8]) -> MessageResult<Element> {
        let mut reader = Reader::from_reader(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Text(text) => {
                    self.text.push_str(&text.decode().map_err(quick_xml::Error::from)?);
                }
                Event::GeneralRef(reference) => self.text.push_str(&resolve_reference(&reference)?),
                Event::Start(start) => {
                    self.flush_text()?;
                    let opened = self.open_element(&start)?;
                    self.open.push(opened);
                }
                Event::Empty(start) => {
                    self.flush_text()?;
                    let (element, mark) = self.open_element(&start)?;
                    self.scope.truncate(mark);
                    self.close(element);
                }
                Event::End(_) => {
                    self.flush_text()?;
                    let (element, mark) = self
                        .open
                        .pop()
                        .ok_or_else(|| MessageError::malformed("unexpected end tag"))?;
                    self.scope.truncate(mark);
                    self.close(element);
                }
                Event::CData(data) => {
                    self.flush_text()?;
                    let data = data.decode().map_err(quick_xml::Error::from)?.into_owned();
                    self.push_node(XMLNode::CData(data));
                }
                Event::Comment(comment) => {
                    self.flush_text()?;
                    let comment = comment.decode().map_err(quick_xml::Error::from)?.into_owned();
                    self.push_node(XMLNode::Comment(comment));
                }
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }
        self.flush_text()?;
        if !self.open.is_empty() {
            return Err(MessageError::malformed("unclosed element at end of document"));
        }
        self.root
            .ok_or_else(|| MessageError::malformed("document contains no element"))
    }

    /// Creates the element for a start tag and pushes its declarations onto
    /// the scope. Returns the scope length to restore once it closes.
    fn open_element(&mut self, start: &BytesStart<'_>) -> MessageResult<(Element, usize)> {
        if self.root.is_some() {
            return Err(MessageError::malformed("content after the root element"));
        }
        let mark = self.scope.len();
        self.scope.extend(declarations(start)?);
        let name = resolve_tag_name(start.name().as_ref(), &self.scope)?;

        let mut element = Element::new(name.local_name());
        element.prefix = name.prefix().map(str::to_string);
        element.namespace = Some(name.namespace().to_string()).filter(|ns| !ns.is_empty());
        element.namespaces = self.in_scope();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|e| MessageError::malformed(e.to_string()))?;
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            if let Some((prefix, _)) = key.split_once(':') {
                if prefix != "xml" && !self.scope.iter().any(|(p, _)| p == prefix) {
                    return Err(MessageError::malformed(format!("unbound namespace prefix '{prefix}'")));
                }
            }
            let value = attribute.unescape_value()?.into_owned();
            element.attributes.insert(key.to_string(), value);
        }
        Ok((element, mark))
    }

    fn in_scope(&self) -> Option<Namespace> {
        if self.scope.is_empty() {
            return None;
        }
        let mut namespaces = Namespace::empty();
        for (prefix, uri) in &self.scope {
            namespaces.force_put(prefix.as_str(), uri.as_str());
        }
        Some(namespaces)
    }

    fn close(&mut self, element: Element) {
        match self.open.last_mut() {
            Some((parent, _)) => parent.children.push(XMLNode::Element(element)),
            None => self.root = Some(element),
        }
    }

    fn push_node(&mut self, node: XMLNode) {
        if let Some((parent, _)) = self.open.last_mut() {
            parent.children.push(node);
        }
    }

    /// Whitespace-only runs between elements are dropped.
    fn flush_text(&mut self) -> MessageResult<()> {
        let text = std::mem::take(&mut self.text);
        if text.trim().is_empty() {
            return Ok(());
        }
        if self.open.is_empty() {
            return Err(MessageError::malformed("text outside the root element"));
        }
        self.push_node(XMLNode::Text(text));
        Ok(())
    }
}

fn resolve_reference(reference: &BytesRef<'_>) -> MessageResult<String> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(quick_xml::Error::from)?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| MessageError::malformed(format!("undeclared entity '&{name};'")))
}

/// Writes an element without an XML declaration.
pub fn write_element(element: &Element) -> MessageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(false)
        .perform_indent(false);
    element.write_with_config(&mut buf, config)?;
    Ok(buf)
}

/// Writes an element as a standalone document.
pub fn write_document(element: &Element) -> MessageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    element.write_with_config(&mut buf, config)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_space() {
        assert_eq!(normalize_space("  urn:a \n  b\t"), "urn:a b");
        assert_eq!(normalize_space("   "), "");
    }

    #[test]
    fn test_parse_fragment_with_inherited_namespace() {
        let namespaces = vec![("o".to_string(), "urn:orders".to_string())];
        let element = parse_fragment(b"<o:Order><o:Id>7</o:Id></o:Order>", &namespaces).unwrap();
        assert_eq!(QName::of(&element), QName::new("urn:orders", "Order"));
        let id = find_child(&element, &QName::new("urn:orders", "Id")).unwrap();
        assert_eq!(text_of(id), "7");
    }

    #[test]
    fn test_resolve_qname_value() {
        let element = parse_element(
            br#"<code xmlns:wsa="http://www.w3.org/2005/08/addressing">wsa:Action</code>"#,
        )
        .unwrap();
        let name = resolve_qname_value(&element, "wsa:Action").unwrap();
        assert_eq!(name.namespace(), "http://www.w3.org/2005/08/addressing");
        assert_eq!(name.local_name(), "Action");
        assert!(resolve_qname_value(&element, "nope:Action").is_none());
    }

    #[test]
    fn test_attribute_resolves_prefix() {
        let element = parse_element(
            br#"<h xmlns:s="urn:s" xmlns:t="urn:t" s:mustUnderstand="1" t:mustUnderstand="0" other="x"/>"#,
        )
        .unwrap();
        assert_eq!(attribute(&element, &QName::new("urn:s", "mustUnderstand")), Some("1"));
        assert_eq!(attribute(&element, &QName::new("urn:t", "mustUnderstand")), Some("0"));
        assert_eq!(attribute(&element, &QName::local("mustUnderstand")), None);
        assert_eq!(attribute(&element, &QName::local("other")), Some("x"));
        assert_eq!(attribute(&element, &QName::local("missing")), None);
    }

    #[test]
    fn test_parse_keeps_attribute_prefixes() {
        let element = parse_element(
            br#"<o:Order xmlns:o="urn:orders" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true" xml:lang="en"/>"#,
        )
        .unwrap();
        assert_eq!(element.attributes.get("xsi:nil").map(String::as_str), Some("true"));
        assert_eq!(attribute(&element, &QName::new(XML_NAMESPACE, "lang")), Some("en"));
        assert!(element.attributes.keys().all(|key| !key.starts_with("xmlns")));

        let written = String::from_utf8(write_element(&element).unwrap()).unwrap();
        assert!(written.contains(r#"xsi:nil="true""#), "{written}");
        assert!(written.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#), "{written}");
    }

    #[test]
    fn test_parse_resolves_references_and_nesting() {
        let element = parse_element(
            br#"<a xmlns="urn:a"><b>x &amp; y &#60;z&#x3E;</b><c:c xmlns:c="urn:c"/><!-- note --></a>"#,
        )
        .unwrap();
        assert_eq!(QName::of(&element), QName::new("urn:a", "a"));
        let b = find_child(&element, &QName::new("urn:a", "b")).unwrap();
        assert_eq!(text_of(b), "x & y <z>");
        assert!(find_child(&element, &QName::new("urn:c", "c")).is_some());
        assert_eq!(child_elements(&element).count(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        assert!(parse_element(br#"<a x:y="1"/>"#).is_err());
        assert!(parse_element(b"<a><b></a>").is_err());
        assert!(parse_element(b"<a/><b/>").is_err());
        assert!(parse_element(b"<a>").is_err());
        assert!(parse_element(b"   ").is_err());
        assert!(parse_element(b"<a>&bogus;</a>").is_err());
    }

    #[test]
    fn test_qname_value_element_round_trip() {
        let name = QName::new("urn:env", "Value").with_prefix("env");
        let value = QName::new("urn:codes", "Broken").with_prefix("c");
        let element = qname_value_element(&name, &value);
        let bytes = write_element(&element).unwrap();
        let parsed = parse_element(&bytes).unwrap();
        assert_eq!(
            resolve_qname_value(&parsed, &text_of(&parsed)),
            Some(QName::new("urn:codes", "Broken"))
        );
    }
}
