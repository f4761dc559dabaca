//! SOAP header blocks.

use crate::error::MessageResult;
use crate::qname::QName;
use crate::version::SoapVersion;
use crate::xml;
use xmltree::{Element, XMLNode};

/// One header block: a named element with targeting metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapHeaderElement {
    name: QName,
    must_understand: bool,
    actor_or_role: Option<String>,
    content: Element,
}

impl SoapHeaderElement {
    /// Creates an empty header block.
    pub fn new(name: QName) -> Self {
        let content = name.to_element();
        Self {
            name,
            must_understand: false,
            actor_or_role: None,
            content,
        }
    }

    /// Wraps a parsed header element, reading its targeting attributes.
    ///
    /// Only attributes in `version`'s envelope namespace count as targeting;
    /// same-named attributes in other namespaces stay on the content.
    pub fn from_element(version: SoapVersion, mut content: Element) -> Self {
        let must_understand_name = version.envelope_name("mustUnderstand");
        let target_name = version.envelope_name(version.actor_or_role_attribute());
        let must_understand = xml::attribute(&content, &must_understand_name)
            .is_some_and(|v| matches!(v.trim(), "1" | "true"));
        let actor_or_role = xml::attribute(&content, &target_name)
            .map(str::to_string)
            .filter(|v| !v.is_empty());
        let targeting: Vec<String> = content
            .attributes
            .keys()
            .filter(|key| {
                xml::attribute_name(&content, key)
                    .is_some_and(|name| name == must_understand_name || name == target_name)
            })
            .cloned()
            .collect();
        for key in &targeting {
            content.attributes.remove(key);
        }
        Self {
            name: QName::of(&content),
            must_understand,
            actor_or_role,
            content,
        }
    }

    /// Returns the qualified name.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Returns the must-understand flag.
    pub fn must_understand(&self) -> bool {
        self.must_understand
    }

    /// Sets the must-understand flag.
    pub fn set_must_understand(&mut self, value: bool) {
        self.must_understand = value;
    }

    /// Returns the targeted actor (1.1) or role (1.2).
    pub fn actor_or_role(&self) -> Option<&str> {
        self.actor_or_role.as_deref()
    }

    /// Sets the targeted actor or role.
    pub fn set_actor_or_role(&mut self, value: impl Into<String>) {
        self.actor_or_role = Some(value.into());
    }

    /// Returns the normalized text content.
    pub fn text(&self) -> String {
        xml::normalize_space(&xml::text_of(&self.content))
    }

    /// Replaces the content with a text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content.children.retain(|node| !matches!(node, XMLNode::Text(_)));
        self.content.children.push(XMLNode::Text(text.into()));
    }

    /// Appends a child element.
    pub fn add_child(&mut self, child: Element) {
        self.content.children.push(XMLNode::Element(child));
    }

    /// Sets a plain attribute on the block.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.content.attributes.insert(name.into(), value.into());
    }

    /// Returns the underlying element, without targeting attributes.
    pub fn element(&self) -> &Element {
        &self.content
    }

    /// Writes the block, adding targeting attributes in `version`'s vocabulary.
    pub fn to_element(&self, version: SoapVersion) -> Element {
        let mut element = self.content.clone();
        let env_prefix = crate::version::ENVELOPE_PREFIX;
        let needs_env = self.must_understand || self.actor_or_role.is_some();
        if needs_env {
            xml::declare_namespace(&mut element, env_prefix, version.envelope_namespace());
        }
        if self.must_understand {
            element.attributes.insert(
                format!("{env_prefix}:mustUnderstand"),
                version.must_understand_true().to_string(),
            );
        }
        if let Some(target) = &self.actor_or_role {
            element.attributes.insert(
                format!("{env_prefix}:{}", version.actor_or_role_attribute()),
                target.clone(),
            );
        }
        element
    }
}

/// The ordered header of a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoapHeader {
    elements: Vec<SoapHeaderElement>,
}

impl SoapHeader {
    /// Creates an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new block and returns it for editing.
    pub fn add_header_element(&mut self, name: QName) -> &mut SoapHeaderElement {
        self.elements.push(SoapHeaderElement::new(name));
        let last = self.elements.len() - 1;
        &mut self.elements[last]
    }

    /// Appends an existing block.
    pub fn push(&mut self, element: SoapHeaderElement) {
        self.elements.push(element);
    }

    /// Returns every block in document order.
    pub fn elements(&self) -> &[SoapHeaderElement] {
        &self.elements
    }

    /// Returns the blocks with the given name.
    pub fn elements_named<'a>(&'a self, name: &QName) -> impl Iterator<Item = &'a SoapHeaderElement> + 'a {
        let name = name.clone();
        self.elements.iter().filter(move |e| *e.name() == name)
    }

    /// Returns true when no blocks are present.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Removes every block with the given name.
    pub fn remove_header_elements(&mut self, name: &QName) {
        self.elements.retain(|e| e.name() != name);
    }

    /// Returns the blocks this node must process.
    ///
    /// Under SOAP 1.1 a block is targeted when it names no actor, the `next`
    /// actor, or one of `actors_or_roles`. Under SOAP 1.2 the `next` role and
    /// listed roles are always targeted, an absent or `ultimateReceiver` role
    /// only when `ultimate_receiver` is set, and the `none` role never.
    pub fn elements_to_process(
        &self,
        version: SoapVersion,
        actors_or_roles: &[String],
        ultimate_receiver: bool,
    ) -> Vec<&SoapHeaderElement> {
        self.elements
            .iter()
            .filter(|e| is_targeted(e, version, actors_or_roles, ultimate_receiver))
            .collect()
    }

    /// Adds a SOAP 1.2 `NotUnderstood` block naming `header`.
    pub fn add_not_understood(&mut self, version: SoapVersion, header: &QName) {
        let mut block = SoapHeaderElement::new(version.envelope_name("NotUnderstood"));
        if header.namespace().is_empty() {
            block.set_attribute("qname", header.local_name());
        } else {
            let prefix = header.prefix().unwrap_or("ns0").to_string();
            block.set_attribute(format!("xmlns:{prefix}"), header.namespace());
            block.set_attribute("qname", format!("{prefix}:{}", header.local_name()));
        }
        self.elements.push(block);
    }

    /// Writes the header as a `Header` element, or `None` when empty.
    pub fn to_element(&self, version: SoapVersion) -> MessageResult<Option<Element>> {
        if self.elements.is_empty() {
            return Ok(None);
        }
        let mut header = version.envelope_name("Header").to_element();
        for block in &self.elements {
            header.children.push(XMLNode::Element(block.to_element(version)));
        }
        Ok(Some(header))
    }

    /// Reads the blocks of a parsed `Header` element.
    pub fn from_element(version: SoapVersion, header: &Element) -> Self {
        Self {
            elements: xml::child_elements(header)
                .map(|child| SoapHeaderElement::from_element(version, child.clone()))
                .collect(),
        }
    }
}

fn is_targeted(
    element: &SoapHeaderElement,
    version: SoapVersion,
    actors_or_roles: &[String],
    ultimate_receiver: bool,
) -> bool {
    let target = element.actor_or_role();
    match version {
        SoapVersion::Soap11 => match target {
            None => true,
            Some(actor) => {
                actor == version.next_actor_or_role_uri()
                    || actors_or_roles.iter().any(|a| a == actor)
            }
        },
        SoapVersion::Soap12 => match target {
            None => ultimate_receiver,
            Some(role) if Some(role) == version.none_role_uri() => false,
            Some(role) if Some(role) == version.ultimate_receiver_role_uri() => ultimate_receiver,
            Some(role) => {
                role == version.next_actor_or_role_uri()
                    || actors_or_roles.iter().any(|r| r == role)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(target: Option<&str>) -> SoapHeaderElement {
        let mut element = SoapHeaderElement::new(QName::new("urn:h", "Token"));
        element.set_must_understand(true);
        if let Some(target) = target {
            element.set_actor_or_role(target);
        }
        element
    }

    fn header_with(blocks: Vec<SoapHeaderElement>) -> SoapHeader {
        let mut header = SoapHeader::new();
        for b in blocks {
            header.push(b);
        }
        header
    }

    #[test]
    fn test_soap11_targeting() {
        let v = SoapVersion::Soap11;
        let header = header_with(vec![
            block(None),
            block(Some(v.next_actor_or_role_uri())),
            block(Some("urn:me")),
            block(Some("urn:someone-else")),
        ]);
        let targeted = header.elements_to_process(v, &["urn:me".to_string()], true);
        assert_eq!(targeted.len(), 3);
    }

    #[test]
    fn test_soap12_targeting() {
        let v = SoapVersion::Soap12;
        let header = header_with(vec![
            block(None),
            block(v.ultimate_receiver_role_uri()),
            block(v.none_role_uri()),
            block(Some(v.next_actor_or_role_uri())),
        ]);
        assert_eq!(header.elements_to_process(v, &[], true).len(), 3);
        assert_eq!(header.elements_to_process(v, &[], false).len(), 1);
    }

    #[test]
    fn test_attributes_written_per_version() {
        let element = block(Some("urn:me"));
        let v11 = element.to_element(SoapVersion::Soap11);
        let v11_name = |local: &str| SoapVersion::Soap11.envelope_name(local);
        assert_eq!(xml::attribute(&v11, &v11_name("mustUnderstand")), Some("1"));
        assert_eq!(xml::attribute(&v11, &v11_name("actor")), Some("urn:me"));

        let v12 = element.to_element(SoapVersion::Soap12);
        let v12_name = |local: &str| SoapVersion::Soap12.envelope_name(local);
        assert_eq!(xml::attribute(&v12, &v12_name("mustUnderstand")), Some("true"));
        assert_eq!(xml::attribute(&v12, &v12_name("role")), Some("urn:me"));
    }

    #[test]
    fn test_parse_reads_targeting() {
        let parsed = xml::parse_element(
            br#"<h:Token xmlns:h="urn:h" xmlns:s="http://www.w3.org/2003/05/soap-envelope" s:mustUnderstand="true" s:role="urn:me">abc</h:Token>"#,
        )
        .unwrap();
        let element = SoapHeaderElement::from_element(SoapVersion::Soap12, parsed);
        assert!(element.must_understand());
        assert_eq!(element.actor_or_role(), Some("urn:me"));
        assert_eq!(element.text(), "abc");
        assert_eq!(element.name(), &QName::new("urn:h", "Token"));
    }

    #[test]
    fn test_foreign_targeting_attributes_stay_on_content() {
        let parsed = xml::parse_element(
            br#"<h:Token xmlns:h="urn:h" xmlns:x="urn:other" xmlns:s="http://www.w3.org/2003/05/soap-envelope" x:role="auditor" s:role="urn:me"/>"#,
        )
        .unwrap();
        let element = SoapHeaderElement::from_element(SoapVersion::Soap12, parsed);
        assert_eq!(element.actor_or_role(), Some("urn:me"));
        assert!(!element.must_understand());
        assert_eq!(element.element().attributes.get("x:role").map(String::as_str), Some("auditor"));
        assert!(element.element().attributes.get("s:role").is_none());
    }

    #[test]
    fn test_elements_named_with_temporary_name() {
        let mut header = SoapHeader::new();
        header.add_header_element(QName::new("urn:h", "Token")).set_text("a");
        header.add_header_element(QName::new("urn:h", "Other"));
        header.add_header_element(QName::new("urn:h", "Token")).set_text("b");

        let texts: Vec<String> = header
            .elements_named(&QName::new("urn:h", "Token"))
            .map(SoapHeaderElement::text)
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_not_understood_for_unqualified_header() {
        let mut header = SoapHeader::new();
        header.add_not_understood(SoapVersion::Soap12, &QName::local("Token"));
        let block = header.elements()[0].element();
        assert_eq!(block.attributes.get("qname").map(String::as_str), Some("Token"));
        assert!(block.attributes.keys().all(|key| !key.starts_with("xmlns:ns0")));

        let bytes = xml::write_element(&header.elements()[0].to_element(SoapVersion::Soap12)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("xmlns:ns0"), "{text}");
        assert!(text.contains(r#"qname="Token""#), "{text}");
    }

    #[test]
    fn test_not_understood_for_qualified_header() {
        let mut header = SoapHeader::new();
        header.add_not_understood(SoapVersion::Soap12, &QName::new("urn:h", "Token").with_prefix("h"));
        let block = header.elements()[0].element();
        assert_eq!(block.attributes.get("qname").map(String::as_str), Some("h:Token"));
        assert_eq!(block.attributes.get("xmlns:h").map(String::as_str), Some("urn:h"));
    }
}
