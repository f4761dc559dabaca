//! SOAP faults and declarative fault definitions.
//!
//! A [`SoapFault`] is version-neutral until it is written: the logical
//! [`FaultCode`] is mapped to the active version's vocabulary by
//! [`SoapFault::to_element`], so a client fault becomes `Client` under SOAP 1.1
//! and `Sender` under SOAP 1.2.

use crate::error::{MessageError, MessageResult};
use crate::qname::QName;
use crate::version::SoapVersion;
use crate::xml;
use std::fmt;
use std::str::FromStr;
use xmltree::{Element, XMLNode};

/// Locale used when a fault does not name one.
pub const DEFAULT_FAULT_LOCALE: &str = "en";

/// The classification of a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultCode {
    /// `Client` (1.1) or `Sender` (1.2).
    ClientOrSender,
    /// `Server` (1.1) or `Receiver` (1.2).
    ServerOrReceiver,
    /// `MustUnderstand`.
    MustUnderstand,
    /// `VersionMismatch`.
    VersionMismatch,
    /// An arbitrary code; SOAP 1.1 only.
    Custom(QName),
}

impl FaultCode {
    /// Returns the wire QName of this code under `version`.
    pub fn qname(&self, version: SoapVersion) -> MessageResult<QName> {
        match self {
            Self::ClientOrSender => Ok(version.client_or_sender_fault_code()),
            Self::ServerOrReceiver => Ok(version.server_or_receiver_fault_code()),
            Self::MustUnderstand => Ok(version.must_understand_fault_code()),
            Self::VersionMismatch => Ok(version.version_mismatch_fault_code()),
            Self::Custom(code) if version.supports_custom_fault_codes() => Ok(code.clone()),
            Self::Custom(code) => Err(MessageError::UnsupportedFaultCode {
                code: code.to_string(),
                version: version.name(),
            }),
        }
    }

    /// Maps a wire QName back to a logical code.
    pub fn from_qname(version: SoapVersion, code: &QName) -> Self {
        if *code == version.client_or_sender_fault_code() {
            Self::ClientOrSender
        } else if *code == version.server_or_receiver_fault_code() {
            Self::ServerOrReceiver
        } else if *code == version.must_understand_fault_code() {
            Self::MustUnderstand
        } else if *code == version.version_mismatch_fault_code() {
            Self::VersionMismatch
        } else {
            Self::Custom(code.clone())
        }
    }

    /// Returns a stable lowercase label, used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClientOrSender => "client",
            Self::ServerOrReceiver => "server",
            Self::MustUnderstand => "must_understand",
            Self::VersionMismatch => "version_mismatch",
            Self::Custom(_) => "custom",
        }
    }
}

/// A protocol fault carried in a message body.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapFault {
    code: FaultCode,
    subcodes: Vec<QName>,
    reason: String,
    locale: Option<String>,
    actor_or_role: Option<String>,
    details: Vec<Element>,
}

impl SoapFault {
    /// Creates a fault with a code and reason.
    pub fn new(code: FaultCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            subcodes: Vec::new(),
            reason: reason.into(),
            locale: None,
            actor_or_role: None,
            details: Vec::new(),
        }
    }

    /// Creates a client/sender fault.
    pub fn client(reason: impl Into<String>) -> Self {
        Self::new(FaultCode::ClientOrSender, reason)
    }

    /// Creates a server/receiver fault.
    pub fn server(reason: impl Into<String>) -> Self {
        Self::new(FaultCode::ServerOrReceiver, reason)
    }

    /// Sets the reason locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Sets the faulting actor (1.1) or role (1.2).
    #[must_use]
    pub fn with_actor_or_role(mut self, actor: impl Into<String>) -> Self {
        self.actor_or_role = Some(actor.into());
        self
    }

    /// Appends a subcode. Subcodes are written under SOAP 1.2 only.
    #[must_use]
    pub fn with_subcode(mut self, subcode: QName) -> Self {
        self.subcodes.push(subcode);
        self
    }

    /// Appends a detail entry.
    #[must_use]
    pub fn with_detail(mut self, detail: Element) -> Self {
        self.details.push(detail);
        self
    }

    /// Returns the logical code.
    pub fn code(&self) -> &FaultCode {
        &self.code
    }

    /// Returns the subcodes in order.
    pub fn subcodes(&self) -> &[QName] {
        &self.subcodes
    }

    /// Returns the reason text.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the reason locale.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Returns the actor or role.
    pub fn actor_or_role(&self) -> Option<&str> {
        self.actor_or_role.as_deref()
    }

    /// Returns the detail entries in order.
    pub fn details(&self) -> &[Element] {
        &self.details
    }

    /// Checks that the fault can be written under `version`.
    pub fn validate(&self, version: SoapVersion) -> MessageResult<()> {
        self.code.qname(version).map(|_| ())
    }

    /// Writes the fault as a `Fault` element in the version's vocabulary.
    pub fn to_element(&self, version: SoapVersion) -> MessageResult<Element> {
        let code = self.code.qname(version)?;
        let mut fault = version.envelope_name("Fault").to_element();
        match version {
            SoapVersion::Soap11 => {
                push(&mut fault, xml::qname_value_element(&QName::local("faultcode"), &code));
                let mut reason = xml::text_element(&QName::local("faultstring"), &self.reason);
                if let Some(locale) = &self.locale {
                    reason.attributes.insert("xml:lang".to_string(), locale.clone());
                }
                push(&mut fault, reason);
                if let Some(actor) = &self.actor_or_role {
                    push(&mut fault, xml::text_element(&QName::local("faultactor"), actor));
                }
                if !self.details.is_empty() {
                    push(&mut fault, self.detail_element(QName::local("detail")));
                }
            }
            SoapVersion::Soap12 => {
                let value_name = version.envelope_name("Value");
                let mut code_element = version.envelope_name("Code").to_element();
                push(&mut code_element, xml::qname_value_element(&value_name, &code));
                // Subcodes nest: Code/Subcode/Subcode/...
                let mut nested: Option<Element> = None;
                for subcode in self.subcodes.iter().rev() {
                    let mut sub = version.envelope_name("Subcode").to_element();
                    push(&mut sub, xml::qname_value_element(&value_name, subcode));
                    if let Some(inner) = nested.take() {
                        push(&mut sub, inner);
                    }
                    nested = Some(sub);
                }
                if let Some(sub) = nested {
                    push(&mut code_element, sub);
                }
                push(&mut fault, code_element);

                let mut reason = version.envelope_name("Reason").to_element();
                let mut text = xml::text_element(&version.envelope_name("Text"), &self.reason);
                text.attributes.insert(
                    "xml:lang".to_string(),
                    self.locale.clone().unwrap_or_else(|| DEFAULT_FAULT_LOCALE.to_string()),
                );
                push(&mut reason, text);
                push(&mut fault, reason);

                if let Some(role) = &self.actor_or_role {
                    push(&mut fault, xml::text_element(&version.envelope_name("Role"), role));
                }
                if !self.details.is_empty() {
                    push(&mut fault, self.detail_element(version.envelope_name("Detail")));
                }
            }
        }
        Ok(fault)
    }

    /// Reads a `Fault` element written in `version`'s vocabulary.
    pub fn from_element(version: SoapVersion, element: &Element) -> MessageResult<Self> {
        match version {
            SoapVersion::Soap11 => {
                let code_element = xml::find_child(element, &QName::local("faultcode"))
                    .ok_or_else(|| MessageError::invalid_envelope("fault without faultcode"))?;
                let code = xml::resolve_qname_value(code_element, &xml::text_of(code_element))
                    .ok_or_else(|| MessageError::invalid_envelope("unresolvable faultcode"))?;
                let reason_element = xml::find_child(element, &QName::local("faultstring"));
                let mut fault = Self::new(
                    FaultCode::from_qname(version, &code),
                    reason_element.map(xml::text_of).unwrap_or_default(),
                );
                fault.locale = reason_element
                    .and_then(|r| xml::attribute(r, &xml_lang()))
                    .map(str::to_string);
                fault.actor_or_role = xml::find_child(element, &QName::local("faultactor"))
                    .map(xml::text_of);
                if let Some(detail) = xml::find_child(element, &QName::local("detail")) {
                    fault.details = xml::child_elements(detail).cloned().collect();
                }
                Ok(fault)
            }
            SoapVersion::Soap12 => {
                let value_name = version.envelope_name("Value");
                let code_element = xml::find_child(element, &version.envelope_name("Code"))
                    .ok_or_else(|| MessageError::invalid_envelope("fault without Code"))?;
                let code = read_value(code_element, &value_name)?;
                let mut fault = Self::new(FaultCode::from_qname(version, &code), String::new());

                let mut current = code_element;
                while let Some(sub) = xml::find_child(current, &version.envelope_name("Subcode")) {
                    fault.subcodes.push(read_value(sub, &value_name)?);
                    current = sub;
                }
                if let Some(text) = xml::find_child(element, &version.envelope_name("Reason"))
                    .and_then(|reason| xml::find_child(reason, &version.envelope_name("Text")))
                {
                    fault.reason = xml::text_of(text);
                    fault.locale = xml::attribute(text, &xml_lang()).map(str::to_string);
                }
                fault.actor_or_role =
                    xml::find_child(element, &version.envelope_name("Role")).map(xml::text_of);
                if let Some(detail) = xml::find_child(element, &version.envelope_name("Detail")) {
                    fault.details = xml::child_elements(detail).cloned().collect();
                }
                Ok(fault)
            }
        }
    }

    fn detail_element(&self, name: QName) -> Element {
        let mut detail = name.to_element();
        for entry in &self.details {
            push(&mut detail, entry.clone());
        }
        detail
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fault: {}", self.code.label(), self.reason)
    }
}

fn push(parent: &mut Element, child: Element) {
    parent.children.push(XMLNode::Element(child));
}

fn xml_lang() -> QName {
    QName::new(xml::XML_NAMESPACE, "lang")
}

fn read_value(parent: &Element, value_name: &QName) -> MessageResult<QName> {
    let value = xml::find_child(parent, value_name)
        .ok_or_else(|| MessageError::invalid_envelope("fault code without Value"))?;
    xml::resolve_qname_value(value, &xml::text_of(value))
        .ok_or_else(|| MessageError::invalid_envelope("unresolvable fault code value"))
}

/// A declarative template materialized into a [`SoapFault`].
///
/// The textual form is `CODE,reason[,locale]` where `CODE` is one of
/// `CLIENT`, `SENDER`, `SERVER`, `RECEIVER` or a `{namespace}local` custom code.
///
/// ```
/// use herald_core::{FaultCode, FaultDefinition};
///
/// let definition: FaultDefinition = "SENDER,Invalid order,en".parse().unwrap();
/// assert_eq!(definition.code(), &FaultCode::ClientOrSender);
/// assert_eq!(definition.reason(), Some("Invalid order"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultDefinition {
    code: FaultCode,
    reason: Option<String>,
    locale: String,
    actor: Option<String>,
}

impl FaultDefinition {
    /// Creates a definition with a code and no fixed reason.
    pub fn new(code: FaultCode) -> Self {
        Self {
            code,
            reason: None,
            locale: DEFAULT_FAULT_LOCALE.to_string(),
            actor: None,
        }
    }

    /// Sets the reason text.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Sets the actor or role.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Returns the code.
    pub fn code(&self) -> &FaultCode {
        &self.code
    }

    /// Returns the fixed reason, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Returns the actor or role.
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Materializes a fault, using `fallback_reason` when the definition has none.
    pub fn to_fault(&self, fallback_reason: &str) -> SoapFault {
        let reason = self
            .reason
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(fallback_reason);
        let mut fault = SoapFault::new(self.code.clone(), reason).with_locale(self.locale.clone());
        if let Some(actor) = &self.actor {
            fault = fault.with_actor_or_role(actor.clone());
        }
        fault
    }
}

impl FromStr for FaultDefinition {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ',').map(str::trim);
        let code_text = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| {
            MessageError::invalid_fault_definition(s, "missing fault code")
        })?;
        let code = match code_text.to_ascii_uppercase().as_str() {
            "CLIENT" | "SENDER" => FaultCode::ClientOrSender,
            "SERVER" | "RECEIVER" => FaultCode::ServerOrReceiver,
            _ if code_text.starts_with('{') => FaultCode::Custom(
                QName::from_clark(code_text)
                    .map_err(|e| MessageError::invalid_fault_definition(s, e.to_string()))?,
            ),
            other => {
                return Err(MessageError::invalid_fault_definition(
                    s,
                    format!("unknown fault code '{other}'"),
                ))
            }
        };
        let mut definition = Self::new(code);
        if let Some(reason) = parts.next().filter(|r| !r.is_empty()) {
            definition.reason = Some(reason.to_string());
        }
        if let Some(locale) = parts.next().filter(|l| !l.is_empty()) {
            definition.locale = locale.to_string();
        }
        Ok(definition)
    }
}
