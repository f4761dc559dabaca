//! Mapping by transport action.

use super::{EndpointMapping, LookupTable, MappingSupport, TableMapping, TableMappingBuilder};
use crate::chain::EndpointInvocationChain;
use crate::error::MappingError;
use herald_core::{MessageContext, MessageError};

/// Maps the `SOAPAction` (or SOAP 1.2 `action` parameter) to an endpoint.
///
/// Surrounding quotes are stripped from both keys and request values. An
/// empty action never matches.
#[derive(Debug)]
pub struct SoapActionEndpointMapping {
    table: LookupTable<String>,
    support: MappingSupport,
}

impl SoapActionEndpointMapping {
    /// Starts a builder.
    pub fn builder() -> TableMappingBuilder<Self> {
        TableMappingBuilder::new()
    }

    /// Returns the number of registered actions.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn strip_quotes(value: &str) -> &str {
    value.trim().trim_matches('"')
}

impl TableMapping for SoapActionEndpointMapping {
    type Key = String;

    const NAME: &'static str = "soap-action";

    fn parse_key(raw: &str) -> Result<String, MappingError> {
        let action = strip_quotes(raw);
        if action.is_empty() {
            return Err(MappingError::invalid(Self::NAME, raw, "action must not be empty"));
        }
        Ok(action.to_string())
    }

    fn from_table(table: LookupTable<String>, support: MappingSupport) -> Self {
        Self { table, support }
    }
}

impl EndpointMapping for SoapActionEndpointMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn endpoint_for(&self, ctx: &MessageContext) -> Result<Option<EndpointInvocationChain>, MessageError> {
        let target = ctx
            .request()
            .soap_action()
            .map(strip_quotes)
            .filter(|action| !action.is_empty())
            .and_then(|action| self.table.get(action));
        Ok(self.support.chain_for(target, Self::NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::FnEndpoint;
    use crate::mapping::EndpointTarget;
    use herald_core::{SoapMessage, SoapVersion, TreeMessageFactory};
    use std::sync::Arc;

    fn context(action: Option<&str>) -> MessageContext {
        let mut request = SoapMessage::new(SoapVersion::Soap11);
        if let Some(action) = action {
            request.set_soap_action(action);
        }
        MessageContext::new(request, Arc::new(TreeMessageFactory::default()))
    }

    fn mapping() -> SoapActionEndpointMapping {
        SoapActionEndpointMapping::builder()
            .endpoint("urn:echo", EndpointTarget::instance(FnEndpoint::new("echo", |_| Ok(()))))
            .build()
            .unwrap()
    }

    #[test]
    fn test_quoted_action_matches() {
        let chain = mapping().endpoint_for(&context(Some("\"urn:echo\""))).unwrap();
        assert_eq!(chain.unwrap().endpoint().name(), "echo");
    }

    #[test]
    fn test_empty_action_never_matches() {
        assert!(mapping().endpoint_for(&context(Some("\"\""))).unwrap().is_none());
        assert!(mapping().endpoint_for(&context(Some(""))).unwrap().is_none());
        assert!(mapping().endpoint_for(&context(None)).unwrap().is_none());
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = SoapActionEndpointMapping::builder()
            .endpoint("\"\"", EndpointTarget::named("x"))
            .build();
        assert!(matches!(result, Err(MappingError::InvalidKey { .. })));
    }
}
