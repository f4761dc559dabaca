//! Mapping by payload root name.

use super::{EndpointMapping, LookupTable, MappingSupport, TableMapping, TableMappingBuilder};
use crate::chain::EndpointInvocationChain;
use crate::error::MappingError;
use herald_core::{MessageContext, MessageError, QName};

/// Maps the qualified name of the payload root to an endpoint.
///
/// Keys are registered in Clark notation (`{namespace}local`). Only the
/// start tag of the payload is read, so streaming payloads stay unparsed.
#[derive(Debug)]
pub struct PayloadRootQNameEndpointMapping {
    table: LookupTable<QName>,
    support: MappingSupport,
}

impl PayloadRootQNameEndpointMapping {
    /// Starts a builder.
    pub fn builder() -> TableMappingBuilder<Self> {
        TableMappingBuilder::new()
    }

    /// Returns the number of registered names.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl TableMapping for PayloadRootQNameEndpointMapping {
    type Key = QName;

    const NAME: &'static str = "payload-root";

    fn parse_key(raw: &str) -> Result<QName, MappingError> {
        QName::from_clark(raw).map_err(|err| MappingError::invalid(Self::NAME, raw, err.to_string()))
    }

    fn from_table(table: LookupTable<QName>, support: MappingSupport) -> Self {
        Self { table, support }
    }
}

impl EndpointMapping for PayloadRootQNameEndpointMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn endpoint_for(&self, ctx: &MessageContext) -> Result<Option<EndpointInvocationChain>, MessageError> {
        let target = match ctx.request().payload_root_name()? {
            Some(root) => self.table.get(&root),
            None => None,
        };
        Ok(self.support.chain_for(target, Self::NAME))
    }
}
