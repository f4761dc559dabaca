//! Out-of-band reply delivery.

use crate::uri::AddressingUri;
use herald_core::SoapMessage;
use std::sync::Arc;

/// Delivers a reply to a non-anonymous address.
///
/// Senders are called synchronously from the exchange thread.
pub trait MessageSender: Send + Sync {
    /// Returns a short name for logs.
    fn name(&self) -> &str;

    /// Returns true when this sender can reach `uri`.
    fn supports(&self, uri: &AddressingUri) -> bool;

    /// Sends `message` to `uri`.
    fn send(&self, uri: &AddressingUri, message: &SoapMessage) -> anyhow::Result<()>;
}

/// A shared sender.
pub type BoxedMessageSender = Arc<dyn MessageSender>;

/// Returns the first sender that supports `uri`.
pub fn sender_for<'a>(senders: &'a [BoxedMessageSender], uri: &AddressingUri) -> Option<&'a BoxedMessageSender> {
    senders.iter().find(|sender| sender.supports(uri))
}
