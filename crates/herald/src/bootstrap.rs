//! Assembles a dispatcher from configuration.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;

use herald_addressing::{ActionEndpointMapping, ActionRegistration, MemoryMessageIdStrategy};
use herald_config::{HeraldConfig, MessageFactoryKind};
use herald_core::{FaultDefinition, MessageFactory, StreamingMessageFactory, TreeMessageFactory};
use herald_dispatch::{
    EndpointRegistry, EndpointTarget, FaultMappingExceptionResolver, MessageDispatcher,
    PayloadRootQNameEndpointMapping, SimpleFaultExceptionResolver, SoapActionEndpointMapping,
};
use herald_server::{HttpResponse, ReceiverConfig, Server, ShutdownSignal, SoapReceiver};

use crate::HeraldError;

/// A dispatcher, its message factory and the configuration they came from.
///
/// Mappings are consulted in this order:
///
/// 1. the WS-Addressing action mapping, when `addressing.enabled`
/// 2. the SOAP action table
/// 3. the payload root table, which also carries `mappings.default_endpoint`
///
/// Unresolved failures go to the fault mapping resolver, then to a
/// catch-all `Server`/`Receiver` fault when `faults.fallback_to_server_fault`.
///
/// ```
/// use herald::{EndpointRegistry, Herald, HeraldConfig, PayloadEndpoint};
///
/// let mut config = HeraldConfig::default();
/// config
///     .mappings
///     .payload_root
///     .insert("{urn:herald:echo}EchoRequest".to_string(), "echo".to_string());
///
/// let registry = EndpointRegistry::new().with(PayloadEndpoint::new("echo", |request| Ok(request.cloned())));
/// let herald = Herald::from_config(config, registry).unwrap();
///
/// let response = herald.handle(&Default::default(), herald::core::fixtures::SOAP11_ECHO_REQUEST.into());
/// assert_eq!(response.status(), 200);
/// ```
#[derive(Debug, Clone)]
pub struct Herald {
    config: HeraldConfig,
    receiver: SoapReceiver,
}

impl Herald {
    /// Validates `config` and builds the dispatcher over `registry`.
    ///
    /// # Errors
    ///
    /// Returns `HeraldError::Config` for an invalid configuration,
    /// `HeraldError::UnknownEndpoint` when a mapping names an endpoint the
    /// registry lacks, and `HeraldError::Mapping` for rejected keys.
    pub fn from_config(config: HeraldConfig, registry: EndpointRegistry) -> Result<Self, HeraldError> {
        config.validate()?;
        check_endpoint_names(&config, &registry)?;

        let factory = message_factory(&config);
        let registry = Arc::new(registry);
        let dispatcher = build_dispatcher(&config, &registry)?;
        tracing::info!(
            soap_version = %config.dispatcher.soap_version,
            endpoints = registry.len(),
            addressing = config.addressing.enabled,
            "dispatcher assembled"
        );

        Ok(Self {
            config,
            receiver: SoapReceiver::new(Arc::new(dispatcher), factory),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        self.receiver.dispatcher()
    }

    /// Returns the message factory.
    pub fn factory(&self) -> &Arc<dyn MessageFactory> {
        self.receiver.factory()
    }

    /// Returns the receiver that applies the SOAP HTTP binding.
    pub fn receiver(&self) -> &SoapReceiver {
        &self.receiver
    }

    /// Handles one exchange synchronously.
    pub fn handle(&self, headers: &HeaderMap, body: Bytes) -> HttpResponse {
        self.receiver.receive(headers.clone(), body)
    }

    /// Installs logging and metrics as configured.
    ///
    /// Call once, from within a Tokio runtime when a standalone metrics
    /// listener is configured.
    pub fn init_telemetry(&self) -> Result<(), HeraldError> {
        herald_telemetry::init_telemetry(&self.config.telemetry.to_telemetry_config())?;
        Ok(())
    }

    /// Receiver settings derived from the `server` section.
    pub fn receiver_config(&self) -> ReceiverConfig {
        let server = &self.config.server;
        ReceiverConfig::builder()
            .http_addr(server.http_addr.clone())
            .request_timeout(Duration::from_millis(server.request_timeout_ms))
            .shutdown_timeout(Duration::from_secs(server.shutdown_timeout_secs))
            .max_body_bytes(server.max_body_bytes)
            .build()
    }

    /// Serves HTTP until SIGTERM or SIGINT.
    pub async fn serve(self) -> Result<(), HeraldError> {
        self.serve_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves HTTP until `shutdown` fires.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), HeraldError> {
        let config = self.receiver_config();
        Server::new(config, self.receiver).run_with_shutdown(shutdown).await?;
        Ok(())
    }
}

fn message_factory(config: &HeraldConfig) -> Arc<dyn MessageFactory> {
    let dispatcher = &config.dispatcher;
    match dispatcher.message_factory {
        MessageFactoryKind::Tree => Arc::new(TreeMessageFactory::new(dispatcher.soap_version)),
        MessageFactoryKind::Streaming => Arc::new(
            StreamingMessageFactory::new(dispatcher.soap_version).with_payload_caching(dispatcher.payload_caching),
        ),
    }
}

fn check_endpoint_names(config: &HeraldConfig, registry: &EndpointRegistry) -> Result<(), HeraldError> {
    let mappings = &config.mappings;
    let references = mappings
        .payload_root
        .iter()
        .map(|(key, name)| (format!("mappings.payload_root.{key}"), name))
        .chain(
            mappings
                .soap_action
                .iter()
                .map(|(key, name)| (format!("mappings.soap_action.{key}"), name)),
        )
        .chain(
            mappings
                .default_endpoint
                .iter()
                .map(|name| ("mappings.default_endpoint".to_string(), name)),
        )
        .chain(
            config
                .addressing
                .actions
                .iter()
                .filter(|_| config.addressing.enabled)
                .map(|(key, action)| (format!("addressing.actions.{key}"), &action.endpoint)),
        );

    for (referenced_by, name) in references {
        if !registry.contains(name) {
            return Err(HeraldError::unknown_endpoint(name.as_str(), referenced_by));
        }
    }
    Ok(())
}

fn build_dispatcher(config: &HeraldConfig, registry: &Arc<EndpointRegistry>) -> Result<MessageDispatcher, HeraldError> {
    let dispatcher_config = &config.dispatcher;
    let mut builder = MessageDispatcher::builder()
        .must_understand_fault_string(dispatcher_config.must_understand_fault_string.clone())
        .must_understand_fault_locale(dispatcher_config.must_understand_fault_locale.clone());

    let addressing = &config.addressing;
    if addressing.enabled {
        let mut mapping = ActionEndpointMapping::builder()
            .versions(addressing.versions.iter().map(|kind| kind.version()).collect())
            .output_action_suffix(addressing.output_action_suffix.clone())
            .fault_action_suffix(addressing.fault_action_suffix.clone())
            .registry(Arc::clone(registry))
            .actors_or_roles(dispatcher_config.actors_or_roles.clone())
            .ultimate_receiver(dispatcher_config.ultimate_receiver);
        if addressing.detect_duplicates {
            mapping = mapping.message_id_strategy(Arc::new(MemoryMessageIdStrategy::default()));
        }
        for (action, entry) in &addressing.actions {
            let mut registration = ActionRegistration::new(EndpointTarget::named(entry.endpoint.clone()))
                .message_id_optional(entry.message_id_optional);
            if let Some(address) = &entry.address {
                registration = registration.address(address.clone());
            }
            mapping = mapping.register(action.clone(), registration);
        }
        builder = builder.mapping(mapping.build()?);
    }

    let mappings = &config.mappings;
    if !mappings.soap_action.is_empty() {
        let mut mapping = SoapActionEndpointMapping::builder()
            .registry(Arc::clone(registry))
            .actors_or_roles(dispatcher_config.actors_or_roles.clone())
            .ultimate_receiver(dispatcher_config.ultimate_receiver);
        for (action, name) in &mappings.soap_action {
            mapping = mapping.endpoint(action.clone(), EndpointTarget::named(name.clone()));
        }
        builder = builder.mapping(mapping.build()?);
    }

    if !mappings.payload_root.is_empty() || mappings.default_endpoint.is_some() {
        let mut mapping = PayloadRootQNameEndpointMapping::builder()
            .registry(Arc::clone(registry))
            .actors_or_roles(dispatcher_config.actors_or_roles.clone())
            .ultimate_receiver(dispatcher_config.ultimate_receiver);
        for (root, name) in &mappings.payload_root {
            mapping = mapping.endpoint(root.clone(), EndpointTarget::named(name.clone()));
        }
        if let Some(name) = &mappings.default_endpoint {
            mapping = mapping.default_endpoint(EndpointTarget::named(name.clone()));
        }
        builder = builder.mapping(mapping.build()?);
    }

    let faults = &config.faults;
    if !faults.mappings.is_empty() || faults.default_fault.is_some() {
        let mut resolver = FaultMappingExceptionResolver::builder();
        for (failure_type, definition) in &faults.mappings {
            resolver = resolver.mapping_text(failure_type.clone(), definition)?;
        }
        if let Some(text) = &faults.default_fault {
            resolver = resolver.default_fault(text.parse::<FaultDefinition>()?);
        }
        builder = builder.resolver(resolver.build());
    }
    if faults.fallback_to_server_fault {
        builder = builder.resolver(SimpleFaultExceptionResolver::new());
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_config::ActionConfig;
    use herald_core::SoapVersion;
    use herald_dispatch::FnEndpoint;

    fn registry() -> EndpointRegistry {
        EndpointRegistry::new().with(FnEndpoint::new("noop", |_| Ok(())))
    }

    #[test]
    fn test_factory_follows_configuration() {
        let mut config = HeraldConfig::default();
        config.dispatcher.soap_version = SoapVersion::Soap12;
        config.dispatcher.message_factory = MessageFactoryKind::Streaming;
        let herald = Herald::from_config(config, registry()).unwrap();
        assert_eq!(herald.factory().soap_version(), SoapVersion::Soap12);
        assert!(format!("{:?}", herald.factory()).contains("Streaming"));
    }

    #[test]
    fn test_unknown_endpoint_is_reported() {
        let mut config = HeraldConfig::default();
        config
            .mappings
            .soap_action
            .insert("urn:orders:Place".to_string(), "orders".to_string());
        let err = Herald::from_config(config, registry()).unwrap_err();
        assert!(
            matches!(&err, HeraldError::UnknownEndpoint { name, referenced_by }
                if name == "orders" && referenced_by == "mappings.soap_action.urn:orders:Place"),
            "{err}"
        );
    }

    #[test]
    fn test_disabled_addressing_ignores_actions() {
        let mut config = HeraldConfig::default();
        config.addressing.actions.insert(
            "urn:orders:Place".to_string(),
            ActionConfig {
                endpoint: "missing".to_string(),
                address: None,
                message_id_optional: false,
            },
        );
        assert!(Herald::from_config(config, registry()).is_ok());
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let mut config = HeraldConfig::default();
        config.server.http_addr = "nowhere".to_string();
        assert!(matches!(
            Herald::from_config(config, registry()),
            Err(HeraldError::Config(_))
        ));
    }

    #[test]
    fn test_receiver_config_from_server_section() {
        let mut config = HeraldConfig::default();
        config.server.request_timeout_ms = 1500;
        config.server.max_body_bytes = 2048;
        let receiver = Herald::from_config(config, registry()).unwrap().receiver_config();
        assert_eq!(receiver.request_timeout(), Duration::from_millis(1500));
        assert_eq!(receiver.max_body_bytes(), 2048);
    }
}
