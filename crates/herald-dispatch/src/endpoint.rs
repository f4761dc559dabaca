//! Endpoints and the name registry.
//!
//! An [`Endpoint`] handles one exchange. Endpoints are shared across
//! exchanges behind [`BoxedEndpoint`] and must not keep exchange state.

use herald_core::{EndpointFailure, MessageContext};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use xmltree::Element;

/// Handles a message exchange.
pub trait Endpoint: Send + Sync {
    /// Returns the name used in logs and for endpoint-scoped resolvers.
    fn name(&self) -> &str;

    /// Processes the request in `ctx`, writing a response if there is one.
    ///
    /// Leaving the context without a response makes the exchange one-way.
    fn invoke(&self, ctx: &mut MessageContext) -> Result<(), EndpointFailure>;
}

/// A shared endpoint.
pub type BoxedEndpoint = Arc<dyn Endpoint>;

impl fmt::Debug for dyn Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint").field("name", &self.name()).finish()
    }
}

/// An endpoint backed by a closure over the whole context.
pub struct FnEndpoint<F> {
    name: String,
    handler: F,
}

impl<F> FnEndpoint<F>
where
    F: Fn(&mut MessageContext) -> Result<(), EndpointFailure> + Send + Sync,
{
    /// Creates a named endpoint.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> Endpoint for FnEndpoint<F>
where
    F: Fn(&mut MessageContext) -> Result<(), EndpointFailure> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, ctx: &mut MessageContext) -> Result<(), EndpointFailure> {
        (self.handler)(ctx)
    }
}

/// An endpoint that maps the request payload to an optional response payload.
///
/// Returning `None` leaves the exchange without a response.
///
/// ```
/// use herald_dispatch::{Endpoint, PayloadEndpoint};
///
/// let echo = PayloadEndpoint::new("echo", |request| Ok(request.cloned()));
/// assert_eq!(echo.name(), "echo");
/// ```
pub struct PayloadEndpoint<F> {
    name: String,
    handler: F,
}

impl<F> PayloadEndpoint<F>
where
    F: Fn(Option<&Element>) -> Result<Option<Element>, EndpointFailure> + Send + Sync,
{
    /// Creates a named payload endpoint.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> Endpoint for PayloadEndpoint<F>
where
    F: Fn(Option<&Element>) -> Result<Option<Element>, EndpointFailure> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, ctx: &mut MessageContext) -> Result<(), EndpointFailure> {
        let response = {
            let request = ctx.request().payload_element()?;
            (self.handler)(request)?
        };
        if let Some(payload) = response {
            ctx.response_mut().set_payload(payload);
        }
        Ok(())
    }
}

/// Signature of an endpoint method on a shared bean.
pub type EndpointMethodFn<T> = fn(&T, &mut MessageContext) -> Result<(), EndpointFailure>;

/// An endpoint bound to one method of a shared bean.
pub struct MethodEndpoint<T> {
    name: String,
    bean: Arc<T>,
    method: EndpointMethodFn<T>,
}

impl<T> MethodEndpoint<T> {
    /// Binds `method` to `bean`.
    pub fn new(name: impl Into<String>, bean: Arc<T>, method: EndpointMethodFn<T>) -> Self {
        Self {
            name: name.into(),
            bean,
            method,
        }
    }

    /// Returns the bean the method is bound to.
    pub fn bean(&self) -> &Arc<T> {
        &self.bean
    }
}

impl<T: Send + Sync> Endpoint for MethodEndpoint<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, ctx: &mut MessageContext) -> Result<(), EndpointFailure> {
        (self.method)(&self.bean, ctx)
    }
}

/// Resolves endpoint names to instances.
///
/// Mappings that register endpoints by name look them up here on every
/// request. The registry is built before the dispatcher and not changed
/// afterwards.
#[derive(Default, Clone)]
pub struct EndpointRegistry {
    endpoints: IndexMap<String, BoxedEndpoint>,
}

impl EndpointRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint under its own name.
    #[must_use]
    pub fn with(mut self, endpoint: impl Endpoint + 'static) -> Self {
        self.register(Arc::new(endpoint));
        self
    }

    /// Registers a shared endpoint under its own name, replacing any previous one.
    pub fn register(&mut self, endpoint: BoxedEndpoint) {
        self.register_as(endpoint.name().to_string(), endpoint);
    }

    /// Registers a shared endpoint under an explicit name.
    pub fn register_as(&mut self, name: impl Into<String>, endpoint: BoxedEndpoint) {
        self.endpoints.insert(name.into(), endpoint);
    }

    /// Looks up an endpoint.
    pub fn get(&self, name: &str) -> Option<BoxedEndpoint> {
        self.endpoints.get(name).cloned()
    }

    /// Returns true when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Returns the number of registered endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("endpoints", &self.endpoints.keys().collect::<Vec<_>>())
            .finish()
    }
}
