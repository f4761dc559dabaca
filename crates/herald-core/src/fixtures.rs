//! Sample envelopes and failure types shared by tests across the workspace.

use crate::failure::FailureType;

/// Namespace of the echo payloads.
pub const ECHO_NAMESPACE: &str = "urn:herald:echo";

/// Namespace of the sample security header.
pub const SECURITY_NAMESPACE: &str = "urn:herald:security";

/// WS-Addressing 1.0 namespace, repeated here so fixtures stay dependency free.
pub const WSA10_NAMESPACE: &str = "http://www.w3.org/2005/08/addressing";

/// WS-Addressing 2004/08 namespace.
pub const WSA200408_NAMESPACE: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";

/// A SOAP 1.1 echo request with text `hello`.
pub const SOAP11_ECHO_REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Header/>
  <soapenv:Body>
    <echo:EchoRequest xmlns:echo="urn:herald:echo">hello</echo:EchoRequest>
  </soapenv:Body>
</soapenv:Envelope>"#;

/// A SOAP 1.2 echo request with text `hello`.
pub const SOAP12_ECHO_REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:echo="urn:herald:echo">
  <env:Body>
    <echo:EchoRequest>hello</echo:EchoRequest>
  </env:Body>
</env:Envelope>"#;

/// A SOAP 1.1 order request whose payload root is `{urn:herald:echo}PlaceOrder`.
pub const SOAP11_ORDER_REQUEST: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <echo:PlaceOrder xmlns:echo="urn:herald:echo"><echo:Quantity>-1</echo:Quantity></echo:PlaceOrder>
  </soapenv:Body>
</soapenv:Envelope>"#;

/// A SOAP 1.2 request carrying a must-understand security token.
pub const SOAP12_MUST_UNDERSTAND_REQUEST: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
  <env:Header>
    <sec:Token xmlns:sec="urn:herald:security" env:mustUnderstand="true">secret</sec:Token>
  </env:Header>
  <env:Body>
    <echo:EchoRequest xmlns:echo="urn:herald:echo">hello</echo:EchoRequest>
  </env:Body>
</env:Envelope>"#;

/// A SOAP 1.1 request carrying a must-understand security token.
pub const SOAP11_MUST_UNDERSTAND_REQUEST: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Header>
    <sec:Token xmlns:sec="urn:herald:security" soapenv:mustUnderstand="1">secret</sec:Token>
  </soapenv:Header>
  <soapenv:Body>
    <echo:EchoRequest xmlns:echo="urn:herald:echo">hello</echo:EchoRequest>
  </soapenv:Body>
</soapenv:Envelope>"#;

/// A SOAP 1.1 client fault with reason `Invalid order`.
pub const SOAP11_CLIENT_FAULT: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <soapenv:Fault>
      <faultcode>soapenv:Client</faultcode>
      <faultstring xml:lang="en">Invalid order</faultstring>
    </soapenv:Fault>
  </soapenv:Body>
</soapenv:Envelope>"#;

/// A SOAP 1.2 request with WS-Addressing 1.0 headers, a reply-to address
/// that is anonymous, and a reference parameter on the reply-to reference.
pub const SOAP12_ADDRESSING10_REQUEST: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:wsa="http://www.w3.org/2005/08/addressing">
  <env:Header>
    <wsa:To env:mustUnderstand="true">http://example.com/echo</wsa:To>
    <wsa:Action>urn:herald:echo:Echo</wsa:Action>
    <wsa:MessageID>urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf</wsa:MessageID>
    <wsa:ReplyTo>
      <wsa:Address>http://www.w3.org/2005/08/addressing/anonymous</wsa:Address>
      <wsa:ReferenceParameters>
        <echo:Session xmlns:echo="urn:herald:echo">42</echo:Session>
      </wsa:ReferenceParameters>
    </wsa:ReplyTo>
  </env:Header>
  <env:Body>
    <echo:EchoRequest xmlns:echo="urn:herald:echo">hello</echo:EchoRequest>
  </env:Body>
</env:Envelope>"#;

/// A SOAP 1.1 request with WS-Addressing 2004/08 headers.
pub const SOAP11_ADDRESSING200408_REQUEST: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing">
  <soapenv:Header>
    <wsa:To>http://example.com/echo</wsa:To>
    <wsa:Action>urn:herald:echo:Echo</wsa:Action>
    <wsa:MessageID>urn:uuid:9b2c6a8e-8a0c-4f5e-9d4e-6c1f0a8b7d21</wsa:MessageID>
    <wsa:ReplyTo>
      <wsa:Address>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</wsa:Address>
    </wsa:ReplyTo>
  </soapenv:Header>
  <soapenv:Body>
    <echo:EchoRequest xmlns:echo="urn:herald:echo">hello</echo:EchoRequest>
  </soapenv:Body>
</soapenv:Envelope>"#;

/// Root of the sample failure hierarchy.
pub static EXCEPTION: FailureType = FailureType::root("Exception");

/// Extends [`EXCEPTION`].
pub static RUNTIME_EXCEPTION: FailureType = FailureType::extends("RuntimeException", &EXCEPTION);

/// Extends [`RUNTIME_EXCEPTION`].
pub static ILLEGAL_ARGUMENT_EXCEPTION: FailureType =
    FailureType::extends("IllegalArgumentException", &RUNTIME_EXCEPTION);

/// Extends [`EXCEPTION`] directly.
pub static IO_EXCEPTION: FailureType = FailureType::extends("IOException", &EXCEPTION);
