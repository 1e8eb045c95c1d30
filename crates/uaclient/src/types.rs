// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core OPC UA value types and client configuration.
//!
//! This module defines the identifier and configuration types shared by the
//! rest of the crate: [`NodeId`], the security mode/policy enums,
//! [`ClientConfig`] with its builder, and the subscription parameter types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClientError, ConfigurationError};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// A `NodeId` uniquely identifies a node within a server's address space.
/// It pairs a namespace index with an identifier that is numeric, string,
/// GUID, or opaque (byte string).
///
/// # Examples
///
/// ```
/// use uaclient::NodeId;
///
/// let numeric = NodeId::numeric(0, 2253);
/// let string = NodeId::string(2, "Plant.Line1.Temperature");
/// let parsed: NodeId = "ns=2;s=Plant.Line1.Temperature".parse().unwrap();
/// assert_eq!(string, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node id.
    #[inline]
    pub const fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node id.
    #[inline]
    pub const fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node id.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the null node id (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    /// Returns `true` if this is the null node id.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }

    /// Returns the numeric value if this is a numeric identifier.
    #[inline]
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a string identifier.
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    // Well-known nodes used throughout the client.

    /// Objects folder node (ns=0, i=85).
    pub const OBJECTS_FOLDER: NodeId = NodeId::numeric(0, 85);

    /// Server object node (ns=0, i=2253).
    pub const SERVER: NodeId = NodeId::numeric(0, 2253);

    /// Server status variable node (ns=0, i=2256).
    pub const SERVER_STATUS: NodeId = NodeId::numeric(0, 2256);
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "ns={};", self.namespace_index)?;
        }
        write!(f, "{}", self.identifier)
    }
}

impl FromStr for NodeId {
    type Err = ClientError;

    /// Parses a node id from the OPC UA text form.
    ///
    /// Supported formats: `ns=2;i=1001`, `ns=2;s=Name`, `ns=2;g=<uuid>`,
    /// `ns=2;b=<base64>`; the `ns=` prefix defaults to namespace 0 when
    /// absent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns_str, id_str) = rest.split_once(';').ok_or_else(|| {
                    ClientError::configuration(ConfigurationError::invalid_node_id(
                        s,
                        "missing identifier after namespace",
                    ))
                })?;
                let ns: u16 = ns_str.parse().map_err(|_| {
                    ClientError::configuration(ConfigurationError::invalid_node_id(
                        s,
                        "invalid namespace index",
                    ))
                })?;
                (ns, id_str)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id.parse().map_err(|_| {
                ClientError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    "invalid numeric identifier",
                ))
            })?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id).map_err(|e| {
                ClientError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    format!("invalid GUID: {}", e),
                ))
            })?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64.decode(id).map_err(|e| {
                ClientError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    format!("invalid base64: {}", e),
                ))
            })?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(ClientError::configuration(
                ConfigurationError::invalid_node_id(s, "expected i=, s=, g= or b= identifier"),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier (used for all standard nodes).
    Numeric(u32),

    /// String identifier.
    String(String),

    /// GUID identifier.
    Guid(Uuid),

    /// Opaque identifier (application-specific byte array).
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// AttributeId
// =============================================================================

/// OPC UA node attribute identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// The node id attribute.
    NodeId,
    /// The browse name attribute.
    BrowseName,
    /// The display name attribute.
    DisplayName,
    /// The value attribute (the one read and monitored by default).
    #[default]
    Value,
}

impl AttributeId {
    /// Returns the numeric attribute id from OPC UA part 4.
    pub const fn value(&self) -> u32 {
        match self {
            Self::NodeId => 1,
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Value => 13,
        }
    }
}

// =============================================================================
// MonitoringMode
// =============================================================================

/// Monitoring mode of a monitored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringMode {
    /// Sampling and reporting disabled.
    Disabled,

    /// Sampling enabled, reporting disabled.
    Sampling,

    /// Sampling and reporting enabled.
    #[default]
    Reporting,
}

impl MonitoringMode {
    /// Returns the wire value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::Sampling => 1,
            Self::Reporting => 2,
        }
    }
}

// =============================================================================
// SecurityMode
// =============================================================================

/// OPC UA message security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Messages are neither signed nor encrypted.
    #[default]
    None,

    /// Messages are signed but not encrypted.
    Sign,

    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl SecurityMode {
    /// Returns the wire value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Sign => 2,
            Self::SignAndEncrypt => 3,
        }
    }

    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Sign => "Sign",
            Self::SignAndEncrypt => "SignAndEncrypt",
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SecurityMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "none" => Ok(Self::None),
            "sign" | "signed" => Ok(Self::Sign),
            "signandencrypt" | "signencrypt" => Ok(Self::SignAndEncrypt),
            _ => Err(ClientError::configuration(
                ConfigurationError::invalid_security_mode(s),
            )),
        }
    }
}

// =============================================================================
// SecurityPolicy
// =============================================================================

/// OPC UA security policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityPolicy {
    /// No security policy (use with [`SecurityMode::None`]).
    #[default]
    None,

    /// Basic256Sha256 (recommended minimum).
    Basic256Sha256,

    /// Aes128Sha256RsaOaep.
    Aes128Sha256RsaOaep,

    /// Aes256Sha256RsaPss (most secure).
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    /// Returns the policy URI.
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            Self::Basic256Sha256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
            Self::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            Self::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
        }
    }

    /// Returns the short name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Basic256Sha256 => "Basic256Sha256",
            Self::Aes128Sha256RsaOaep => "Aes128Sha256RsaOaep",
            Self::Aes256Sha256RsaPss => "Aes256Sha256RsaPss",
        }
    }

    /// Returns `true` if certificates are required for this policy.
    #[inline]
    pub const fn requires_certificates(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Creates a policy from its URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            s if s.ends_with("#None") => Some(Self::None),
            s if s.ends_with("#Basic256Sha256") => Some(Self::Basic256Sha256),
            s if s.contains("Aes128_Sha256_RsaOaep") => Some(Self::Aes128Sha256RsaOaep),
            s if s.contains("Aes256_Sha256_RsaPss") => Some(Self::Aes256Sha256RsaPss),
            _ => None,
        }
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// PkiConfig
// =============================================================================

/// Certificate store configuration passed through to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PkiConfig {
    /// No certificate store; server certificates are not validated.
    #[default]
    NoPki,

    /// Directory-backed certificate store.
    Directory {
        /// Root directory of the store.
        path: String,
    },
}

impl PkiConfig {
    /// Creates a directory-backed store configuration.
    pub fn directory(path: impl Into<String>) -> Self {
        Self::Directory { path: path.into() }
    }
}

// =============================================================================
// ClientConfig
// =============================================================================

/// Connection configuration for a [`Channel`](crate::Channel) and the
/// sessions built on it.
///
/// # Examples
///
/// ```
/// use uaclient::{ClientConfig, SecurityMode, SecurityPolicy};
///
/// let config = ClientConfig::builder()
///     .endpoint_url("opc.tcp://localhost:4840")
///     .application_name("Inspection Client")
///     .security_mode(SecurityMode::None)
///     .security_policy(SecurityPolicy::None)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server endpoint URL (e.g. `opc.tcp://localhost:4840`).
    pub endpoint_url: String,

    /// Application name reported in the client description.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Application URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_uri: Option<String>,

    /// Product URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_uri: Option<String>,

    /// Session name sent in CreateSession.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    /// Security mode.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// Security policy.
    #[serde(default)]
    pub security_policy: SecurityPolicy,

    /// Path to the client certificate (DER), if the policy requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate_path: Option<String>,

    /// Path to the client private key, if the policy requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,

    /// Path to a pinned server certificate (may be absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_certificate_path: Option<String>,

    /// Certificate store configuration.
    #[serde(default)]
    pub pki: PkiConfig,

    /// Initial connect deadline.
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Requested session timeout.
    #[serde(default = "default_session_timeout")]
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Maximum response message size accepted from the server
    /// (0 = no client-side limit).
    #[serde(default)]
    pub max_response_message_size: u32,
}

fn default_application_name() -> String {
    "Sylvex UA Client".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(60)
}

impl ClientConfig {
    /// Returns a builder for this configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Returns the effective application URI.
    pub fn effective_application_uri(&self) -> String {
        self.application_uri
            .clone()
            .unwrap_or_else(|| format!("urn:sylvex:uaclient:{}", self.application_name))
    }

    /// Returns the effective session name.
    pub fn effective_session_name(&self) -> String {
        self.session_name
            .clone()
            .unwrap_or_else(|| self.application_name.clone())
    }
}

// =============================================================================
// ClientConfigBuilder
// =============================================================================

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    endpoint_url: Option<String>,
    application_name: Option<String>,
    application_uri: Option<String>,
    product_uri: Option<String>,
    session_name: Option<String>,
    security_mode: SecurityMode,
    security_policy: SecurityPolicy,
    client_certificate_path: Option<String>,
    private_key_path: Option<String>,
    server_certificate_path: Option<String>,
    pki: PkiConfig,
    connect_timeout: Option<Duration>,
    session_timeout: Option<Duration>,
    max_response_message_size: u32,
}

impl ClientConfigBuilder {
    /// Sets the endpoint URL (required).
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the application URI.
    pub fn application_uri(mut self, uri: impl Into<String>) -> Self {
        self.application_uri = Some(uri.into());
        self
    }

    /// Sets the product URI.
    pub fn product_uri(mut self, uri: impl Into<String>) -> Self {
        self.product_uri = Some(uri.into());
        self
    }

    /// Sets the session name.
    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = Some(name.into());
        self
    }

    /// Sets the security mode.
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.security_mode = mode;
        self
    }

    /// Sets the security policy.
    pub fn security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.security_policy = policy;
        self
    }

    /// Sets the client certificate and private key paths.
    pub fn client_identity(
        mut self,
        certificate_path: impl Into<String>,
        private_key_path: impl Into<String>,
    ) -> Self {
        self.client_certificate_path = Some(certificate_path.into());
        self.private_key_path = Some(private_key_path.into());
        self
    }

    /// Pins the server certificate.
    pub fn server_certificate_path(mut self, path: impl Into<String>) -> Self {
        self.server_certificate_path = Some(path.into());
        self
    }

    /// Sets the certificate store configuration.
    pub fn pki(mut self, pki: PkiConfig) -> Self {
        self.pki = pki;
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the requested session timeout.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Sets the maximum response message size.
    pub fn max_response_message_size(mut self, size: u32) -> Self {
        self.max_response_message_size = size;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint URL is missing or not
    /// an `opc.tcp://` URL, or if the security policy requires certificates
    /// that were not provided.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let endpoint_url = self.endpoint_url.ok_or_else(|| {
            ClientError::configuration(ConfigurationError::invalid_endpoint(
                "",
                "endpoint URL is required",
            ))
        })?;

        if !endpoint_url.starts_with("opc.tcp://") {
            return Err(ClientError::configuration(
                ConfigurationError::invalid_endpoint(
                    &endpoint_url,
                    "endpoint URL must start with opc.tcp://",
                ),
            ));
        }

        if self.security_policy.requires_certificates()
            && (self.client_certificate_path.is_none() || self.private_key_path.is_none())
        {
            return Err(ClientError::configuration(
                ConfigurationError::missing_certificates(self.security_policy.name()),
            ));
        }

        Ok(ClientConfig {
            endpoint_url,
            application_name: self
                .application_name
                .unwrap_or_else(default_application_name),
            application_uri: self.application_uri,
            product_uri: self.product_uri,
            session_name: self.session_name,
            security_mode: self.security_mode,
            security_policy: self.security_policy,
            client_certificate_path: self.client_certificate_path,
            private_key_path: self.private_key_path,
            server_certificate_path: self.server_certificate_path,
            pki: self.pki,
            connect_timeout: self.connect_timeout.unwrap_or_else(default_connect_timeout),
            session_timeout: self.session_timeout.unwrap_or_else(default_session_timeout),
            max_response_message_size: self.max_response_message_size,
        })
    }
}

// =============================================================================
// SubscriptionParams
// =============================================================================

/// Parameters requested when creating a subscription.
///
/// The server may revise the interval and counts; the revised values are
/// reported on the created [`Subscription`](crate::Subscription).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionParams {
    /// Requested publishing interval.
    #[serde(default = "default_publishing_interval")]
    #[serde(with = "humantime_serde")]
    pub publishing_interval: Duration,

    /// Requested lifetime count, in publishing intervals.
    #[serde(default = "default_lifetime_count")]
    pub lifetime_count: u32,

    /// Requested maximum keep-alive count, in publishing intervals.
    #[serde(default = "default_max_keepalive_count")]
    pub max_keepalive_count: u32,

    /// Maximum notifications per publish (0 = unlimited).
    #[serde(default)]
    pub max_notifications_per_publish: u32,

    /// Whether publishing is enabled at creation.
    #[serde(default = "default_true")]
    pub publishing_enabled: bool,

    /// Relative priority (0-255).
    #[serde(default)]
    pub priority: u8,
}

fn default_publishing_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_lifetime_count() -> u32 {
    3000
}

fn default_max_keepalive_count() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for SubscriptionParams {
    fn default() -> Self {
        Self {
            publishing_interval: default_publishing_interval(),
            lifetime_count: default_lifetime_count(),
            max_keepalive_count: default_max_keepalive_count(),
            max_notifications_per_publish: 0,
            publishing_enabled: true,
            priority: 0,
        }
    }
}

impl SubscriptionParams {
    /// Creates parameters with a custom publishing interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            publishing_interval: interval,
            ..Default::default()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_constructors() {
        let n = NodeId::numeric(2, 1001);
        assert_eq!(n.namespace_index, 2);
        assert_eq!(n.as_numeric(), Some(1001));

        let s = NodeId::string(2, "Pump.Speed");
        assert_eq!(s.as_string(), Some("Pump.Speed"));
        assert!(s.as_numeric().is_none());

        assert!(NodeId::null().is_null());
        assert!(!NodeId::SERVER.is_null());
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::numeric(0, 2253).to_string(), "i=2253");
        assert_eq!(NodeId::numeric(2, 1001).to_string(), "ns=2;i=1001");
        assert_eq!(NodeId::string(3, "A.B").to_string(), "ns=3;s=A.B");
    }

    #[test]
    fn test_node_id_parse() {
        let n: NodeId = "ns=2;i=1001".parse().unwrap();
        assert_eq!(n, NodeId::numeric(2, 1001));

        let s: NodeId = "s=Pump.Speed".parse().unwrap();
        assert_eq!(s, NodeId::string(0, "Pump.Speed"));

        let g: NodeId = "ns=1;g=550e8400-e29b-41d4-a716-446655440000"
            .parse()
            .unwrap();
        assert!(matches!(g.identifier, NodeIdentifier::Guid(_)));

        assert!("ns=2".parse::<NodeId>().is_err());
        assert!("ns=2;x=1".parse::<NodeId>().is_err());
        assert!("ns=bad;i=1".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_parse_round_trip() {
        for text in ["i=84", "ns=2;i=1001", "ns=2;s=Plant.Temp", "ns=7;b=AQID"] {
            let parsed: NodeId = text.parse().unwrap();
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn test_attribute_id_values() {
        assert_eq!(AttributeId::Value.value(), 13);
        assert_eq!(AttributeId::BrowseName.value(), 3);
    }

    #[test]
    fn test_security_policy_uri() {
        assert!(SecurityPolicy::None.uri().ends_with("#None"));
        assert_eq!(
            SecurityPolicy::from_uri("http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256"),
            Some(SecurityPolicy::Basic256Sha256)
        );
        assert!(!SecurityPolicy::None.requires_certificates());
        assert!(SecurityPolicy::Basic256Sha256.requires_certificates());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .endpoint_url("opc.tcp://localhost:4840")
            .application_name("Test Client")
            .build()
            .unwrap();

        assert_eq!(config.endpoint_url, "opc.tcp://localhost:4840");
        assert_eq!(config.application_name, "Test Client");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config
            .effective_application_uri()
            .starts_with("urn:sylvex:uaclient:"));
    }

    #[test]
    fn test_config_builder_rejects_bad_endpoint() {
        assert!(ClientConfig::builder().build().is_err());
        assert!(ClientConfig::builder()
            .endpoint_url("http://localhost:4840")
            .build()
            .is_err());
    }

    #[test]
    fn test_config_builder_requires_certificates_for_secure_policy() {
        let err = ClientConfig::builder()
            .endpoint_url("opc.tcp://localhost:4840")
            .security_policy(SecurityPolicy::Basic256Sha256)
            .build();
        assert!(err.is_err());

        let ok = ClientConfig::builder()
            .endpoint_url("opc.tcp://localhost:4840")
            .security_policy(SecurityPolicy::Basic256Sha256)
            .client_identity("certs/client.der", "certs/client.key")
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = ClientConfig::builder()
            .endpoint_url("opc.tcp://plc7:4840")
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.endpoint_url, config.endpoint_url);
        assert_eq!(parsed.connect_timeout, Duration::from_secs(5));
        assert_eq!(parsed.security_mode, SecurityMode::None);
    }

    #[test]
    fn test_subscription_params_defaults() {
        let params = SubscriptionParams::default();
        assert_eq!(params.publishing_interval, Duration::from_millis(500));
        assert!(params.publishing_enabled);

        let fast = SubscriptionParams::with_interval(Duration::from_millis(100));
        assert_eq!(fast.publishing_interval, Duration::from_millis(100));
    }
}
