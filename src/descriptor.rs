//! Endpoint descriptors and the loose-input parser.
//!
//! A [`ConnectionDescriptor`] is the strict `{host, port, secure}` triple a
//! connection is opened against. [`ConnectionDescriptor::parse`] accepts
//! anything an application is likely to have lying around: nothing at all, a
//! `"host"`, `"host:port"` or `"scheme://host:port"` string, or a
//! [`PartialDescriptor`] loaded from configuration.
//!
//! # Example
//!
//! ```
//! use titanium_link::{ConnectionDescriptor, PartialDescriptor, Port};
//!
//! let d = ConnectionDescriptor::parse("wss://example.com:443");
//! assert_eq!(d.host(), "example.com");
//! assert_eq!(d.port(), Port::Number(443));
//! assert!(d.is_secure());
//!
//! let d = ConnectionDescriptor::parse(PartialDescriptor {
//!     port: Some(9000),
//!     ..Default::default()
//! });
//! assert_eq!(d.to_string(), "ws://localhost:9000");
//! ```
//!
//! Parsing never fails. Malformed input yields a descriptor that fails later,
//! when the transport is opened.

// ============================================================================
// Imports
// ============================================================================

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Constants
// ============================================================================

/// Host used when none is given.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when none is given.
pub const DEFAULT_PORT: i64 = 8080;

/// Separator between scheme and authority.
const SCHEME_SEPARATOR: &str = "://";

/// The only scheme token that turns on `secure`.
const SECURE_SCHEME: &str = "wss";

/// Rendering of [`Port::NotANumber`].
const NAN_TEXT: &str = "NaN";

// ============================================================================
// Port
// ============================================================================

/// Port component of a descriptor.
///
/// Any integer is accepted; no range check is made. [`Port::NotANumber`] is
/// kept when a textual port has no leading digits, so that the bad endpoint
/// is rejected by the transport instead of silently falling back to
/// [`DEFAULT_PORT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// A parsed integer port.
    Number(i64),
    /// Textual port without any leading digits.
    NotANumber,
}

impl Port {
    /// Parses the leading integer of `text`.
    ///
    /// Leading whitespace and a sign are allowed. Anything after the digits
    /// is ignored. Values beyond `i64` saturate.
    #[must_use]
    pub fn parse_leading(text: &str) -> Self {
        let text = text.trim_start();
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let mut value: i64 = 0;
        let mut seen = false;
        for digit in digits.bytes().take_while(u8::is_ascii_digit) {
            seen = true;
            let digit = i64::from(digit - b'0');
            value = if negative {
                value.saturating_mul(10).saturating_sub(digit)
            } else {
                value.saturating_mul(10).saturating_add(digit)
            };
        }

        if seen {
            Self::Number(value)
        } else {
            Self::NotANumber
        }
    }

    /// Returns the port number, if there is one.
    #[inline]
    #[must_use]
    pub const fn number(self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(n),
            Self::NotANumber => None,
        }
    }
}

impl Default for Port {
    #[inline]
    fn default() -> Self {
        Self::Number(DEFAULT_PORT)
    }
}

impl From<i64> for Port {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Port {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u16> for Port {
    #[inline]
    fn from(value: u16) -> Self {
        Self::Number(i64::from(value))
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::NotANumber => f.write_str(NAN_TEXT),
        }
    }
}

/// `NotANumber` travels as the string `"NaN"`.
impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::NotANumber => serializer.serialize_str(NAN_TEXT),
        }
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Self::Number(n)),
            Repr::Text(text) if text == NAN_TEXT => Ok(Self::NotANumber),
            Repr::Text(text) => Err(D::Error::custom(format!(
                "expected an integer port or \"{NAN_TEXT}\", got {text:?}"
            ))),
        }
    }
}

// ============================================================================
// PartialDescriptor
// ============================================================================

/// Loosely specified endpoint where every field is optional.
///
/// Absent fields take [`DEFAULT_HOST`], [`DEFAULT_PORT`] and `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDescriptor {
    /// Host to connect to, an IP or a domain.
    pub host: Option<String>,
    /// Port to connect to, any integer.
    pub port: Option<i64>,
    /// Whether to use `wss`.
    pub secure: Option<bool>,
}

// ============================================================================
// EndpointSpec
// ============================================================================

/// Input accepted by [`ConnectionDescriptor::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EndpointSpec {
    /// Nothing was given; every field takes its default.
    #[default]
    Unspecified,
    /// `host`, `host:port` or `scheme://host:port`.
    Text(String),
    /// Structured input with optional fields.
    Partial(PartialDescriptor),
}

impl From<()> for EndpointSpec {
    #[inline]
    fn from((): ()) -> Self {
        Self::Unspecified
    }
}

impl From<&str> for EndpointSpec {
    #[inline]
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for EndpointSpec {
    #[inline]
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PartialDescriptor> for EndpointSpec {
    #[inline]
    fn from(partial: PartialDescriptor) -> Self {
        Self::Partial(partial)
    }
}

impl<T: Into<EndpointSpec>> From<Option<T>> for EndpointSpec {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unspecified, Into::into)
    }
}

/// `null`, a string or an object, mirroring the three input forms.
impl<'de> Deserialize<'de> for EndpointSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Partial(PartialDescriptor),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            None => Self::Unspecified,
            Some(Repr::Text(text)) => Self::Text(text),
            Some(Repr::Partial(partial)) => Self::Partial(partial),
        })
    }
}

// ============================================================================
// ConnectionDescriptor
// ============================================================================

/// Fully-populated endpoint: host, port and whether to use TLS.
///
/// Immutable. The `with_*` methods return a new descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    host: String,
    port: Port,
    secure: bool,
}

impl ConnectionDescriptor {
    /// Creates a descriptor from its parts.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: impl Into<Port>, secure: bool) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            secure,
        }
    }

    /// Normalizes a loosely specified endpoint.
    ///
    /// See the [module docs](self) for the accepted forms.
    #[must_use]
    pub fn parse(spec: impl Into<EndpointSpec>) -> Self {
        match spec.into() {
            EndpointSpec::Unspecified => Self::default(),
            EndpointSpec::Partial(partial) => Self::from(partial),
            EndpointSpec::Text(text) => Self::parse_text(&text),
        }
    }

    /// Normalizes an endpoint read from JSON configuration.
    ///
    /// Accepts `null`, a string in any of the text forms, or an object with
    /// optional `host`, `port` and `secure` fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if `json` is not valid
    /// JSON or has another shape.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let spec: EndpointSpec = serde_json::from_str(json)?;
        Ok(Self::parse(spec))
    }

    fn parse_text(text: &str) -> Self {
        let mut descriptor = Self::default();

        let authority = if text.contains(SCHEME_SEPARATOR) {
            let mut parts = text.split(SCHEME_SEPARATOR);
            descriptor.secure = parts.next() == Some(SECURE_SCHEME);
            parts.next().unwrap_or_default()
        } else {
            text
        };

        if authority.contains(':') {
            let mut parts = authority.split(':');
            descriptor.host = parts.next().unwrap_or_default().to_owned();
            descriptor.port = Port::parse_leading(parts.next().unwrap_or_default());
        } else {
            descriptor.host = authority.to_owned();
        }

        descriptor
    }

    /// Returns the host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> Port {
        self.port
    }

    /// Returns `true` if the endpoint uses `wss`.
    #[inline]
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Returns `"wss"` or `"ws"`.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.secure { SECURE_SCHEME } else { "ws" }
    }

    /// Returns a copy with a different host.
    #[inline]
    #[must_use]
    pub fn with_host(&self, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with a different port.
    #[inline]
    #[must_use]
    pub fn with_port(&self, port: impl Into<Port>) -> Self {
        Self {
            port: port.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with a different `secure` flag.
    #[inline]
    #[must_use]
    pub fn with_secure(&self, secure: bool) -> Self {
        Self {
            secure,
            ..self.clone()
        }
    }
}

impl Default for ConnectionDescriptor {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: Port::default(),
            secure: false,
        }
    }
}

impl From<PartialDescriptor> for ConnectionDescriptor {
    fn from(partial: PartialDescriptor) -> Self {
        Self {
            host: partial.host.unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: partial.port.map_or_else(Port::default, Port::Number),
            secure: partial.secure.unwrap_or(false),
        }
    }
}

impl FromStr for ConnectionDescriptor {
    type Err = Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_text(s))
    }
}

/// Canonical form: `scheme://host:port`.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme(), self.host, self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================
