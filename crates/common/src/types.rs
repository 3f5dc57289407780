use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier representation a benchmark run is keyed on.
///
/// The three variants cover the key encodings whose comparison cost the
/// benchmark quantifies: fixed-width integers, wide integers, and opaque
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    Int32,
    Int64,
    OpaqueString,
}

impl IdentifierKind {
    /// Stable label used in logs and benchmark samples.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Int32 => "int32",
            IdentifierKind::Int64 => "int64",
            IdentifierKind::OpaqueString => "opaque-string",
        }
    }

    /// Suffix used by SQL backends so each representation gets its own
    /// typed table.
    pub fn table_suffix(&self) -> &'static str {
        match self {
            IdentifierKind::Int32 => "i32",
            IdentifierKind::Int64 => "i64",
            IdentifierKind::OpaqueString => "text",
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key type usable for goods and user rows.
///
/// All three strategies behave identically across implementations of this
/// trait; only the key-comparison cost differs.
pub trait Identifier:
    Clone + Eq + std::hash::Hash + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static
{
    /// The representation this type reports under in benchmark samples.
    const KIND: IdentifierKind;
}

/// Fixed-width integer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id32(i32);

impl Id32 {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for Id32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Id32 {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Identifier for Id32 {
    const KIND: IdentifierKind = IdentifierKind::Int32;
}

/// Wide integer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id64(i64);

impl Id64 {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Id64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Id64 {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Identifier for Id64 {
    const KIND: IdentifierKind = IdentifierKind::Int64;
}

/// Opaque string identifier (UUID-shaped in practice, but any string works).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueId(String);

impl OpaqueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a random identifier backed by a UUID v4.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OpaqueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OpaqueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OpaqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Identifier for OpaqueId {
    const KIND: IdentifierKind = IdentifierKind::OpaqueString;
}
