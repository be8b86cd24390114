//! Argon2 parameters and the selector strings accepted on the command line.

use core::{fmt, str::FromStr};

use thiserror::Error;

// ERRORS
// ================================================================================================

/// Invalid user-supplied configuration. Always reported, never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid Argon2 type: '{0}'")]
    InvalidType(String),
    #[error("invalid Argon2 version: '{0}'")]
    InvalidVersion(String),
    #[error("invalid mode: '{0}'")]
    InvalidMode(String),
    #[error("invalid output type: '{0}'")]
    InvalidOutputType(String),
    #[error("invalid output mode: '{0}'")]
    InvalidOutputMode(String),
    #[error("the {0} backend is not available in this build")]
    BackendUnavailable(&'static str),
    #[error("{name} must be at least 1")]
    ZeroValue { name: &'static str },
    #[error("device index out of range: {index} (found {count} devices)")]
    DeviceIndexOutOfRange { index: usize, count: usize },
}

// ARGON2 TYPE
// ================================================================================================

/// The Argon2 variants the harness can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argon2Type {
    /// Data-independent memory access.
    I,
    /// Data-dependent memory access.
    D,
}

impl FromStr for Argon2Type {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i" => Ok(Self::I),
            "d" => Ok(Self::D),
            _ => Err(ConfigError::InvalidType(s.into())),
        }
    }
}

impl fmt::Display for Argon2Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I => f.write_str("i"),
            Self::D => f.write_str("d"),
        }
    }
}

impl From<Argon2Type> for argon2::Algorithm {
    fn from(value: Argon2Type) -> Self {
        match value {
            Argon2Type::I => argon2::Algorithm::Argon2i,
            Argon2Type::D => argon2::Algorithm::Argon2d,
        }
    }
}

// ARGON2 VERSION
// ================================================================================================

/// Argon2 algorithm revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argon2Version {
    /// Version 0x10.
    V10,
    /// Version 0x13, as standardized in RFC 9106.
    V13,
}

impl FromStr for Argon2Version {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V10),
            "1.3" => Ok(Self::V13),
            _ => Err(ConfigError::InvalidVersion(s.into())),
        }
    }
}

impl fmt::Display for Argon2Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V10 => f.write_str("1.0"),
            Self::V13 => f.write_str("1.3"),
        }
    }
}

impl From<Argon2Version> for argon2::Version {
    fn from(value: Argon2Version) -> Self {
        match value {
            Argon2Version::V10 => argon2::Version::V0x10,
            Argon2Version::V13 => argon2::Version::V0x13,
        }
    }
}

// HASH PARAMETERS
// ================================================================================================

/// Inputs of a single Argon2 hash, shared by every slot of a processing unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashParams {
    pub output_len: usize,
    pub salt: Vec<u8>,
    pub secret: Vec<u8>,
    pub associated_data: Vec<u8>,
    pub t_cost: u32,
    /// Memory size in KiB.
    pub m_cost: u32,
    pub lanes: u32,
}

impl HashParams {
    /// Returns parameters without secret or associated data.
    pub fn new(output_len: usize, salt: &[u8], t_cost: u32, m_cost: u32, lanes: u32) -> Self {
        Self {
            output_len,
            salt: salt.to_vec(),
            secret: Vec::new(),
            associated_data: Vec::new(),
            t_cost,
            m_cost,
            lanes,
        }
    }

    pub fn with_secret(mut self, secret: &[u8]) -> Self {
        self.secret = secret.to_vec();
        self
    }

    pub fn with_associated_data(mut self, data: &[u8]) -> Self {
        self.associated_data = data.to_vec();
        self
    }
}

// TESTS
// ================================================================================================
