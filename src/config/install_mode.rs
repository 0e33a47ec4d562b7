//! Install mode descriptor parsing
//!
//! An install mode selects the OperatorGroup topology used for a deployment.
//! The accepted grammar is `InstallModeType[=ns1,ns2[, ...]]`:
//!
//! - `AllNamespaces` - mode type only, no namespaces
//! - `SingleNamespace=ns1` - one target namespace
//! - `MultiNamespace=ns1,ns2, ns3` - tokens are trimmed
//! - `OwnNamespace=` - explicit empty namespace set, same as `OwnNamespace`

use std::fmt;
use std::str::FromStr;

use crate::error::{OlmError, config::malformed_install_mode};

/// Install mode types known to OLM
///
/// Parsing does not reject other types: whether a mode is supported is
/// decided by the ClusterServiceVersion being installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallModeType {
    OwnNamespace,
    SingleNamespace,
    MultiNamespace,
    AllNamespaces,
}

impl InstallModeType {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallModeType::OwnNamespace => "OwnNamespace",
            InstallModeType::SingleNamespace => "SingleNamespace",
            InstallModeType::MultiNamespace => "MultiNamespace",
            InstallModeType::AllNamespaces => "AllNamespaces",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "OwnNamespace" => Some(InstallModeType::OwnNamespace),
            "SingleNamespace" => Some(InstallModeType::SingleNamespace),
            "MultiNamespace" => Some(InstallModeType::MultiNamespace),
            "AllNamespaces" => Some(InstallModeType::AllNamespaces),
            _ => None,
        }
    }
}

impl fmt::Display for InstallModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `--install-mode` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallModeSpec {
    pub mode_type: String,
    pub namespaces: Vec<String>,
}

impl InstallModeSpec {
    /// Parse an install mode descriptor
    ///
    /// Splits on the first `=`; everything after it is a comma separated
    /// namespace list. Fails with [`OlmError::MalformedInstallMode`].
    pub fn parse(raw: &str) -> Result<Self, OlmError> {
        if raw.trim().is_empty() {
            return Err(malformed_install_mode(raw, "empty install mode"));
        }

        let (mode_type, namespaces) = match raw.split_once('=') {
            None => (raw.trim(), Vec::new()),
            Some((mode_type, rest)) => (mode_type.trim(), parse_namespaces(raw, rest)?),
        };

        if mode_type.is_empty() {
            return Err(malformed_install_mode(raw, "missing type"));
        }
        if mode_type.chars().any(char::is_whitespace) {
            return Err(malformed_install_mode(
                raw,
                format!("type '{}' contains whitespace", mode_type),
            ));
        }

        Ok(Self {
            mode_type: mode_type.to_string(),
            namespaces,
        })
    }

    /// The built-in default: install into the operator's own namespace
    pub fn own_namespace() -> Self {
        Self {
            mode_type: InstallModeType::OwnNamespace.as_str().to_string(),
            namespaces: Vec::new(),
        }
    }

    /// The mode type, if it is one OLM defines
    pub fn known_type(&self) -> Option<InstallModeType> {
        InstallModeType::from_name(&self.mode_type)
    }

    /// Namespaces an OperatorGroup for this mode should target
    ///
    /// `AllNamespaces` targets nothing (cluster wide), `OwnNamespace` targets
    /// the operator namespace, every other mode targets the listed namespaces.
    pub fn target_namespaces(&self, operator_namespace: &str) -> Vec<String> {
        match self.known_type() {
            Some(InstallModeType::AllNamespaces) => Vec::new(),
            Some(InstallModeType::OwnNamespace) if self.namespaces.is_empty() => {
                vec![operator_namespace.to_string()]
            }
            _ => self.namespaces.clone(),
        }
    }
}

fn parse_namespaces(raw: &str, list: &str) -> Result<Vec<String>, OlmError> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    list.split(',')
        .map(str::trim)
        .map(|ns| {
            if ns.is_empty() {
                Err(malformed_install_mode(raw, "empty namespace"))
            } else if ns.contains('=') {
                Err(malformed_install_mode(
                    raw,
                    format!("namespace '{}' contains '='", ns),
                ))
            } else {
                Ok(ns.to_string())
            }
        })
        .collect()
}

impl FromStr for InstallModeSpec {
    type Err = OlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstallModeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mode_type)?;
        if !self.namespaces.is_empty() {
            write!(f, "={}", self.namespaces.join(","))?;
        }
        Ok(())
    }
}
