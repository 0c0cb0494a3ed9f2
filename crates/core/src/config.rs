//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the services that
//! need it. Request handlers never read process-wide environment variables themselves, which
//! keeps behaviour consistent across threads and test harnesses.

use crate::constants::DEFAULT_LISTEN_ADDR;
use crate::error::{LoadError, LoadResult};
use rxform_types::NonEmptyText;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    catalog_path: PathBuf,
    form_path: PathBuf,
    listen_addr: SocketAddr,
}

impl CoreConfig {
    pub fn new(catalog_path: PathBuf, form_path: PathBuf, listen_addr: SocketAddr) -> Self {
        Self {
            catalog_path,
            form_path,
            listen_addr,
        }
    }

    /// Build a config from already-read environment values (`RXFORM_CATALOG`, `RXFORM_FORM`,
    /// `RXFORM_ADDR`).
    ///
    /// The two paths are required; the listen address defaults to `0.0.0.0:3000`.
    pub fn from_env_values(
        catalog: Option<String>,
        form: Option<String>,
        addr: Option<String>,
    ) -> LoadResult<Self> {
        let catalog_path = required_path("RXFORM_CATALOG", catalog)?;
        let form_path = required_path("RXFORM_FORM", form)?;

        let addr = addr
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = addr.parse().map_err(|_| {
            LoadError::InvalidInput(format!("RXFORM_ADDR '{addr}' is not a socket address"))
        })?;

        Ok(Self::new(catalog_path, form_path, listen_addr))
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn form_path(&self) -> &Path {
        &self.form_path
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}

fn required_path(var: &str, value: Option<String>) -> LoadResult<PathBuf> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => Err(LoadError::InvalidInput(format!("{var} must be set"))),
    }
}

/// A form author's drug order element: the form's name plus the element's parameters.
///
/// ```yaml
/// name: HIV Treatment
/// parameters:
///   drugNames: "Triomune-30, /Second line/, 3"
///   validateDose: "true"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormDefinition {
    pub name: NonEmptyText,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl FormDefinition {
    /// Parse a form definition from YAML text.
    pub fn parse(yaml_text: &str) -> LoadResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() { "<root>" } else { path.as_str() };
            LoadError::Translation(format!("form definition schema mismatch at {path}: {source}"))
        })
    }

    pub fn load(path: &Path) -> LoadResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}
