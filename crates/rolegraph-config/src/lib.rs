//! Configuration management for rolegraph
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (RG_* prefix, `__` between sections)
//! 2. rolegraph.local.toml (gitignored, local overrides)
//! 3. rolegraph.toml (git-tracked, project config)
//! 4. ~/.config/rolegraph/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use anyhow::Result;
use rolegraph_types::{Attribute, RoleAttributes, is_reserved_role_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main rolegraph configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolegraphConfig {
    pub rbac: RbacConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Initial value of the `enable_rbac_checks` system variable.
    pub enable_rbac_checks: bool,
    /// Log every authorization decision.
    pub audit_decisions: bool,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            enable_rbac_checks: true,
            audit_decisions: true,
        }
    }
}

/// Roles created when a catalog is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub roles: Vec<BootstrapRole>,
}

/// Role definition from config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapRole {
    pub name: String,
    #[serde(default)]
    pub createrole: bool,
    #[serde(default)]
    pub createdb: bool,
    #[serde(default)]
    pub createcluster: bool,
    #[serde(default = "default_inherit")]
    pub inherit: bool,
}

fn default_inherit() -> bool {
    true
}

impl BootstrapRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            createrole: false,
            createdb: false,
            createcluster: false,
            inherit: true,
        }
    }

    /// Returns the attributes the role is created with.
    pub fn attributes(&self) -> RoleAttributes {
        let flags = [
            (Attribute::CreateRole, self.createrole),
            (Attribute::CreateDb, self.createdb),
            (Attribute::CreateCluster, self.createcluster),
        ];
        flags
            .into_iter()
            .filter(|(_, on)| *on)
            .fold(RoleAttributes::new(), |acc, (attribute, _)| {
                acc.with_attribute(attribute)
            })
            .with_inherit(self.inherit)
    }
}

impl RolegraphConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a single TOML file, without merging any other source.
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Create a development configuration (RBAC checks off)
    pub fn development() -> Self {
        Self {
            rbac: RbacConfig {
                enable_rbac_checks: false,
                audit_decisions: false,
            },
            ..Default::default()
        }
    }

    /// Create a production configuration
    pub fn production() -> Self {
        Self {
            rbac: RbacConfig {
                enable_rbac_checks: true,
                audit_decisions: true,
            },
            ..Default::default()
        }
    }

    /// Rejects bootstrap roles that could never be created.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for role in &self.bootstrap.roles {
            if role.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "bootstrap role name must not be empty".to_string(),
                ));
            }
            if is_reserved_role_name(&role.name) {
                return Err(ConfigError::ValidationError(format!(
                    "bootstrap role name '{}' is reserved",
                    role.name
                )));
            }
            if !seen.insert(role.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "bootstrap role '{}' is defined more than once",
                    role.name
                )));
            }
        }
        Ok(())
    }
}
