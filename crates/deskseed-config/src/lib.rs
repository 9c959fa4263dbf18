//! ---
//! seed_section: "02-configuration"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Tenant and credential configuration loading."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
//! Tenant configuration for the Deskseed pipelines.
//!
//! The configuration is an explicit value constructed once at startup
//! (TOML file plus environment overrides) and passed by reference into
//! the provisioner and reclaimer constructors. Core logic never reads
//! ambient state.

#![warn(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Environment variable overriding the config file location.
pub const ENV_CONFIG_PATH: &str = "DESKSEED_CONFIG";

const ENV_SUBDOMAIN: &str = "DESKSEED_SUBDOMAIN";
const ENV_AGENT_EMAIL: &str = "DESKSEED_AGENT_EMAIL";
const ENV_API_TOKEN: &str = "DESKSEED_API_TOKEN";
const ENV_OAUTH_TOKEN: &str = "DESKSEED_OAUTH_TOKEN";

fn default_platform_domain() -> String {
    "zendesk.com".to_owned()
}

fn default_stage_concurrency() -> usize {
    1
}

/// Credential used to authenticate against the helpdesk API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    /// Agent API token, sent as Basic `{email}/token:{token}`.
    ApiToken(String),
    /// OAuth access token, sent as a Bearer token.
    #[serde(rename = "oauth_token")]
    OAuth(String),
}

impl Credential {
    /// Render the `Authorization` header value for this credential.
    pub fn authorization_header(&self, agent_email: &str) -> String {
        match self {
            Credential::ApiToken(token) => {
                let raw = format!("{agent_email}/token:{token}");
                format!("Basic {}", BASE64.encode(raw.as_bytes()))
            }
            Credential::OAuth(token) => format!("Bearer {token}"),
        }
    }
}

/// Tenant connection settings for one helpdesk instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Tenant subdomain, e.g. `acme` for `acme.zendesk.com`.
    pub subdomain: String,
    /// Email address of the acting agent.
    pub agent_email: String,
    /// Credential used for every request.
    pub credential: Credential,
    /// Platform apex domain the tenant lives under.
    #[serde(default = "default_platform_domain")]
    pub platform_domain: String,
}

impl TenantConfig {
    /// Base URL of the tenant, e.g. `https://acme.zendesk.com`.
    pub fn base_url(&self) -> Result<Url> {
        let raw = format!("https://{}.{}", self.subdomain, self.platform_domain);
        Url::parse(&raw).with_context(|| format!("invalid tenant base url {raw}"))
    }

    /// Render the `Authorization` header for the configured credential.
    pub fn authorization_header(&self) -> String {
        self.credential.authorization_header(&self.agent_email)
    }

    fn validate(&self) -> Result<()> {
        if self.subdomain.trim().is_empty() {
            return Err(anyhow!("tenant subdomain cannot be empty"));
        }
        if !self.agent_email.contains('@') {
            return Err(anyhow!(
                "agent email {:?} does not look like an email address",
                self.agent_email
            ));
        }
        let token = match &self.credential {
            Credential::ApiToken(token) | Credential::OAuth(token) => token,
        };
        if token.trim().is_empty() {
            return Err(anyhow!("credential token cannot be empty"));
        }
        Ok(())
    }
}

/// Defaults applied to provisioning runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionDefaults {
    /// Number of organization/user/ticket triples to create.
    #[serde(default = "default_count")]
    pub count: usize,
    /// Display label embedded in generated names.
    #[serde(default = "default_label")]
    pub label: String,
    /// Maximum create requests in flight within one stage. The
    /// default of 1 keeps calls strictly sequential; higher values
    /// may let in-flight creations complete after a failure.
    #[serde(default = "default_stage_concurrency")]
    pub stage_concurrency: usize,
}

fn default_count() -> usize {
    10
}

fn default_label() -> String {
    "Demo".to_owned()
}

impl Default for ProvisionDefaults {
    fn default() -> Self {
        Self {
            count: default_count(),
            label: default_label(),
            stage_concurrency: default_stage_concurrency(),
        }
    }
}

/// Top-level configuration for the Deskseed CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tenant connection settings.
    pub tenant: TenantConfig,
    /// Provisioning defaults, overridable per invocation.
    #[serde(default)]
    pub provision: ProvisionDefaults,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    /// The parsed and validated configuration.
    pub config: AppConfig,
    /// Effective source path on disk.
    pub source: PathBuf,
}

impl AppConfig {
    /// Load configuration from disk, respecting the `DESKSEED_CONFIG`
    /// override, then apply credential overrides from the environment.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let mut config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply credential overrides from the process environment.
    ///
    /// `DESKSEED_OAUTH_TOKEN` wins over `DESKSEED_API_TOKEN` when both
    /// are set, mirroring the OAuth-first behaviour of the header
    /// construction.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(subdomain) = std::env::var(ENV_SUBDOMAIN) {
            if !subdomain.trim().is_empty() {
                self.tenant.subdomain = subdomain;
            }
        }
        if let Ok(email) = std::env::var(ENV_AGENT_EMAIL) {
            if !email.trim().is_empty() {
                self.tenant.agent_email = email;
            }
        }
        if let Ok(token) = std::env::var(ENV_OAUTH_TOKEN) {
            if !token.trim().is_empty() {
                self.tenant.credential = Credential::OAuth(token);
                return;
            }
        }
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            if !token.trim().is_empty() {
                self.tenant.credential = Credential::ApiToken(token);
            }
        }
    }

    /// Validate tenant settings and provisioning defaults.
    pub fn validate(&self) -> Result<()> {
        self.tenant.validate()?;
        if self.provision.count == 0 {
            return Err(anyhow!("provision count must be at least 1"));
        }
        if self.provision.stage_concurrency == 0 {
            return Err(anyhow!("stage concurrency must be at least 1"));
        }
        Ok(())
    }
}
