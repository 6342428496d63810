//! Configuration of the override scope used by a [ScopedFactory](crate::scoped_factory::ScopedFactory).
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `PARAMSCOPE_` or `paramscope.json` file, e.g.
//! `PARAMSCOPE_CLEANUP_POLICY=map`.

use crate::error::ConfigurationError;
use crate::scope::override_scope::PARAMETER;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use serde::Deserialize;

pub use crate::scope::override_scope::MissPolicy;
pub use crate::scope::override_store::CleanupPolicy;

const CONFIG_ENV_PREFIX: &str = "PARAMSCOPE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "paramscope.json";

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ScopeConfig {
    /// Name under which the override scope is registered. Components use it in their `scope`
    /// attribute.
    pub scope_name: String,
    pub cleanup_policy: CleanupPolicy,
    pub miss_policy: MissPolicy,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            scope_name: PARAMETER.to_string(),
            cleanup_policy: CleanupPolicy::default(),
            miss_policy: MissPolicy::default(),
        }
    }
}

impl From<OptionalScopeConfig> for ScopeConfig {
    fn from(value: OptionalScopeConfig) -> Self {
        let default = Self::default();
        Self {
            scope_name: value.scope_name.unwrap_or(default.scope_name),
            cleanup_policy: value.cleanup_policy.unwrap_or(default.cleanup_policy),
            miss_policy: value.miss_policy.unwrap_or(default.miss_policy),
        }
    }
}

impl ScopeConfig {
    /// Reads the config from [CONFIG_FILE], if present, and then the environment.
    pub fn init_from_environment() -> Result<Self, ConfigurationError> {
        Self::load(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX)),
        )
    }

    fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigurationError> {
        builder
            .build()
            .and_then(|config| config.try_deserialize::<OptionalScopeConfig>())
            .map(|config| config.into())
            .map_err(|error| ConfigurationError::Load(error.to_string()))
    }
}

#[derive(Deserialize)]
struct OptionalScopeConfig {
    scope_name: Option<String>,
    cleanup_policy: Option<CleanupPolicy>,
    miss_policy: Option<MissPolicy>,
}
