#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! Defaults suit production use. Environment overrides are read only by
//! [`BindingConfig::from_env`]:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `WEBCOMP_BINDING_NAME` | Name recorded on tracing spans |
//! | `WEBCOMP_STRICT_LIFECYCLE` | `1`/`true`/`yes`/`on`: panic on lifecycle violations |

/// Default binding name, also the span tag.
pub const DEFAULT_BINDING_NAME: &str = "webcomp";

const ENV_BINDING_NAME: &str = "WEBCOMP_BINDING_NAME";
const ENV_STRICT_LIFECYCLE: &str = "WEBCOMP_STRICT_LIFECYCLE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    binding_name: String,
    strict_lifecycle: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            binding_name: DEFAULT_BINDING_NAME.to_owned(),
            strict_lifecycle: false,
        }
    }
}

#[inline]
fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl BindingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through `get_env`, so callers and tests can
    /// supply their own environment.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(name) = get_env(ENV_BINDING_NAME) {
            let name = name.trim();
            if !name.is_empty() {
                config.binding_name = name.to_owned();
            }
        }
        if let Some(flag) = get_env(ENV_STRICT_LIFECYCLE) {
            config.strict_lifecycle = env_flag(&flag);
        }
        config
    }

    #[must_use]
    pub fn with_binding_name(mut self, name: impl Into<String>) -> Self {
        self.binding_name = name.into();
        self
    }

    /// Panic, after logging, when an update finds no registry.
    #[must_use]
    pub fn with_strict_lifecycle(mut self, strict: bool) -> Self {
        self.strict_lifecycle = strict;
        self
    }

    #[must_use]
    pub fn binding_name(&self) -> &str {
        &self.binding_name
    }

    #[must_use]
    pub fn strict_lifecycle(&self) -> bool {
        self.strict_lifecycle
    }
}
