mod settings;

use std::path::Path;

use config::{Config, Environment, File};

use settings::PartialSettings;

use crate::utils::RelayError;

pub use settings::{LogSettings, OverflowPolicy, RelaySettings, ServerSettings, Settings};

/// Prefix for environment overrides, e.g. `ROBOBRIDGE_SERVER__STREAM_PORT`.
pub const ENV_PREFIX: &str = "ROBOBRIDGE";

/// Loads the configuration from `config/default` (if present) and environment variables.
/// Missing values are filled from `Settings::default()`.
pub fn load_config() -> Result<Settings, RelayError> {
    load_config_from(None)
}

/// Like [`load_config`], but reads `path` instead of `config/default` when given.
/// An explicit path must exist, and the merged relay settings must pass
/// [`RelaySettings::validate`].
pub fn load_config_from(path: Option<&Path>) -> Result<Settings, RelayError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("config/default").required(false),
    };

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = partial.merge_with_defaults();
    settings.relay.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests;
