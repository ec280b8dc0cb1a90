// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Giggle chat relay.
//!
//! TOML files in the XDG hierarchy plus `GIGGLE_*` environment overrides,
//! strict `deny_unknown_fields` parsing, and miette diagnostics with typo
//! suggestions.
//!
//! ```no_run
//! use giggle_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("model: {}", config.openai.model);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::GiggleConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<GiggleConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<GiggleConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_paths()
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
