// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean" hints.

#![allow(unused_assignments)] // miette's Diagnostic derive triggers this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error rendered through miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(giggle::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the section.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(giggle::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(giggle::config::missing_key),
        help("add `{key} = <value>` to giggle.toml")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(giggle::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(giggle::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Converts every error carried by a `figment::Error` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to attach source spans
/// to unknown-key errors.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

fn locate(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings have no file metadata; fall back to the only source given.
    let found = match origin {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((path, content)) = found else {
        return (None, None);
    };

    match find_key_offset(content, error.path.first().map(String::as_str), field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` as a key inside `[section]` (or the top level).
pub fn find_key_offset(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let start = match section {
        Some(name) => {
            let header = format!("[{name}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best valid key above the similarity threshold, if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render errors to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
