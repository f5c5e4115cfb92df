//! Error types.
//!
//! The structural engine itself is total over arbitrary text; the only errors are the
//! id sampling running out of attempts (recovered internally) and invalid configuration.

#![allow(unused_assignments)] // Fields are read by miette's derive macro via attributes

use std::path::PathBuf;

use miette::Diagnostic;

/// Bounded id sampling found no free candidate.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("no unused block id found after {attempts} attempts")]
pub struct IdExhausted {
	pub attempts: usize,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to load settings from {}", path.display())]
	#[diagnostic(code(blockmark::config::load), help("settings are TOML with top-level `indent_width` and `marker_removal`, plus `[ids]` and `[rules]` tables"))]
	Load {
		path: PathBuf,
		#[source]
		source: config::ConfigError,
	},

	#[error("indent_width must be at least 1")]
	#[diagnostic(code(blockmark::config::indent_width), help("set `indent_width` to the number of spaces a tab should become"))]
	ZeroIndentWidth,

	#[error("ids.length must be at least 1")]
	#[diagnostic(code(blockmark::config::id_length))]
	ZeroIdLength,

	#[error("ids.prefix {prefix:?} contains characters not allowed in block ids")]
	#[diagnostic(code(blockmark::config::id_prefix), help("block ids may only contain ASCII letters, digits, '_' and '-'"))]
	InvalidIdPrefix { prefix: String },
}
