use std::path::{Path, PathBuf};

use serde::Deserialize;
use smart_default::SmartDefault;

use crate::error::ConfigError;

const APP_NAME: &str = "blockmark";
const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, Deserialize, PartialEq, SmartDefault)]
#[serde(default)]
pub struct Settings {
	/// Spaces written per tab when rewriting indentation. Never used for nesting decisions.
	#[default = 4]
	pub indent_width: usize,
	pub ids: IdSettings,
	pub rules: RuleSet,
	pub marker_removal: MarkerRemovalMode,
}

#[derive(Clone, Debug, Deserialize, PartialEq, SmartDefault)]
#[serde(default)]
pub struct IdSettings {
	#[default(String::new())]
	pub prefix: String,
	#[default = 6]
	pub length: usize,
	/// Narrow-alphabet draws before widening.
	#[default = 64]
	pub max_attempts: usize,
}

/// Save-time rules, applied in declaration order to every touched item.
#[derive(Clone, Debug, Deserialize, PartialEq, SmartDefault)]
#[serde(default)]
pub struct RuleSet {
	#[default = true]
	pub cleanup_orphans: bool,
	#[default = false]
	pub tabs_to_spaces: bool,
	#[default = true]
	pub merge_split: bool,
	#[default = true]
	pub cleanup_duplicates: bool,
	#[default = true]
	pub fix_indentation: bool,
	#[default = true]
	pub ensure_system_line: bool,
	/// Don't mint system lines for items with no content yet.
	#[default = true]
	pub skip_empty_items: bool,
}

impl RuleSet {
	pub fn none() -> Self {
		Self {
			cleanup_orphans: false,
			tabs_to_spaces: false,
			merge_split: false,
			cleanup_duplicates: false,
			fix_indentation: false,
			ensure_system_line: false,
			skip_empty_items: true,
		}
	}
}

/// What goes away when an item's marker is removed, or its start line is split or cut.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, SmartDefault)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRemovalMode {
	/// Only the item's system line; content and children stay.
	#[default]
	SystemLine,
	/// The item's entire subtree.
	Subtree,
}

impl Settings {
	/// Layered load: the settings file (explicit and required, or `$XDG_CONFIG_HOME/blockmark/config.toml`),
	/// then `BLOCKMARK_*` environment variables, e.g. `BLOCKMARK_RULES__TABS_TO_SPACES=true`.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let explicit = path.is_some();
		let path = path.map(Path::to_path_buf).or_else(default_config_path);

		let mut builder = config::Config::builder();
		if let Some(path) = &path {
			builder = builder.add_source(config::File::from(path.as_path()).required(explicit));
		}
		builder = builder.add_source(config::Environment::with_prefix("BLOCKMARK").prefix_separator("_").separator("__").try_parsing(true));

		let settings: Settings = builder.build().and_then(|c| c.try_deserialize()).map_err(|source| ConfigError::Load {
			path: path.clone().unwrap_or_default(),
			source,
		})?;
		settings.validate()?;
		tracing::debug!(?path, ?settings, "[config] loaded");
		Ok(settings)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.indent_width == 0 {
			return Err(ConfigError::ZeroIndentWidth);
		}
		if self.ids.length == 0 {
			return Err(ConfigError::ZeroIdLength);
		}
		if !self.ids.prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
			return Err(ConfigError::InvalidIdPrefix { prefix: self.ids.prefix.clone() });
		}
		Ok(())
	}
}

fn default_config_path() -> Option<PathBuf> {
	xdg::BaseDirectories::with_prefix(APP_NAME).find_config_file(CONFIG_FILE)
}
