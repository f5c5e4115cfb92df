//! Line classifiers.
//!
//! Pure recognizers for the three line shapes the engine cares about: list-item
//! prefixes, fence delimiters and system lines. Everything else is `NoMatch`.
//! Callers are responsible for consulting the fence mask first.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

use super::indent::{DOC_TAB_WIDTH, columns};

static LIST_ITEM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?P<indent>[ \t]*)(?P<marker>(?:[-*+]|\d{1,9}\.)[ \t]+)(?P<checkbox>\[[ xX]\][ \t]+)?(?P<content>.*)$").unwrap());

static MERGED: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?P<indent>[ \t]*)\[date:: (?P<ts>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)\] \^(?P<id>[A-Za-z0-9_-]+)[ \t]*\r?$").unwrap()
});

static DATE_ONLY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?P<indent>[ \t]*)\[date:: (?P<ts>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)\][ \t]*\r?$").unwrap());

static ID_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?P<indent>[ \t]*)\^(?P<id>[A-Za-z0-9_-]+)[ \t]*\r?$").unwrap());

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*(?P<run>`{3,}|~{3,})(?P<info>.*)$").unwrap());

static BLOCK_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\^(?P<id>[A-Za-z0-9_-]+)").unwrap());

/// Tagged classification of a single line.
#[derive(Clone, Debug, PartialEq)]
pub enum Classified<'a> {
	NoMatch,
	ListItem(ListItemMatch<'a>),
	SystemLine(SystemLineMatch<'a>),
}

pub fn classify(line: &str) -> Classified<'_> {
	if let Some(item) = list_item(line) {
		return Classified::ListItem(item);
	}
	if let Some(sys) = system_line(line) {
		return Classified::SystemLine(sys);
	}
	Classified::NoMatch
}

/// What kind of marker opens a list item.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarkerKind {
	/// `-`, `*` or `+`
	Unordered,
	/// `1.`
	Ordered,
	/// Any marker followed by a `[ ]`/`[x]` checkbox
	Task,
}

/// A recognized list-item prefix.
#[derive(Clone, Debug, PartialEq)]
pub struct ListItemMatch<'a> {
	pub indent: &'a str,
	/// Bullet or number plus the whitespace after it, e.g. `"- "` or `"12. "`.
	pub marker: &'a str,
	pub checkbox: Option<&'a str>,
	pub content: &'a str,
}

impl ListItemMatch<'_> {
	pub fn indent_columns(&self) -> usize {
		columns(self.indent, DOC_TAB_WIDTH)
	}

	pub fn marker_len(&self) -> usize {
		self.marker.len()
	}

	/// The bullet or number without trailing whitespace.
	pub fn bullet(&self) -> &str {
		self.marker.trim_end()
	}

	pub fn kind(&self) -> MarkerKind {
		if self.checkbox.is_some() {
			MarkerKind::Task
		} else if self.bullet().ends_with('.') {
			MarkerKind::Ordered
		} else {
			MarkerKind::Unordered
		}
	}

	/// Indent used by the item's wrapped lines and its system line.
	pub fn continuation_indent(&self) -> String {
		format!("{}{}", self.indent, " ".repeat(self.marker_len()))
	}
}

pub fn list_item(line: &str) -> Option<ListItemMatch<'_>> {
	let caps = LIST_ITEM.captures(line)?;
	Some(ListItemMatch {
		indent: caps.name("indent").map_or("", |m| m.as_str()),
		marker: caps.name("marker").map_or("", |m| m.as_str()),
		checkbox: caps.name("checkbox").map(|m| m.as_str()),
		content: caps.name("content").map_or("", |m| m.as_str()),
	})
}

pub fn is_list_item(line: &str) -> bool {
	LIST_ITEM.is_match(line)
}

/// The textual shape of a system line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SystemLineShape {
	/// `[date:: TS] ^id`, the canonical form
	Merged,
	/// `[date:: TS]` alone, waiting for an id-only line after it
	DateOnly,
	/// `^id` alone
	IdOnly,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SystemLineMatch<'a> {
	pub indent: &'a str,
	pub timestamp: Option<&'a str>,
	pub id: Option<&'a str>,
}

impl SystemLineMatch<'_> {
	pub fn shape(&self) -> SystemLineShape {
		match (self.timestamp, self.id) {
			(Some(_), Some(_)) => SystemLineShape::Merged,
			(Some(_), None) => SystemLineShape::DateOnly,
			_ => SystemLineShape::IdOnly,
		}
	}

	pub fn indent_columns(&self) -> usize {
		columns(self.indent, DOC_TAB_WIDTH)
	}
}

pub fn system_line(line: &str) -> Option<SystemLineMatch<'_>> {
	if let Some(caps) = MERGED.captures(line) {
		return Some(SystemLineMatch {
			indent: caps.name("indent").map_or("", |m| m.as_str()),
			timestamp: caps.name("ts").map(|m| m.as_str()),
			id: caps.name("id").map(|m| m.as_str()),
		});
	}
	if let Some(caps) = DATE_ONLY.captures(line) {
		return Some(SystemLineMatch {
			indent: caps.name("indent").map_or("", |m| m.as_str()),
			timestamp: caps.name("ts").map(|m| m.as_str()),
			id: None,
		});
	}
	let caps = ID_ONLY.captures(line)?;
	Some(SystemLineMatch {
		indent: caps.name("indent").map_or("", |m| m.as_str()),
		timestamp: None,
		id: caps.name("id").map(|m| m.as_str()),
	})
}

/// Only the canonical `[date:: TS] ^id` shape.
pub fn merged_system_line(line: &str) -> Option<SystemLineMatch<'_>> {
	system_line(line).filter(|m| m.shape() == SystemLineShape::Merged)
}

pub fn is_system_line(line: &str) -> bool {
	MERGED.is_match(line) || DATE_ONLY.is_match(line) || ID_ONLY.is_match(line)
}

/// Render the canonical system line.
pub fn format_system_line(indent: &str, timestamp: &str, id: &str) -> String {
	format!("{indent}[date:: {timestamp}] ^{id}")
}

/// A fence delimiter: the character and how many times it repeats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FenceDelimiter {
	pub ch: char,
	pub len: usize,
	/// Whether anything besides whitespace follows the run (an info string).
	pub has_info: bool,
}

pub fn fence_delimiter(line: &str) -> Option<FenceDelimiter> {
	let caps = FENCE.captures(line)?;
	let run = caps.name("run")?.as_str();
	let info = caps.name("info").map_or("", |m| m.as_str());
	let ch = run.chars().next()?;
	// backtick fences may not carry backticks in their info string
	if ch == '`' && info.contains('`') {
		return None;
	}
	Some(FenceDelimiter {
		ch,
		len: run.chars().count(),
		has_info: !info.trim().is_empty(),
	})
}

/// Every `^id` token appearing anywhere in `text`.
pub fn block_refs(text: &str) -> HashSet<String> {
	BLOCK_REF.captures_iter(text).filter_map(|c| c.name("id")).map(|m| m.as_str().to_string()).collect()
}
