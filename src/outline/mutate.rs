//! Subtree-level edits.
//!
//! Editing an item's start line can destroy the item (its marker goes away, or the line
//! is split or cut), and then its metadata has to go with it. Copy, cut and paste move
//! whole subtrees, re-indenting them to the destination and giving copies fresh ids.

use serde::{Deserialize, Serialize};

use super::{
	classify::{self, SystemLineShape, format_system_line, is_list_item},
	document::Document,
	fence,
	id::Stamper,
	indent::{DOC_TAB_WIDTH, columns, is_blank, leading_whitespace, strip_columns},
	system_line,
	tree::ItemSpan,
};
use crate::config::MarkerRemovalMode;

/// What an edit of an item's start line did to the item.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartLineEdit {
	/// The line was deleted.
	Cut,
	/// The line became several lines.
	Split,
	/// One line, no longer a list item.
	MarkerRemoved,
	/// Still a list item; only its marker character or indentation may differ.
	Retained,
}

impl StartLineEdit {
	pub fn classify<S: AsRef<str>>(replacement: &[S]) -> Self {
		match replacement {
			[] => Self::Cut,
			[only] if is_list_item(only.as_ref()) => Self::Retained,
			[_] => Self::MarkerRemoved,
			_ => Self::Split,
		}
	}
}

/// Replace line `line` with `replacement`, dropping what the edit orphans.
///
/// When the edit destroys the item, its system line goes away too
/// ([`MarkerRemovalMode::SystemLine`]), or everything below the start line in its subtree
/// ([`MarkerRemovalMode::Subtree`]). Content inside fences is never a deletion target.
pub fn apply_start_line_edit(text: &str, line: usize, replacement: Vec<String>, mode: MarkerRemovalMode) -> String {
	let mut doc = Document::from_text(text);
	if line >= doc.len() {
		return text.to_string();
	}
	let edit = StartLineEdit::classify(&replacement);

	if let Some(span) = doc.span(line) {
		match (edit, mode) {
			(StartLineEdit::Retained, _) => {}
			(_, MarkerRemovalMode::SystemLine) => {
				if let Some(hit) = system_line::find(&doc, line) {
					tracing::debug!(line, ?edit, system_line = hit.line, "[mutate] item destroyed, dropping its system line");
					doc.remove_line(hit.line);
				}
			}
			(_, MarkerRemovalMode::Subtree) => {
				tracing::debug!(line, ?edit, end = span.end, "[mutate] item destroyed, dropping its subtree");
				let below: Vec<usize> = (line + 1..=span.end).collect();
				doc.remove_lines(&below);
			}
		}
	}

	doc.splice(line, line, replacement);
	doc.to_text()
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardOrigin {
	Copy,
	Cut,
}

/// What copy and cut hand to the host clipboard.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClipboardPayload {
	/// Raw subtree text, system lines included.
	pub with_system_lines: String,
	/// The same text with every system line stripped.
	pub plain_text: String,
	/// Smallest indentation among the selected items.
	pub base_indent_columns: usize,
	pub origin: ClipboardOrigin,
}

impl ClipboardPayload {
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}

	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}
}

/// Subtree spans for the selection, in document order, with nested selections folded into
/// their selected ancestor. Lines that don't start an item select their owner.
pub fn selected_spans(doc: &Document, starts: &[usize]) -> Vec<ItemSpan> {
	let mut spans: Vec<ItemSpan> = starts.iter().filter_map(|&s| doc.owner_of(s)).filter_map(|s| doc.span(s)).collect();
	spans.sort_by_key(|s| s.start);

	let mut out: Vec<ItemSpan> = Vec::with_capacity(spans.len());
	for span in spans {
		if out.last().is_some_and(|last| last.contains(span.start)) {
			continue;
		}
		out.push(span);
	}
	out
}

pub fn copy(text: &str, starts: &[usize]) -> Option<ClipboardPayload> {
	let doc = Document::from_text(text);
	let spans = selected_spans(&doc, starts);
	(!spans.is_empty()).then(|| payload(&doc, &spans, ClipboardOrigin::Copy))
}

/// Like [`copy`], and also returns `text` with the selected subtrees removed.
pub fn cut(text: &str, starts: &[usize]) -> Option<(ClipboardPayload, String)> {
	let mut doc = Document::from_text(text);
	let spans = selected_spans(&doc, starts);
	if spans.is_empty() {
		return None;
	}
	let payload = payload(&doc, &spans, ClipboardOrigin::Cut);
	let lines: Vec<usize> = spans.iter().flat_map(|s| s.start..=s.end).collect();
	doc.remove_lines(&lines);
	Some((payload, doc.to_text()))
}

fn payload(doc: &Document, spans: &[ItemSpan], origin: ClipboardOrigin) -> ClipboardPayload {
	let lines: Vec<usize> = spans.iter().flat_map(|s| s.start..=s.end).collect();
	let raw: Vec<&str> = lines.iter().filter_map(|&i| doc.line(i)).collect();
	ClipboardPayload {
		with_system_lines: raw.join("\n"),
		plain_text: without_system_lines(doc, &lines).join("\n"),
		base_indent_columns: spans.iter().map(|s| s.indent_cols).min().unwrap_or(0),
		origin,
	}
}

/// Drops merged system lines, and date-only lines directly followed by their id-only line.
fn without_system_lines<'d>(doc: &'d Document, lines: &[usize]) -> Vec<&'d str> {
	let shape = |i: usize| doc.system_line(i).map(|s| s.shape());
	let mut out = Vec::with_capacity(lines.len());
	let mut k = 0;
	while k < lines.len() {
		let i = lines[k];
		match shape(i) {
			Some(SystemLineShape::Merged) => {
				k += 1;
				continue;
			}
			Some(SystemLineShape::DateOnly) if lines.get(k + 1) == Some(&(i + 1)) && shape(i + 1) == Some(SystemLineShape::IdOnly) => {
				k += 2;
				continue;
			}
			_ => {}
		}
		if let Some(line) = doc.line(i) {
			out.push(line);
		}
		k += 1;
	}
	out
}

#[derive(Clone, Copy, Debug)]
pub enum PasteSource<'a> {
	Internal(&'a ClipboardPayload),
	/// Text from outside; only accepted when it reads as a list subtree.
	External(&'a str),
}

/// External text is a list subtree when its first non-blank line starts a list item.
pub fn looks_like_subtree(text: &str) -> bool {
	text.split('\n').find(|l| !is_blank(l)).is_some_and(is_list_item)
}

/// Paste a subtree at `line`, shifting it so its top level sits at the destination's
/// indentation. A blank line or an empty list item at `line` is replaced; anything else
/// gets the block inserted above it. Copies have every system line re-minted.
///
/// Returns `None` when the source is external text that isn't a list.
pub fn paste(text: &str, line: usize, source: PasteSource<'_>, stamper: &mut Stamper<'_>) -> Option<String> {
	let (block, remap) = match source {
		PasteSource::Internal(payload) => (payload.with_system_lines.as_str(), payload.origin == ClipboardOrigin::Copy),
		PasteSource::External(external) => {
			if !looks_like_subtree(external) {
				tracing::debug!("[mutate] external text is not a list, refusing to paste");
				return None;
			}
			(external, false)
		}
	};

	let mut src: Vec<String> = block.split('\n').map(str::to_string).collect();
	while src.last().is_some_and(|l| is_blank(l)) {
		src.pop();
	}
	if src.is_empty() {
		return None;
	}
	if remap {
		stamper.reserve_refs(block);
		let remapped = remap_system_lines(&mut src, stamper);
		tracing::debug!(remapped, "[mutate] re-minted system lines of a copy");
	}

	let mut doc = Document::from_text(text);
	let dest_indent = doc.line(line).map(|l| leading_whitespace(l).to_string()).unwrap_or_default();
	let min_cols = src.iter().filter(|l| !is_blank(l)).map(|l| columns(l, DOC_TAB_WIDTH)).min().unwrap_or(0);
	let shifted: Vec<String> = src
		.iter()
		.map(|l| if is_blank(l) { String::new() } else { format!("{dest_indent}{}", strip_columns(l, min_cols, DOC_TAB_WIDTH)) })
		.collect();

	let replace = line < doc.len() && (doc.is_blank(line) || doc.item(line).is_some_and(|i| i.content.trim().is_empty()));
	if replace {
		doc.splice(line, line, shifted);
	} else {
		doc.insert_lines(line, shifted);
	}
	Some(doc.to_text())
}

/// Give every system line outside a fence a fresh timestamp and id.
fn remap_system_lines(lines: &mut [String], stamper: &mut Stamper<'_>) -> usize {
	let fence = fence::scan(&*lines);
	let mut remapped = 0;
	for (line, fenced) in lines.iter_mut().zip(fence) {
		if fenced {
			continue;
		}
		let Some(sys) = classify::system_line(line) else { continue };
		let indent = sys.indent.to_string();
		let fresh = match sys.shape() {
			SystemLineShape::Merged => format_system_line(&indent, &stamper.timestamp(), stamper.fresh_id().as_str()),
			SystemLineShape::DateOnly => format!("{indent}[date:: {}]", stamper.timestamp()),
			SystemLineShape::IdOnly => format!("{indent}^{}", stamper.fresh_id()),
		};
		*line = fresh;
		remapped += 1;
	}
	remapped
}
