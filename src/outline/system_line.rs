//! System-line discovery, creation, relocation and repair.
//!
//! The canonical place for an item's system line is the last line of its own content
//! region: directly before its first child, or after its last content line when it has
//! none. Lines elsewhere in the subtree may still be used as a *source* of the timestamp
//! and id, but data is never left there.

use serde::Serialize;

use super::{
	classify::{SystemLineShape, format_system_line},
	document::Document,
	fence,
	id::{BlockId, Stamper},
	indent::{DOC_TAB_WIDTH, columns, leading_whitespace},
	tree::ItemSpan,
};

/// A canonical system line as seen by consumers.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SystemLine {
	pub line: usize,
	pub indent_columns: usize,
	pub timestamp: String,
	pub id: String,
}

fn merged_at(doc: &Document, idx: usize) -> Option<SystemLine> {
	let sys = doc.system_line(idx)?;
	if sys.shape() != SystemLineShape::Merged {
		return None;
	}
	Some(SystemLine {
		line: idx,
		indent_columns: sys.indent_columns(),
		timestamp: sys.timestamp?.to_string(),
		id: sys.id?.to_string(),
	})
}

/// First canonical system line in the item's own content region.
pub fn find(doc: &Document, start: usize) -> Option<SystemLine> {
	let span = doc.span(start)?;
	(start + 1..=span.own_end).find_map(|i| merged_at(doc, i))
}

/// [`find`], but only when the line sits in the canonical place.
pub fn find_placed(doc: &Document, start: usize) -> Option<SystemLine> {
	let span = doc.span(start)?;
	find(doc, start).filter(|hit| hit.line == span.own_end)
}

/// Tolerant search: the own region first, then anywhere in the subtree where the line is
/// attributed to this item rather than to a descendant.
pub fn find_in_subtree(doc: &Document, start: usize) -> Option<SystemLine> {
	let span = doc.span(start)?;
	find(doc, start).or_else(|| (span.own_end + 1..=span.end).filter(|&i| owned_by(doc, &span, i)).find_map(|i| merged_at(doc, i)))
}

fn owned_by(doc: &Document, span: &ItemSpan, line: usize) -> bool {
	span.own_contains(line) || (span.contains(line) && doc.owner_of(line) == Some(span.start))
}

/// Timestamp/id material gathered for an item, and the lines it came from.
#[derive(Debug, Default)]
struct Source {
	lines: Vec<usize>,
	timestamp: Option<String>,
	id: Option<String>,
}

fn gather_source(doc: &Document, span: &ItemSpan) -> Source {
	if let Some(hit) = find_in_subtree(doc, span.start) {
		return Source {
			lines: vec![hit.line],
			timestamp: Some(hit.timestamp),
			id: Some(hit.id),
		};
	}

	// no merged line anywhere; fall back to split pieces
	let mut source = Source::default();
	for i in span.start + 1..=span.end {
		if !owned_by(doc, span, i) {
			continue;
		}
		let Some(sys) = doc.system_line(i) else { continue };
		match sys.shape() {
			SystemLineShape::DateOnly if source.timestamp.is_none() => {
				source.timestamp = sys.timestamp.map(str::to_string);
				source.lines.push(i);
			}
			SystemLineShape::IdOnly if source.id.is_none() => {
				source.id = sys.id.map(str::to_string);
				source.lines.push(i);
			}
			_ => {}
		}
	}
	source
}

/// Make sure the item at `start` has a canonical system line and return its id.
///
/// Side-effect free when one is already in place. Otherwise reuses whatever timestamp and
/// id the subtree already attributes to the item, mints the rest, removes the source
/// lines along with any other canonical line in the own region, and writes one merged
/// line in the canonical place. Returns `None` when there is no item at `start`, or when
/// the canonical place would fall inside an unclosed fence.
pub fn ensure(doc: &mut Document, start: usize, stamper: &mut Stamper<'_>) -> Option<BlockId> {
	let span = doc.span(start)?;
	let indent = doc.item(start)?.continuation_indent();

	if let Some(hit) = find(doc, start) {
		if hit.line == span.own_end {
			return Some(BlockId::from(hit.id));
		}
	}
	let mut source = gather_source(doc, &span);
	// one canonical line per own region, or the next pass finds a different one first
	for i in start + 1..=span.own_end {
		if !source.lines.contains(&i) && merged_at(doc, i).is_some() {
			source.lines.push(i);
		}
	}
	let insert_at = span.own_end + 1 - source.lines.iter().filter(|&&l| l <= span.own_end).count();
	if lands_in_fence(doc, &source.lines, insert_at) {
		tracing::debug!(start, "[system_line] canonical place is inside an open fence, not writing");
		return None;
	}

	let timestamp = source.timestamp.unwrap_or_else(|| stamper.timestamp());
	let id = source.id.map(BlockId::from).unwrap_or_else(|| stamper.fresh_id());
	if source.lines.is_empty() {
		tracing::debug!(start, %id, "[system_line] creating");
	} else {
		tracing::debug!(start, %id, from = ?source.lines, to = insert_at, "[system_line] relocating");
	}
	doc.remove_lines(&source.lines);
	doc.insert_line(insert_at, format_system_line(&indent, &timestamp, id.as_str()));
	Some(id)
}

/// Whether a line inserted at `at`, after removing `removed`, would be fence interior.
fn lands_in_fence(doc: &Document, removed: &[usize], at: usize) -> bool {
	let mut lines: Vec<&str> = doc.lines().iter().enumerate().filter(|(i, _)| !removed.contains(i)).map(|(_, l)| l.as_str()).collect();
	let at = at.min(lines.len());
	lines.insert(at, "");
	fence::scan(&lines)[at]
}

/// Collapse `[date:: TS]` directly followed by `^id` into one merged line, bottom-up over
/// the subtree. Both lines must sit within one indentation unit of their owner's
/// continuation indent. Returns how many pairs were merged.
pub fn merge_split_pairs(doc: &mut Document, start: usize) -> usize {
	let Some(span) = doc.span(start) else { return 0 };
	let mut merged = 0;

	for i in (start + 1..span.end).rev() {
		let Some(replacement) = merged_pair(doc, i) else { continue };
		doc.splice(i, i + 1, vec![replacement]);
		merged += 1;
	}
	if merged > 0 {
		tracing::debug!(start, merged, "[system_line] merged split pairs");
	}
	merged
}

fn merged_pair(doc: &Document, i: usize) -> Option<String> {
	let date = doc.system_line(i).filter(|s| s.shape() == SystemLineShape::DateOnly)?;
	let id = doc.system_line(i + 1).filter(|s| s.shape() == SystemLineShape::IdOnly)?;
	let owner = doc.owner_of(i)?;
	let expected = columns(&doc.item(owner)?.continuation_indent(), DOC_TAB_WIDTH);
	let near = |cols: usize| cols.abs_diff(expected) <= DOC_TAB_WIDTH;
	if !near(date.indent_columns()) || !near(id.indent_columns()) {
		return None;
	}
	Some(format_system_line(date.indent, date.timestamp?, id.id?))
}

/// Rewrite the leading whitespace of a canonically placed system line to the item's
/// continuation indent. The payload is left untouched.
pub fn fix_indentation(doc: &mut Document, start: usize) -> bool {
	let Some(hit) = find_placed(doc, start) else { return false };
	let Some(indent) = doc.item(start).map(|i| i.continuation_indent()) else { return false };
	let Some(line) = doc.line(hit.line) else { return false };

	let lead = leading_whitespace(line);
	if lead == indent {
		return false;
	}
	let fixed = format!("{indent}{}", &line[lead.len()..]);
	doc.replace_line(hit.line, fixed);
	true
}

/// Remove a system line directly above the item at `start` that no item owns.
pub fn cleanup_orphan_above(doc: &mut Document, start: usize) -> bool {
	let Some(above) = start.checked_sub(1) else { return false };
	if doc.item(start).is_none() || doc.system_line(above).is_none() {
		return false;
	}
	if doc.owner_of(above).is_some() {
		return false;
	}
	tracing::debug!(line = above, "[system_line] removing orphan");
	doc.remove_line(above);
	true
}

/// Keep only the first canonical system line in the item's own content. Split shapes left
/// next to a canonical line are redundant and go too. Returns the number of lines removed.
pub fn cleanup_duplicates(doc: &mut Document, start: usize) -> usize {
	let Some(span) = doc.span(start) else { return 0 };
	let mut merged = Vec::new();
	let mut split = Vec::new();
	for i in start + 1..=span.own_end {
		match doc.system_line(i).map(|s| s.shape()) {
			Some(SystemLineShape::Merged) => merged.push(i),
			Some(_) => split.push(i),
			None => {}
		}
	}
	if merged.is_empty() {
		return 0;
	}

	let doomed: Vec<usize> = merged.into_iter().skip(1).chain(split).collect();
	if !doomed.is_empty() {
		tracing::debug!(start, lines = ?doomed, "[system_line] removing duplicates");
		doc.remove_lines(&doomed);
	}
	doomed.len()
}
