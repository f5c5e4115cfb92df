//! Save-time normalization.
//!
//! Dirty ranges are mapped to the items they touch, every ancestor of a touched item is
//! touched too, and the rule pipeline runs once per item from the bottom of the document
//! up. Each rule re-derives boundaries from the current text, so earlier rules may shift
//! lines freely.

use std::{borrow::Cow, collections::BTreeSet};

use super::{
	dirty::DirtyRange,
	document::Document,
	id::Stamper,
	indent::{DOC_TAB_WIDTH, expand_tabs, leading_whitespace},
	system_line,
};
use crate::config::Settings;

/// Start lines of every item a dirty range overlaps, plus all their ancestors.
pub fn touched_items(doc: &Document, dirty: &[DirtyRange]) -> BTreeSet<usize> {
	let mut touched = BTreeSet::new();
	for range in dirty {
		let lines = range.lines();
		let lines = lines.start..lines.end.min(doc.len());
		if lines.is_empty() {
			continue;
		}
		// anything owning a line in the range either starts inside it or encloses its first line
		let owners = doc.owner_of(lines.start).into_iter().chain(lines.filter(|&i| doc.item(i).is_some()));
		for owner in owners {
			mark_with_ancestors(doc, owner, &mut touched);
		}
	}
	touched
}

fn mark_with_ancestors(doc: &Document, start: usize, touched: &mut BTreeSet<usize>) {
	let mut next = Some(start);
	while let Some(s) = next {
		if !touched.insert(s) {
			break;
		}
		next = doc.parent_of(s);
	}
}

/// Run the rule pipeline over everything `dirty` touches.
///
/// Borrows `text` back when no range maps to an item, or when the rules leave it as is.
#[tracing::instrument(skip_all, fields(ranges = dirty.len()))]
pub fn normalize<'t>(text: &'t str, dirty: &[DirtyRange], settings: &Settings, stamper: &mut Stamper<'_>) -> Cow<'t, str> {
	let mut doc = Document::from_text(text);
	let touched = touched_items(&doc, dirty);
	if touched.is_empty() {
		tracing::debug!("[normalize] no list items touched");
		return Cow::Borrowed(text);
	}
	tracing::debug!(items = touched.len(), "[normalize] processing touched items");

	for &start in touched.iter().rev() {
		normalize_item(&mut doc, start, settings, stamper);
	}

	let out = doc.to_text();
	if out == text { Cow::Borrowed(text) } else { Cow::Owned(out) }
}

fn normalize_item(doc: &mut Document, mut start: usize, settings: &Settings, stamper: &mut Stamper<'_>) {
	let rules = &settings.rules;
	if doc.item(start).is_none() {
		return;
	}

	if rules.cleanup_orphans && system_line::cleanup_orphan_above(doc, start) {
		start -= 1;
	}
	if rules.tabs_to_spaces {
		tabs_to_spaces(doc, start, settings.indent_width);
	}
	if rules.merge_split {
		system_line::merge_split_pairs(doc, start);
	}
	if rules.cleanup_duplicates {
		system_line::cleanup_duplicates(doc, start);
	}
	if rules.fix_indentation {
		system_line::fix_indentation(doc, start);
	}
	if !rules.ensure_system_line {
		return;
	}
	if rules.skip_empty_items && doc.item(start).is_some_and(|i| i.content.trim().is_empty()) {
		tracing::trace!(start, "[normalize] empty item, not creating a system line");
		return;
	}
	system_line::ensure(doc, start, stamper);
	// relocation can land next to split leftovers the first cleanup could not see
	if rules.cleanup_duplicates {
		system_line::cleanup_duplicates(doc, start);
	}
}

/// Convert leading tabs on the item's own lines to spaces at `width`.
///
/// If that would move the item under a different parent or change which lines its
/// subtree covers, the lines are converted at the parse width instead, which keeps every
/// column where it was. Lines inside fences and the item's descendants are not touched.
pub fn tabs_to_spaces(doc: &mut Document, start: usize, width: usize) -> bool {
	let Some(span) = doc.span(start) else { return false };
	let tabbed: Vec<usize> = (start..=span.own_end)
		.filter(|&i| !doc.in_fence(i) && doc.line(i).is_some_and(|l| leading_whitespace(l).contains('\t')))
		.collect();
	if tabbed.is_empty() {
		return false;
	}

	let parent = doc.parent_of(start);
	let original: Vec<String> = tabbed.iter().filter_map(|&i| doc.line(i).map(str::to_string)).collect();
	rewrite_leading(doc, &tabbed, width);

	let preserved = doc.parent_of(start) == parent && doc.span(start).is_some_and(|s| s.own_end == span.own_end && s.end == span.end && s.first_child == span.first_child);
	if !preserved {
		tracing::debug!(start, width, "[normalize] tab width would re-parent, converting at parse width");
		for (&i, line) in tabbed.iter().zip(original) {
			doc.replace_line(i, line);
		}
		rewrite_leading(doc, &tabbed, DOC_TAB_WIDTH);
	}
	true
}

fn rewrite_leading(doc: &mut Document, lines: &[usize], width: usize) {
	for &i in lines {
		let Some(line) = doc.line(i) else { continue };
		let lead = leading_whitespace(line);
		let rewritten = format!("{}{}", expand_tabs(lead, width), &line[lead.len()..]);
		doc.replace_line(i, rewritten);
	}
}
