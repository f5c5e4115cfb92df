//! Subtree boundaries, reconstructed from indentation alone.
//!
//! There are no parent pointers: an item is its start line, and its subtree is the run
//! of following lines that are deeper than it. A blank line outside a fence always ends
//! a subtree. System lines of any shape are tolerated in an item's own content region
//! even with broken indentation, so malformed files can still be attributed and repaired.

use serde::Serialize;

use super::{
	classify::{is_list_item, is_system_line},
	document::Document,
	indent::{columns, is_blank},
	system_line,
};

/// Line ranges of one item. All bounds are inclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ItemSpan {
	pub start: usize,
	/// Last line of the item's own content: the line before its first child, or `end`.
	pub own_end: usize,
	pub end: usize,
	pub first_child: Option<usize>,
	pub indent_cols: usize,
}

impl ItemSpan {
	pub fn contains(&self, line: usize) -> bool {
		(self.start..=self.end).contains(&line)
	}

	pub fn own_contains(&self, line: usize) -> bool {
		(self.start..=self.own_end).contains(&line)
	}
}

/// Last line of the subtree starting at `start`, or `None` if `start` is out of range.
pub fn subtree_end<S: AsRef<str>>(lines: &[S], start: usize, indent_cols: usize, tab_width: usize, fence: &[bool]) -> Option<usize> {
	scan_span(lines, start, indent_cols, tab_width, fence).map(|s| s.end)
}

fn scan_span<S: AsRef<str>>(lines: &[S], start: usize, indent_cols: usize, tab_width: usize, fence: &[bool]) -> Option<ItemSpan> {
	if start >= lines.len() {
		return None;
	}
	let mut end = start;
	let mut first_child = None;
	let mut i = start + 1;

	while i < lines.len() {
		if fence.get(i).copied().unwrap_or(false) {
			end = i;
			i += 1;
			continue;
		}
		let line = lines[i].as_ref();
		if is_blank(line) {
			break;
		}
		if first_child.is_none() && is_system_line(line) {
			end = i;
			i += 1;
			continue;
		}
		let cols = columns(line, tab_width);
		if cols <= indent_cols {
			break;
		}
		if is_list_item(line) {
			first_child.get_or_insert(i);
			// a child's subtree is always part of ours, including its tolerated lines
			let child_end = scan_span(lines, i, cols, tab_width, fence).map_or(i, |s| s.end);
			end = child_end;
			i = child_end + 1;
			continue;
		}
		end = i;
		i += 1;
	}

	Some(ItemSpan {
		start,
		own_end: first_child.map_or(end, |c| c - 1),
		end,
		first_child,
		indent_cols,
	})
}

impl Document {
	/// Span of the list item starting at `start`. `None` if there is no visible item there.
	pub fn span(&self, start: usize) -> Option<ItemSpan> {
		let cols = self.item(start)?.indent_columns();
		scan_span(self.lines(), start, cols, self.tab_width(), self.fence_mask())
	}

	/// Start line of the item owning `line`: the line itself when it starts an item,
	/// otherwise the nearest item above whose subtree contains it.
	pub fn owner_of(&self, line: usize) -> Option<usize> {
		if line >= self.len() {
			return None;
		}
		if self.item(line).is_some() {
			return Some(line);
		}
		self.enclosing(line)
	}

	/// Nearest strict ancestor of the item at `start`.
	pub fn parent_of(&self, start: usize) -> Option<usize> {
		self.item(start)?;
		self.enclosing(start)
	}

	/// Walks upward, stopping at the first blank line outside a fence: subtrees never
	/// contain one, so nothing above it can own `line`.
	fn enclosing(&self, line: usize) -> Option<usize> {
		let mut ceiling = usize::MAX;
		for i in (0..line).rev() {
			if self.in_fence(i) {
				continue;
			}
			if self.is_blank(i) {
				return None;
			}
			let Some(item) = self.item(i) else { continue };
			let cols = item.indent_columns();
			if cols >= ceiling {
				continue;
			}
			if self.span(i).is_some_and(|s| s.end >= line) {
				return Some(i);
			}
			if cols == 0 {
				return None;
			}
			ceiling = cols;
		}
		None
	}

	/// Start lines of the direct children of the item at `start`.
	pub fn children(&self, start: usize) -> Vec<usize> {
		let Some(span) = self.span(start) else { return Vec::new() };
		let mut out = Vec::new();
		let Some(mut i) = span.first_child else { return out };
		while i <= span.end {
			match self.span(i) {
				Some(child) => {
					out.push(i);
					i = child.end + 1;
				}
				None => i += 1,
			}
		}
		out
	}

	/// Every visible list-item start line, in document order.
	pub fn item_starts(&self) -> Vec<usize> {
		(0..self.len()).filter(|&i| self.item(i).is_some()).collect()
	}
}

/// A list item as seen by indexers and the query view.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ListItem {
	pub start_line: usize,
	pub end_line: usize,
	pub indent_columns: usize,
	pub text: String,
	pub id: Option<String>,
	pub parent_id: Option<String>,
}

pub fn list_items(doc: &Document) -> Vec<ListItem> {
	doc.item_starts()
		.into_iter()
		.filter_map(|start| {
			let span = doc.span(start)?;
			let item = doc.item(start)?;
			let id = system_line::find(doc, start).map(|hit| hit.id);
			let parent_id = doc.parent_of(start).and_then(|p| system_line::find(doc, p)).map(|hit| hit.id);
			Some(ListItem {
				start_line: start,
				end_line: span.end,
				indent_columns: span.indent_cols,
				text: item.content.to_string(),
				id,
				parent_id,
			})
		})
		.collect()
}
