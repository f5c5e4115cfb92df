//! Line buffer paired with its fence mask.
//!
//! Every structural edit rescans the mask, so consumers can re-derive boundaries after
//! any earlier edit without tracking index shifts of their own.

use super::{
	classify::{ListItemMatch, SystemLineMatch, list_item, system_line},
	fence,
	indent::{DOC_TAB_WIDTH, columns, is_blank},
};

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
	lines: Vec<String>,
	fence: Vec<bool>,
	tab_width: usize,
}

impl Document {
	pub fn new(lines: Vec<String>) -> Self {
		let fence = fence::scan(&lines);
		Self {
			lines,
			fence,
			tab_width: DOC_TAB_WIDTH,
		}
	}

	/// Split on `'\n'`; [`Document::to_text`] restores the exact input.
	pub fn from_text(text: &str) -> Self {
		Self::new(text.split('\n').map(str::to_string).collect())
	}

	pub fn to_text(&self) -> String {
		self.lines.join("\n")
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	pub fn fence_mask(&self) -> &[bool] {
		&self.fence
	}

	pub fn tab_width(&self) -> usize {
		self.tab_width
	}

	pub fn line(&self, idx: usize) -> Option<&str> {
		self.lines.get(idx).map(String::as_str)
	}

	/// Interior of a fenced block. Out-of-range lines are not.
	pub fn in_fence(&self, idx: usize) -> bool {
		self.fence.get(idx).copied().unwrap_or(false)
	}

	pub fn is_blank(&self, idx: usize) -> bool {
		self.line(idx).is_none_or(is_blank)
	}

	pub fn columns(&self, idx: usize) -> usize {
		self.line(idx).map_or(0, |l| columns(l, self.tab_width))
	}

	/// List item at `idx`, unless the line is inside a fence.
	pub fn item(&self, idx: usize) -> Option<ListItemMatch<'_>> {
		if self.in_fence(idx) {
			return None;
		}
		self.line(idx).and_then(list_item)
	}

	/// System line of any shape at `idx`, unless the line is inside a fence.
	pub fn system_line(&self, idx: usize) -> Option<SystemLineMatch<'_>> {
		if self.in_fence(idx) {
			return None;
		}
		self.line(idx).and_then(system_line)
	}

	pub fn insert_line(&mut self, idx: usize, line: String) {
		let idx = idx.min(self.lines.len());
		self.lines.insert(idx, line);
		self.rescan();
	}

	/// Insert `lines` so the first of them lands at `idx`.
	pub fn insert_lines(&mut self, idx: usize, lines: Vec<String>) {
		let idx = idx.min(self.lines.len());
		self.lines.splice(idx..idx, lines);
		self.rescan();
	}

	pub fn remove_line(&mut self, idx: usize) -> Option<String> {
		if idx >= self.lines.len() {
			return None;
		}
		let removed = self.lines.remove(idx);
		self.rescan();
		Some(removed)
	}

	/// Remove several lines at once. Indices may come in any order.
	pub fn remove_lines(&mut self, indices: &[usize]) {
		let mut sorted: Vec<usize> = indices.iter().copied().filter(|&i| i < self.lines.len()).collect();
		sorted.sort_unstable();
		sorted.dedup();
		for idx in sorted.into_iter().rev() {
			self.lines.remove(idx);
		}
		self.rescan();
	}

	/// Replace the inclusive range `start..=end` with `replacement`.
	pub fn splice(&mut self, start: usize, end: usize, replacement: Vec<String>) {
		let start = start.min(self.lines.len());
		let end = end.saturating_add(1).min(self.lines.len()).max(start);
		self.lines.splice(start..end, replacement);
		self.rescan();
	}

	pub fn replace_line(&mut self, idx: usize, line: String) {
		if let Some(slot) = self.lines.get_mut(idx) {
			*slot = line;
			self.rescan();
		}
	}

	fn rescan(&mut self) {
		self.fence = fence::scan(&self.lines);
	}
}
