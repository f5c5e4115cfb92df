//! Dirty-range tracking between saves.
//!
//! Ranges are half-open line intervals recorded as the document is edited, kept per
//! path and coalesced on insertion. A save drains them under the lock, so two saves of
//! the same path never both see the same ranges.

use std::{
	collections::HashMap,
	ops::Range,
	path::{Path, PathBuf},
	sync::{Mutex, PoisonError},
};

use derive_new::new;
use serde::{Deserialize, Serialize};

/// Lines `start..end`. An empty range still touches line `start`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, new)]
pub struct DirtyRange {
	pub start: usize,
	pub end: usize,
}

impl DirtyRange {
	pub fn line(line: usize) -> Self {
		Self::new(line, line + 1)
	}

	/// Every line of a document with `len` lines.
	pub fn whole(len: usize) -> Self {
		Self::new(0, len.max(1))
	}

	/// Lines actually touched, with the bounds put in order.
	pub fn lines(&self) -> Range<usize> {
		let (lo, hi) = (self.start.min(self.end), self.start.max(self.end));
		lo..hi.max(lo + 1)
	}
}

/// Sort and merge overlapping or adjacent ranges.
pub fn coalesce(ranges: &mut Vec<DirtyRange>) {
	let mut sorted: Vec<Range<usize>> = ranges.iter().map(DirtyRange::lines).collect();
	sorted.sort_by_key(|r| r.start);

	let mut out: Vec<Range<usize>> = Vec::with_capacity(sorted.len());
	for r in sorted {
		match out.last_mut() {
			Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
			_ => out.push(r),
		}
	}
	*ranges = out.into_iter().map(|r| DirtyRange::new(r.start, r.end)).collect();
}

#[derive(Debug, Default)]
pub struct DirtyRangeStore {
	ranges: Mutex<HashMap<PathBuf, Vec<DirtyRange>>>,
}

impl DirtyRangeStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&self, path: impl AsRef<Path>, range: DirtyRange) {
		let mut map = self.ranges.lock().unwrap_or_else(PoisonError::into_inner);
		let entry = map.entry(path.as_ref().to_path_buf()).or_default();
		entry.push(range);
		coalesce(entry);
		tracing::trace!(path = %path.as_ref().display(), ranges = entry.len(), "[dirty] recorded");
	}

	/// Remove and return everything recorded for `path`.
	pub fn drain(&self, path: impl AsRef<Path>) -> Vec<DirtyRange> {
		let mut map = self.ranges.lock().unwrap_or_else(PoisonError::into_inner);
		map.remove(path.as_ref()).unwrap_or_default()
	}

	/// Current ranges for `path`, without consuming them.
	pub fn peek(&self, path: impl AsRef<Path>) -> Vec<DirtyRange> {
		let map = self.ranges.lock().unwrap_or_else(PoisonError::into_inner);
		map.get(path.as_ref()).cloned().unwrap_or_default()
	}

	pub fn is_dirty(&self, path: impl AsRef<Path>) -> bool {
		let map = self.ranges.lock().unwrap_or_else(PoisonError::into_inner);
		map.get(path.as_ref()).is_some_and(|r| !r.is_empty())
	}
}
