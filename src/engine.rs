//! Host-facing entry points.
//!
//! [`Engine`] owns the settings, the id generator, the clock and the dirty-range store,
//! and exposes one method per operation a host editor calls. Everything else in the
//! crate is pure functions over text.

use std::{
	borrow::Cow,
	path::Path,
	sync::{Mutex, PoisonError},
};

use crate::{
	config::Settings,
	outline::{
		self, BlockId, ClipboardPayload, Clock, DirtyRange, DirtyRangeStore, Document, IdGenerator, ListItem, LocalClock, PasteSource, Stamper, SystemLine, ensure_system_line,
		fence_mask, list_items, normalize, repair,
	},
};

/// An item's id, plus the text after writing its system line (unchanged if it had one).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ensured {
	pub id: BlockId,
	pub text: String,
}

pub struct Engine {
	settings: Settings,
	ids: Mutex<IdGenerator>,
	clock: Box<dyn Clock + Send + Sync>,
	dirty: DirtyRangeStore,
}

impl Engine {
	pub fn new(settings: Settings) -> Self {
		let ids = IdGenerator::new(&settings.ids);
		Self::with_parts(settings, ids, LocalClock)
	}

	pub fn with_parts(settings: Settings, ids: IdGenerator, clock: impl Clock + Send + Sync + 'static) -> Self {
		Self {
			settings,
			ids: Mutex::new(ids),
			clock: Box::new(clock),
			dirty: DirtyRangeStore::new(),
		}
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn dirty_ranges(&self) -> &DirtyRangeStore {
		&self.dirty
	}

	pub fn record_edit(&self, path: impl AsRef<Path>, range: DirtyRange) {
		self.dirty.record(path, range);
	}

	/// Runs `f` with a stamper seeded from `text`. Holds the id generator for the duration.
	fn with_stamper<T>(&self, text: &str, f: impl FnOnce(&mut Stamper<'_>) -> T) -> T {
		let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
		let mut stamper = Stamper::new(&mut ids, self.clock.as_ref(), text);
		f(&mut stamper)
	}

	pub fn normalize_on_save<'t>(&self, text: &'t str, dirty: &[DirtyRange]) -> Cow<'t, str> {
		self.with_stamper(text, |stamper| normalize(text, dirty, &self.settings, stamper))
	}

	pub fn repair_duplicate_ids<'t>(&self, text: &'t str) -> Cow<'t, str> {
		self.with_stamper(text, |stamper| repair(text, stamper))
	}

	/// Drain the ranges recorded for `path`, normalize them, then repair duplicate ids
	/// over the whole result.
	#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
	pub fn save<'t>(&self, path: impl AsRef<Path>, text: &'t str) -> Cow<'t, str> {
		let dirty = self.dirty.drain(&path);
		tracing::debug!(ranges = dirty.len(), "[engine] saving");
		self.with_stamper(text, |stamper| {
			let normalized = normalize(text, &dirty, &self.settings, stamper);
			let repaired = match repair(&normalized, stamper) {
				Cow::Owned(s) => Some(s),
				Cow::Borrowed(_) => None,
			};
			repaired.map_or(normalized, Cow::Owned)
		})
	}

	pub fn ensure_system_line_for_item(&self, text: &str, start: usize) -> Option<Ensured> {
		self.with_stamper(text, |stamper| {
			let mut doc = Document::from_text(text);
			let id = ensure_system_line(&mut doc, start, stamper)?;
			Some(Ensured { id, text: doc.to_text() })
		})
	}

	/// Inclusive `(start, end)` lines of the subtree starting at `start`.
	pub fn compute_subtree_range(&self, text: &str, start: usize) -> Option<(usize, usize)> {
		Document::from_text(text).span(start).map(|s| (s.start, s.end))
	}

	pub fn find_owning_item_start_line(&self, text: &str, line: usize) -> Option<usize> {
		Document::from_text(text).owner_of(line)
	}

	pub fn find_system_line(&self, text: &str, start: usize) -> Option<SystemLine> {
		outline::find_system_line(&Document::from_text(text), start)
	}

	pub fn serialize_subtree_for_clipboard(&self, text: &str, starts: &[usize]) -> Option<ClipboardPayload> {
		outline::copy(text, starts)
	}

	pub fn cut_subtrees(&self, text: &str, starts: &[usize]) -> Option<(ClipboardPayload, String)> {
		outline::cut(text, starts)
	}

	pub fn apply_paste(&self, text: &str, line: usize, source: PasteSource<'_>) -> Option<String> {
		self.with_stamper(text, |stamper| outline::paste(text, line, source, stamper))
	}

	pub fn apply_start_line_edit(&self, text: &str, line: usize, replacement: Vec<String>) -> String {
		outline::apply_start_line_edit(text, line, replacement, self.settings.marker_removal)
	}

	pub fn list_items(&self, text: &str) -> Vec<ListItem> {
		list_items(&Document::from_text(text))
	}

	pub fn fence_mask(&self, text: &str) -> Vec<bool> {
		fence_mask(&text.split('\n').collect::<Vec<_>>())
	}
}
