//! Structural engine for outliner documents.
//!
//! A document is plain text; list items, their subtrees and their system lines are
//! views recomputed from the text on every call. Nothing here keeps a parsed tree
//! between calls, and every function is total over arbitrary input.
//!
//! A system line is the sidecar `[date:: <timestamp>] ^<id>` an item owns, written
//! directly after the item's own content and before its first child.

mod classify;
pub use classify::{
	Classified, FenceDelimiter, ListItemMatch, MarkerKind, SystemLineMatch, SystemLineShape, block_refs, classify, fence_delimiter, format_system_line, is_list_item,
	is_system_line, list_item, merged_system_line,
};

mod dirty;
pub use dirty::{DirtyRange, DirtyRangeStore, coalesce};

mod document;
pub use document::Document;

mod fence;
pub use fence::scan as fence_mask;

mod id;
pub use id::{BlockId, Clock, FixedClock, IdGenerator, LocalClock, Stamper, format_timestamp};

mod indent;
pub use indent::{DOC_TAB_WIDTH, columns, expand_tabs, leading_whitespace, strip_columns};

mod mutate;
pub use mutate::{ClipboardOrigin, ClipboardPayload, PasteSource, StartLineEdit, apply_start_line_edit, copy, cut, looks_like_subtree, paste, selected_spans};

mod normalize;
pub use normalize::{normalize, tabs_to_spaces, touched_items};

mod repair;
pub use repair::repair;

mod system_line;
pub use system_line::{
	SystemLine, cleanup_duplicates, cleanup_orphan_above, ensure as ensure_system_line, find as find_system_line, find_in_subtree, find_placed, fix_indentation, merge_split_pairs,
};

mod tree;
pub use tree::{ItemSpan, ListItem, list_items, subtree_end};
