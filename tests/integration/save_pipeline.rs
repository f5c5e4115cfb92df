//! Recording edits across a session and flushing them on save.

use std::{sync::Arc, thread};

use blockmark::{RuleSet, Settings, outline::DirtyRange};

use crate::common::{NOW, engine};

#[test]
fn test_save_only_touches_recorded_items() {
	let engine = engine(Settings::default());
	let text = "- a\n- b\n- c";
	engine.record_edit("notes.md", DirtyRange::line(1));
	let saved = engine.save("notes.md", text);
	let lines: Vec<&str> = saved.split('\n').collect();
	assert_eq!(lines.len(), 4);
	assert_eq!(lines[..2], ["- a", "- b"]);
	assert!(lines[2].starts_with(&format!("  [date:: {NOW}] ^")));
	assert_eq!(lines[3], "- c");
}

#[test]
fn test_child_edit_reaches_ancestors() {
	let engine = engine(Settings::default());
	let text = "- a\n  - b\n    - c";
	engine.record_edit("notes.md", DirtyRange::line(2));
	let saved = engine.save("notes.md", text);
	let items = engine.list_items(&saved);
	assert_eq!(items.len(), 3);
	assert!(items.iter().all(|item| item.id.is_some()));
	assert_eq!(items[2].parent_id, items[1].id);
	assert_eq!(items[1].parent_id, items[0].id);
}

#[test]
fn test_paths_are_independent() {
	let engine = engine(Settings::default());
	engine.record_edit("one.md", DirtyRange::line(0));
	engine.record_edit("two.md", DirtyRange::line(0));

	let saved = engine.save("one.md", "- a");
	assert_ne!(saved, "- a");
	assert!(!engine.dirty_ranges().is_dirty("one.md"));
	assert!(engine.dirty_ranges().is_dirty("two.md"));
	assert_eq!(engine.dirty_ranges().peek("two.md"), vec![DirtyRange::line(0)]);
}

#[test]
fn test_unrecorded_save_still_repairs() {
	let engine = engine(Settings::default());
	let text = "- a\n  [date:: 2026-01-10T00:00:00] ^same\n- b\n  [date:: 2026-01-10T00:00:00] ^same";
	let saved = engine.save("notes.md", text);
	let ids: Vec<String> = engine.list_items(&saved).into_iter().filter_map(|item| item.id).collect();
	assert_eq!(ids.len(), 2);
	assert_eq!(ids[0], "same");
	assert_ne!(ids[1], "same");
}

#[test]
fn test_disabled_rules_leave_layout_alone() {
	let engine = engine(Settings {
		rules: RuleSet::none(),
		..Settings::default()
	});
	let text = "- a\n\t[date:: 2026-01-10T00:00:00]\n\t^x\n- b";
	engine.record_edit("notes.md", DirtyRange::whole(4));
	assert_eq!(engine.save("notes.md", text), text);
}

#[test]
fn test_concurrent_sessions_share_engine() {
	let engine = Arc::new(engine(Settings::default()));
	let handles: Vec<_> = (0..8)
		.map(|n| {
			let engine = Arc::clone(&engine);
			thread::spawn(move || {
				let path = format!("doc-{n}.md");
				engine.record_edit(&path, DirtyRange::whole(2));
				engine.save(&path, "- a\n- b").into_owned()
			})
		})
		.collect();

	let mut ids = Vec::new();
	for handle in handles {
		let saved = handle.join().unwrap();
		ids.extend(engine.list_items(&saved).into_iter().filter_map(|item| item.id));
	}
	assert_eq!(ids.len(), 16);
	assert!((0..8).all(|n| !engine.dirty_ranges().is_dirty(format!("doc-{n}.md"))));
}
