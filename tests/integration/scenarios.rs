//! End-to-end behaviour of the host-facing operations on small documents.

use std::collections::HashSet;

use blockmark::{
	Settings,
	outline::{ClipboardPayload, DirtyRange, PasteSource, merged_system_line},
};
use insta::assert_snapshot;
use rstest::rstest;

use crate::common::{NOW, engine};

fn canonical_ids(text: &str, engine: &blockmark::Engine) -> Vec<String> {
	let fence = engine.fence_mask(text);
	text.split('\n')
		.zip(fence)
		.filter(|(_, fenced)| !fenced)
		.filter_map(|(line, _)| merged_system_line(line).and_then(|m| m.id).map(str::to_string))
		.collect()
}

#[test]
fn test_new_sibling_gives_parent_system_line() {
	let engine = engine(Settings::default());
	let text = "- a\n  - child\n- ";
	let ensured = engine.ensure_system_line_for_item(text, 0).unwrap();
	let lines: Vec<&str> = ensured.text.split('\n').collect();
	assert_eq!(lines[0], "- a");
	assert_eq!(lines[1], format!("  [date:: {NOW}] ^{}", ensured.id));
	assert_eq!(lines[2..], ["  - child", "- "]);
}

#[test]
fn test_full_repair_rewrites_second_occurrence() {
	let engine = engine(Settings::default());
	let text = "- a\n[date:: 2026-01-26T16:01:21] ^abcd\n- b\n  [date:: 2026-01-26T16:02:00] ^abcd";
	let out = engine.repair_duplicate_ids(text);
	let lines: Vec<&str> = out.split('\n').collect();
	assert_eq!(lines[1], "[date:: 2026-01-26T16:01:21] ^abcd");
	let rewritten = merged_system_line(lines[3]).unwrap();
	assert_eq!(rewritten.indent, "  ");
	assert_eq!(rewritten.timestamp, Some(NOW));
	assert_ne!(rewritten.id, Some("abcd"));
}

#[test]
fn test_marker_deletion_keeps_children() {
	let engine = engine(Settings::default());
	let text = "- parent\n  [date:: 2026-01-10T00:00:00] ^abc\n  - child";
	assert_eq!(engine.apply_start_line_edit(text, 0, vec![" parent".into()]), " parent\n  - child");
}

#[test]
fn test_marker_deletion_leaves_fenced_lookalike() {
	let engine = engine(Settings::default());
	let text = "- parent\n  ```txt\n  [date:: 2026-01-10T00:00:00] ^nope\n  ```\n- next";
	assert_snapshot!(engine.apply_start_line_edit(text, 0, vec!["parent".into()]), @r"
	parent
	  ```txt
	  [date:: 2026-01-10T00:00:00] ^nope
	  ```
	- next
	");
}

#[test]
fn test_fenced_lookalikes_are_not_items() {
	let engine = engine(Settings::default());
	let text = "- real\n  ```\n  - fake\n  [date:: 2026-01-10T00:00:00] ^nope\n  ```";
	let items = engine.list_items(text);
	assert_eq!(items.len(), 1);
	assert_eq!(items[0].text, "real");
	assert_eq!(items[0].id, None);
	assert_eq!(items[0].end_line, 4);

	let out = engine.normalize_on_save(text, &[DirtyRange::whole(5)]);
	assert_eq!(out.split('\n').take(5).collect::<Vec<_>>().join("\n"), text);
}

#[test]
fn test_clipboard_round_trip_through_json() {
	let engine = engine(Settings::default());
	let text = "- a\n  [date:: 2026-01-10T00:00:00] ^pa\n  - b\n    [date:: 2026-01-10T00:00:00] ^pb\n- ";
	let json = engine.serialize_subtree_for_clipboard(text, &[0]).unwrap().to_json().unwrap();
	let payload = ClipboardPayload::from_json(&json).unwrap();

	let plain = engine.apply_paste(text, 4, PasteSource::External(&payload.plain_text)).unwrap();
	assert_snapshot!(plain, @r"
	- a
	  [date:: 2026-01-10T00:00:00] ^pa
	  - b
	    [date:: 2026-01-10T00:00:00] ^pb
	- a
	  - b
	");

	let internal = engine.apply_paste(text, 4, PasteSource::Internal(&payload)).unwrap();
	let ids = canonical_ids(&internal, &engine);
	assert_eq!(ids.len(), 4);
	assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 4);
	assert_eq!(ids[..2], ["pa", "pb"]);
}

#[test]
fn test_cut_and_paste_keeps_ids() {
	let engine = engine(Settings::default());
	let text = "- a\n  [date:: 2026-01-10T00:00:00] ^pa\n- b\n  - ";
	let (payload, rest) = engine.cut_subtrees(text, &[0]).unwrap();
	assert_eq!(rest, "- b\n  - ");
	let out = engine.apply_paste(&rest, 1, PasteSource::Internal(&payload)).unwrap();
	assert_eq!(out, "- b\n  - a\n    [date:: 2026-01-10T00:00:00] ^pa");
}

#[rstest]
#[case::pasted_twice("- a\n  [date:: 2026-01-10T00:00:00] ^x\n- a\n  [date:: 2026-01-10T00:00:00] ^x\n- a\n  [date:: 2026-01-10T00:00:00] ^x")]
#[case::nested_copy("- p\n  [date:: 2026-01-10T00:00:00] ^p\n  - p\n    [date:: 2026-01-10T00:00:00] ^p")]
#[case::split_and_merged("- a\n  [date:: 2026-01-10T00:00:00]\n  ^dup\n- b\n  [date:: 2026-01-10T00:00:00] ^dup")]
#[case::fresh("- a\n  - b\n    - c\n- d")]
fn test_save_leaves_unique_ids(#[case] text: &str) {
	let engine = engine(Settings::default());
	let len = text.split('\n').count();
	engine.record_edit("doc.md", DirtyRange::whole(len));
	let saved = engine.save("doc.md", text).into_owned();

	let ids = canonical_ids(&saved, &engine);
	assert_eq!(ids.len(), engine.list_items(&saved).len());
	assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());

	engine.record_edit("doc.md", DirtyRange::whole(saved.split('\n').count()));
	assert_eq!(engine.save("doc.md", &saved), saved);
}
