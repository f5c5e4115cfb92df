//! The `blockmark` binary against files in a temp dir.

use crate::common::{TestContext, path_str};

#[test]
fn test_normalize_prints_without_writing() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a\n  - b\n");

	let (status, stdout, stderr) = ctx.run(&["normalize", path_str(&file)]);
	assert!(status.success(), "stderr: {stderr}");
	let lines: Vec<&str> = stdout.split('\n').collect();
	assert_eq!(lines.len(), 5);
	assert_eq!(lines[0], "- a");
	assert!(lines[1].starts_with("  [date:: "));
	assert_eq!(lines[2], "  - b");
	assert!(lines[3].starts_with("    [date:: "));
	assert_eq!(lines[4], "");
	assert_eq!(ctx.read("notes.md"), "- a\n  - b\n");
}

#[test]
fn test_normalize_write_is_stable() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a\n\t[date:: 2026-01-10T00:00:00]\n\t^keep\n- b\n");

	let (status, _, stderr) = ctx.run(&["normalize", "--write", path_str(&file)]);
	assert!(status.success(), "stderr: {stderr}");
	let first = ctx.read("notes.md");
	assert!(first.starts_with("- a\n  [date:: 2026-01-10T00:00:00] ^keep\n- b\n  [date:: "));

	let (status, _, _) = ctx.run(&["normalize", "--write", path_str(&file)]);
	assert!(status.success());
	assert_eq!(ctx.read("notes.md"), first);
}

#[test]
fn test_normalize_limited_to_lines() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a\n- b\n- c");

	let (status, stdout, _) = ctx.run(&["normalize", "--lines", "2", path_str(&file)]);
	assert!(status.success());
	let lines: Vec<&str> = stdout.split('\n').collect();
	assert_eq!(lines[..3], ["- a", "- b", "- c"]);
	assert!(lines[3].starts_with("  [date:: "));

	let (status, _, stderr) = ctx.run(&["normalize", "--lines", "x..3", path_str(&file)]);
	assert!(!status.success());
	assert!(stderr.contains("invalid line number"), "stderr: {stderr}");
}

#[test]
fn test_repair_keeps_first_occurrence() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a\n[date:: 2026-01-26T16:01:21] ^abcd\n- b\n  [date:: 2026-01-26T16:02:00] ^abcd");

	let (status, _, _) = ctx.run(&["repair", "-w", path_str(&file)]);
	assert!(status.success());
	let out = ctx.read("notes.md");
	let lines: Vec<&str> = out.split('\n').collect();
	assert_eq!(lines[..3], ["- a", "[date:: 2026-01-26T16:01:21] ^abcd", "- b"]);
	assert!(lines[3].starts_with("  [date:: "));
	assert!(!lines[3].ends_with("^abcd"));
}

#[test]
fn test_ensure_prints_id() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a\n  [date:: 2026-01-10T00:00:00] ^known\n- b");

	let (status, stdout, _) = ctx.run(&["ensure", "--line", "0", path_str(&file)]);
	assert!(status.success());
	assert_eq!(stdout, "known\n");

	let (status, stdout, _) = ctx.run(&["ensure", "--write", "--line", "2", path_str(&file)]);
	assert!(status.success());
	let id = stdout.trim();
	let out = ctx.read("notes.md");
	let (before, last) = out.rsplit_once('\n').unwrap();
	assert!(before.ends_with("\n- b"));
	assert!(last.starts_with("  [date:: "));
	assert!(last.ends_with(&format!("] ^{id}")));
}

#[test]
fn test_ensure_rejects_non_item_line() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "plain\n- a");

	let (status, _, stderr) = ctx.run(&["ensure", "--line", "0", path_str(&file)]);
	assert!(!status.success());
	assert!(stderr.contains("no list item starts at line 0"), "stderr: {stderr}");
}

#[test]
fn test_range_and_items() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a\n  [date:: 2026-01-10T00:00:00] ^pa\n  - b\n- c");

	let (status, stdout, _) = ctx.run(&["range", "--line", "0", path_str(&file)]);
	assert!(status.success());
	assert_eq!(stdout, "0 2\n");

	let (status, stdout, _) = ctx.run(&["items", path_str(&file)]);
	assert!(status.success());
	let items: serde_json::Value = serde_json::from_str(&stdout).unwrap();
	let items = items.as_array().unwrap();
	assert_eq!(items.len(), 3);
	assert_eq!(items[0]["id"], "pa");
	assert_eq!(items[1]["text"], "b");
	assert_eq!(items[1]["parent_id"], "pa");
	assert_eq!(items[2]["start_line"], 3);
	assert!(items[2]["id"].is_null());
}

#[test]
fn test_env_overrides_rules() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a\n- b");

	let (status, stdout, _) = ctx.run_with_env(&["normalize", path_str(&file)], &[("BLOCKMARK_RULES__ENSURE_SYSTEM_LINE", "false")]);
	assert!(status.success());
	assert_eq!(stdout, "- a\n- b");
}

#[test]
fn test_config_file_settings() {
	let ctx = TestContext::new();
	ctx.write_config("indent_width = 2\n\n[ids]\nprefix = \"t-\"\n\n[rules]\ntabs_to_spaces = true\n");
	let file = ctx.write("notes.md", "- a\n\t- b");

	let (status, stdout, stderr) = ctx.run(&["normalize", path_str(&file)]);
	assert!(status.success(), "stderr: {stderr}");
	let lines: Vec<&str> = stdout.split('\n').collect();
	assert_eq!(lines[0], "- a");
	assert!(lines[1].starts_with("  [date:: "));
	assert!(lines[1].contains("^t-"));
	assert_eq!(lines[2], "  - b");
	assert!(lines[3].starts_with("    [date:: "));
}

#[test]
fn test_explicit_config_path() {
	let ctx = TestContext::new();
	let config = ctx.write("custom.toml", "[rules]\nensure_system_line = false\n");
	let file = ctx.write("notes.md", "- a");

	let (status, stdout, _) = ctx.run(&["normalize", "--config", path_str(&config), path_str(&file)]);
	assert!(status.success());
	assert_eq!(stdout, "- a");
}

#[test]
fn test_invalid_config_exits_with_diagnostic() {
	let ctx = TestContext::new();
	ctx.write_config("indent_width = 0\n");
	let file = ctx.write("notes.md", "- a");

	let (status, _, stderr) = ctx.run(&["normalize", path_str(&file)]);
	assert_eq!(status.code(), Some(2));
	assert!(stderr.contains("indent_width"), "stderr: {stderr}");
}

#[test]
fn test_trace_file_gets_json_events() {
	let ctx = TestContext::new();
	let trace = ctx.path("trace.jsonl");
	let file = ctx.write("notes.md", "- a\n  [date:: 2026-01-10T00:00:00] ^x\n- b\n  [date:: 2026-01-10T00:00:00] ^x");

	let (status, _, _) = ctx.run_with_env(&["normalize", path_str(&file)], &[("BLOCKMARK_TRACE_FILE", path_str(&trace))]);
	assert!(status.success());

	let log = std::fs::read_to_string(&trace).unwrap();
	let events: Vec<serde_json::Value> = log.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
	assert!(!events.is_empty());
	assert!(events.iter().all(|e| e["level"].is_string()));
	assert!(log.contains("[engine] saving"));
}

#[test]
fn test_missing_explicit_config_fails() {
	let ctx = TestContext::new();
	let file = ctx.write("notes.md", "- a");

	let (status, stdout, stderr) = ctx.run(&["normalize", "--config", path_str(&ctx.path("typo.toml")), path_str(&file)]);
	assert_eq!(status.code(), Some(2));
	assert!(stdout.is_empty());
	assert!(stderr.contains("typo.toml"), "stderr: {stderr}");
}
