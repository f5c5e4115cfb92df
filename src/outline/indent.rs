//! Indentation arithmetic.
//!
//! Every nesting decision compares column counts computed with [`DOC_TAB_WIDTH`].
//! The width used when rewriting tabs to spaces is configured separately, so
//! changing it never changes how a document nests.

/// Tab width used for parsing. Fixed, independent of the rewrite width.
pub const DOC_TAB_WIDTH: usize = 4;

/// Leading run of spaces and tabs.
pub fn leading_whitespace(line: &str) -> &str {
	let end = line.find(|c: char| c != ' ' && c != '\t').unwrap_or(line.len());
	&line[..end]
}

/// Column count of the leading whitespace of `text`.
///
/// A space advances by one column, a tab advances to the next multiple of `tab_width`.
/// A `tab_width` of zero is treated as one.
pub fn columns(text: &str, tab_width: usize) -> usize {
	let tab_width = tab_width.max(1);
	let mut cols = 0;
	for ch in text.chars() {
		match ch {
			' ' => cols += 1,
			'\t' => cols += tab_width - (cols % tab_width),
			_ => break,
		}
	}
	cols
}

/// Re-express a whitespace run as spaces, expanding tabs at `tab_width`.
pub fn expand_tabs(ws: &str, tab_width: usize) -> String {
	" ".repeat(columns(ws, tab_width))
}

/// Remove up to `n` columns of leading whitespace.
///
/// A tab straddling the cut is split: the columns it covers past `n` come back as spaces.
/// Never removes non-whitespace, so indentation cannot go negative.
pub fn strip_columns(line: &str, n: usize, tab_width: usize) -> String {
	let tab_width = tab_width.max(1);
	let mut cols = 0;
	for (idx, ch) in line.char_indices() {
		if cols >= n {
			return line[idx..].to_string();
		}
		let next = match ch {
			' ' => cols + 1,
			'\t' => cols + tab_width - (cols % tab_width),
			_ => return line[idx..].to_string(),
		};
		if next > n {
			let mut out = " ".repeat(next - n);
			out.push_str(&line[idx + ch.len_utf8()..]);
			return out;
		}
		cols = next;
	}
	String::new()
}

pub fn is_blank(line: &str) -> bool {
	line.trim().is_empty()
}
