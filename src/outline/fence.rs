//! Fenced-code-block scanner.
//!
//! Produces a per-line mask where `true` means "inside a fence": the line is opaque and
//! must not be read as structure. Delimiter lines themselves stay `false` so they can be
//! indented and attributed like any other content line.

use super::classify::fence_delimiter;

#[derive(Clone, Copy, Debug)]
struct OpenFence {
	ch: char,
	len: usize,
	line: usize,
}

pub fn scan<S: AsRef<str>>(lines: &[S]) -> Vec<bool> {
	let mut mask = Vec::with_capacity(lines.len());
	let mut open: Option<OpenFence> = None;

	for (i, line) in lines.iter().enumerate() {
		let line = line.as_ref();
		match open {
			None => {
				if let Some(delim) = fence_delimiter(line) {
					open = Some(OpenFence { ch: delim.ch, len: delim.len, line: i });
				}
				mask.push(false);
			}
			Some(fence) => {
				let closes = i != fence.line && fence_delimiter(line).is_some_and(|d| !d.has_info && d.ch == fence.ch && d.len >= fence.len);
				if closes {
					open = None;
					mask.push(false);
				} else {
					mask.push(true);
				}
			}
		}
	}

	mask
}
