//! Whole-document duplicate id repair.

use std::{borrow::Cow, collections::HashSet};

use super::{
	classify::{SystemLineShape, format_system_line},
	document::Document,
	id::Stamper,
};

/// Rewrite every canonical system line whose id was already seen earlier in the
/// document. The first occurrence keeps its line untouched; later ones get a fresh
/// timestamp and an id unique against the document and everything minted so far.
#[tracing::instrument(skip_all)]
pub fn repair<'t>(text: &'t str, stamper: &mut Stamper<'_>) -> Cow<'t, str> {
	let mut doc = Document::from_text(text);
	let mut seen = HashSet::new();
	let mut rewritten = 0;

	for i in 0..doc.len() {
		let Some(sys) = doc.system_line(i).filter(|s| s.shape() == SystemLineShape::Merged) else { continue };
		let (Some(id), indent) = (sys.id.map(str::to_string), sys.indent.to_string()) else { continue };
		if seen.insert(id.clone()) {
			continue;
		}

		let fresh = stamper.fresh_id();
		tracing::debug!(line = i, %id, %fresh, "[repair] rewriting duplicate id");
		seen.insert(fresh.as_str().to_string());
		doc.replace_line(i, format_system_line(&indent, &stamper.timestamp(), fresh.as_str()));
		rewritten += 1;
	}

	if rewritten == 0 {
		return Cow::Borrowed(text);
	}
	tracing::info!(rewritten, "[repair] duplicate ids rewritten");
	Cow::Owned(doc.to_text())
}
