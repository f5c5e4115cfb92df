//! Block identifiers and timestamps.
//!
//! Ids are sampled at random from a short alphabet until one is found that the document
//! does not already reference. Sampling is bounded; on exhaustion the caller widens to a
//! larger alphabet and longer ids, which always terminates in practice.

use std::collections::HashSet;

use derive_more::{Display, From};
use jiff::{Zoned, civil::DateTime};
use rand::{RngCore, SeedableRng, rngs::StdRng};

use super::classify::block_refs;
use crate::{config::IdSettings, error::IdExhausted};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const WIDE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Extra characters the wide scheme adds on top of the configured length.
const WIDE_EXTRA_LEN: usize = 4;

/// A block identifier, without the leading `^`.
#[derive(Clone, Debug, Display, Eq, From, Hash, PartialEq, PartialOrd, Ord)]
pub struct BlockId(String);

impl BlockId {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}

/// Source of the local wall-clock time written into system lines.
pub trait Clock {
	fn now(&self) -> DateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
	fn now(&self) -> DateTime {
		Zoned::now().datetime()
	}
}

/// Always returns the same instant. Used in tests and for reproducible rewrites.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime);

impl Clock for FixedClock {
	fn now(&self) -> DateTime {
		self.0
	}
}

pub fn format_timestamp(dt: DateTime) -> String {
	dt.strftime("%Y-%m-%dT%H:%M:%S").to_string()
}

pub struct IdGenerator {
	rng: Box<dyn RngCore + Send>,
	prefix: String,
	length: usize,
	max_attempts: usize,
}

impl IdGenerator {
	pub fn new(settings: &IdSettings) -> Self {
		Self::with_rng(settings, StdRng::from_os_rng())
	}

	/// Deterministic generator.
	pub fn seeded(settings: &IdSettings, seed: u64) -> Self {
		Self::with_rng(settings, StdRng::seed_from_u64(seed))
	}

	pub fn with_rng(settings: &IdSettings, rng: impl RngCore + Send + 'static) -> Self {
		Self {
			rng: Box::new(rng),
			prefix: settings.prefix.clone(),
			length: settings.length.max(1),
			max_attempts: settings.max_attempts,
		}
	}

	fn draw(&mut self, alphabet: &[u8], length: usize) -> String {
		let mut id = self.prefix.clone();
		for _ in 0..length {
			let idx = (self.rng.next_u32() as usize) % alphabet.len();
			id.push(alphabet[idx] as char);
		}
		id
	}

	/// Bounded sampling from the narrow alphabet.
	pub fn sample(&mut self, taken: impl Fn(&str) -> bool) -> Result<BlockId, IdExhausted> {
		for _ in 0..self.max_attempts {
			let candidate = self.draw(ALPHABET, self.length);
			if !taken(&candidate) {
				return Ok(BlockId(candidate));
			}
		}
		Err(IdExhausted { attempts: self.max_attempts })
	}

	/// Unbounded sampling from the wide alphabet with longer ids.
	pub fn sample_wide(&mut self, taken: impl Fn(&str) -> bool) -> BlockId {
		let length = self.length + WIDE_EXTRA_LEN;
		loop {
			let candidate = self.draw(WIDE_ALPHABET, length);
			if !taken(&candidate) {
				return BlockId(candidate);
			}
		}
	}

	pub fn generate(&mut self, taken: impl Fn(&str) -> bool) -> BlockId {
		match self.sample(&taken) {
			Ok(id) => id,
			Err(e) => {
				tracing::warn!(attempts = e.attempts, "[ids] narrow alphabet exhausted, widening");
				self.sample_wide(&taken)
			}
		}
	}
}

/// Mints timestamps and document-unique ids for one pass over a document.
///
/// Starts out knowing every `^id` referenced in the document and remembers everything
/// it hands out, so ids stay unique across all edits of the pass.
pub struct Stamper<'a> {
	ids: &'a mut IdGenerator,
	clock: &'a dyn Clock,
	taken: HashSet<String>,
}

impl<'a> Stamper<'a> {
	pub fn new(ids: &'a mut IdGenerator, clock: &'a dyn Clock, text: &str) -> Self {
		Self {
			ids,
			clock,
			taken: block_refs(text),
		}
	}

	pub fn timestamp(&self) -> String {
		format_timestamp(self.clock.now())
	}

	pub fn fresh_id(&mut self) -> BlockId {
		let taken = &self.taken;
		let id = self.ids.generate(|candidate| taken.contains(candidate));
		self.taken.insert(id.as_str().to_string());
		id
	}

	/// Mark ids from another text as unavailable.
	pub fn reserve_refs(&mut self, text: &str) {
		self.taken.extend(block_refs(text));
	}

	pub fn is_taken(&self, id: &str) -> bool {
		self.taken.contains(id)
	}
}
