//! Binary update codec
//!
//! Pure transforms between the wire format and structured edit sets. The
//! codec never touches a document. Decoding must survive arbitrary byte
//! streams: every length field is checked against the remaining buffer
//! before use, varints are capped at 10 bytes, and collection sizes are
//! grown by push rather than preallocated from untrusted counts.

use std::collections::BTreeMap;

use crate::error::UpdateError;

/// Identity of a single inserted character: the inserting client and that
/// client's logical clock at insertion time. Clocks are contiguous per
/// client, so a run of n characters occupies n consecutive clock values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId {
	pub client: u64,
	pub clock: u64,
}

impl ItemId {
	pub fn new(client: u64, clock: u64) -> Self {
		Self { client, clock }
	}
}

/// One inserted run on the wire: its head identity, its left anchor
/// (`None` anchors at document start), and the inserted characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireItem {
	pub id: ItemId,
	pub origin: Option<ItemId>,
	pub content: String,
}

/// A contiguous range of one client's clocks whose characters are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRange {
	pub client: u64,
	pub clock: u64,
	pub len: u64,
}

/// A decoded update: inserted runs plus deleted ranges. Immutable once
/// decoded; applying it twice is a no-op at the document level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
	pub items: Vec<WireItem>,
	pub deletes: Vec<DeleteRange>,
}

impl Update {
	pub fn is_empty(&self) -> bool {
		self.items.is_empty() && self.deletes.is_empty()
	}
}

/// Per-client clock summary: maps client id to the next clock value not yet
/// seen from that client. Monotonically non-decreasing per client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateVector(BTreeMap<u64, u64>);

impl StateVector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Next unseen clock for a client (0 for unknown clients).
	pub fn get(&self, client: u64) -> u64 {
		self.0.get(&client).copied().unwrap_or(0)
	}

	/// Raise a client's clock. Lower values are ignored, keeping the vector
	/// monotonic even on duplicate deliveries.
	pub fn observe(&mut self, client: u64, next_clock: u64) {
		let entry = self.0.entry(client).or_insert(0);
		if next_clock > *entry {
			*entry = next_clock;
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
		self.0.iter().map(|(c, k)| (*c, *k))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

const ORIGIN_NONE: u8 = 0;
const ORIGIN_SOME: u8 = 1;

/// Encode an update into its self-describing binary form.
pub fn encode_update(update: &Update) -> Vec<u8> {
	let mut enc = Encoder::new();
	enc.write_varint(update.items.len() as u64);
	for item in &update.items {
		enc.write_varint(item.id.client);
		enc.write_varint(item.id.clock);
		match item.origin {
			None => enc.write_u8(ORIGIN_NONE),
			Some(origin) => {
				enc.write_u8(ORIGIN_SOME);
				enc.write_varint(origin.client);
				enc.write_varint(origin.clock);
			}
		}
		enc.write_string(&item.content);
	}
	enc.write_varint(update.deletes.len() as u64);
	for del in &update.deletes {
		enc.write_varint(del.client);
		enc.write_varint(del.clock);
		enc.write_varint(del.len);
	}
	enc.finish()
}

/// Decode a binary update, rejecting truncated or structurally invalid
/// input without panicking or looping unboundedly.
pub fn decode_update(buf: &[u8]) -> Result<Update, UpdateError> {
	let mut dec = Decoder::new(buf);
	let item_count = dec.read_varint()?;
	let mut items = Vec::new();
	for _ in 0..item_count {
		// Each item consumes at least 4 bytes; a huge count on a short
		// buffer fails on the first truncated read instead of allocating.
		let client = dec.read_varint()?;
		let clock = dec.read_varint()?;
		let origin = match dec.read_u8()? {
			ORIGIN_NONE => None,
			ORIGIN_SOME => Some(ItemId::new(dec.read_varint()?, dec.read_varint()?)),
			_ => return Err(UpdateError::Malformed("invalid origin tag")),
		};
		let content = dec.read_string()?;
		if content.is_empty() {
			return Err(UpdateError::Malformed("empty item content"));
		}
		items.push(WireItem { id: ItemId::new(client, clock), origin, content });
	}
	let delete_count = dec.read_varint()?;
	let mut deletes = Vec::new();
	for _ in 0..delete_count {
		let client = dec.read_varint()?;
		let clock = dec.read_varint()?;
		let len = dec.read_varint()?;
		if len == 0 {
			return Err(UpdateError::Malformed("empty delete range"));
		}
		clock.checked_add(len).ok_or(UpdateError::Malformed("delete range overflow"))?;
		deletes.push(DeleteRange { client, clock, len });
	}
	dec.expect_end()?;
	Ok(Update { items, deletes })
}

/// Encode a state vector.
pub fn encode_state_vector(sv: &StateVector) -> Vec<u8> {
	let mut enc = Encoder::new();
	enc.write_varint(sv.0.len() as u64);
	for (client, clock) in sv.iter() {
		enc.write_varint(client);
		enc.write_varint(clock);
	}
	enc.finish()
}

/// Decode a state vector.
pub fn decode_state_vector(buf: &[u8]) -> Result<StateVector, UpdateError> {
	let mut dec = Decoder::new(buf);
	let count = dec.read_varint()?;
	let mut sv = StateVector::new();
	for _ in 0..count {
		let client = dec.read_varint()?;
		let clock = dec.read_varint()?;
		sv.observe(client, clock);
	}
	dec.expect_end()?;
	Ok(sv)
}

struct Encoder {
	buf: Vec<u8>,
}

impl Encoder {
	fn new() -> Self {
		Self { buf: Vec::new() }
	}

	fn write_u8(&mut self, b: u8) {
		self.buf.push(b);
	}

	fn write_varint(&mut self, mut v: u64) {
		loop {
			let byte = (v & 0x7f) as u8;
			v >>= 7;
			if v == 0 {
				self.buf.push(byte);
				return;
			}
			self.buf.push(byte | 0x80);
		}
	}

	fn write_string(&mut self, s: &str) {
		self.write_varint(s.len() as u64);
		self.buf.extend_from_slice(s.as_bytes());
	}

	fn finish(self) -> Vec<u8> {
		self.buf
	}
}

struct Decoder<'a> {
	buf: &'a [u8],
	pos: usize,
}

impl<'a> Decoder<'a> {
	fn new(buf: &'a [u8]) -> Self {
		Self { buf, pos: 0 }
	}

	fn read_u8(&mut self) -> Result<u8, UpdateError> {
		let b = *self.buf.get(self.pos).ok_or(UpdateError::Malformed("truncated input"))?;
		self.pos += 1;
		Ok(b)
	}

	fn read_varint(&mut self) -> Result<u64, UpdateError> {
		let mut value: u64 = 0;
		let mut shift: u32 = 0;
		// 10 bytes covers the full u64 range; anything longer is invalid.
		for _ in 0..10 {
			let byte = self.read_u8()?;
			let low = u64::from(byte & 0x7f);
			value |= low
				.checked_shl(shift)
				.filter(|_| shift < 64 && (shift != 63 || low <= 1))
				.ok_or(UpdateError::Malformed("varint overflow"))?;
			if byte & 0x80 == 0 {
				return Ok(value);
			}
			shift += 7;
		}
		Err(UpdateError::Malformed("varint too long"))
	}

	fn read_string(&mut self) -> Result<String, UpdateError> {
		let len = self.read_varint()? as usize;
		let end = self
			.pos
			.checked_add(len)
			.filter(|end| *end <= self.buf.len())
			.ok_or(UpdateError::Malformed("string length exceeds input"))?;
		let s = std::str::from_utf8(&self.buf[self.pos..end])
			.map_err(|_| UpdateError::Malformed("invalid utf-8"))?;
		self.pos = end;
		Ok(s.to_string())
	}

	fn expect_end(&self) -> Result<(), UpdateError> {
		if self.pos == self.buf.len() { Ok(()) } else { Err(UpdateError::Malformed("trailing bytes")) }
	}
}


// vim: ts=4
