//! Content admission guard for document creation
//!
//! Runs exactly once, on externally supplied raw text (upload or
//! paste-to-new), before a document is created from it. Edits arriving later
//! through the CRDT path are not re-checked; collaborators share the
//! creator's trust domain.
//!
//! Every check is a single linear pass. No regex, no backtracking: the guard
//! exists to stop algorithmic-complexity attacks, so it must not be one.

use serde::Serialize;
use std::fmt;

/// Maximum accepted content size in bytes (10 MiB).
pub const MAX_CONTENT_BYTES: usize = 10 * 1024 * 1024;

/// Maximum bracket nesting depth. All three bracket families share one
/// counter, bounding total structural depth in a single pass.
pub const MAX_NESTING_DEPTH: u64 = 100;

/// Longest accepted run of one repeated character.
pub const MAX_REPEATED_CHARS: u64 = 10_000;

/// Machine-parsable rejection: a reason tag plus the measured numeric detail.
///
/// Serializes as `{ "reason": "nesting_too_deep", "detail": 101 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
	/// Content byte length exceeds the limit; detail is the limit.
	ContentTooLarge(usize),
	/// Bracket nesting ran too deep; detail is the measured depth.
	NestingTooDeep(u64),
	/// A single character repeated too many times; detail is the run length.
	RepeatedCharacterRun(u64),
}

impl fmt::Display for RejectionReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RejectionReason::ContentTooLarge(limit) => {
				write!(f, "content exceeds maximum size of {} bytes", limit)
			}
			RejectionReason::NestingTooDeep(depth) => {
				write!(f, "content has {} levels of nesting (max {})", depth, MAX_NESTING_DEPTH)
			}
			RejectionReason::RepeatedCharacterRun(count) => {
				write!(f, "content contains a run of {} repeated characters", count)
			}
		}
	}
}

/// Validate raw text before a document is created from it.
///
/// The three rules are independent; all must pass.
pub fn validate(content: &str) -> Result<(), RejectionReason> {
	if content.len() > MAX_CONTENT_BYTES {
		return Err(RejectionReason::ContentTooLarge(MAX_CONTENT_BYTES));
	}

	let mut nesting: u64 = 0;
	let mut max_nesting: u64 = 0;
	for ch in content.chars() {
		match ch {
			'[' | '(' | '{' => {
				nesting += 1;
				max_nesting = max_nesting.max(nesting);
			}
			']' | ')' | '}' => nesting = nesting.saturating_sub(1),
			_ => {}
		}
	}
	if max_nesting > MAX_NESTING_DEPTH {
		return Err(RejectionReason::NestingTooDeep(max_nesting));
	}

	let mut prev: Option<char> = None;
	let mut run: u64 = 0;
	for ch in content.chars() {
		if prev == Some(ch) {
			run += 1;
			if run > MAX_REPEATED_CHARS {
				return Err(RejectionReason::RepeatedCharacterRun(run));
			}
		} else {
			prev = Some(ch);
			run = 1;
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_accepts_normal_markdown() {
		let content = "# Notes\n\n- item [link](https://example.com)\n- `code`\n";
		assert_eq!(validate(content), Ok(()));
	}

	#[test]
	fn test_accepts_empty() {
		assert_eq!(validate(""), Ok(()));
	}

	#[test]
	fn test_repeated_run_boundaries() {
		assert_eq!(validate(&"a".repeat(9_999)), Ok(()));
		assert_eq!(validate(&"a".repeat(10_000)), Ok(()));
		assert_eq!(
			validate(&"a".repeat(10_001)),
			Err(RejectionReason::RepeatedCharacterRun(10_001))
		);
	}

	#[test]
	fn test_repeated_run_detected_mid_text() {
		let content = format!("prefix {} suffix", "~".repeat(15_000));
		assert_eq!(validate(&content), Err(RejectionReason::RepeatedCharacterRun(10_001)));
	}

	#[test]
	fn test_run_resets_on_different_char() {
		// Alternating characters never build a run.
		let content = "ab".repeat(20_000);
		assert_eq!(validate(&content), Ok(()));
	}

	#[test]
	fn test_nesting_boundaries() {
		let ok = format!("{}x{}", "[".repeat(100), "]".repeat(100));
		assert_eq!(validate(&ok), Ok(()));

		let deep = format!("{}x{}", "[".repeat(101), "]".repeat(101));
		assert_eq!(validate(&deep), Err(RejectionReason::NestingTooDeep(101)));
	}

	#[test]
	fn test_nesting_counter_shared_across_families() {
		// 60 brackets + 60 parens never close: depth 120 on one counter.
		let content = format!("{}{}", "[".repeat(60), "(".repeat(60));
		assert_eq!(validate(&content), Err(RejectionReason::NestingTooDeep(120)));
	}

	#[test]
	fn test_nesting_floor_at_zero() {
		// Unmatched closers never drive the counter negative.
		let content = format!("{}{}", "]".repeat(500), "[".repeat(50));
		assert_eq!(validate(&content), Ok(()));
	}

	#[test]
	fn test_size_boundaries() {
		// Varied filler so the run check stays out of the way.
		let chunk = "abcdefgh";
		let exactly = chunk.repeat(MAX_CONTENT_BYTES / chunk.len());
		assert_eq!(exactly.len(), MAX_CONTENT_BYTES);
		assert_eq!(validate(&exactly), Ok(()));

		let over = format!("{}!", exactly);
		assert_eq!(validate(&over), Err(RejectionReason::ContentTooLarge(MAX_CONTENT_BYTES)));
	}

	#[test]
	fn test_rejection_json_shape() {
		let json = serde_json::to_value(RejectionReason::NestingTooDeep(101)).unwrap();
		assert_eq!(json["reason"], "nesting_too_deep");
		assert_eq!(json["detail"], 101);
	}
}

// vim: ts=4
