//! Utility functions

use rand::RngExt;

use crate::error::QpResult;

/// Length of generated document names. Externally visible ids are always
/// exactly this long and drawn from [`SAFE`].
pub const ID_LENGTH: usize = 24;
pub const SAFE: [char; 62] = [
	'0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
	'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
	'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
	'V', 'W', 'X', 'Y', 'Z',
];

/// Generate a random URL-safe document id.
pub fn random_id() -> QpResult<String> {
	let mut rng = rand::rng();
	let mut result = String::with_capacity(ID_LENGTH);

	for _ in 0..ID_LENGTH {
		result.push(SAFE[rng.random_range(0..SAFE.len())]);
	}
	Ok(result)
}

/// Whether a string is a well-formed document name (exact id length,
/// URL-safe alphanumeric characters only).
pub fn is_valid_doc_name(name: &str) -> bool {
	name.len() == ID_LENGTH && name.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_random_id_shape() {
		let id = random_id().unwrap();
		assert_eq!(id.len(), ID_LENGTH);
		assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
	}

	#[test]
	fn test_random_ids_differ() {
		assert_ne!(random_id().unwrap(), random_id().unwrap());
	}

	#[test]
	fn test_doc_name_validation() {
		let id = random_id().unwrap();
		assert!(is_valid_doc_name(&id));
		assert!(!is_valid_doc_name("short"));
		assert!(!is_valid_doc_name(&"x".repeat(ID_LENGTH + 1)));
		assert!(!is_valid_doc_name(&format!("{}/../x", &id[..ID_LENGTH - 5])));
	}
}

// vim: ts=4
