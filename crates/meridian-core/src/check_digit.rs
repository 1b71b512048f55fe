//! # Check Digit (modulo 11)
//!
//! Check digit used on invoice access keys.
//!
//! ```text
//!   digits:   1    2    3
//!   weights:  4    3    2      ◄── right to left, 2 → 9 then back to 2
//!   sum:      4 +  6 +  6 = 16
//!   16 mod 11 = 5  →  11 - 5 = 6
//!
//!   remainder 0 or 1  →  digit 0
//! ```
//!
//! Empty input or any non-digit character yields `0` instead of an error.
//! Callers that need to reject malformed keys must validate them first.

const FIRST_WEIGHT: u32 = 2;
const LAST_WEIGHT: u32 = 9;

/// Computes the modulo 11 check digit of a digit string.
///
/// ## Example
/// ```rust
/// use meridian_core::check_digit::compute_check_digit;
///
/// assert_eq!(compute_check_digit("123"), 6);
/// assert_eq!(compute_check_digit(""), 0);
/// assert_eq!(compute_check_digit("12a"), 0);
/// ```
pub fn compute_check_digit(digits: &str) -> u32 {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }

    let mut weight = FIRST_WEIGHT;
    let mut sum = 0u64;

    for b in digits.bytes().rev() {
        sum += u64::from(b - b'0') * u64::from(weight);
        weight = if weight == LAST_WEIGHT {
            FIRST_WEIGHT
        } else {
            weight + 1
        };
    }

    match (sum % 11) as u32 {
        0 | 1 => 0,
        remainder => 11 - remainder,
    }
}

/// Returns `digits` followed by its check digit.
///
/// ```rust
/// use meridian_core::check_digit::append_check_digit;
///
/// assert_eq!(append_check_digit("123"), "1236");
/// ```
pub fn append_check_digit(digits: &str) -> String {
    format!("{}{}", digits, compute_check_digit(digits))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_inputs() {
        assert_eq!(compute_check_digit("123"), 6);
        assert_eq!(compute_check_digit("261"), 5);
        assert_eq!(compute_check_digit("19"), 1);
        assert_eq!(compute_check_digit("9"), 4);
    }

    #[test]
    fn test_remainder_zero_or_one_gives_zero() {
        // 0 * 2 = 0 → remainder 0
        assert_eq!(compute_check_digit("0"), 0);
        // 6 * 2 = 12 → remainder 1
        assert_eq!(compute_check_digit("6"), 0);
    }

    #[test]
    fn test_weight_wraps_after_nine() {
        // 43 digits, weights cycle through 2..=9 several times
        assert_eq!(
            compute_check_digit("5206043300991100250655012000000780026730161"),
            5
        );
        assert_eq!(
            compute_check_digit("35190812345678000190550010000000011000000011"),
            5
        );
    }

    #[test]
    fn test_malformed_input_degrades_to_zero() {
        assert_eq!(compute_check_digit(""), 0);
        assert_eq!(compute_check_digit("12 3"), 0);
        assert_eq!(compute_check_digit("abc"), 0);
        assert_eq!(compute_check_digit("-123"), 0);
        assert_eq!(compute_check_digit("１２３"), 0);
    }

    #[test]
    fn test_append_check_digit() {
        let key = append_check_digit("5206043300991100250655012000000780026730161");
        assert_eq!(key.len(), 44);
        assert!(key.ends_with('5'));
        assert_eq!(append_check_digit(""), "0");
    }
}
