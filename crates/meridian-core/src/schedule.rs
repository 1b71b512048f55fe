//! # Payment Schedules
//!
//! A payment type carries a schedule definition such as `"00/30/60"`: one
//! token per installment, each the number of days until it is due.
//!
//! ```text
//! "00/30/60"
//!   │   │  └── Deferred { days: 60 }
//!   │   └───── Deferred { days: 30 }
//!   └───────── Immediate            (settled at the counter)
//! ```
//!
//! Tokens are separated by `/` or whitespace. The definition is decoded once,
//! when the payment type is loaded, and the structured form is what the
//! settlement engine iterates over.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on a single deferral, roughly ten years.
pub const MAX_DEFERRAL_DAYS: u32 = 3650;

// =============================================================================
// Schedule Entry
// =============================================================================

/// When one installment of a payment schedule is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleEntry {
    /// Paid on the spot (day offset 0).
    Immediate,
    /// Paid `days` days after settlement.
    Deferred { days: u32 },
}

impl ScheduleEntry {
    /// Days between settlement and the due date.
    #[inline]
    pub fn day_offset(&self) -> u32 {
        match self {
            ScheduleEntry::Immediate => 0,
            ScheduleEntry::Deferred { days } => *days,
        }
    }
}

// =============================================================================
// Payment Schedule
// =============================================================================

/// Ordered, non-empty list of installment due offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    entries: Vec<ScheduleEntry>,
}

impl PaymentSchedule {
    /// Decodes a schedule definition.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::schedule::{PaymentSchedule, ScheduleEntry};
    ///
    /// let schedule = PaymentSchedule::parse("00/30/60").unwrap();
    /// assert_eq!(schedule.len(), 3);
    /// assert_eq!(schedule.entries()[0], ScheduleEntry::Immediate);
    /// assert_eq!(schedule.entries()[2], ScheduleEntry::Deferred { days: 60 });
    /// ```
    pub fn parse(definition: &str) -> Result<Self, ValidationError> {
        let entries = definition
            .split(|c: char| c == '/' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(parse_token)
            .collect::<Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            return Err(ValidationError::Required {
                field: "payment schedule".to_string(),
            });
        }

        Ok(PaymentSchedule { entries })
    }

    #[inline]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a parsed schedule.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter()
    }
}

fn parse_token(token: &str) -> Result<ScheduleEntry, ValidationError> {
    let days: u32 = token.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "payment schedule".to_string(),
        reason: format!("'{}' is not a day count", token),
    })?;

    if days > MAX_DEFERRAL_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "payment schedule".to_string(),
            min: 0,
            max: MAX_DEFERRAL_DAYS as i64,
        });
    }

    Ok(if days == 0 {
        ScheduleEntry::Immediate
    } else {
        ScheduleEntry::Deferred { days }
    })
}

impl FromStr for PaymentSchedule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentSchedule::parse(s)
    }
}

/// Renders back to the canonical `"00/30/60"` form.
impl fmt::Display for PaymentSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{:02}", entry.day_offset())?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slash_separated() {
        let schedule = PaymentSchedule::parse("00/30/60").unwrap();
        assert_eq!(
            schedule.entries(),
            &[
                ScheduleEntry::Immediate,
                ScheduleEntry::Deferred { days: 30 },
                ScheduleEntry::Deferred { days: 60 },
            ]
        );
    }

    #[test]
    fn test_parse_whitespace_separated() {
        let schedule = PaymentSchedule::parse(" 30  60 ").unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.entries()[0].day_offset(), 30);
    }

    #[test]
    fn test_parse_single_immediate() {
        let schedule = PaymentSchedule::parse("00").unwrap();
        assert_eq!(schedule.entries(), &[ScheduleEntry::Immediate]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PaymentSchedule::parse("").is_err());
        assert!(PaymentSchedule::parse(" / ").is_err());
        assert!(PaymentSchedule::parse("00/abc").is_err());
        assert!(PaymentSchedule::parse("-30").is_err());
        assert!(PaymentSchedule::parse("99999").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let schedule: PaymentSchedule = "0 30/60".parse().unwrap();
        assert_eq!(schedule.to_string(), "00/30/60");
    }
}
