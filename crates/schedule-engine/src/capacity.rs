//! Capacity classification.

use schedule_core::error::AppError;
use schedule_core::result::AppResult;
use schedule_entity::{CapacityTier, Session};

/// Lower bounds of each tier, in percent of capacity. Each bound is
/// inclusive.
const FULL_PERCENT: u64 = 90;
const HIGH_PERCENT: u64 = 70;
const MEDIUM_PERCENT: u64 = 40;

/// Derives a load tier from participant counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityClassifier;

impl CapacityClassifier {
    /// Classify `current` bookings against a capacity of `max`.
    ///
    /// Ratios are compared in integer percent so that tier boundaries are
    /// exact. A capacity of zero fails with `InvalidCapacity`. Bookings
    /// above capacity classify as `Full`.
    pub fn classify(current: u32, max: u32) -> AppResult<CapacityTier> {
        if max == 0 {
            return Err(AppError::invalid_capacity(format!(
                "Cannot classify {current} participants against a capacity of 0"
            )));
        }

        let scaled = u64::from(current) * 100;
        let max = u64::from(max);

        let tier = if scaled >= FULL_PERCENT * max {
            CapacityTier::Full
        } else if scaled >= HIGH_PERCENT * max {
            CapacityTier::High
        } else if scaled >= MEDIUM_PERCENT * max {
            CapacityTier::Medium
        } else {
            CapacityTier::Low
        };
        Ok(tier)
    }

    /// Classify a session by its own participant counts.
    pub fn classify_session(session: &Session) -> AppResult<CapacityTier> {
        Self::classify(session.current_participants, session.max_participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedule_core::error::ErrorKind;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(CapacityClassifier::classify(36, 100).unwrap(), CapacityTier::Low);
        assert_eq!(CapacityClassifier::classify(39, 100).unwrap(), CapacityTier::Low);
        assert_eq!(CapacityClassifier::classify(40, 100).unwrap(), CapacityTier::Medium);
        assert_eq!(CapacityClassifier::classify(69, 100).unwrap(), CapacityTier::Medium);
        assert_eq!(CapacityClassifier::classify(70, 100).unwrap(), CapacityTier::High);
        assert_eq!(CapacityClassifier::classify(89, 100).unwrap(), CapacityTier::High);
        assert_eq!(CapacityClassifier::classify(90, 100).unwrap(), CapacityTier::Full);
        assert_eq!(CapacityClassifier::classify(100, 100).unwrap(), CapacityTier::Full);
    }

    #[test]
    fn test_small_capacities() {
        // 12/15 = 80%
        assert_eq!(CapacityClassifier::classify(12, 15).unwrap(), CapacityTier::High);
        // 7/10 sits exactly on the High boundary
        assert_eq!(CapacityClassifier::classify(7, 10).unwrap(), CapacityTier::High);
        // 18/20 sits exactly on the Full boundary
        assert_eq!(CapacityClassifier::classify(18, 20).unwrap(), CapacityTier::Full);
        assert_eq!(CapacityClassifier::classify(0, 8).unwrap(), CapacityTier::Low);
    }

    #[test]
    fn test_over_capacity_is_full() {
        assert_eq!(CapacityClassifier::classify(11, 10).unwrap(), CapacityTier::Full);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = CapacityClassifier::classify(5, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCapacity);
        let err = CapacityClassifier::classify(0, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCapacity);
    }
}
