use engine_config::settings::format::BatchLimits;
use std::{fmt, time::Duration};

/// Why a batch is being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainTrigger {
    MaxRecords,
    MaxBytes,
    MaxAge,
    /// Drained regardless of limits: state checkpoint or end of stream.
    Finalize,
}

impl fmt::Display for DrainTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrainTrigger::MaxRecords => "max_records",
            DrainTrigger::MaxBytes => "max_bytes",
            DrainTrigger::MaxAge => "max_age",
            DrainTrigger::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// First limit the open batch has reached, if any. Zero limits are disabled.
pub fn evaluate(
    limits: &BatchLimits,
    records: usize,
    bytes: usize,
    age: Duration,
) -> Option<DrainTrigger> {
    if records == 0 {
        return None;
    }
    if limits.max_records > 0 && records >= limits.max_records {
        return Some(DrainTrigger::MaxRecords);
    }
    if limits.max_bytes > 0 && bytes >= limits.max_bytes {
        return Some(DrainTrigger::MaxBytes);
    }
    if limits.max_age_secs > 0 && age >= Duration::from_secs(limits.max_age_secs) {
        return Some(DrainTrigger::MaxAge);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_limits() {
        let limits = BatchLimits {
            max_records: 3,
            max_bytes: 100,
            max_age_secs: 60,
        };
        let young = Duration::from_secs(1);

        assert_eq!(evaluate(&limits, 2, 10, young), None);
        assert_eq!(evaluate(&limits, 3, 10, young), Some(DrainTrigger::MaxRecords));
        assert_eq!(evaluate(&limits, 1, 100, young), Some(DrainTrigger::MaxBytes));
        assert_eq!(
            evaluate(&limits, 1, 10, Duration::from_secs(60)),
            Some(DrainTrigger::MaxAge)
        );
        assert_eq!(evaluate(&limits, 0, 1_000, Duration::from_secs(600)), None);
    }

    #[test]
    fn test_disabled_limits_never_fire() {
        let limits = BatchLimits::unbounded();
        assert_eq!(
            evaluate(&limits, 1_000_000, usize::MAX, Duration::from_secs(86_400)),
            None
        );
    }
}
