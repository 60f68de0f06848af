use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Remaining-validity classification of a certificate.
///
/// Always derived from days-to-expiry and the configured threshold via
/// [`CertStatus::classify`]; never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertStatus {
    /// More than `threshold` days left
    Valid,
    /// Between 0 and `threshold` days left, inclusive
    ExpiringSoon,
    /// Past `not_after`
    Expired,
}

impl CertStatus {
    /// All statuses, in severity order.
    pub const ALL: [Self; 3] = [Self::Valid, Self::ExpiringSoon, Self::Expired];

    /// Classify a certificate from its days-to-expiry.
    ///
    /// `days < 0` is expired, `0..=threshold` is expiring soon, anything
    /// larger is valid.
    #[must_use]
    pub fn classify(days_to_expiry: i64, threshold_days: u32) -> Self {
        if days_to_expiry < 0 {
            Self::Expired
        } else if days_to_expiry <= i64::from(threshold_days) {
            Self::ExpiringSoon
        } else {
            Self::Valid
        }
    }

    /// Stable label used in storage and exports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CertStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "expiring_soon" => Ok(Self::ExpiringSoon),
            "expired" => Ok(Self::Expired),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(CertStatus::classify(30, 30), CertStatus::ExpiringSoon);
        assert_eq!(CertStatus::classify(31, 30), CertStatus::Valid);
        assert_eq!(CertStatus::classify(-1, 30), CertStatus::Expired);
        assert_eq!(CertStatus::classify(0, 30), CertStatus::ExpiringSoon);
    }

    #[test]
    fn test_zero_threshold() {
        assert_eq!(CertStatus::classify(0, 0), CertStatus::ExpiringSoon);
        assert_eq!(CertStatus::classify(1, 0), CertStatus::Valid);
    }

    #[test]
    fn test_label_roundtrip() {
        for status in CertStatus::ALL {
            assert_eq!(status.as_str().parse::<CertStatus>().unwrap(), status);
        }
        assert!("revoked".parse::<CertStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&CertStatus::ExpiringSoon).unwrap();
        assert_eq!(json, "\"expiring_soon\"");
    }
}
