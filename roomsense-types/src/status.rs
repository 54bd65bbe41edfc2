//! Classification status labels.

/// Status of a banded measurement (temperature, humidity).
///
/// Three tiers, symmetric around a configured comfort band: inside the band
/// is `Normal`, moderately outside is `Warning`, far outside is `Alert`.
/// The ordering reflects severity, so `max()` over statuses yields the
/// worst one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ComfortStatus {
    Normal,
    Warning,
    Alert,
}

impl ComfortStatus {
    pub fn is_normal(&self) -> bool {
        matches!(self, ComfortStatus::Normal)
    }

    /// Short label for log output.
    pub fn symbol(&self) -> &'static str {
        match self {
            ComfortStatus::Normal => "OK",
            ComfortStatus::Warning => "WARN",
            ComfortStatus::Alert => "ALERT",
        }
    }
}

/// Status of an air-quality measurement (lower is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AirStatus {
    Normal,
    Poor,
    Alert,
}

impl AirStatus {
    pub fn is_normal(&self) -> bool {
        matches!(self, AirStatus::Normal)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            AirStatus::Normal => "OK",
            AirStatus::Poor => "POOR",
            AirStatus::Alert => "ALERT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(ComfortStatus::Normal < ComfortStatus::Warning);
        assert!(ComfortStatus::Warning < ComfortStatus::Alert);
        assert!(AirStatus::Normal < AirStatus::Poor);
        assert!(AirStatus::Poor < AirStatus::Alert);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn wire_names_are_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ComfortStatus::Warning).unwrap(),
            "\"WARNING\""
        );
        assert_eq!(serde_json::to_string(&AirStatus::Poor).unwrap(), "\"POOR\"");
        let parsed: ComfortStatus = serde_json::from_str("\"ALERT\"").unwrap();
        assert_eq!(parsed, ComfortStatus::Alert);
    }
}
