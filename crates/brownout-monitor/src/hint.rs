//! Platform-reported connection metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::quality::QualityClassification;

/// Effective connection type as reported by the platform.
///
/// Types outside the well-known cellular set are kept as `Other` and count
/// as good unless listed among the configured slow types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EffectiveType {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    /// Any other non-empty type, lower-cased (e.g. `5g`, `wifi`).
    Other(String),
}

impl EffectiveType {
    /// Parse a reported type; only an empty value yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "slow-2g" => Some(Self::Slow2g),
            "2g" => Some(Self::TwoG),
            "3g" => Some(Self::ThreeG),
            "4g" => Some(Self::FourG),
            other => Some(Self::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Slow2g => "slow-2g",
            Self::TwoG => "2g",
            Self::ThreeG => "3g",
            Self::FourG => "4g",
            Self::Other(name) => name,
        }
    }
}

impl TryFrom<String> for EffectiveType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "empty effective type".to_string())
    }
}

impl From<EffectiveType> for String {
    fn from(value: EffectiveType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for EffectiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection metadata the platform may expose alongside online/offline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_type: Option<EffectiveType>,
    #[serde(default)]
    pub save_data: bool,
    /// Estimated downlink in Mbit/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downlink: Option<f64>,
    /// Estimated round-trip time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtt: Option<u64>,
}

impl ConnectionHint {
    /// Hint carrying only an effective type.
    pub fn from_effective_type(value: &str) -> Option<Self> {
        EffectiveType::parse(value).map(|effective_type| Self {
            effective_type: Some(effective_type),
            ..Default::default()
        })
    }

    /// Read a hint from a JSON object with `effectiveType`, `saveData`,
    /// `downlink` and `rtt` members.
    ///
    /// Returns `None` when the value is malformed or carries nothing that
    /// could classify the connection; the caller then relies on probing.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let effective_type = match object.get("effectiveType") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(EffectiveType::parse(s)?),
            Some(_) => return None,
        };
        let save_data = match object.get("saveData") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return None,
        };
        let downlink = match object.get("downlink") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_f64()?),
        };
        let rtt = match object.get("rtt") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_u64()?),
        };

        if effective_type.is_none() && !save_data {
            return None;
        }

        Some(Self {
            effective_type,
            save_data,
            downlink,
            rtt,
        })
    }

    /// Whether the hint alone marks the connection slow.
    pub fn is_slow(&self, slow_types: &[String]) -> bool {
        if self.save_data {
            return true;
        }
        self.effective_type
            .as_ref()
            .map(|t| slow_types.iter().any(|s| s.eq_ignore_ascii_case(t.as_str())))
            .unwrap_or(false)
    }

    /// Classification implied by the hint.
    pub fn classify(&self, slow_types: &[String]) -> QualityClassification {
        if self.is_slow(slow_types) {
            QualityClassification::Slow
        } else {
            QualityClassification::Good
        }
    }
}
