use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: &'static str,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(CellType {
    Rbc => "RBC",
    Cast => "Cast",
    Urothelial => "Urothelial",
});

/// Clinical severity of a single finding.
///
/// Any string the detection service sends that is not one of the known
/// levels lands in `Unknown` instead of failing the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Elevated,
    Critical,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_abnormal(&self) -> bool {
        matches!(self, Self::Elevated | Self::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn cell_type_round_trips_wire_names() {
        for cell in [CellType::Rbc, CellType::Cast, CellType::Urothelial] {
            assert_eq!(CellType::from_str(cell.as_str()).unwrap(), cell);
        }
        assert_eq!(serde_json::to_string(&CellType::Rbc).unwrap(), "\"RBC\"");
    }

    #[test]
    fn cell_type_rejects_unknown() {
        let err = CellType::from_str("WBC").unwrap_err();
        assert_eq!(err.field, "CellType");
        assert_eq!(err.value, "WBC");
    }

    #[test]
    fn severity_unknown_strings_deserialize_to_unknown() {
        let sev: Severity = serde_json::from_str("\"borderline\"").unwrap();
        assert_eq!(sev, Severity::Unknown);
        let sev: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(sev, Severity::Critical);
    }

    #[test]
    fn only_elevated_and_critical_are_abnormal() {
        assert!(Severity::Elevated.is_abnormal());
        assert!(Severity::Critical.is_abnormal());
        assert!(!Severity::Normal.is_abnormal());
        assert!(!Severity::Unknown.is_abnormal());
    }
}
