use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EsgCategory {
    Environment,
    Social,
    Governance,
}

impl EsgCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EsgCategory::Environment => "Environment",
            EsgCategory::Social => "Social",
            EsgCategory::Governance => "Governance",
        }
    }
}

impl fmt::Display for EsgCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a raw model label onto the ESG taxonomy.
///
/// Case-sensitive substring match, checked Environment → Social → Governance.
/// The first anchor found wins, so a label mentioning several themes always
/// lands in the earliest one. Labels matching no anchor are unclassified.
pub fn map_label(label: &str) -> Option<EsgCategory> {
    if label.contains("Environment") {
        Some(EsgCategory::Environment)
    } else if label.contains("Social") {
        Some(EsgCategory::Social)
    } else if label.contains("Governance") {
        Some(EsgCategory::Governance)
    } else {
        None
    }
}
