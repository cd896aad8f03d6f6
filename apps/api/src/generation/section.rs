use std::fmt;

use serde::{Deserialize, Serialize};

/// The five resume sections. Declaration order is the canonical document order,
/// and `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Summary,
    Experience,
    Skills,
    Projects,
    Education,
}

impl SectionType {
    pub const ALL: [SectionType; 5] = [
        SectionType::Summary,
        SectionType::Experience,
        SectionType::Skills,
        SectionType::Projects,
        SectionType::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Summary => "summary",
            SectionType::Experience => "experience",
            SectionType::Skills => "skills",
            SectionType::Projects => "projects",
            SectionType::Education => "education",
        }
    }

    /// Heading rendered by every export format.
    pub fn heading(&self) -> &'static str {
        match self {
            SectionType::Summary => "Professional Summary",
            SectionType::Experience => "Work Experience",
            SectionType::Skills => "Technical Skills",
            SectionType::Projects => "Key Projects",
            SectionType::Education => "Education",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
