//! Shared configuration and display types for Vigil.
//!
//! Everything here is plain data: serde-friendly enums that travel between
//! the config file, the engine and whatever front end renders the state.

pub mod formatting;

use serde::{Deserialize, Serialize};

/// Direction for acceptance-time ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// How the mission list is ordered for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionSort {
    /// `progress / target` descending, ties broken by oldest acceptance first.
    #[default]
    ProgressRatio,
    /// Acceptance time only.
    Accepted(SortDirection),
}

impl MissionSort {
    /// Parse the short names used on the command line.
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name {
            "progress" | "progress-ratio" => Some(Self::ProgressRatio),
            "accepted" | "accepted-asc" => Some(Self::Accepted(SortDirection::Ascending)),
            "accepted-desc" => Some(Self::Accepted(SortDirection::Descending)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Wrapper {
        mission_sort: MissionSort,
    }

    #[test]
    fn test_parse_unit_sort_from_toml() {
        let parsed: Wrapper = toml::from_str(r#"mission_sort = "progress_ratio""#).unwrap();
        assert_eq!(parsed.mission_sort, MissionSort::ProgressRatio);
    }

    #[test]
    fn test_parse_directional_sort_from_toml() {
        let toml = r#"
[mission_sort]
accepted = "descending"
"#;
        let parsed: Wrapper = toml::from_str(toml).unwrap();
        assert_eq!(
            parsed.mission_sort,
            MissionSort::Accepted(SortDirection::Descending)
        );
    }

    #[test]
    fn test_cli_names() {
        assert_eq!(
            MissionSort::from_cli_name("progress"),
            Some(MissionSort::ProgressRatio)
        );
        assert_eq!(
            MissionSort::from_cli_name("accepted-desc"),
            Some(MissionSort::Accepted(SortDirection::Descending))
        );
        assert_eq!(MissionSort::from_cli_name("bogus"), None);
    }
}
