//! Query scopes and occupancy filters

use serde::{Deserialize, Serialize};

use super::person::PersonCategory;

/// Narrows a query to a company and/or a sector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub sector_id: Option<String>,
}

impl Scope {
    /// Every sector of every company
    pub fn all() -> Self {
        Self::default()
    }

    pub fn company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: Some(company_id.into()),
            sector_id: None,
        }
    }

    pub fn sector(sector_id: impl Into<String>) -> Self {
        Self {
            company_id: None,
            sector_id: Some(sector_id.into()),
        }
    }
}

/// Parameters for "who is inside now"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyQuery {
    #[serde(flatten)]
    pub scope: Scope,
    #[serde(default)]
    pub category: Option<PersonCategory>,
    /// Case-insensitive prefix of the person's rut or id
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl OccupancyQuery {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: PersonCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_rut_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rut = Some(prefix.into());
        self
    }
}

/// Which registers a depart may be matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchScope {
    /// Most recent open entry of the person, in any sector
    #[default]
    Person,
    /// Most recent open entry of the person in the depart's sector
    Sector,
}

impl std::str::FromStr for MatchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "person" => Ok(MatchScope::Person),
            "sector" => Ok(MatchScope::Sector),
            other => Err(format!("unknown match scope '{}' (expected person|sector)", other)),
        }
    }
}
