//! Directory types: persons, sectors and companies

use serde::{Deserialize, Serialize};

/// Category of a person, snapshotted onto every register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersonCategory {
    #[default]
    Staff,
    Contractor,
    Visitor,
    Supplier,
}

impl std::fmt::Display for PersonCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersonCategory::Staff => write!(f, "staff"),
            PersonCategory::Contractor => write!(f, "contractor"),
            PersonCategory::Visitor => write!(f, "visitor"),
            PersonCategory::Supplier => write!(f, "supplier"),
        }
    }
}

impl std::str::FromStr for PersonCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(PersonCategory::Staff),
            "contractor" => Ok(PersonCategory::Contractor),
            "visitor" | "visit" => Ok(PersonCategory::Visitor),
            "supplier" => Ok(PersonCategory::Supplier),
            other => Err(format!("unknown person category '{}'", other)),
        }
    }
}

/// A person known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub rut: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default, rename = "type")]
    pub category: PersonCategory,
    #[serde(default)]
    pub card: Option<u64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Person {
    pub fn new(id: impl Into<String>, category: PersonCategory) -> Self {
        Self {
            id: id.into(),
            rut: String::new(),
            name: String::new(),
            company_id: None,
            category,
            card: None,
            active: true,
        }
    }

    pub fn with_rut(mut self, rut: impl Into<String>) -> Self {
        self.rut = rut.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }
}

/// A physical sector of a facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
}

impl Sector {
    pub fn new(id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: None,
            company_id: Some(company_id.into()),
        }
    }
}

/// A company owning sectors and employing persons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
