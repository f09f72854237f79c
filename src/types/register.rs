//! Register records - the entry/depart events of the access log
//!
//! A `Register` is created exactly once. After creation only `resolved` and
//! `counterpart_id` change (through the store's conditional resolve), plus the
//! person snapshot during an explicit directory sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::person::{Person, PersonCategory};

/// Store-assigned register identifier
pub type RegisterId = u64;

/// Direction of a sector crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    /// Person crossed into the sector
    Entry,
    /// Person left the sector
    Depart,
}

impl std::fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterKind::Entry => write!(f, "entry"),
            RegisterKind::Depart => write!(f, "depart"),
        }
    }
}

/// Denormalized copy of the directory data taken at submission time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSnapshot {
    pub category: PersonCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
}

impl From<&Person> for PersonSnapshot {
    fn from(person: &Person) -> Self {
        Self {
            category: person.category,
            name: Some(person.name.clone()).filter(|n| !n.is_empty()),
            rut: Some(person.rut.clone()).filter(|r| !r.is_empty()),
        }
    }
}

/// A stored entry or depart event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    pub id: RegisterId,
    pub person_id: Option<String>,
    pub person_category: Option<PersonCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_rut: Option<String>,
    pub sector_id: String,
    pub kind: RegisterKind,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub counterpart_id: Option<RegisterId>,
    #[serde(default)]
    pub unauthorized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unauthorized_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Register {
    /// Build an unresolved register for a known person.
    ///
    /// The id is a placeholder until the store assigns one on insert.
    pub fn for_person(
        kind: RegisterKind,
        person_id: String,
        snapshot: PersonSnapshot,
        sector_id: String,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            person_id: Some(person_id),
            person_category: Some(snapshot.category),
            person_name: snapshot.name,
            person_rut: snapshot.rut,
            sector_id,
            kind,
            occurred_at,
            resolved: false,
            counterpart_id: None,
            unauthorized: false,
            unauthorized_identifier: None,
            comment: None,
        }
    }

    /// Build a register for an identifier the directory does not know
    pub fn unauthorized(
        kind: RegisterKind,
        identifier: String,
        sector_id: String,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            person_id: None,
            person_category: None,
            person_name: None,
            person_rut: None,
            sector_id,
            kind,
            occurred_at,
            resolved: false,
            counterpart_id: None,
            unauthorized: true,
            unauthorized_identifier: Some(identifier),
            comment: None,
        }
    }

    /// Attach a free-text comment
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn is_entry(&self) -> bool {
        self.kind == RegisterKind::Entry
    }

    pub fn is_depart(&self) -> bool {
        self.kind == RegisterKind::Depart
    }

    /// Current person snapshot, if the register is linked to a person
    pub fn snapshot(&self) -> Option<PersonSnapshot> {
        self.person_category.map(|category| PersonSnapshot {
            category,
            name: self.person_name.clone(),
            rut: self.person_rut.clone(),
        })
    }

    /// Overwrite the denormalized person fields (directory sync only)
    pub(crate) fn apply_snapshot(&mut self, snapshot: PersonSnapshot) {
        self.person_category = Some(snapshot.category);
        self.person_name = snapshot.name;
        self.person_rut = snapshot.rut;
    }

    /// Case-insensitive prefix match against the rut snapshot or person id
    pub fn identifier_starts_with(&self, prefix: &str) -> bool {
        let prefix = prefix.to_lowercase();
        let matches = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| v.to_lowercase().starts_with(&prefix))
                .unwrap_or(false)
        };
        matches(&self.person_rut) || matches(&self.person_id)
    }
}

/// A submission as received from the caller, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegister {
    #[serde(default)]
    pub kind: Option<RegisterKind>,
    #[serde(default)]
    pub person_id: Option<String>,
    pub sector_id: String,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub counterpart_id: Option<RegisterId>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewRegister {
    pub fn entry(person_id: impl Into<String>, sector_id: impl Into<String>) -> Self {
        Self {
            kind: Some(RegisterKind::Entry),
            person_id: Some(person_id.into()),
            sector_id: sector_id.into(),
            ..Default::default()
        }
    }

    pub fn depart(person_id: impl Into<String>, sector_id: impl Into<String>) -> Self {
        Self {
            kind: Some(RegisterKind::Depart),
            person_id: Some(person_id.into()),
            sector_id: sector_id.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn counterpart(mut self, id: RegisterId) -> Self {
        self.counterpart_id = Some(id);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}
