//! In-memory directory, optionally seeded from a JSON file

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{AppResult, Company, Person, Sector};

use super::{DirectoryError, PersonDirectory, SectorCatalog};

/// Shape of the seed file: `{"companies": [...], "sectors": [...], "persons": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub persons: Vec<Person>,
}

#[derive(Default)]
struct DirectoryState {
    companies: HashMap<String, Company>,
    sectors: HashMap<String, Sector>,
    persons: HashMap<String, Person>,
}

/// Directory held entirely in memory
#[derive(Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: DirectorySeed) -> Self {
        let directory = Self::new();
        {
            let mut state = directory.state.write();
            for company in seed.companies {
                state.companies.insert(company.id.clone(), company);
            }
            for sector in seed.sectors {
                state.sectors.insert(sector.id.clone(), sector);
            }
            for person in seed.persons {
                state.persons.insert(person.id.clone(), person);
            }
        }
        directory
    }

    /// Load a seed file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let seed: DirectorySeed = serde_json::from_str(&content)?;
        info!(
            path = %path.as_ref().display(),
            companies = seed.companies.len(),
            sectors = seed.sectors.len(),
            persons = seed.persons.len(),
            "loaded directory seed"
        );
        Ok(Self::from_seed(seed))
    }

    /// Insert or replace a person
    pub fn upsert_person(&self, person: Person) {
        self.state.write().persons.insert(person.id.clone(), person);
    }

    pub fn remove_person(&self, person_id: &str) -> Option<Person> {
        self.state.write().persons.remove(person_id)
    }

    pub fn company(&self, company_id: &str) -> Option<Company> {
        self.state.read().companies.get(company_id).cloned()
    }
}

#[async_trait]
impl PersonDirectory for InMemoryDirectory {
    async fn lookup(&self, person_id: &str) -> Result<Person, DirectoryError> {
        self.state
            .read()
            .persons
            .get(person_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(person_id.to_string()))
    }
}

#[async_trait]
impl SectorCatalog for InMemoryDirectory {
    async fn sector(&self, sector_id: &str) -> Result<Option<Sector>, DirectoryError> {
        Ok(self.state.read().sectors.get(sector_id).cloned())
    }

    async fn sectors_of_company(&self, company_id: &str) -> Result<Vec<String>, DirectoryError> {
        let state = self.state.read();
        let mut ids: Vec<String> = state
            .sectors
            .values()
            .filter(|s| s.company_id.as_deref() == Some(company_id))
            .map(|s| s.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
