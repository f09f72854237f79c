//! Occupancy statistics result types

use serde::{Deserialize, Serialize};

use super::person::PersonCategory;

/// Number of daily buckets in the history
pub const HISTORY_DAYS: usize = 7;

/// Head count per person category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub staff: usize,
    pub contractor: usize,
    pub visitor: usize,
    pub supplier: usize,
}

impl CategoryCounts {
    pub fn increment(&mut self, category: PersonCategory) {
        match category {
            PersonCategory::Staff => self.staff += 1,
            PersonCategory::Contractor => self.contractor += 1,
            PersonCategory::Visitor => self.visitor += 1,
            PersonCategory::Supplier => self.supplier += 1,
        }
    }

    pub fn get(&self, category: PersonCategory) -> usize {
        match category {
            PersonCategory::Staff => self.staff,
            PersonCategory::Contractor => self.contractor,
            PersonCategory::Visitor => self.visitor,
            PersonCategory::Supplier => self.supplier,
        }
    }

    pub fn total(&self) -> usize {
        self.staff + self.contractor + self.visitor + self.supplier
    }
}

/// One day of register traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    /// Inclusive lower bound, epoch milliseconds
    pub timestamp: i64,
    pub entry_count: usize,
    pub depart_count: usize,
}

/// Result of a statistics computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResult {
    /// People currently inside, by category
    pub inside: CategoryCounts,
    /// Today first, then the six previous days
    pub daily_history: Vec<DailyBucket>,
}

/// Outcome of a directory sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub scanned: usize,
    pub updated: usize,
    pub missing: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_counts() {
        let mut counts = CategoryCounts::default();
        counts.increment(PersonCategory::Staff);
        counts.increment(PersonCategory::Staff);
        counts.increment(PersonCategory::Visitor);

        assert_eq!(counts.get(PersonCategory::Staff), 2);
        assert_eq!(counts.get(PersonCategory::Visitor), 1);
        assert_eq!(counts.get(PersonCategory::Supplier), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_stats_result_serialization() {
        let stats = StatsResult {
            inside: CategoryCounts::default(),
            daily_history: vec![DailyBucket {
                timestamp: 1_700_000_000_000,
                entry_count: 3,
                depart_count: 1,
            }],
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"dailyHistory\""));
        assert!(json.contains("\"entryCount\":3"));
        assert!(json.contains("\"departCount\":1"));
    }
}
