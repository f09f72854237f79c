//! Occupancy statistics and daily history

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::LedgerResult;
use crate::event_store::{RegisterFilter, SortOrder};
use crate::types::{CategoryCounts, DailyBucket, Register, RegisterKind, Scope, StatsResult, HISTORY_DAYS};
use crate::utils::daily_bounds;

use super::AccessLedger;

/// Head counts of people inside plus a seven-day traffic history.
///
/// The two underlying queries run concurrently and are not isolated from
/// each other; a failure of either fails the whole computation.
pub async fn compute_statistics(
    ledger: &AccessLedger,
    scope: &Scope,
    now: DateTime<FixedOffset>,
) -> LedgerResult<StatsResult> {
    let bounds = daily_bounds(now, HISTORY_DAYS);
    let sector_ids = ledger.resolve_sectors(scope).await?;

    let open_filter = RegisterFilter {
        kind: Some(RegisterKind::Entry),
        resolved: Some(false),
        sector_ids: sector_ids.clone(),
        ..Default::default()
    };
    let history_filter = RegisterFilter {
        sector_ids,
        occurred_from: bounds.last().map(|(lower, _)| *lower),
        occurred_before: bounds.first().map(|(_, upper)| *upper),
        ..Default::default()
    };

    let (open, recent) = tokio::try_join!(
        ledger.store.query(&open_filter, SortOrder::IdAsc, None),
        ledger.store.query(&history_filter, SortOrder::IdAsc, None),
    )?;

    Ok(StatsResult {
        inside: count_inside(&open),
        daily_history: daily_history(&recent, &bounds),
    })
}

/// Count each person once, by the category on their highest-id open entry
pub fn count_inside(open_entries: &[Register]) -> CategoryCounts {
    let mut latest: HashMap<&str, &Register> = HashMap::new();
    for register in open_entries {
        let Some(person_id) = register.person_id.as_deref() else {
            continue;
        };
        latest
            .entry(person_id)
            .and_modify(|current| {
                if register.id > current.id {
                    *current = register;
                }
            })
            .or_insert(register);
    }

    let mut counts = CategoryCounts::default();
    for register in latest.values() {
        if let Some(category) = register.person_category {
            counts.increment(category);
        }
    }
    counts
}

/// Entry and depart counts per `[lower, upper)` bucket
pub fn daily_history(registers: &[Register], bounds: &[(DateTime<Utc>, DateTime<Utc>)]) -> Vec<DailyBucket> {
    bounds
        .iter()
        .map(|(lower, upper)| {
            let mut bucket = DailyBucket {
                timestamp: lower.timestamp_millis(),
                entry_count: 0,
                depart_count: 0,
            };
            for register in registers
                .iter()
                .filter(|r| r.occurred_at >= *lower && r.occurred_at < *upper)
            {
                match register.kind {
                    RegisterKind::Entry => bucket.entry_count += 1,
                    RegisterKind::Depart => bucket.depart_count += 1,
                }
            }
            bucket
        })
        .collect()
}
