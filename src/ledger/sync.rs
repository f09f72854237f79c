//! Bulk refresh of person snapshots from the directory

use std::collections::HashMap;

use tracing::{info, warn};

use crate::directory::DirectoryError;
use crate::error::LedgerResult;
use crate::event_store::{RegisterFilter, SortOrder};
use crate::types::{PersonSnapshot, SyncReport};

use super::AccessLedger;

/// Re-resolve every person-linked register and rewrite changed snapshots.
///
/// All counts are in registers. A person the directory no longer knows
/// leaves their registers untouched; a transient failure aborts the pass.
pub async fn sync_directory(ledger: &AccessLedger) -> LedgerResult<SyncReport> {
    let registers = ledger
        .store
        .query(&RegisterFilter::default(), SortOrder::IdAsc, None)
        .await?;

    let mut cache: HashMap<String, Option<PersonSnapshot>> = HashMap::new();
    let mut report = SyncReport::default();

    for register in registers {
        let Some(person_id) = register.person_id.clone() else {
            continue;
        };
        report.scanned += 1;

        if !cache.contains_key(&person_id) {
            let snapshot = match ledger.persons.lookup(&person_id).await {
                Ok(person) => Some(PersonSnapshot::from(&person)),
                Err(DirectoryError::NotFound(_)) => {
                    warn!(person = %person_id, "person no longer in directory");
                    None
                }
                Err(e) => return Err(e.into()),
            };
            cache.insert(person_id.clone(), snapshot);
        }

        match cache.get(&person_id).cloned().flatten() {
            Some(snapshot) => {
                if ledger.store.refresh_person(register.id, snapshot).await? {
                    report.updated += 1;
                }
            }
            None => report.missing += 1,
        }
    }

    info!(
        scanned = report.scanned,
        updated = report.updated,
        missing = report.missing,
        "directory sync complete"
    );
    Ok(report)
}
