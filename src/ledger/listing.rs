//! Plain register lookups

use crate::error::{LedgerError, LedgerResult};
use crate::event_store::{RegisterFilter, SortOrder};
use crate::types::{Register, RegisterId, Scope};

use super::AccessLedger;

pub async fn register(ledger: &AccessLedger, id: RegisterId) -> LedgerResult<Register> {
    ledger
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("register {}", id)))
}

/// Every register in scope (unauthorized included), most recent first
pub async fn registers(
    ledger: &AccessLedger,
    scope: &Scope,
    limit: Option<usize>,
) -> LedgerResult<Vec<Register>> {
    let filter = RegisterFilter {
        include_unauthorized: true,
        sector_ids: ledger.resolve_sectors(scope).await?,
        ..Default::default()
    };
    Ok(ledger.store.query(&filter, SortOrder::OccurredDesc, limit).await?)
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::types::NewRegister;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_registers_most_recent_first() {
        let (ledger, _, _) = testing::ledger();
        let at = |h| Utc.with_ymd_and_hms(2024, 5, 6, h, 0, 0).unwrap();

        ledger.submit(NewRegister::entry("ana", "s-1").at(at(10))).await.unwrap();
        ledger.submit(NewRegister::entry("ghost", "s-1").at(at(12))).await.unwrap();
        ledger.submit(NewRegister::entry("beto", "s-1").at(at(8))).await.unwrap();
        ledger.submit(NewRegister::entry("carla", "s-3").at(at(11))).await.unwrap();

        let listed = ledger.registers(&Scope::sector("s-1"), None).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let top = ledger.registers(&Scope::all(), Some(2)).await.unwrap();
        let ids: Vec<_> = top.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_register_not_found() {
        let (ledger, _, _) = testing::ledger();
        assert!(matches!(ledger.register(7).await, Err(LedgerError::NotFound(_))));
    }
}
