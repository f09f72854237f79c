//! Who is inside right now

use futures::stream::{self, BoxStream, StreamExt};

use crate::error::LedgerResult;
use crate::event_store::{RegisterFilter, SortOrder};
use crate::types::{OccupancyQuery, Register, RegisterKind};

use super::AccessLedger;

/// Open, authorized entries within the query scope, ascending by id
pub async fn currently_inside(
    ledger: &AccessLedger,
    query: &OccupancyQuery,
) -> LedgerResult<BoxStream<'static, Register>> {
    let sector_ids = ledger.resolve_sectors(&query.scope).await?;
    if matches!(sector_ids, Some(ref ids) if ids.is_empty()) {
        return Ok(stream::empty().boxed());
    }

    let filter = RegisterFilter {
        kind: Some(RegisterKind::Entry),
        resolved: Some(false),
        include_unauthorized: false,
        sector_ids,
        category: query.category,
        identifier_prefix: query
            .rut
            .as_ref()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        ..Default::default()
    };

    let registers = ledger.store.query(&filter, SortOrder::IdAsc, query.limit).await?;
    Ok(stream::iter(registers).boxed())
}
