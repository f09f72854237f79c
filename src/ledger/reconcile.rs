//! Submission and entry/depart matching

use chrono::Utc;
use tracing::{debug, warn};

use crate::directory::DirectoryError;
use crate::error::{LedgerError, LedgerResult};
use crate::notify::RegisterNotice;
use crate::types::{MatchScope, NewRegister, PersonSnapshot, Register, RegisterId, RegisterKind};

use super::AccessLedger;

/// Validate, snapshot, store and (for departs) match a submission.
///
/// The depart is always stored before matching so it has an id to link to.
/// A lost race in the implicit path leaves it unmatched; a lost race on an
/// explicit counterpart returns `Conflict` with the depart still stored.
pub async fn submit(ledger: &AccessLedger, candidate: NewRegister) -> LedgerResult<Register> {
    let NewRegister {
        kind,
        person_id,
        sector_id,
        occurred_at,
        counterpart_id,
        comment,
    } = candidate;

    let kind = kind.ok_or_else(|| LedgerError::validation("kind is required"))?;
    let person_id = person_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    let sector_id = sector_id.trim().to_string();
    let occurred_at = occurred_at.unwrap_or_else(Utc::now);

    match kind {
        RegisterKind::Entry if counterpart_id.is_some() => {
            return Err(LedgerError::validation("an entry cannot name a counterpart"));
        }
        RegisterKind::Entry if person_id.is_none() => {
            return Err(LedgerError::validation("an entry requires a person id"));
        }
        RegisterKind::Depart if person_id.is_none() && counterpart_id.is_none() => {
            return Err(LedgerError::validation(
                "a depart requires a person id or a counterpart id",
            ));
        }
        _ => {}
    }

    if sector_id.is_empty() {
        return Err(LedgerError::validation("sector id is required"));
    }
    if ledger.sectors.sector(&sector_id).await?.is_none() {
        return Err(LedgerError::not_found(format!("sector '{}'", sector_id)));
    }

    // Snapshot the person as the directory knows them right now. A depart
    // without a person gets a placeholder that `load_counterpart` replaces.
    let mut register = match person_id {
        Some(person_id) => match ledger.persons.lookup(&person_id).await {
            Ok(person) => Register::for_person(
                kind,
                person_id,
                PersonSnapshot::from(&person),
                sector_id,
                occurred_at,
            ),
            Err(DirectoryError::NotFound(_)) => {
                warn!(identifier = %person_id, sector = %sector_id, %kind, "unauthorized register");
                if counterpart_id.is_some() {
                    return Err(LedgerError::validation(format!(
                        "unknown person '{}' cannot name a counterpart",
                        person_id
                    )));
                }
                Register::unauthorized(kind, person_id, sector_id, occurred_at)
            }
            Err(e) => return Err(e.into()),
        },
        None => Register::unauthorized(kind, String::new(), sector_id, occurred_at),
    }
    .with_comment(comment);

    let explicit = match counterpart_id {
        Some(id) => Some(load_counterpart(ledger, id, &mut register).await?),
        None => None,
    };

    register.id = ledger.store.insert(register.clone()).await?;
    debug!(id = register.id, %kind, sector = %register.sector_id, "register stored");

    if register.unauthorized || register.is_entry() {
        ledger.notify(RegisterNotice::Created {
            register: register.clone(),
        });
        return Ok(register);
    }

    match explicit {
        Some(entry) => match link(ledger, entry, register.clone()).await? {
            Some(linked) => Ok(announce_match(ledger, linked)),
            None => {
                warn!(
                    depart = register.id,
                    entry = ?counterpart_id,
                    "explicit counterpart claimed concurrently"
                );
                ledger.notify(RegisterNotice::Created {
                    register: register.clone(),
                });
                Err(LedgerError::Conflict(format!(
                    "register {} was resolved by another depart",
                    counterpart_id.unwrap_or_default()
                )))
            }
        },
        None => match find_open_entry(ledger, &register).await? {
            Some(entry) => {
                let entry_id = entry.id;
                match link(ledger, entry, register.clone()).await? {
                    Some(linked) => Ok(announce_match(ledger, linked)),
                    None => {
                        warn!(
                            depart = register.id,
                            entry = entry_id,
                            "lost match race, depart left unmatched"
                        );
                        ledger.notify(RegisterNotice::Created {
                            register: register.clone(),
                        });
                        Ok(register)
                    }
                }
            }
            None => {
                debug!(depart = register.id, "no open entry, depart left unmatched");
                ledger.notify(RegisterNotice::Created {
                    register: register.clone(),
                });
                Ok(register)
            }
        },
    }
}

/// Load and check an explicitly named counterpart for `depart`.
///
/// A depart submitted without a person inherits the counterpart's person.
async fn load_counterpart(
    ledger: &AccessLedger,
    id: RegisterId,
    depart: &mut Register,
) -> LedgerResult<Register> {
    let entry = ledger
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("register {}", id)))?;

    if !entry.is_entry() {
        return Err(LedgerError::validation(format!("register {} is not an entry", id)));
    }
    if entry.unauthorized {
        return Err(LedgerError::validation(format!(
            "register {} is unauthorized and cannot be matched",
            id
        )));
    }
    if entry.resolved {
        return Err(LedgerError::validation(format!("register {} is already resolved", id)));
    }
    if entry.occurred_at > depart.occurred_at {
        return Err(LedgerError::validation(format!(
            "register {} occurs after the depart",
            id
        )));
    }
    if ledger.match_scope == MatchScope::Sector && entry.sector_id != depart.sector_id {
        return Err(LedgerError::validation(format!(
            "register {} belongs to sector '{}'",
            id, entry.sector_id
        )));
    }

    if depart.person_id.is_none() {
        // Placeholder from a person-less submission: take the entry's person
        let snapshot = entry
            .snapshot()
            .ok_or_else(|| LedgerError::validation(format!("register {} has no person", id)))?;
        let mut inherited = Register::for_person(
            RegisterKind::Depart,
            entry.person_id.clone().unwrap_or_default(),
            snapshot,
            depart.sector_id.clone(),
            depart.occurred_at,
        );
        inherited.comment = depart.comment.take();
        *depart = inherited;
    } else if entry.person_id != depart.person_id {
        return Err(LedgerError::validation(format!(
            "register {} belongs to a different person",
            id
        )));
    }

    Ok(entry)
}

/// Most recent open entry for the depart's person (and sector, if configured)
async fn find_open_entry(ledger: &AccessLedger, depart: &Register) -> LedgerResult<Option<Register>> {
    let Some(person_id) = depart.person_id.as_deref() else {
        return Ok(None);
    };
    let sector = match ledger.match_scope {
        MatchScope::Person => None,
        MatchScope::Sector => Some(depart.sector_id.as_str()),
    };

    let entry = ledger
        .store
        .find_unresolved_entry(person_id, sector, depart.occurred_at)
        .await?;
    if let Some(ref entry) = entry {
        debug!(depart = depart.id, entry = entry.id, "matching candidate found");
    }
    Ok(entry)
}

/// Claim `entry` for `depart`, marking both sides in one store write.
///
/// Returns `None` if another caller claimed the entry first.
async fn link(
    ledger: &AccessLedger,
    mut entry: Register,
    mut depart: Register,
) -> LedgerResult<Option<(Register, Register)>> {
    if !ledger.store.resolve_pair(entry.id, depart.id).await? {
        return Ok(None);
    }

    entry.resolved = true;
    entry.counterpart_id = Some(depart.id);
    depart.resolved = true;
    depart.counterpart_id = Some(entry.id);
    debug!(entry = entry.id, depart = depart.id, "registers matched");

    Ok(Some((entry, depart)))
}

fn announce_match(ledger: &AccessLedger, (entry, depart): (Register, Register)) -> Register {
    ledger.notify(RegisterNotice::Created {
        register: depart.clone(),
    });
    ledger.notify(RegisterNotice::Resolved {
        register: depart.clone(),
        counterpart: entry,
    });
    depart
}
