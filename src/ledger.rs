//! Append-only experience ledger.
//!
//! Entries are never edited or removed. A grant is undone by appending an offsetting
//! `reversal` entry that points back at the original through `source_id`.
//! Totals are summed from the entries on every read; there is no running counter to drift.
//! No append may leave a user's total below zero.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{ExperienceLogEntry, ExperienceSource};
use crate::error::{LedgerError, LedgerResult};

/// Input for `append_entry`; id and timestamp are assigned by the ledger.
#[derive(Clone, Debug)]
pub struct NewEntry {
    pub user_id: String,
    pub source: ExperienceSource,
    pub source_id: Option<String>,
    pub xp: i64,
    pub description: Option<String>,
}

/// What an append produced, with the user's totals on both sides of it.
#[derive(Clone, Debug)]
pub struct AppendReceipt {
    pub entry: ExperienceLogEntry,
    pub previous_total: i64,
    pub new_total: i64,
}

#[derive(Clone, Default)]
pub struct ExperienceLedger {
    by_user: Arc<RwLock<HashMap<String, Vec<ExperienceLogEntry>>>>,
}

impl ExperienceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "debug", skip(self, new), fields(user_id = %new.user_id, source = %new.source, xp = new.xp))]
    pub async fn append_entry(&self, new: NewEntry) -> LedgerResult<AppendReceipt> {
        if new.user_id.is_empty() {
            return Err(LedgerError::Rejected("user id is empty".into()));
        }
        if new.xp == 0 {
            return Err(LedgerError::Rejected("xp must be non-zero".into()));
        }

        let user_id = new.user_id.clone();
        let mut by_user = self.by_user.write().await;
        let entries = by_user.entry(user_id.clone()).or_default();
        let outcome = record(entries, new);
        if entries.is_empty() {
            by_user.remove(&user_id);
        }
        let receipt = outcome?;

        info!(target: "ledger", user_id = %receipt.entry.user_id, entry_id = %receipt.entry.id, source = %receipt.entry.source, xp = receipt.entry.xp, previous_total = receipt.previous_total, new_total = receipt.new_total, "Ledger entry appended");
        Ok(receipt)
    }

    /// Append an entry that cancels `entry_id`. Each entry can be reversed at most once.
    #[instrument(level = "debug", skip(self, description))]
    pub async fn reverse_entry(
        &self,
        user_id: &str,
        entry_id: &str,
        description: Option<String>,
    ) -> LedgerResult<AppendReceipt> {
        let original = {
            let by_user = self.by_user.read().await;
            let entries = by_user.get(user_id).map(Vec::as_slice).unwrap_or_default();
            let original = entries
                .iter()
                .find(|e| e.id == entry_id)
                .cloned()
                .ok_or_else(|| LedgerError::EntryNotFound {
                    user_id: user_id.to_string(),
                    entry_id: entry_id.to_string(),
                })?;
            if original.source == ExperienceSource::Reversal {
                return Err(LedgerError::NotReversible(entry_id.to_string()));
            }
            original
        };

        let new = NewEntry {
            user_id: user_id.to_string(),
            source: ExperienceSource::Reversal,
            source_id: Some(original.id.clone()),
            xp: -original.xp,
            description: description.or_else(|| Some(format!("Reversal of {}", original.source))),
        };

        // Re-check under the write lock so two concurrent reversals cannot both land.
        let mut by_user = self.by_user.write().await;
        let entries = by_user.entry(user_id.to_string()).or_default();
        if entries
            .iter()
            .any(|e| e.source == ExperienceSource::Reversal && e.source_id.as_deref() == Some(entry_id))
        {
            return Err(LedgerError::AlreadyReversed(entry_id.to_string()));
        }
        let receipt = record(entries, new)?;

        info!(target: "ledger", %user_id, reversed = %entry_id, entry_id = %receipt.entry.id, xp = receipt.entry.xp, previous_total = receipt.previous_total, new_total = receipt.new_total, "Ledger entry reversed");
        Ok(receipt)
    }

    /// Sum of every entry for the user. Users without entries have zero.
    pub async fn total_xp_for(&self, user_id: &str) -> LedgerResult<i64> {
        let by_user = self.by_user.read().await;
        match by_user.get(user_id) {
            Some(entries) => sum_entries(user_id, entries),
            None => Ok(0),
        }
    }

    /// Most recent entries first.
    pub async fn entries_for(&self, user_id: &str, limit: usize) -> Vec<ExperienceLogEntry> {
        let by_user = self.by_user.read().await;
        by_user
            .get(user_id)
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of `(user_id, total)` for every user with at least one entry.
    pub async fn totals(&self) -> LedgerResult<Vec<(String, i64)>> {
        let by_user = self.by_user.read().await;
        by_user
            .iter()
            .map(|(user_id, entries)| Ok((user_id.clone(), sum_entries(user_id, entries)?)))
            .collect()
    }
}

/// Push one entry onto a user's rows. Caller holds the write lock.
fn record(entries: &mut Vec<ExperienceLogEntry>, new: NewEntry) -> LedgerResult<AppendReceipt> {
    let previous_total = sum_entries(&new.user_id, entries)?;
    let new_total = previous_total
        .checked_add(new.xp)
        .ok_or_else(|| LedgerError::TotalOverflow(new.user_id.clone()))?;
    if new_total < 0 {
        return Err(LedgerError::NegativeTotal { user_id: new.user_id, total: new_total });
    }

    let entry = ExperienceLogEntry {
        id: Uuid::new_v4().to_string(),
        user_id: new.user_id,
        source: new.source,
        source_id: new.source_id,
        xp: new.xp,
        description: new.description,
        created_at: Utc::now(),
    };
    entries.push(entry.clone());
    Ok(AppendReceipt { entry, previous_total, new_total })
}

fn sum_entries(user_id: &str, entries: &[ExperienceLogEntry]) -> LedgerResult<i64> {
    entries
        .iter()
        .try_fold(0i64, |acc, e| acc.checked_add(e.xp))
        .ok_or_else(|| LedgerError::TotalOverflow(user_id.to_string()))
}
