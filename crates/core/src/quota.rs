//! Per-identity extraction allowance.
//!
//! Free identities may extract [`FREE_EXTRACTION_LIMIT`] documents; premium
//! identities are unlimited. The pipeline never consults the quota; callers
//! check it before extracting and record the extraction afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{NoteError, Result};

/// Extractions allowed for an identity without premium.
pub const FREE_EXTRACTION_LIMIT: u32 = 2;

/// Decides whether an identity may run another extraction.
pub trait QuotaService: Send + Sync {
    /// True when `identity` has allowance left.
    fn can_extract(&self, identity: &str) -> bool;

    /// Count one completed extraction against `identity`.
    fn record_extraction(&self, identity: &str) -> Result<()>;

    /// Fail with [`NoteError::QuotaExceeded`] when no allowance is left.
    fn ensure_can_extract(&self, identity: &str) -> Result<()> {
        if self.can_extract(identity) {
            Ok(())
        } else {
            Err(NoteError::QuotaExceeded { identity: identity.to_string(), limit: FREE_EXTRACTION_LIMIT })
        }
    }
}

/// Usage recorded for one identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub premium: bool,
    pub note_count: u32,
}

impl Account {
    pub fn can_extract(&self) -> bool {
        self.premium || self.note_count < FREE_EXTRACTION_LIMIT
    }

    /// Extractions left, or `None` when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        (!self.premium).then(|| FREE_EXTRACTION_LIMIT.saturating_sub(self.note_count))
    }
}

/// In-memory ledger of accounts, optionally persisted as JSON.
///
/// Every recorded extraction is written back to the backing file when one
/// is set.
#[derive(Debug, Default)]
pub struct QuotaLedger {
    accounts: Mutex<BTreeMap<String, Account>>,
    path: Option<PathBuf>,
}

impl QuotaLedger {
    /// A ledger that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the ledger stored at `path`, starting empty if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let accounts = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), accounts = accounts.len(), "opened quota ledger");

        Ok(Self { accounts: Mutex::new(accounts), path: Some(path) })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current usage of `identity`; unknown identities have a fresh account.
    pub fn account(&self, identity: &str) -> Account {
        self.lock().get(identity).copied().unwrap_or_default()
    }

    /// Grant unlimited extractions to `identity`.
    pub fn set_premium(&self, identity: &str, premium: bool) -> Result<()> {
        let mut accounts = self.lock();
        accounts.entry(identity.to_string()).or_default().premium = premium;
        self.persist(&accounts)
    }

    fn persist(&self, accounts: &BTreeMap<String, Account>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(accounts)?)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QuotaService for QuotaLedger {
    fn can_extract(&self, identity: &str) -> bool {
        self.account(identity).can_extract()
    }

    fn record_extraction(&self, identity: &str) -> Result<()> {
        let mut accounts = self.lock();
        let account = accounts.entry(identity.to_string()).or_default();
        account.note_count = account.note_count.saturating_add(1);
        debug!(identity, count = account.note_count, "recorded extraction");
        self.persist(&accounts)
    }
}
