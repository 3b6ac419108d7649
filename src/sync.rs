//! Bypass Default Sync
//!
//! Bulk-writes the configured default bypass flag onto existing rules.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::fixtures::rules::{RuleFixture, RulesFixture};

/// Rule Store Errors
#[derive(Debug, Error)]
pub enum RuleStoreError {
    /// IO error reading or writing the rule file
    #[error("Failed to access rule store: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialisation error
    #[error("Failed to parse rule store: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Persistent storage of cart price rules' bypass flags.
#[cfg_attr(test, mockall::automock)]
pub trait RuleStore {
    /// Number of rules whose bypass flag differs from `default`. Unset flags count as `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count_mismatched(&self, default: bool) -> Result<usize, RuleStoreError>;

    /// Set every mismatched rule's bypass flag to `default`, returning how many changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn set_bypass_all(&mut self, default: bool) -> Result<usize, RuleStoreError>;
}

/// Outcome of [`sync_bypass_default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Rules changed, or that would change on a dry run
    pub count: usize,

    /// Flag value written
    pub bypass: bool,

    /// Whether nothing was written
    pub dry_run: bool,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.bypass { "enabled" } else { "disabled" };

        if self.dry_run {
            write!(
                f,
                "Dry run: {} rule(s) would be updated to bypass={label}",
                self.count
            )
        } else {
            write!(f, "Updated {} rule(s) to bypass={label}", self.count)
        }
    }
}

/// Align every rule's bypass flag with `default`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn sync_bypass_default<S: RuleStore + ?Sized>(
    store: &mut S,
    default: bool,
    dry_run: bool,
) -> Result<SyncReport, RuleStoreError> {
    let count = if dry_run {
        store.count_mismatched(default)?
    } else {
        store.set_bypass_all(default)?
    };

    info!(count, bypass = default, dry_run, "synced bypass default");

    Ok(SyncReport {
        count,
        bypass: default,
        dry_run,
    })
}

/// A rule store backed by a YAML rules file.
#[derive(Debug)]
pub struct YamlRuleStore {
    path: PathBuf,
    fixture: RulesFixture,
}

impl YamlRuleStore {
    /// Open the rules file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RuleStoreError> {
        let path = path.into();
        let contents = fs::read_to_string(&path)?;
        let fixture = serde_norway::from_str(&contents)?;

        Ok(Self { path, fixture })
    }

    /// File backing the store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rules currently held
    pub fn rules(&self) -> &[RuleFixture] {
        &self.fixture.rules
    }

    fn save(&self) -> Result<(), RuleStoreError> {
        let contents = serde_norway::to_string(&self.fixture)?;

        fs::write(&self.path, contents)?;

        Ok(())
    }
}

impl RuleStore for YamlRuleStore {
    fn count_mismatched(&self, default: bool) -> Result<usize, RuleStoreError> {
        Ok(self
            .fixture
            .rules
            .iter()
            .filter(|rule| rule.bypass_enabled() != default)
            .count())
    }

    fn set_bypass_all(&mut self, default: bool) -> Result<usize, RuleStoreError> {
        let mut updated = 0;

        for rule in &mut self.fixture.rules {
            if rule.bypass_enabled() != default {
                rule.bypass = Some(default);
                updated += 1;
            }
        }

        if updated > 0 {
            self.save()?;
        }

        Ok(updated)
    }
}
