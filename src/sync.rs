//! Alias tag reconciliation

use crate::engine::AliasMap;
use crate::error::{ReleaseError, Result};
use crate::gateway::{tag_ref, Gateway};
use crate::warnings::RunWarning;
use std::fmt;
use tracing::{info, warn};

/// What happened to an alias ref
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Created => write!(f, "created"),
            SyncAction::Updated => write!(f, "updated"),
        }
    }
}

/// Result of reconciling one alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOutcome {
    pub alias: String,
    pub commit: String,
    pub action: SyncAction,
}

/// Brings alias tags in line with an [AliasMap]
pub struct TagSynchronizer<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> TagSynchronizer<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        TagSynchronizer { gateway }
    }

    /// Create the alias ref, or force-move it when it already exists.
    ///
    /// Creating first and falling back to an update leaves no window between
    /// an existence check and the write.
    pub fn reconcile(&self, alias: &str, commit: &str) -> Result<SyncAction> {
        let object = self.gateway.create_tag(alias, alias, commit)?;
        let ref_name = tag_ref(alias);

        match self.gateway.create_ref(&ref_name, &object.id) {
            Ok(()) => Ok(SyncAction::Created),
            Err(ReleaseError::RefAlreadyExists(_)) => {
                self.gateway.update_ref(&ref_name, &object.id, true)?;
                Ok(SyncAction::Updated)
            }
            Err(e) => Err(e),
        }
    }

    /// Reconcile every alias; a failing alias is reported and skipped
    pub fn reconcile_all(&self, aliases: &AliasMap) -> (Vec<AliasOutcome>, Vec<RunWarning>) {
        let mut outcomes = Vec::new();
        let mut warnings = Vec::new();

        for (alias, commit) in aliases.iter() {
            match self.reconcile(alias, commit) {
                Ok(action) => {
                    info!(alias, commit, %action, "alias tag reconciled");
                    outcomes.push(AliasOutcome {
                        alias: alias.to_string(),
                        commit: commit.to_string(),
                        action,
                    });
                }
                Err(e) => {
                    warn!(alias, commit, error = %e, "alias tag not reconciled");
                    warnings.push(RunWarning::AliasSyncFailed {
                        alias: alias.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        (outcomes, warnings)
    }
}
