//! Credential validation shared by every ingress path.
//!
//! All three paths admit a log the same way: the project must exist, the
//! presented API key must match it, and the client must be the user that
//! owns it. The paths differ only in how they report failure, so the
//! checks live here and each path maps [`AuthFailure`] to its own wire
//! shape.

use sentinel_core::protocol::AccountTier;
use sentinel_store::CredentialStore;
use tracing::warn;

/// The credential triple every caller presents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    /// Caller's identifier.
    pub client_id: String,
    /// Target project.
    pub project_id: String,
    /// Secret for the project.
    pub api_key: String,
}

impl Credentials {
    /// Wire names of the credential fields that are empty, in the order
    /// they are reported to clients.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_empty() {
            missing.push("api_key");
        }
        if self.client_id.is_empty() {
            missing.push("client_id");
        }
        if self.project_id.is_empty() {
            missing.push("project_id");
        }
        missing
    }
}

/// Why a credential check failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthFailure {
    /// The store failed while checking; not the caller's fault.
    Database,
    /// No project with the presented ID.
    ProjectNotFound,
    /// Project exists but the key does not match.
    InvalidApiKey,
    /// Client is not the user that owns the project.
    InvalidClient,
}

impl AuthFailure {
    /// The message each failure puts on the wire.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Database => "Database error when checking project",
            Self::ProjectNotFound => "Project not found",
            Self::InvalidApiKey => "Invalid API key",
            Self::InvalidClient => "Invalid client ID or user doesn't own this project",
        }
    }
}

/// Run the three credential checks in order and resolve the caller's tier.
///
/// Checks run sequentially and the first failure wins, so a caller with a
/// bad key and a bad client ID hears about the key.
pub fn authenticate<S: CredentialStore + ?Sized>(
    store: &S,
    creds: &Credentials,
) -> Result<AccountTier, AuthFailure> {
    let project = match store.find_project(&creds.project_id) {
        Ok(Some(project)) => project,
        Ok(None) => return Err(AuthFailure::ProjectNotFound),
        Err(e) => {
            warn!(error = %e, project_id = %creds.project_id, "project lookup failed");
            return Err(AuthFailure::Database);
        }
    };

    if project.api_key != creds.api_key {
        return Err(AuthFailure::InvalidApiKey);
    }

    match store.client_owns_project(&creds.client_id, &creds.project_id) {
        Ok(true) => {}
        Ok(false) => return Err(AuthFailure::InvalidClient),
        Err(e) => {
            warn!(error = %e, client_id = %creds.client_id, "ownership check failed");
            return Err(AuthFailure::Database);
        }
    }

    store.account_tier(&creds.client_id).map_err(|e| {
        warn!(error = %e, client_id = %creds.client_id, "tier lookup failed");
        AuthFailure::Database
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
