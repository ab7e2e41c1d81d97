//! Error types for Gantry

use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for Gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Workspace inventory errors
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Source-control errors
    #[error(transparent)]
    Scm(#[from] ScmError),

    /// Registry-related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Run-level errors
    #[error(transparent)]
    Run(#[from] RunError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Workspace inventory errors
///
/// Inventory failures are fatal: without a package snapshot there is no
/// safe way to decide what changed.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Listing the workspace packages failed
    #[error("Failed to list workspace packages: {0}")]
    ListFailed(String),

    /// The package listing could not be parsed
    #[error("Failed to parse package listing: {0}")]
    ParseFailed(String),

    /// Two packages in one snapshot share a name
    #[error("Duplicate package name in workspace: {0}")]
    DuplicateName(String),
}

/// Source-control errors
#[derive(Debug, Error)]
pub enum ScmError {
    /// Repository could not be opened
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Fetch from remote failed
    #[error("Failed to fetch {remote}/{branch}: {reason}")]
    FetchFailed {
        remote: String,
        branch: String,
        reason: String,
    },

    /// Diff computation failed
    #[error("Failed to diff against {reference}: {reason}")]
    DiffFailed { reference: String, reason: String },

    /// HEAD could not be resolved
    #[error("Failed to resolve HEAD: {0}")]
    HeadUnresolved(String),
}

/// Commit-search errors
///
/// These never surface past the checkpoint locator, which degrades to
/// the trunk baseline on any failure.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Request could not be sent
    #[error("Commit search request failed: {0}")]
    RequestFailed(String),

    /// Search API returned a non-success status
    #[error("Commit search API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response could not be decoded
    #[error("Failed to decode commit search response: {0}")]
    Decode(String),
}

/// Registry-related errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Request could not be sent
    #[error("Registry request failed: {0}")]
    RequestFailed(String),

    /// Registry API returned a non-success status
    #[error("Registry API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A package-manager invocation failed
    #[error("Command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    /// Authentication could not be established
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// Run-level errors
#[derive(Debug, Error)]
pub enum RunError {
    /// A version bump failed; remaining bumps are aborted
    #[error("Failed to bump {package}: {reason}")]
    VersionBump { package: String, reason: String },

    /// A publish failed; remaining publishes are aborted
    #[error("Failed to publish {package}: {reason}")]
    Publish { package: String, reason: String },

    /// A publish is required but no auth strategy is resolvable
    #[error(
        "No registry credentials available: provide an .npmrc, set NODE_AUTH_TOKEN, \
         or run with trusted publishing enabled"
    )]
    MissingCredential,
}
