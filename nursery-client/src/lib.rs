//! Nursery Client - tree tag bulk status orchestration
//!
//! Loads a zone's tree tags from the hosted backend, tracks the user's
//! selection and runs bulk lifecycle status changes with partial-failure
//! reporting.

pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod logger;
pub mod orchestrator;
pub mod policy;
pub mod reconciler;
pub mod remote;
pub mod selection;
pub mod store;

pub use config::ClientConfig;
pub use error::{
    ClientError, ClientResult, StoreError, StoreResult, TransitionError, TransitionResult,
};
pub use executor::{TransitionExecutor, TransitionOutcome};
pub use http::SupabaseClient;
pub use orchestrator::{AutoConfirm, Confirmer, TagStatusOrchestrator};
pub use policy::{ConfirmationPrompt, TransitionRequest, TransitionTarget};
pub use remote::{Filter, OrderBy, RemoteDataService, SelectQuery};
pub use selection::SelectionSet;
pub use store::{LoadState, TagStore};

// Re-export shared types for convenience
pub use shared::{
    PolicyViolation, ReportKind, TagEvent, TagStatus, TransitionMode, TransitionReport, TreeTag,
    TreeTagCreate, TreeTagUpdate, Zone,
};
