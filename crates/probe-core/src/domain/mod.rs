//! # Domain Layer
//!
//! Pure domain types for the probe.
//!
//! ## Modules
//!
//! - `identifier` - ContentIdentifier, fixed-width FileHash, match policy
//! - `namespace` - Namespace naming rules, owner account id
//! - `entities` - UploadRecord, ProbeIteration state machine
//! - `value_objects` - Series kinds, poll/failure/retrieval policies, gateway tags
//! - `errors` - NetworkError classification and fatal ProbeError

pub mod entities;
pub mod errors;
pub mod identifier;
pub mod namespace;
pub mod value_objects;

pub use entities::{
    IterationPhase, IterationTimings, ProbeIteration, UploadRecord, LEDGER_TIMESTAMP_FORMAT,
};
pub use errors::{ErrorClass, NetworkError, ProbeError};
pub use identifier::{ContentIdentifier, FileHash, IdentifierMatch, FILE_HASH_LEN};
pub use namespace::{AccountId, NamespaceName, MAX_NAMESPACE_LEN, MIN_NAMESPACE_LEN};
pub use value_objects::{
    Backoff, CounterMode, FailurePolicy, Gateway, GatewayKind, PollPolicy, RetrievalPolicy,
    SeriesKind,
};
