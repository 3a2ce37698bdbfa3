pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ParsePolicyError, SessionConfig, StoragePolicy, DEFAULT_LIFETIME_SECS, DEFAULT_TOKEN_TYPE,
};
pub use error::{Result, SessionError};
pub use events::{SessionEvent, SessionNotifier};
pub use store::{ProfileLookup, Session, SessionKeys, SessionState, SessionStore};
