//! Core library for the Pexo Forms authentication lifecycle.
//!
//! This crate provides:
//! - `StateStore`: key–value persisted state, one JSON file per key
//! - `CredentialStore`: registered accounts with explicit demo seeding
//! - `SessionManager`: sign-in/sign-out/restore with 30-minute expiry
//! - the expiry sweep: a timer task that evicts lapsed sessions
//! - `check_access`: authentication and publisher-role route gating
//!
//! The front end owns the event loop; everything here completes within
//! a single call apart from the spawned sweep task.

pub mod account;
pub mod clock;
pub mod config;
pub mod error;
pub mod policy;
pub mod session;
pub mod store;
pub mod sweep;

pub use account::{Account, CredentialStore, Role, RESET_PASSWORD};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::AuthError;
pub use policy::{check_access, AccessDecision};
pub use session::{RestoreOutcome, Session, SessionManager, SESSION_TIMEOUT_MINUTES};
pub use store::{StateStore, KEY_SESSION, KEY_USER_DATABASE};
pub use sweep::{spawn_expiry_sweep, sweep_once, SessionEvent, SWEEP_INTERVAL};
