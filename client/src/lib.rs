//! Blocking client for the KerbalStuff mod-hosting service.
//!
//! # Overview
//! Wraps `kerbalstuff-core` with a transport so each operation is one call:
//! `KerbalStuff` covers search, lookup and browse; `Session` covers login and
//! publishing.
//!
//! ```no_run
//! use kerbalstuff::{BrowseParams, KerbalStuff, OrderBy, SortOrder};
//!
//! let ks = KerbalStuff::default();
//! let newest = ks.browse(&BrowseParams::new(OrderBy::Updated, SortOrder::Desc, 10))?;
//! for m in &newest {
//!     println!("{} by {}", m.name, m.author);
//! }
//! # Ok::<(), kerbalstuff::ApiError>(())
//! ```

pub mod config;
#[cfg(test)]
mod fake;
pub mod query;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use kerbalstuff_core::{
    ApiError, BrowseParams, CreateModParams, CreatedMod, Credential, Mod, ModVersion, OrderBy,
    PublishedVersion, Result, SortOrder, UpdateModParams, User,
};
pub use query::KerbalStuff;
pub use session::Session;
pub use transport::{Transport, UreqTransport};
