//! Synchronous API client core for the KerbalStuff mod-hosting service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, making the core fully deterministic and testable.
//!
//! # Design
//! - `ApiClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (validates, produces a request) and
//!   `parse_*` (normalizes the error envelope, decodes records).
//! - Upload bodies reference the archive by path. Reading it is the
//!   transport's job, which keeps the file handle scoped to one request.
//! - Records are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod multipart;
pub mod normalize;
pub mod params;
pub mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::{FilePart, MultipartForm};
pub use normalize::normalize;
pub use params::{BrowseParams, CreateModParams, OrderBy, SortOrder, UpdateModParams};
pub use types::{CreatedMod, Credential, Mod, ModVersion, PublishedVersion, User};
