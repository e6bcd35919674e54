//! # Pinbox Gateway
//!
//! HTTP front end for an IPFS-pinned S3 bucket.
//!
//! This crate provides:
//! - **Upload**: `POST /upload` streams a multipart body, stores the file with
//!   its form fields as custom metadata and reports the object's CID if the
//!   backend has already pinned it
//! - **Listing**: `GET /list` pages through the bucket and enriches each object
//!   with its metadata, CID and public gateway URL
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Browsers / HTTP clients                │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  Pinbox Gateway                      │
//! ├─────────────────────────────────────────────────────┤
//! │   CORS │ Request ID │ Logging │ Trace               │
//! ├─────────────────────────────────────────────────────┤
//! │  Multipart decoder → Size guard → Key generator     │
//! │  CID reconciler → Response composer                 │
//! ├─────────────────────────────────────────────────────┤
//! │                  pinbox-store                        │
//! │          (S3 bucket with IPFS pinning)              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The CID returned by an upload is a single best-effort read taken right
//! after the write. Pinning is asynchronous on the backend side, so `cid` is
//! often `null` on upload and shows up later in `/list`.

pub mod cid;
pub mod config;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod limits;
pub mod middleware;
pub mod multipart;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
