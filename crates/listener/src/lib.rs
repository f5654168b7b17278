//! Trigger relay event source infrastructure.
//!
//! Receives push notifications over HTTP and hands them to
//! [`relay::TriggerRelay`]:
//!
//! - a plain `GET /?repo=..&branch=..&files=..` endpoint for hooks that can
//!   only call a URL (e.g. a Git server `post-receive` script with `curl`);
//! - a `POST /` GitLab push webhook receiver;
//! - liveness and readiness probes for orchestrators.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request parsing and HTTP status mapping live here. The
//! [`relay`] crate sees only [`routing::PushEvent`].

pub mod requests;
pub mod server;

pub use requests::{parse_gitlab_push, parse_query, RequestError};
pub use server::{router, serve};
