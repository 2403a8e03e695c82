//! Authenticated request gateway and route authorization for the school
//! management API.
//!
//! Every call goes through [`gateway::Gateway`], which recovers an expired
//! session with a single coalesced refresh and replays the failed request once.
//! [`routes::evaluate`] decides, per navigation, whether the current identity
//! may reach a destination, using the seniority order of [`identity::Role`].

pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod identity;
pub mod routes;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub use client::SchoolClient;
pub use errors::AppError;
