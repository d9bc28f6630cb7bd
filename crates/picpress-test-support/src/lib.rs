#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across the picpress crates.
//! Layout: fixtures.rs (generated image payloads), multipart.rs (request body builder).

pub mod fixtures;
pub mod multipart;

pub use multipart::MultipartBody;
