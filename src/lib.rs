//! # Heroes
//!
//! `heroes` is a small relational API over three entities: heroes, powers, and
//! the `hero_powers` association that links them with a `strength`.
//!
//! ## Data Model
//!
//! - **Heroes** carry a `name` and a `super_name`.
//! - **Powers** carry a `name` and a `description` that must be at least
//!   20 characters long.
//! - **Hero powers** join one hero to one power with a strength of `Strong`,
//!   `Weak` or `Average`. Both foreign keys are enforced by the database.
//!
//! Deleting a hero or a power removes its `hero_powers` rows in the same
//! transaction. Detail responses nest the other side of the association one
//! level deep only, so no payload ever refers back to its parent.
//!
//! ## Storage
//!
//! Everything lives in a single SQLite database. The schema in `sql/schema.sql`
//! is embedded in the binary and applied idempotently at startup.

pub mod api;
pub mod cli;
pub mod db;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
