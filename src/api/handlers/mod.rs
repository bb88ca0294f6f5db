//! API handlers for heroes, powers and hero powers.
//!
//! Route handlers only parse input and map the high-level flow. `validation`
//! owns the domain rules, `storage` owns every SQL statement and response
//! shaping, and `error` turns failures into stable HTTP responses.

pub mod error;
pub mod health;
pub mod hero_powers;
pub mod heroes;
pub mod powers;
pub mod root;
mod storage;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;
