//! Domain rules for the P-Chart quality-control backend.
//!
//! Everything here is pure: no database, no HTTP. The `db` and `api` crates
//! call into these modules to decide whether a state change is allowed and
//! what it produces.

pub mod cascade;
pub mod defect;
pub mod edit_request;
pub mod error;
pub mod lock;
pub mod operation;
pub mod production_order;
pub mod roles;
pub mod types;
