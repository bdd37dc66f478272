//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the create/update payloads that touch it

pub mod defect;
pub mod edit_request;
pub mod notification;
pub mod operation;
pub mod production_order;
pub mod user;
