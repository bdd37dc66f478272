//! Request extractors that identify the caller and gate on role.

pub mod auth;
pub mod rbac;
