//! Request handlers, one submodule per resource.
//!
//! Handlers extract the actor and request body, delegate to the
//! [`workflow`](crate::workflow) services or a repository in `pchart_db`, and
//! wrap results in [`DataResponse`](crate::response::DataResponse).

pub mod defects;
pub mod edit_requests;
pub mod locks;
pub mod master_defects;
pub mod notifications;
pub mod operations;
pub mod production_orders;
pub mod users;
