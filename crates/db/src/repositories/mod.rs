//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads and
//! standalone writes take `&PgPool`; methods that must take part in a
//! caller's transaction take `&mut PgConnection` or a generic `PgExecutor`.

pub mod edit_request_repo;
pub mod master_defect_repo;
pub mod notification_repo;
pub mod operation_defect_repo;
pub mod operation_repo;
pub mod order_lock_repo;
pub mod production_order_repo;
pub mod user_repo;

pub use edit_request_repo::EditRequestRepo;
pub use master_defect_repo::MasterDefectRepo;
pub use notification_repo::NotificationRepo;
pub use operation_defect_repo::OperationDefectRepo;
pub use operation_repo::OperationRepo;
pub use order_lock_repo::OrderLockRepo;
pub use production_order_repo::ProductionOrderRepo;
pub use user_repo::UserRepo;
