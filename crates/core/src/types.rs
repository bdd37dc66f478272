/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Unit counts (ordered quantity, defect quantities, operation input/output).
pub type Quantity = i32;
