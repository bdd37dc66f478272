//! Bearer token handling. Tokens are issued elsewhere; this crate only
//! verifies them (and mints them for tests and tooling).

pub mod jwt;
