//! Match state: reference data, the assignment and result tables, the audit
//! log, and the session that ties them together.
//!
//! State lives in WASM memory (`thread_local`) and is written to browser
//! storage after every change.

pub mod assignments;
pub mod audit_log;
pub mod clock;
pub mod controller;
pub mod keyed;
pub mod reference;
pub mod results;
pub mod session;
pub mod side;
pub mod storage;
