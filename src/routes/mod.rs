//! Route handlers. Each takes the raw query (GET) or body (POST) string and
//! returns an HTML fragment, JSON, or a short status word.

pub mod board;
pub mod guilds;
pub mod logs;
pub mod session;
pub mod summary;
pub mod util;
