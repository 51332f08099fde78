pub mod logging;
pub mod rate_limit;
pub mod storage;
