pub mod catch_error;
mod downstream;
pub mod finalize;
pub mod lifecycle;
pub mod map;
pub mod merge_map;
pub mod retry;
pub mod switch_map;
pub mod take;
