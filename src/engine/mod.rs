pub mod briefing;
pub mod classify;
pub mod signal;
pub mod trending;
