pub mod attendance;
pub mod cancel_reason;
pub mod errors;
pub mod filter;
pub mod ids;
pub mod notification;
pub mod session;
pub mod shift;
pub mod slot;
