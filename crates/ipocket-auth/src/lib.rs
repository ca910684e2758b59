//! Session store for the ipocket application
//!
//! Sessions live in the database and are addressed by an opaque token. The
//! store is an explicit component owned by the application context; nothing
//! here is process-global.

pub mod services;

pub use services::session_service::SessionService;
