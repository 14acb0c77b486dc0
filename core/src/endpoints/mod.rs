//! Endpoint groups.
//!
//! Each group maps named operations onto a path, method and body. The free
//! functions build `RequestDescriptor`s with no I/O (the FFI and blocking
//! hosts use these); the `*Api` wrappers send them through an `ApiClient`.
//! Input validation is left to the server.

pub mod chat;
pub mod memo;
pub mod user;
