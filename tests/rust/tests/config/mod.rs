//! Configuration integration tests
//!
//! Server records as they arrive from persistence (camelCase JSON) through
//! deserialization, validation and settings.

mod validation;
