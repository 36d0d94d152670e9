//! Connection manager integration tests
//!
//! The manager talks to real rmcp servers over Streamable HTTP and SSE on
//! loopback ports.

mod capabilities;
mod lifecycle;
