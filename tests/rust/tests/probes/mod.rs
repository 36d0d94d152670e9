//! Diagnostic probes against live and mocked endpoints

mod auth;
