//! Upload demo: runs scripted paste-and-upload scenarios against the in-memory editor.
pub mod config;
pub mod logging;
pub mod scenario;
