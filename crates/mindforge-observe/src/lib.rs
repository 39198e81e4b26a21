//! Logging and trace export setup for the MindForge binary.

pub mod tracing_setup;
