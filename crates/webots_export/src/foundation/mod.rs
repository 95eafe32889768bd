//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the exporter:
//! - Math types and transform decomposition
//! - Handle-based collections
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
