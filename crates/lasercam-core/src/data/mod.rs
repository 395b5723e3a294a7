//! Data models loaded from outside the compiler
//!
//! This module provides:
//! - Material profile catalog with per-layer laser settings
//! - Machine working area and startup/shutdown templates

pub mod materials;
