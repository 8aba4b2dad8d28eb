/// State management module
///
/// This module handles all application state, including:
/// - The issue catalog database (catalog.rs)
/// - Shared data structures (data.rs)

pub mod catalog;
pub mod data;
