//! Data models for documents, receipts, and configuration.

pub mod config;
pub mod document;
pub mod receipt;
