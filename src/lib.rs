//! Daily Dose - an AI/tech news digest
//!
//! This crate pulls articles from RSS/Atom feeds, keeps the recent and
//! on-topic ones, collapses duplicate headlines, summarizes and groups them,
//! and mails the result as a daily digest.

pub mod aggregator;
pub mod article;
pub mod categorizer;
pub mod config;
pub mod delivery;
pub mod digest;
pub mod enrichment;
pub mod fetcher;
pub mod filters;
