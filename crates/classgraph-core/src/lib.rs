//! Core types and storage for classgraph.
//!
//! Provides the extracted record model ([`model::ClassArena`] of
//! [`model::ClassRecord`]s), the resolved dependency graph
//! ([`graph::GraphDocument`]), language detection, run configuration and
//! JSON persistence.

pub mod config;
pub mod graph;
pub mod language;
pub mod model;
pub mod schema;
pub mod storage;
