//! # gls-core
//!
//! Core types for the glossary selection engine.
//!
//! This crate provides the foundational types shared across all gls crates:
//! - Entry, compound and usage-record structs (the data model the engine mutates)
//! - Policy enums for selection, hierarchy flattening, missing parents and sorting
//! - Label prefix handling for primary/dual/tertiary variant labels
//! - Prior-selection context carried between resource batches
//! - Input event envelope for JSONL entry streams
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod events;
pub mod labels;
pub mod policy;
