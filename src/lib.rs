//! # msakit - Multiple Sequence Alignment Engine
//!
//! Alignment representation and structural transforms for comparative
//! genomics pipelines.
//!
//! ## Architecture
//!
//! Modules, leaves first:
//! - `alphabet`: symbol set, gap and missing-data classification
//! - `model`: the `Alignment` object and its explicit/compressed views
//! - `suff_stats`: compression into unique column tuples
//! - `coord_map`: sequence <-> alignment coordinate translation
//! - `category`, `features`, `overlay`: column labeling and feature projection
//! - `genetic_code`: codon tables used by coding-sequence cleaning
//! - `transform`: gap stripping, extraction, concatenation, reverse
//!   complementation, row reordering, coding and indel cleaning
//! - `summary`: base/tuple frequencies and the summary stats line
//! - `formats`: FASTA, PHYLIP, MPM, SS readers and writers, MAF import
//!
//! Transforms keep the two views consistent: an edit to the explicit rows
//! either rebuilds the compressed view or drops it.

pub mod alphabet;
pub mod category;
pub mod coord_map;
pub mod features;
pub mod formats;
pub mod genetic_code;
pub mod model;
pub mod overlay;
pub mod suff_stats;
pub mod summary;
pub mod transform;
