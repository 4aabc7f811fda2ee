//! Structural transforms.
//!
//! All transforms are methods on [`Alignment`](crate::model::Alignment)
//! and edit it in place unless they return a new alignment. They either
//! keep the compressed view consistent or drop it; column categories are
//! kept in lockstep with the columns.
//!
//! - [`gaps`]: gap stripping, projection, macro-indel masking, missing data to gaps
//! - [`extract`]: sub-alignments, concatenation, partition by category
//! - [`reverse`]: reverse complementation of alignments, segments and feature groups
//! - [`coding`]: frame-aware cleaning of coding alignments
//! - [`indel`]: masking of characters near indels
//! - [`rows`]: row reordering, row selection, column permutation

pub mod coding;
pub mod extract;
pub mod gaps;
pub mod indel;
pub mod reverse;
pub mod rows;

pub use coding::CodingCleanOptions;
pub use extract::RowSelection;
pub use gaps::GapStrip;
pub use indel::IndelCleanOptions;
pub use reverse::reverse_complement_feature_groups;

/// Keeps the category labels of the retained columns.
pub(crate) fn retain_categories(categories: &mut Option<Vec<usize>>, keep: &[bool]) {
    if let Some(cats) = categories.as_mut() {
        let mut flags = keep.iter();
        cats.retain(|_| *flags.next().unwrap_or(&false));
    }
}
