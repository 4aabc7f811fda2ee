//! Category labeling and feature projection.
//!
//! ## Labeling
//!
//! [`Alignment::label_categories`] assigns one category per column from a
//! feature set in alignment coordinates. Where features overlap, the
//! category with the lower precedence number wins regardless of feature
//! order. A label without precedence, such as background, is always
//! overwritten; a new label without precedence only replaces one that
//! also has none.
//!
//! ## Projection
//!
//! [`Alignment::map_feature_coords`] moves a feature set between coordinate
//! frames: the alignment itself, or the ungapped coordinates of one row.

use crate::category::{CategoryMap, BACKGROUND_NAME};
use crate::coord_map::CoordMap;
use crate::features::{FeatureSet, Strand};
use crate::model::{Alignment, AlignmentResult};

/// Sequence name that designates the alignment frame.
pub const MSA_FRAME_NAME: &str = "MSA";

/// Feature types whose length is anchored at their start (on the + strand).
const LEFT_ANCHORED: [&str; 4] = ["5'splice", "start_codon", "stop_codon", "cds3'ss"];

/// Feature types whose length is anchored at their end (on the + strand).
const RIGHT_ANCHORED: [&str; 3] = ["3'splice", "cds5'ss", "prestart"];

/// A coordinate frame for feature projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordFrame {
    /// Alignment columns.
    Alignment,
    /// Ungapped coordinates of one row (0-based row index).
    Row(usize),
    /// Resolved per feature from its sequence name.
    InferFromName,
}

impl Alignment {
    /// Labels every column with a category from `features`.
    ///
    /// Features of unknown type are skipped, as are features whose range is
    /// empty or falls outside the alignment (with a warning).
    pub fn label_categories(&mut self, features: &FeatureSet, cm: &dyn CategoryMap) {
        let mut cats = vec![0usize; self.length];
        let length = self.length as i64;

        for feat in &features.features {
            let Some(cat) = cm.category(&feat.feature) else {
                log::debug!("Skipping feature of unknown type '{}'", feat.feature);
                continue;
            };
            if cat == 0 && feat.feature != BACKGROUND_NAME {
                continue;
            }
            if feat.start < 1 || feat.end > length || feat.start > feat.end {
                log::warn!("Ignoring out-of-range feature: {}", feat);
                continue;
            }

            let range = cm.range(cat);
            let width = range.end() - range.start() + 1;
            let frame = feat.frame.filter(|&f| f <= 2).unwrap_or(0) as usize;
            for j in feat.start..=feat.end {
                let this_cat = if width == 1 {
                    cat
                } else {
                    let offset = if feat.strand == Strand::Reverse {
                        feat.end - j
                    } else {
                        j - feat.start
                    };
                    let offset = offset as usize;
                    range.start() + (offset + frame) % width
                };
                let col = (j - 1) as usize;
                let old = cm.precedence(cats[col]);
                let new = cm.precedence(this_cat);
                let wins = match (old, new) {
                    (None, _) => true,
                    (Some(o), Some(n)) => n < o,
                    (Some(_), None) => false,
                };
                if wins {
                    cats[col] = this_cat;
                }
            }
        }

        self.categories = Some(cats);
        self.ncats = Some(cm.ncats());
        self.refresh_category_counts();
    }

    /// Converts feature coordinates from one frame to another.
    ///
    /// Features entirely out of range in the target frame are dropped;
    /// partially mapped ones are truncated to the frame's extent. Signal
    /// features of anchored types keep their original length. `offset` is
    /// added to every resulting coordinate. Grouping is cleared.
    pub fn map_feature_coords(
        &self,
        features: &mut FeatureSet,
        from: CoordFrame,
        to: CoordFrame,
        offset: i64,
    ) -> AlignmentResult<()> {
        if from == to {
            for f in &mut features.features {
                f.start += offset;
                f.end += offset;
            }
            return Ok(());
        }
        for frame in [from, to] {
            if let CoordFrame::Row(row) = frame {
                self.check_row(row)?;
            }
        }

        let mut maps: Vec<Option<CoordMap>> = vec![None; self.nseqs()];
        let mut kept = Vec::with_capacity(features.len());

        for mut feat in std::mem::take(&mut features.features) {
            let Some(from_row) = self.resolve_frame(from, &feat.seqname) else {
                continue;
            };
            let Some(to_row) = self.resolve_frame(to, &feat.seqname) else {
                continue;
            };
            for row in [from_row, to_row].into_iter().flatten() {
                if maps[row].is_none() {
                    maps[row] = Some(CoordMap::build(self, row)?);
                }
            }
            let from_map = from_row.and_then(|r| maps[r].as_ref());
            let to_map = to_row.and_then(|r| maps[r].as_ref());

            let map_pos = |pos: i64| {
                usize::try_from(pos)
                    .ok()
                    .and_then(|p| CoordMap::seq_to_seq(from_map, to_map, p))
                    .map(|p| p as i64)
            };
            let orig_span = feat.end - feat.start;
            let s = map_pos(feat.start);
            let e = map_pos(feat.end);
            if s.is_none() && e.is_none() {
                continue;
            }
            let to_len = to_map.map_or(self.length, CoordMap::seq_len) as i64;
            feat.start = s.unwrap_or(1) + offset;
            feat.end = e.unwrap_or(to_len) + offset;

            if feat.end - feat.start != orig_span {
                let lanchor = LEFT_ANCHORED.contains(&feat.feature.as_str());
                let ranchor = RIGHT_ANCHORED.contains(&feat.feature.as_str());
                let fwd = feat.strand == Strand::Forward;
                let rev = feat.strand == Strand::Reverse;
                if (lanchor && fwd) || (ranchor && rev) {
                    feat.end = feat.start + orig_span;
                } else if (ranchor && fwd) || (lanchor && rev) {
                    feat.start = feat.end - orig_span;
                }
            }
            kept.push(feat);
        }

        features.features = kept;
        features.ungroup();
        Ok(())
    }

    /// `Some(None)` for the alignment frame, `Some(Some(row))` for a row,
    /// `None` if the feature's sequence name is not in the alignment.
    fn resolve_frame(&self, frame: CoordFrame, seqname: &str) -> Option<Option<usize>> {
        match frame {
            CoordFrame::Alignment => Some(None),
            CoordFrame::Row(row) => Some(Some(row)),
            CoordFrame::InferFromName if seqname.eq_ignore_ascii_case(MSA_FRAME_NAME) => Some(None),
            CoordFrame::InferFromName => match self.seq_idx(seqname) {
                Some(row) => Some(Some(row)),
                None => {
                    log::warn!("Dropping feature on '{}': name not present in alignment", seqname);
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::SimpleCategoryMap;
    use crate::features::Feature;

    fn aln(seqs: &[&str]) -> Alignment {
        let names = (0..seqs.len()).map(|i| format!("s{}", i)).collect();
        let rows = seqs.iter().map(|s| s.as_bytes().to_vec()).collect();
        Alignment::new(names, rows, None).unwrap()
    }

    fn cm() -> SimpleCategoryMap {
        "NCATS = 5\nCDS 1-3\nintron 4\nUTR 5\nLABELLING_PRECEDENCE = 1,2,3,4"
            .parse()
            .unwrap()
    }

    #[test]
    fn test_label_simple_and_cyclic() {
        let mut a = aln(&["ACGTACGTAC"]);
        let mut cds = Feature::new("s0", "CDS", 2, 7, Strand::Forward);
        cds.frame = Some(1);
        let feats = FeatureSet::new(vec![Feature::new("s0", "intron", 8, 9, Strand::Forward), cds]);
        a.label_categories(&feats, &cm());
        assert_eq!(a.categories().unwrap(), &[0, 2, 3, 1, 2, 3, 1, 4, 4, 0]);
        assert_eq!(a.ncats(), Some(6));
    }

    #[test]
    fn test_label_reverse_strand_cycle() {
        let mut a = aln(&["ACGTAC"]);
        let feats = FeatureSet::new(vec![Feature::new("s0", "CDS", 1, 6, Strand::Reverse)]);
        a.label_categories(&feats, &cm());
        assert_eq!(a.categories().unwrap(), &[3, 2, 1, 3, 2, 1]);
    }

    #[test]
    fn test_precedence_independent_of_order() {
        let intron = Feature::new("s0", "intron", 1, 4, Strand::Forward);
        let cds = Feature::new("s0", "CDS", 3, 5, Strand::Forward);
        for feats in [vec![intron.clone(), cds.clone()], vec![cds, intron]] {
            let mut a = aln(&["ACGTAC"]);
            a.label_categories(&FeatureSet::new(feats), &cm());
            assert_eq!(a.categories().unwrap(), &[4, 4, 1, 2, 3, 0]);
        }
    }

    #[test]
    fn test_unranked_label_yields_to_ranked() {
        let mut a = aln(&["ACGTAC"]);
        let feats = FeatureSet::new(vec![
            Feature::new("s0", "intron", 1, 3, Strand::Forward),
            Feature::new("s0", "UTR", 2, 5, Strand::Forward),
        ]);
        a.label_categories(&feats, &cm());
        assert_eq!(a.categories().unwrap(), &[4, 4, 4, 5, 5, 0]);
    }

    #[test]
    fn test_unranked_label_replaces_unranked() {
        let unranked: SimpleCategoryMap = "NCATS = 2\nintron 1\nUTR 2".parse().unwrap();
        let mut a = aln(&["ACGTAC"]);
        let feats = FeatureSet::new(vec![
            Feature::new("s0", "intron", 1, 3, Strand::Forward),
            Feature::new("s0", "UTR", 2, 5, Strand::Forward),
        ]);
        a.label_categories(&feats, &unranked);
        assert_eq!(a.categories().unwrap(), &[1, 2, 2, 2, 2, 0]);
    }

    #[test]
    fn test_label_skips_bad_features() {
        let mut a = aln(&["ACGT"]);
        let feats = FeatureSet::new(vec![
            Feature::new("s0", "intron", 3, 5, Strand::Forward),
            Feature::new("s0", "intron", 0, 2, Strand::Forward),
            Feature::new("s0", "exon", 1, 2, Strand::Forward),
            Feature::new("s0", "intron", 4, 4, Strand::Forward),
        ]);
        a.label_categories(&feats, &cm());
        assert_eq!(a.categories().unwrap(), &[0, 0, 0, 4]);
    }

    #[test]
    fn test_label_updates_category_counts() {
        let mut a = aln(&["ACGT"]);
        a.build_stats(1, true).unwrap();
        let feats = FeatureSet::new(vec![Feature::new("s0", "intron", 1, 2, Strand::Forward)]);
        a.label_categories(&feats, &cm());
        let cc = a.stats().unwrap().cat_counts().unwrap();
        assert_eq!(cc.len(), 6);
        assert_eq!(cc[4].iter().sum::<usize>(), 2);
        assert_eq!(cc[0].iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_project_row_to_alignment() {
        let a = aln(&["--AC--GT-A", "ACACACGTAA"]);
        let mut feats = FeatureSet::new(vec![
            Feature::new("s0", "exon", 2, 3, Strand::Forward),
            Feature::new("s0", "exon", 7, 9, Strand::Forward),
        ]);
        feats.group_by_tag("gene_id");
        a.map_feature_coords(&mut feats, CoordFrame::InferFromName, CoordFrame::Alignment, 0)
            .unwrap();
        assert_eq!(feats.len(), 1);
        assert_eq!((feats.features[0].start, feats.features[0].end), (4, 7));
        assert!(feats.groups().is_none());
    }

    #[test]
    fn test_project_truncates_partial_features() {
        let a = aln(&["--AC--GT", "ACACACGT"]);
        let mut feats = FeatureSet::new(vec![Feature::new("MSA", "exon", 1, 4, Strand::Forward)]);
        a.map_feature_coords(&mut feats, CoordFrame::InferFromName, CoordFrame::Row(0), 10)
            .unwrap();
        // column 1 precedes row 0's first base; start falls back to 1
        assert_eq!((feats.features[0].start, feats.features[0].end), (11, 12));
    }

    #[test]
    fn test_project_anchored_keeps_length() {
        let a = aln(&["AC--GT", "ACACGT"]);
        let mut feats = FeatureSet::new(vec![
            Feature::new("s1", "start_codon", 2, 4, Strand::Forward),
            Feature::new("s1", "3'splice", 2, 4, Strand::Forward),
        ]);
        a.map_feature_coords(&mut feats, CoordFrame::InferFromName, CoordFrame::Row(0), 0)
            .unwrap();
        // columns 2..4 map to row 0 positions 2..2; anchored types restore the span
        assert_eq!((feats.features[0].start, feats.features[0].end), (2, 4));
        assert_eq!((feats.features[1].start, feats.features[1].end), (0, 2));
    }

    #[test]
    fn test_project_unknown_name_is_dropped() {
        let a = aln(&["ACGT"]);
        let mut feats = FeatureSet::new(vec![
            Feature::new("chrZ", "exon", 1, 2, Strand::Forward),
            Feature::new("s0", "exon", 1, 2, Strand::Forward),
        ]);
        a.map_feature_coords(&mut feats, CoordFrame::InferFromName, CoordFrame::Alignment, 0)
            .unwrap();
        assert_eq!(feats.len(), 1);
        assert_eq!(feats.features[0].seqname, "s0");
    }

    #[test]
    fn test_same_frame_only_offsets() {
        let a = aln(&["ACGT"]);
        let mut feats = FeatureSet::new(vec![Feature::new("s0", "exon", 1, 2, Strand::Forward)]);
        a.map_feature_coords(&mut feats, CoordFrame::Row(0), CoordFrame::Row(0), 5)
            .unwrap();
        assert_eq!((feats.features[0].start, feats.features[0].end), (6, 7));
    }
}
