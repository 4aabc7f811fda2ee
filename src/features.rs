//! Feature sets (GFF annotations).
//!
//! Coordinates are 1-based and inclusive. A [`FeatureSet`] may be grouped
//! by an attribute tag (e.g. `transcript_id`); groups are needed to
//! reverse complement whole genes at once.

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};

use thiserror::Error;

/// Errors that can occur when reading or writing features.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {msg}")]
    Parse { line: usize, msg: String },
}

/// Result type for feature operations.
pub type FeatureResult<T> = Result<T, FeatureError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unknown,
}

impl Strand {
    fn from_gff(field: &str) -> Option<Self> {
        match field {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            "." | "?" => Some(Strand::Unknown),
            _ => None,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
            Strand::Unknown => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// One GFF record.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub seqname: String,
    pub source: String,
    /// Feature type, e.g. `CDS` or `start_codon`.
    pub feature: String,
    pub start: i64,
    pub end: i64,
    pub score: Option<f64>,
    pub strand: Strand,
    /// Reading frame (0, 1 or 2) when known.
    pub frame: Option<u8>,
    pub attribute: String,
}

impl Feature {
    pub fn new(seqname: &str, feature: &str, start: i64, end: i64, strand: Strand) -> Self {
        Self {
            seqname: seqname.to_string(),
            source: ".".to_string(),
            feature: feature.to_string(),
            start,
            end,
            score: None,
            strand,
            frame: None,
            attribute: String::new(),
        }
    }

    /// Value of an attribute tag, for both `tag "value";` and `tag=value;` styles.
    pub fn attribute_value(&self, tag: &str) -> Option<&str> {
        self.attribute.split(';').find_map(|part| {
            let part = part.trim();
            let (key, value) = part
                .split_once('=')
                .or_else(|| part.split_once(char::is_whitespace))?;
            (key.trim() == tag).then(|| value.trim().trim_matches('"'))
        })
    }

    fn parse(line: &str, line_no: usize) -> FeatureResult<Self> {
        let err = |msg: String| FeatureError::Parse { line: line_no, msg };
        let fields: Vec<&str> = line.splitn(9, '\t').collect();
        if fields.len() < 8 {
            return Err(err(format!("expected at least 8 tab-separated fields, got {}", fields.len())));
        }
        let start = fields[3]
            .trim()
            .parse()
            .map_err(|_| err(format!("bad start '{}'", fields[3])))?;
        let end = fields[4]
            .trim()
            .parse()
            .map_err(|_| err(format!("bad end '{}'", fields[4])))?;
        let score = match fields[5].trim() {
            "." => None,
            s => Some(s.parse().map_err(|_| err(format!("bad score '{}'", s)))?),
        };
        let strand = Strand::from_gff(fields[6].trim()).ok_or_else(|| err(format!("bad strand '{}'", fields[6])))?;
        let frame = match fields[7].trim() {
            "." => None,
            f => match f.parse::<u8>() {
                Ok(n) if n <= 2 => Some(n),
                _ => return Err(err(format!("bad frame '{}'", f))),
            },
        };
        Ok(Self {
            seqname: fields[0].to_string(),
            source: fields[1].to_string(),
            feature: fields[2].to_string(),
            start,
            end,
            score,
            strand,
            frame,
            attribute: fields.get(8).map_or_else(String::new, |a| a.trim_end().to_string()),
        })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t",
            self.seqname, self.source, self.feature, self.start, self.end
        )?;
        match self.score {
            Some(s) => write!(f, "{}\t", s)?,
            None => write!(f, ".\t")?,
        }
        write!(f, "{}\t", self.strand)?;
        match self.frame {
            Some(fr) => write!(f, "{}", fr)?,
            None => write!(f, ".")?,
        }
        if !self.attribute.is_empty() {
            write!(f, "\t{}", self.attribute)?;
        }
        Ok(())
    }
}

/// Features sharing a tag value, with their overall extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGroup {
    pub name: String,
    pub start: i64,
    pub end: i64,
    /// Indices into the owning set's features.
    pub members: Vec<usize>,
}

/// An ordered collection of features with optional grouping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
    groups: Option<Vec<FeatureGroup>>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features, groups: None }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn groups(&self) -> Option<&[FeatureGroup]> {
        self.groups.as_deref()
    }

    /// Groups features by the value of an attribute tag.
    ///
    /// Groups appear in order of first occurrence; features without the tag
    /// form singleton groups.
    pub fn group_by_tag(&mut self, tag: &str) {
        let mut groups: Vec<FeatureGroup> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (i, f) in self.features.iter().enumerate() {
            let slot = match f.attribute_value(tag) {
                Some(value) => *by_name.entry(value.to_string()).or_insert_with(|| {
                    groups.push(FeatureGroup {
                        name: value.to_string(),
                        start: f.start,
                        end: f.end,
                        members: Vec::new(),
                    });
                    groups.len() - 1
                }),
                None => {
                    groups.push(FeatureGroup {
                        name: String::new(),
                        start: f.start,
                        end: f.end,
                        members: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            let g = &mut groups[slot];
            g.start = g.start.min(f.start);
            g.end = g.end.max(f.end);
            g.members.push(i);
        }
        self.groups = Some(groups);
    }

    pub fn ungroup(&mut self) {
        self.groups = None;
    }

    /// True if every member of the group lies on the reverse strand.
    pub fn reverse_strand_only(&self, group: &FeatureGroup) -> bool {
        group
            .members
            .iter()
            .all(|&i| self.features[i].strand == Strand::Reverse)
    }

    /// Mirrors the members of a group within the group's extent and flips
    /// their strands.
    pub fn reverse_complement_group(&mut self, group: &FeatureGroup) {
        let pivot = group.start + group.end;
        for &i in &group.members {
            let f = &mut self.features[i];
            let (s, e) = (pivot - f.end, pivot - f.start);
            f.start = s;
            f.end = e;
            f.strand = f.strand.flip();
        }
    }

    /// Reads GFF records; blank lines and `#` lines are skipped.
    pub fn read_gff<R: BufRead>(reader: R) -> FeatureResult<Self> {
        let mut features = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            features.push(Feature::parse(&line, i + 1)?);
        }
        Ok(Self::new(features))
    }

    pub fn write_gff<W: Write>(&self, mut writer: W) -> FeatureResult<()> {
        for f in &self.features {
            writeln!(writer, "{}", f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GFF: &str = "\
##gff-version 2
chr1\tsim\tCDS\t10\t20\t.\t-\t0\ttranscript_id \"t1\"; gene_id \"g1\"
chr1\tsim\tstart_codon\t18\t20\t0.5\t-\t.\ttranscript_id \"t1\";
chr1\tsim\tCDS\t40\t50\t.\t+\t2\ttranscript_id=t2
chr1\tsim\tintron\t60\t70\t.\t.\t.
";

    #[test]
    fn test_read_gff() {
        let set = FeatureSet::read_gff(Cursor::new(GFF)).unwrap();
        assert_eq!(set.len(), 4);
        let f = &set.features[0];
        assert_eq!(f.feature, "CDS");
        assert_eq!((f.start, f.end), (10, 20));
        assert_eq!(f.strand, Strand::Reverse);
        assert_eq!(f.frame, Some(0));
        assert_eq!(f.attribute_value("gene_id"), Some("g1"));
        assert_eq!(set.features[1].score, Some(0.5));
        assert_eq!(set.features[2].attribute_value("transcript_id"), Some("t2"));
        assert_eq!(set.features[3].strand, Strand::Unknown);
        assert_eq!(set.features[3].attribute_value("transcript_id"), None);
    }

    #[test]
    fn test_bad_gff_line() {
        let err = FeatureSet::read_gff(Cursor::new("chr1\tsim\tCDS\tx\t20\t.\t+\t0\n"));
        assert!(matches!(err, Err(FeatureError::Parse { line: 1, .. })));
        let err = FeatureSet::read_gff(Cursor::new("chr1\tsim\tCDS\t1\t20\t.\t+\t5\n"));
        assert!(matches!(err, Err(FeatureError::Parse { .. })));
    }

    #[test]
    fn test_write_gff_round_trip() {
        let set = FeatureSet::read_gff(Cursor::new(GFF)).unwrap();
        let mut out = Vec::new();
        set.write_gff(&mut out).unwrap();
        let again = FeatureSet::read_gff(Cursor::new(out)).unwrap();
        assert_eq!(set, again);
    }

    #[test]
    fn test_group_by_tag() {
        let mut set = FeatureSet::read_gff(Cursor::new(GFF)).unwrap();
        set.group_by_tag("transcript_id");
        let groups = set.groups().unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "t1");
        assert_eq!((groups[0].start, groups[0].end), (10, 20));
        assert_eq!(groups[0].members, vec![0, 1]);
        assert!(set.reverse_strand_only(&groups[0]));
        assert!(!set.reverse_strand_only(&groups[1]));
        assert_eq!(groups[2].members, vec![3]);
    }

    #[test]
    fn test_reverse_complement_group() {
        let mut set = FeatureSet::read_gff(Cursor::new(GFF)).unwrap();
        set.group_by_tag("transcript_id");
        let g = set.groups().unwrap()[0].clone();
        set.reverse_complement_group(&g);
        assert_eq!((set.features[0].start, set.features[0].end), (10, 20));
        assert_eq!((set.features[1].start, set.features[1].end), (10, 12));
        assert_eq!(set.features[1].strand, Strand::Forward);
    }
}
