//! Sufficient-statistics (SS) reader and writer.
//!
//! ```text
//! NSEQS = 2
//! LENGTH = 5
//! TUPLE_SIZE = 1
//! NTUPLES = 2
//! NAMES = human,mouse
//! ALPHABET = ACGT
//! IDX_OFFSET = 0
//!
//! 0	AA	3
//! 1	CG	2
//! IDX_ORDER:
//! 0
//! 1
//! ...
//! ```
//!
//! A tuple is written column by column, oldest column first, columns
//! separated by spaces. `NCATS = n` announces `n` per-category counts
//! after the total count. The `IDX_ORDER:` section, when present, maps
//! each alignment column to its tuple and makes the view ordered.

use std::io::Write;

use thiserror::Error;

use crate::alphabet::{Alphabet, AlphabetError};
use crate::model::{Alignment, AlignmentError};
use crate::suff_stats::SufficientStats;

#[derive(Error, Debug)]
pub enum SsError {
    #[error("Write failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing header field {0}")]
    MissingHeader(&'static str),

    #[error("Line {line}: invalid value '{value}' for {key}")]
    BadHeaderValue { line: usize, key: String, value: String },

    #[error("NAMES lists {found} sequences, NSEQS says {expected}")]
    NameCount { expected: usize, found: usize },

    #[error("Expected {expected} tuples but found {found}")]
    TupleCount { expected: usize, found: usize },

    #[error("Line {line}: {message}")]
    BadTupleLine { line: usize, message: String },

    #[error("Line {line}: invalid tuple index '{value}' in IDX_ORDER")]
    BadOrderIndex { line: usize, value: String },

    #[error("Invalid alphabet: {0}")]
    Alphabet(#[from] AlphabetError),

    #[error("{0}")]
    Alignment(#[from] AlignmentError),
}

pub type SsResult<T> = Result<T, SsError>;

/// Reads a count written either as an integer or as a float.
fn parse_count(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as usize)
    })
}

#[derive(Default)]
struct Header {
    nseqs: Option<usize>,
    length: Option<usize>,
    tuple_size: Option<usize>,
    ntuples: Option<usize>,
    names: Option<Vec<String>>,
    alphabet: Option<String>,
    idx_offset: i64,
    ncats: Option<usize>,
}

impl Header {
    fn set(&mut self, line: usize, key: &str, value: &str) -> SsResult<()> {
        let bad = || SsError::BadHeaderValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "NSEQS" => self.nseqs = Some(value.parse().map_err(|_| bad())?),
            "LENGTH" => self.length = Some(value.parse().map_err(|_| bad())?),
            "TUPLE_SIZE" => self.tuple_size = Some(value.parse().map_err(|_| bad())?),
            "NTUPLES" => self.ntuples = Some(value.parse().map_err(|_| bad())?),
            "NAMES" => self.names = Some(value.split(',').map(|n| n.trim().to_string()).collect()),
            "ALPHABET" => self.alphabet = Some(value.to_string()),
            "IDX_OFFSET" => self.idx_offset = value.parse().map_err(|_| bad())?,
            "NCATS" => self.ncats = Some(value.parse().map_err(|_| bad())?),
            _ => log::debug!("Ignoring SS header field {}", key),
        }
        Ok(())
    }
}

/// Parses SS content into a compressed-only alignment.
///
/// `alphabet` overrides the alphabet declared in the file.
pub fn parse_ss_str(content: &str, alphabet: Option<&Alphabet>) -> SsResult<Alignment> {
    let mut header = Header::default();
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    // header, up to the first tuple line
    let mut first_tuple = None;
    for (line, text) in lines.by_ref() {
        if text.is_empty() {
            continue;
        }
        if text.starts_with(|c: char| c.is_ascii_digit()) {
            first_tuple = Some((line, text));
            break;
        }
        match text.split_once('=') {
            Some((key, value)) => header.set(line, &key.trim().to_ascii_uppercase(), value.trim())?,
            None => {
                return Err(SsError::BadHeaderValue {
                    line,
                    key: String::new(),
                    value: text.to_string(),
                })
            }
        }
    }

    let nseqs = header.nseqs.ok_or(SsError::MissingHeader("NSEQS"))?;
    let length = header.length.ok_or(SsError::MissingHeader("LENGTH"))?;
    let tuple_size = header.tuple_size.unwrap_or(1).max(1);
    let names = header
        .names
        .take()
        .unwrap_or_else(|| (1..=nseqs).map(|i| format!("seq{}", i)).collect());
    if names.len() != nseqs {
        return Err(SsError::NameCount {
            expected: nseqs,
            found: names.len(),
        });
    }
    let alphabet = match (alphabet, &header.alphabet) {
        (Some(alph), _) => alph.clone(),
        (None, Some(symbols)) => Alphabet::new(symbols)?,
        (None, None) => Alphabet::default(),
    };

    let width = nseqs * tuple_size;
    let mut tuples: Vec<Vec<u8>> = Vec::with_capacity(header.ntuples.unwrap_or(0));
    let mut counts = Vec::with_capacity(tuples.capacity());
    let mut cat_counts: Option<Vec<Vec<usize>>> = header.ncats.map(|n| vec![Vec::new(); n]);
    let mut tuple_idx: Option<Vec<usize>> = None;

    let mut next = first_tuple;
    while let Some((line, text)) = next {
        if text.eq_ignore_ascii_case("IDX_ORDER:") {
            tuple_idx = Some(Vec::with_capacity(length));
            break;
        }
        if !text.is_empty() {
            let bad = |message: String| SsError::BadTupleLine { line, message };
            let fields: Vec<&str> = text.split('\t').collect();
            if fields.len() < 3 {
                return Err(bad("expected index, tuple and count".to_string()));
            }
            match fields[0].trim().parse::<usize>() {
                Ok(idx) if idx == tuples.len() => {}
                _ => return Err(bad(format!("expected tuple index {}, got '{}'", tuples.len(), fields[0]))),
            }
            let groups: Vec<&[u8]> = fields[1].split(' ').filter(|g| !g.is_empty()).map(str::as_bytes).collect();
            if groups.len() != tuple_size || groups.iter().any(|g| g.len() != nseqs) {
                return Err(bad(format!("tuple '{}' does not describe {} x {} characters", fields[1], tuple_size, nseqs)));
            }
            let mut tuple = vec![0u8; width];
            for (g, group) in groups.iter().enumerate() {
                for (r, &c) in group.iter().enumerate() {
                    tuple[r * tuple_size + g] = c;
                }
            }
            tuples.push(tuple);
            counts.push(parse_count(fields[2].trim()).ok_or_else(|| bad(format!("invalid count '{}'", fields[2])))?);
            if let Some(per_cat) = cat_counts.as_mut() {
                if fields.len() != 3 + per_cat.len() {
                    return Err(bad(format!("expected {} category counts", per_cat.len())));
                }
                for (cat, value) in per_cat.iter_mut().zip(&fields[3..]) {
                    cat.push(parse_count(value.trim()).ok_or_else(|| bad(format!("invalid count '{}'", value)))?);
                }
            }
        }
        next = lines.next();
    }

    if let Some(expected) = header.ntuples {
        if expected != tuples.len() {
            return Err(SsError::TupleCount {
                expected,
                found: tuples.len(),
            });
        }
    }

    if let Some(order) = tuple_idx.as_mut() {
        for (line, text) in lines {
            for value in text.split_whitespace() {
                match value.parse::<usize>() {
                    Ok(t) if t < tuples.len() => order.push(t),
                    _ => {
                        return Err(SsError::BadOrderIndex {
                            line,
                            value: value.to_string(),
                        })
                    }
                }
            }
        }
    }

    let ncats = header.ncats;
    let stats = SufficientStats::from_parts(nseqs, tuple_size, tuples, counts, cat_counts, tuple_idx);
    let mut aln = Alignment::from_stats(names, stats, length, &alphabet)?;
    aln.idx_offset = header.idx_offset;
    aln.ncats = ncats;
    Ok(aln)
}

/// Writes the compressed view of an alignment.
///
/// Alignments without one are compressed on the fly (tuple size 1,
/// ordered).
pub fn write_ss<W: Write>(writer: &mut W, aln: &Alignment) -> SsResult<()> {
    let built;
    let stats = match aln.stats() {
        Some(stats) => stats,
        None => {
            let rows = aln.rows().ok_or(AlignmentError::NoCompressedView)?;
            let cats = match (aln.categories(), aln.ncats()) {
                (Some(cats), Some(ncats)) => Some((cats, ncats)),
                _ => None,
            };
            built = SufficientStats::from_rows(rows, 1, true, cats);
            &built
        }
    };
    let ts = stats.tuple_size();
    let nseqs = stats.nseqs();

    writeln!(writer, "NSEQS = {}", nseqs)?;
    writeln!(writer, "LENGTH = {}", aln.length())?;
    writeln!(writer, "TUPLE_SIZE = {}", ts)?;
    writeln!(writer, "NTUPLES = {}", stats.ntuples())?;
    writeln!(writer, "NAMES = {}", aln.names().join(","))?;
    writeln!(writer, "ALPHABET = {}", aln.alphabet().as_str())?;
    writeln!(writer, "IDX_OFFSET = {}", aln.idx_offset)?;
    if let Some(cat_counts) = stats.cat_counts() {
        writeln!(writer, "NCATS = {}", cat_counts.len())?;
    }
    writeln!(writer)?;

    let mut text = String::with_capacity(ts * (nseqs + 1));
    for t in 0..stats.ntuples() {
        text.clear();
        let tuple = stats.tuple(t);
        for g in 0..ts {
            if g > 0 {
                text.push(' ');
            }
            text.extend((0..nseqs).map(|r| tuple[r * ts + g] as char));
        }
        write!(writer, "{}\t{}\t{}", t, text, stats.counts()[t])?;
        if let Some(cat_counts) = stats.cat_counts() {
            for per_cat in cat_counts {
                write!(writer, "\t{}", per_cat[t])?;
            }
        }
        writeln!(writer)?;
    }

    if let Some(order) = stats.tuple_idx() {
        writeln!(writer, "IDX_ORDER:")?;
        for t in order {
            writeln!(writer, "{}", t)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_of(a: &Alignment) -> Vec<String> {
        let view = a.char_view().unwrap();
        (0..a.nseqs())
            .map(|r| String::from_utf8(view.row_vec(r, a.length())).unwrap())
            .collect()
    }

    #[test]
    fn test_write_ss_builds_stats() {
        let mut aln = Alignment::new(
            vec!["h".into(), "m".into()],
            vec![b"ACA".to_vec(), b"AGA".to_vec()],
            None,
        )
        .unwrap();
        aln.idx_offset = 100;
        let mut out = Vec::new();
        write_ss(&mut out, &aln).unwrap();
        let expected = "NSEQS = 2\nLENGTH = 3\nTUPLE_SIZE = 1\nNTUPLES = 2\nNAMES = h,m\n\
                        ALPHABET = ACGT\nIDX_OFFSET = 100\n\n\
                        0\tAA\t2\n1\tCG\t1\nIDX_ORDER:\n0\n1\n0\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_read_ordered_dinucleotides() {
        let mut aln = Alignment::new(
            vec!["h".into(), "m".into()],
            vec![b"ACGTAC".to_vec(), b"ACGAAC".to_vec()],
            None,
        )
        .unwrap();
        aln.build_stats(2, true).unwrap();
        let mut out = Vec::new();
        write_ss(&mut out, &aln).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("TUPLE_SIZE = 2"));
        // first column sees a gap before it
        assert!(text.contains("0\t-- AA\t1"));

        let back = parse_ss_str(&text, None).unwrap();
        assert!(back.rows().is_none());
        assert_eq!(back.stats().unwrap().tuple_size(), 2);
        assert_eq!(rows_of(&back), rows_of(&aln));
    }

    #[test]
    fn test_read_unordered_with_categories() {
        let content = "NSEQS = 2\nLENGTH = 5\nTUPLE_SIZE = 1\nNTUPLES = 2\nNAMES = a,b\n\
                       ALPHABET = ACGT\nIDX_OFFSET = 3\nNCATS = 2\n\n\
                       0\tAA\t3\t1\t2\n1\tCG\t2.000000\t2\t0\n";
        let aln = parse_ss_str(content, None).unwrap();
        assert_eq!(aln.length(), 5);
        assert_eq!(aln.idx_offset, 3);
        assert_eq!(aln.ncats(), Some(2));
        let stats = aln.stats().unwrap();
        assert!(!stats.is_ordered());
        assert_eq!(stats.counts(), &[3, 2]);
        assert_eq!(stats.cat_counts().unwrap()[1], vec![2, 0]);
        assert!(aln.char_view().is_err());
    }

    #[test]
    fn test_alphabet_override() {
        let content = "NSEQS = 1\nLENGTH = 1\nNAMES = a\nALPHABET = ACGT\n\n0\tA\t1\n";
        let alph = Alphabet::new("ACGTN").unwrap();
        assert_eq!(parse_ss_str(content, Some(&alph)).unwrap().alphabet().as_str(), "ACGTN");
        assert_eq!(parse_ss_str(content, None).unwrap().alphabet().as_str(), "ACGT");
    }

    #[test]
    fn test_malformed_ss() {
        let missing = "LENGTH = 1\n\n0\tA\t1\n";
        assert!(matches!(parse_ss_str(missing, None), Err(SsError::MissingHeader("NSEQS"))));

        let names = "NSEQS = 2\nLENGTH = 1\nNAMES = a\n\n0\tAC\t1\n";
        assert!(matches!(
            parse_ss_str(names, None),
            Err(SsError::NameCount { expected: 2, found: 1 })
        ));

        let short = "NSEQS = 2\nLENGTH = 1\nNAMES = a,b\n\n0\tA\t1\n";
        assert!(matches!(parse_ss_str(short, None), Err(SsError::BadTupleLine { line: 5, .. })));

        let order = "NSEQS = 1\nLENGTH = 2\nNAMES = a\n\n0\tA\t2\nIDX_ORDER:\n0\n7\n";
        assert!(matches!(parse_ss_str(order, None), Err(SsError::BadOrderIndex { line: 8, .. })));

        let ntuples = "NSEQS = 1\nLENGTH = 1\nNTUPLES = 2\nNAMES = a\n\n0\tA\t1\n";
        assert!(matches!(
            parse_ss_str(ntuples, None),
            Err(SsError::TupleCount { expected: 2, found: 1 })
        ));
    }
}
