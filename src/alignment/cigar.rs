// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Interpretation of the run-length operation strings reported by
//! [`crate::alignment::Aligner`].
//!
//! The query is aligned end to end inside the target. Target bases left and
//! right of the aligned query are reported as `D` runs, so every callable
//! alignment starts with `<offset>D` and ends with `<offset2>D`, optionally
//! followed by a short trailing match.

use regex::Regex;

use crate::constants::MAX_TRAILING_MATCH;

lazy_static! {
    static ref CIGAR_VALID: Regex = Regex::new(r"^(?:\d+[DIM])+$").unwrap();
    static ref CIGAR_OP: Regex = Regex::new(r"(\d+)([DIM])").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum IndelKind {
    #[strum(serialize = "I")]
    Insertion,
    #[strum(serialize = "D")]
    Deletion,
}

/// A callable alignment shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cigar {
    /// A gapless window of `length` bases, starting `offset` bases into the target.
    Snv { offset: u64, length: u64 },
    /// A single insertion or deletion of `length` bases, flanked by `left_match`
    /// and `right_match` aligned bases.
    Indel {
        offset: u64,
        left_match: u64,
        kind: IndelKind,
        length: u64,
        right_match: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Match(u64),
    Ins(u64),
    Del(u64),
}

impl Op {
    fn indel(self) -> Option<(IndelKind, u64)> {
        match self {
            Op::Ins(len) => Some((IndelKind::Insertion, len)),
            Op::Del(len) => Some((IndelKind::Deletion, len)),
            Op::Match(_) => None,
        }
    }
}

fn tokenize(cigar: &str) -> Option<Vec<Op>> {
    if !CIGAR_VALID.is_match(cigar) {
        return None;
    }
    CIGAR_OP
        .captures_iter(cigar)
        .map(|caps| {
            let len: u64 = caps[1].parse().ok()?;
            Some(match &caps[2] {
                "M" => Op::Match(len),
                "I" => Op::Ins(len),
                _ => Op::Del(len),
            })
        })
        .collect()
}

impl Cigar {
    /// Interpret the given operation string. Returns `None` for any shape
    /// that cannot be called.
    pub fn interpret(cigar: &str) -> Option<Self> {
        use self::Op::*;

        let ops = tokenize(cigar)?;
        match *ops.as_slice() {
            [Del(offset), Match(length), Del(_)] => Some(Cigar::Snv { offset, length }),
            [Del(offset), Match(length), Del(_), Match(tail)] if tail <= MAX_TRAILING_MATCH => {
                Some(Cigar::Snv { offset, length })
            }
            [Del(offset), Match(left_match), op, Match(right_match), Del(_)] => {
                Cigar::indel(offset, left_match, op, right_match)
            }
            [Del(offset), Match(left_match), op, Match(right_match), Del(_), Match(tail)]
                if tail <= MAX_TRAILING_MATCH =>
            {
                Cigar::indel(offset, left_match, op, right_match)
            }
            _ => None,
        }
    }

    fn indel(offset: u64, left_match: u64, op: Op, right_match: u64) -> Option<Self> {
        let (kind, length) = op.indel()?;
        Some(Cigar::Indel {
            offset,
            left_match,
            kind,
            length,
            right_match,
        })
    }

    /// Number of leading target bases not covered by the query.
    pub fn offset(&self) -> u64 {
        match self {
            Cigar::Snv { offset, .. } | Cigar::Indel { offset, .. } => *offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snv_window() {
        assert_eq!(
            Cigar::interpret("10D83M7D"),
            Some(Cigar::Snv {
                offset: 10,
                length: 83
            })
        );
        assert_eq!(
            Cigar::interpret("0D16M0D"),
            Some(Cigar::Snv {
                offset: 0,
                length: 16
            })
        );
    }

    #[test]
    fn test_snv_window_trailing_match() {
        assert_eq!(
            Cigar::interpret("50D132M43D5M"),
            Some(Cigar::Snv {
                offset: 50,
                length: 132
            })
        );
        assert_eq!(Cigar::interpret("50D132M43D6M"), None);
    }

    #[test]
    fn test_indel() {
        assert_eq!(
            Cigar::interpret("50D40M3D60M50D"),
            Some(Cigar::Indel {
                offset: 50,
                left_match: 40,
                kind: IndelKind::Deletion,
                length: 3,
                right_match: 60
            })
        );
        assert_eq!(
            Cigar::interpret("5D12M2I30M8D3M"),
            Some(Cigar::Indel {
                offset: 5,
                left_match: 12,
                kind: IndelKind::Insertion,
                length: 2,
                right_match: 30
            })
        );
        assert_eq!(Cigar::interpret("5D12M2I30M8D9M"), None);
    }

    #[test]
    fn test_inscrutable() {
        for cigar in &[
            "",
            "100M",
            "5D10M3I4M2D6M1D",
            "5D10M3M4M2D",
            "5D10M3X4M2D",
            "5D10M1I2M1D2M4D",
            "D10M4D",
            "5S10M4D",
        ] {
            assert_eq!(Cigar::interpret(cigar), None, "{} should not be callable", cigar);
        }
    }
}
