// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use bio::alignment::pairwise;
use bio::alignment::AlignmentOperation;
use bio::alphabets::dna;
use itertools::Itertools;

use crate::constants::{DEFAULT_GAP_EXTEND, DEFAULT_GAP_OPEN, DEFAULT_MATCH, DEFAULT_MISMATCH};

pub mod cigar;

pub use self::cigar::{Cigar, IndelKind};

/// Alignment scores. Mismatch and gap values are penalties, i.e. positive
/// numbers that are subtracted from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentScoring {
    pub match_score: i32,
    pub mismatch: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for AlignmentScoring {
    fn default() -> Self {
        AlignmentScoring {
            match_score: DEFAULT_MATCH,
            mismatch: DEFAULT_MISMATCH,
            gap_open: DEFAULT_GAP_OPEN,
            gap_extend: DEFAULT_GAP_EXTEND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Strand {
    #[strum(serialize = "+")]
    Forward,
    #[strum(serialize = "-")]
    Reverse,
}

/// Result of aligning a query against a target.
#[derive(new, Getters, CopyGetters, Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Run-length operation string, see [`cigar`].
    #[getset(get = "pub")]
    cigar: String,
    #[getset(get_copy = "pub")]
    score: i32,
}

/// Alignment collaborator. Implementations align the whole query against a
/// substring of the target and report unaligned target flanks as `D` runs.
pub trait Aligner: Sync {
    fn align(&self, target: &[u8], query: &[u8], scoring: &AlignmentScoring) -> Alignment;

    /// Align the query and its reverse complement, returning the better of both.
    /// The reverse strand is only chosen if it scores strictly higher.
    fn align_both_strands(
        &self,
        target: &[u8],
        query: &[u8],
        scoring: &AlignmentScoring,
    ) -> (Alignment, Strand) {
        let forward = self.align(target, query, scoring);
        let reverse = self.align(target, &dna::revcomp(query), scoring);
        if reverse.score() > forward.score() {
            (reverse, Strand::Reverse)
        } else {
            (forward, Strand::Forward)
        }
    }
}

/// Semiglobal aligner based on the dynamic programming implementation of rust-bio.
#[derive(Default, Debug, Clone, Copy)]
pub struct PairwiseAligner;

impl Aligner for PairwiseAligner {
    fn align(&self, target: &[u8], query: &[u8], scoring: &AlignmentScoring) -> Alignment {
        let (match_score, mismatch) = (scoring.match_score, -scoring.mismatch);
        let score = |a: u8, b: u8| {
            if a.to_ascii_uppercase() == b.to_ascii_uppercase() {
                match_score
            } else {
                mismatch
            }
        };
        let mut aligner = pairwise::Aligner::with_capacity(
            query.len(),
            target.len(),
            -scoring.gap_open,
            -scoring.gap_extend,
            score,
        );
        let alignment = aligner.semiglobal(query, target);

        let ops = alignment
            .operations
            .iter()
            .filter_map(|op| match op {
                AlignmentOperation::Match | AlignmentOperation::Subst => Some('M'),
                AlignmentOperation::Ins => Some('I'),
                AlignmentOperation::Del => Some('D'),
                AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => None,
            })
            .dedup_with_count()
            .map(|(count, op)| format!("{}{}", count, op))
            .join("");
        let cigar = format!(
            "{}D{}{}D",
            alignment.ystart,
            ops,
            alignment.ylen - alignment.yend
        );

        Alignment::new(cigar, alignment.score)
    }
}
