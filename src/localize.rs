// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Localization of contigs to reference subregions, based on exact k-mer
//! matches (seeds) against the reference.

use std::cmp;
use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use itertools::Itertools;

use crate::constants::{DEFAULT_REGION_DELTA, DEFAULT_REGION_MAXSPAN};
use crate::errors::Error;
use crate::reference::SeqRecord;
use crate::variants::locus::subregion_id;

/// Per sequence, the tightest interval covering all seed matches.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: BTreeMap<String, (u64, u64)>,
}

impl IntervalSet {
    pub fn new() -> Self {
        IntervalSet::default()
    }

    /// Register a seed match of a k-mer at `pos`.
    pub fn add(&mut self, seqid: &str, pos: u64, ksize: u64) {
        let (start, end) = (pos, pos.saturating_add(ksize));
        self.intervals
            .entry(seqid.to_owned())
            .and_modify(|interval| {
                interval.0 = cmp::min(interval.0, start);
                interval.1 = cmp::max(interval.1, end);
            })
            .or_insert((start, end));
    }

    /// Half-open interval covering all seeds on the given sequence.
    pub fn get(&self, seqid: &str) -> Option<(u64, u64)> {
        self.intervals.get(seqid).copied()
    }

    pub fn seqids(&self) -> impl Iterator<Item = &str> {
        self.intervals.keys().map(|seqid| seqid.as_str())
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Cut the seeded interval of each given reference sequence, widened by
    /// `delta` on both sides, into a record named `SEQID_START-END`.
    ///
    /// Fails if there are no seeds at all, if a region is longer than
    /// `maxspan` or if a seeded sequence is not among the given ones. Seeds
    /// past the end of their sequence yield an empty region.
    pub fn extract_regions(
        &self,
        sequences: &[SeqRecord],
        delta: u64,
        maxspan: u64,
    ) -> Result<Vec<SeqRecord>> {
        if self.is_empty() {
            return Err(Error::NoReferenceMatches.into());
        }
        let mut observed = HashSet::new();
        let mut regions = Vec::new();
        for record in sequences {
            observed.insert(record.name().as_str());
            let (start, end) = match self.get(record.name()) {
                Some(interval) => interval,
                None => continue,
            };

            let end = cmp::min(end.saturating_add(delta), record.len() as u64);
            let start = cmp::min(start.saturating_sub(delta), end);
            let span = end.saturating_sub(start);
            if span > maxspan {
                return Err(Error::VariantLocalization { span, maxspan }.into());
            }
            debug!("Localized region {}:{}-{}.", record.name(), start, end);
            regions.push(SeqRecord::new(
                subregion_id(record.name(), start, end),
                record.sequence()[start as usize..end as usize].to_owned(),
            ));
        }

        let missing = self
            .seqids()
            .filter(|seqid| !observed.contains(seqid))
            .collect_vec();
        if !missing.is_empty() {
            return Err(Error::ReferenceSequenceNotFound {
                seqids: missing.join(","),
            }
            .into());
        }
        Ok(regions)
    }

    /// Like [`IntervalSet::extract_regions`], with 50 bp padding and regions
    /// of at most 1000 bp.
    pub fn extract_default_regions(&self, sequences: &[SeqRecord]) -> Result<Vec<SeqRecord>> {
        self.extract_regions(sequences, DEFAULT_REGION_DELTA, DEFAULT_REGION_MAXSPAN)
    }
}
