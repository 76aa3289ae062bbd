// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Reverse;

use anyhow::Result;
use derive_builder::Builder;
use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::alignment::{Aligner, Alignment, AlignmentScoring, PairwiseAligner, Strand};
use crate::constants::{DEFAULT_KSIZE, DEFAULT_MEAN, DEFAULT_SD};
use crate::errors::Error;
use crate::kmers::SampleEvidence;
use crate::model::{AbundanceModel, ErrorRate};
use crate::reference::SeqRecord;
use crate::variants::{call_variants, Variant};

/// Calls variants of query contigs against target subregions and, given
/// k-mer evidence, scores them for being de novo.
#[derive(Builder)]
#[builder(pattern = "owned", build_fn(name = "build_unchecked", private))]
pub struct Caller {
    #[builder(default = "Box::new(PairwiseAligner)")]
    aligner: Box<dyn Aligner>,
    #[builder(default)]
    scoring: AlignmentScoring,
    #[builder(default = "DEFAULT_KSIZE")]
    ksize: usize,
    #[builder(default, setter(strip_option))]
    evidence: Option<SampleEvidence>,
    /// Abundance model, defaults to mean 30, sd 8 and error rate 0.01.
    #[builder(default, setter(strip_option))]
    model: Option<AbundanceModel>,
}

impl CallerBuilder {
    /// Build the caller, checking k-mer sizes and error rates against the
    /// given sample evidence.
    pub fn build(self) -> Result<Caller> {
        let mut caller = self.build_unchecked()?;
        if caller.ksize == 0 {
            return Err(Error::InvalidKmerSize.into());
        }
        if let Some(ref evidence) = caller.evidence {
            evidence.check_ksize(caller.ksize)?;
            if caller.model.is_none() {
                caller.model = Some(AbundanceModel::new(
                    DEFAULT_MEAN,
                    DEFAULT_SD,
                    ErrorRate::default(),
                )?);
            }
            if let Some(ref model) = caller.model {
                model.error_rate().per_sample(evidence.n_samples())?;
            }
        }
        Ok(caller)
    }
}

impl Caller {
    fn likelihoods(&self) -> Option<(&SampleEvidence, &AbundanceModel)> {
        match (&self.evidence, &self.model) {
            (Some(evidence), Some(model)) => Some((evidence, model)),
            _ => None,
        }
    }

    /// Call variants of all queries, each against its best matching target.
    ///
    /// Queries are processed from longest to shortest. If likelihoods are
    /// computed, the result is ordered by decreasing de novo likelihood.
    pub fn call(&self, targets: &[SeqRecord], queries: &[SeqRecord]) -> Result<Vec<Variant>> {
        if targets.is_empty() {
            return Err(Error::NoTargets.into());
        }
        let mut targets = targets.iter().collect::<Vec<_>>();
        targets.sort_by(|a, b| a.name().cmp(b.name()));
        let mut queries = queries.iter().collect::<Vec<_>>();
        queries.sort_by_key(|query| Reverse(query.len()));

        let calls = queries
            .par_iter()
            .map(|query| self.call_query(&targets, query))
            .collect::<Result<Vec<_>>>()?;
        let mut variants = calls.into_iter().flatten().collect::<Vec<_>>();

        if self.likelihoods().is_some() {
            variants.sort_by_key(|variant| Reverse(OrderedFloat(variant.ranking_score())));
        }
        info!(
            "Called {} variants from {} queries against {} targets.",
            variants.iter().filter(|variant| !variant.is_nocall()).count(),
            queries.len(),
            targets.len()
        );
        Ok(variants)
    }

    /// Best alignment of the query over all targets and both strands. Ties are
    /// resolved in favor of the earlier target.
    pub fn best_alignment<'a>(
        &self,
        targets: &[&'a SeqRecord],
        query: &SeqRecord,
    ) -> Option<(&'a SeqRecord, Alignment, Strand)> {
        targets.iter().fold(None, |best, target| {
            let (alignment, strand) =
                self.aligner
                    .align_both_strands(target.sequence(), query.sequence(), &self.scoring);
            let better = best
                .as_ref()
                .map_or(true, |(_, best, _): &(_, Alignment, _)| {
                    alignment.score() > best.score()
                });
            if better {
                Some((*target, alignment, strand))
            } else {
                best
            }
        })
    }

    fn call_query(&self, targets: &[&SeqRecord], query: &SeqRecord) -> Result<Vec<Variant>> {
        let (target, alignment, strand) = self
            .best_alignment(targets, query)
            .ok_or(Error::NoTargets)?;
        debug!(
            "Aligned {} to {} ({} strand): {} (score {}).",
            query.name(),
            target.name(),
            strand,
            alignment.cigar(),
            alignment.score()
        );

        let reversed;
        let query = match strand {
            Strand::Forward => query,
            Strand::Reverse => {
                let mut rc = query.clone();
                rc.reverse_complement();
                reversed = rc;
                &reversed
            }
        };

        let mut variants = call_variants(target, query, alignment.cigar(), self.ksize)?;
        if let Some((evidence, model)) = self.likelihoods() {
            for variant in &mut variants {
                model.compute_likelihoods(variant, evidence)?;
            }
        }
        Ok(variants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmers::{KmerCounts, KmerTable};
    use crate::variants::NoCall;

    /// Aligner reporting a gapless alignment scored by the number of equal
    /// bases at equal positions.
    struct HammingAligner;

    impl Aligner for HammingAligner {
        fn align(&self, target: &[u8], query: &[u8], _: &AlignmentScoring) -> Alignment {
            let score = target
                .iter()
                .zip(query)
                .filter(|(a, b)| a == b)
                .count() as i32;
            let len = query.len().min(target.len());
            Alignment::new(format!("0D{}M{}D", len, target.len() - len), score)
        }
    }

    fn record(name: &str, seq: &[u8]) -> SeqRecord {
        SeqRecord::new(name.to_owned(), seq.to_vec())
    }

    fn caller() -> Caller {
        CallerBuilder::default()
            .aligner(Box::new(HammingAligner))
            .ksize(4)
            .build()
            .unwrap()
    }

    #[test]
    fn test_no_targets() {
        let err = caller()
            .call(&[], &[record("q", b"ACGT")])
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NoTargets));
    }

    #[test]
    fn test_best_alignment_ties_keep_first() {
        let caller = caller();
        let t1 = record("chr1_0-8", b"AAAACCCC");
        let t2 = record("chr2_0-8", b"AAAACCCC");
        let query = record("q", b"AAAACCCC");
        let (target, alignment, strand) = caller
            .best_alignment(&[&t1, &t2], &query)
            .unwrap();
        assert_eq!(target.name(), "chr1_0-8");
        assert_eq!(alignment.score(), 8);
        assert_eq!(strand, Strand::Forward);
    }

    #[test]
    fn test_best_alignment_reverse() {
        let caller = caller();
        let t1 = record("chr1_0-8", b"AAAAAAAA");
        let t2 = record("chr2_0-8", b"ACGGTTTT");
        let query = record("q", b"AAAACCGT");
        let (target, _, strand) = caller.best_alignment(&[&t1, &t2], &query).unwrap();
        assert_eq!(target.name(), "chr2_0-8");
        assert_eq!(strand, Strand::Reverse);
    }

    #[test]
    fn test_call_orders_queries_by_length() {
        let caller = caller();
        let targets = vec![record("chr1_100-108", b"AAAACCCC")];
        let queries = vec![
            record("short", b"AAAA"),
            record("long", b"AAAACCCC"),
            record("mid", b"AAAACC"),
        ];
        let variants = caller.call(&targets, &queries).unwrap();
        let contigs = variants
            .iter()
            .map(|variant| variant.info().contig_sequence().clone().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            contigs,
            vec![b"AAAACCCC".to_vec(), b"AAAACC".to_vec(), b"AAAA".to_vec()]
        );
        assert!(variants
            .iter()
            .all(|variant| variant.info().nocall() == Some(NoCall::PerfectMatch)));
    }

    fn evidence() -> SampleEvidence {
        let table = |seqs: &[&[u8]]| -> Box<dyn KmerTable> {
            Box::new(KmerCounts::from_sequences(4, seqs.iter().copied()))
        };
        SampleEvidence::new(table(&[]), vec![table(&[]), table(&[])], None)
    }

    #[test]
    fn test_build_checks_evidence() {
        let res = CallerBuilder::default()
            .ksize(5)
            .evidence(evidence())
            .build();
        assert!(res.is_err());

        let res = CallerBuilder::default()
            .ksize(4)
            .evidence(evidence())
            .model(AbundanceModel::new(30.0, 8.0, ErrorRate::PerSample(vec![0.01, 0.01])).unwrap())
            .build();
        let err = res.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidErrorRate { .. })
        ));

        assert!(CallerBuilder::default().ksize(0).build().is_err());
    }

    #[test]
    fn test_call_with_evidence_sorts_by_denovo_likelihood() {
        let caller = CallerBuilder::default()
            .aligner(Box::new(HammingAligner))
            .ksize(4)
            .evidence(evidence())
            .build()
            .unwrap();
        let targets = vec![record("chr1_100-108", b"AAAACCCC")];
        let queries = vec![record("perfect", b"AAAACCCC"), record("snv", b"AAAGCC")];
        let variants = caller.call(&targets, &queries).unwrap();

        assert_eq!(variants.len(), 2);
        // empty tables: every alt k-mer has abundance zero
        for variant in &variants {
            assert_eq!(
                variant.info().likelihood_denovo(),
                Some(f64::NEG_INFINITY)
            );
        }
        // stable sort keeps the longer query first
        assert!(variants[0].is_nocall());
        assert_eq!(variants[1].alt_allele(), b"G");
        assert_eq!(variants[1].samples().len(), 3);
    }
}
