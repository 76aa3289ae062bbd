// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Log10 likelihoods of k-mer abundances under the hypotheses that a variant
//! is de novo, inherited, or a false call.
//!
//! Abundances are given as one row per sample (case first, then controls),
//! with one entry per evidence k-mer.

use anyhow::Result;
use itertools::izip;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::constants::TRIO_SCENARIOS_TOTAL;
use crate::errors::Error;
use crate::kmers::{filter_reference, get_abundances, SampleEvidence};
use crate::model::{AbundanceModel, CopyNumber};
use crate::variants::{SampleInfo, Variant};

use crate::model::CopyNumber::{Absent, Heterozygous as Het, Homozygous as Hom};

/// Copy numbers of (proband, mother, father) for which the proband carries
/// the alternate allele. These are 11 of the 15 genotype triples of a trio.
const INHERITANCE_SCENARIOS: [[CopyNumber; 3]; 11] = [
    [Het, Absent, Het],
    [Het, Absent, Hom],
    [Het, Het, Absent],
    [Het, Het, Het],
    [Het, Het, Hom],
    [Het, Hom, Absent],
    [Het, Hom, Het],
    [Hom, Het, Het],
    [Hom, Het, Hom],
    [Hom, Hom, Het],
    [Hom, Hom, Hom],
];

fn log_prob_error(abundance: u32, error: f64) -> f64 {
    // log10(0) saturates to -inf
    (f64::from(abundance) * error).log10()
}

fn log_prob_normal(abundance: u32, dist: &Normal) -> f64 {
    dist.cdf(f64::from(abundance)).log10()
}

/// Log10 probability of observing a k-mer `abundance` given the copy number
/// of the allele. Copy number two abundances follow `N(mean, sd)`, copy number
/// one abundances `N(mean / 2, sd / 2)`, while abundances of absent alleles are
/// explained by the `error` rate alone.
///
/// An abundance of zero for an absent allele yields negative infinity.
pub fn abund_log_prob(
    copy_number: CopyNumber,
    abundance: u32,
    mean: f64,
    sd: f64,
    error: f64,
) -> Result<f64> {
    let normal = |mean: f64, sd: f64| {
        Normal::new(mean, sd).map_err(|e| Error::InvalidAbundanceModel { msg: e.to_string() })
    };
    Ok(match copy_number {
        CopyNumber::Absent => log_prob_error(abundance, error),
        CopyNumber::Heterozygous => log_prob_normal(abundance, &normal(mean / 2.0, sd / 2.0)?),
        CopyNumber::Homozygous => log_prob_normal(abundance, &normal(mean, sd)?),
    })
}

impl AbundanceModel {
    /// Log10 probability of the given abundance, see [`abund_log_prob`].
    pub fn log_prob(&self, copy_number: CopyNumber, abundance: u32, error: f64) -> f64 {
        match self.distribution(copy_number) {
            Some(dist) => log_prob_normal(abundance, dist),
            None => log_prob_error(abundance, error),
        }
    }

    /// Likelihood that all alt k-mers are sequencing errors in every sample.
    pub fn likelihood_false(&self, alt: &[Vec<u32>]) -> Result<f64> {
        let errors = self.error_rate().per_sample(alt.len())?;
        Ok(alt
            .iter()
            .zip(errors)
            .map(|(row, error)| {
                row.iter()
                    .map(|&abundance| self.log_prob(Absent, abundance, error))
                    .sum::<f64>()
            })
            .sum())
    }

    /// Likelihood that the case is heterozygous for the alt allele while every
    /// control is homozygous for the reference allele.
    pub fn likelihood_denovo(&self, alt: &[Vec<u32>], refr: &[Vec<u32>]) -> Result<f64> {
        let errors = self.error_rate().per_sample(alt.len())?;
        let mut logsum = 0.0;
        if let (Some(case_alt), Some(case_refr)) = (alt.first(), refr.first()) {
            for (&a, &r) in case_alt.iter().zip(case_refr) {
                logsum += self.log_prob(Het, a, errors[0]);
                logsum += self.log_prob(Het, r, errors[0]);
            }
        }
        for (i, (control_alt, control_refr)) in alt.iter().zip(refr).enumerate().skip(1) {
            for (&a, &r) in control_alt.iter().zip(control_refr) {
                logsum += self.log_prob(Absent, a, errors[i]);
                logsum += self.log_prob(Hom, r, errors[i]);
            }
        }
        Ok(logsum)
    }

    /// Likelihood that the alt allele was inherited by the case from the two
    /// controls (mother, father).
    ///
    /// METHOD: for each k-mer, we take the most likely of the inheritance
    /// scenarios (each with prior 1/15) instead of summing over them. The sum
    /// over k-mers is finally rescaled by log10(15/11).
    pub fn likelihood_inherited(&self, alt: &[Vec<u32>]) -> Result<f64> {
        if alt.len() != 3 {
            return Err(Error::NotATrio {
                n_samples: alt.len(),
            }
            .into());
        }
        let errors = self.error_rate().per_sample(3)?;
        let prior = (1.0 / TRIO_SCENARIOS_TOTAL).log10();

        let logsum: f64 = izip!(&alt[0], &alt[1], &alt[2])
            .map(|(&case, &mother, &father)| {
                INHERITANCE_SCENARIOS
                    .iter()
                    .map(|&[g_case, g_mother, g_father]| {
                        self.log_prob(g_case, case, errors[0])
                            + self.log_prob(g_mother, mother, errors[1])
                            + self.log_prob(g_father, father, errors[2])
                            + prior
                    })
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .sum();

        let n_scenarios = INHERITANCE_SCENARIOS.len() as f64;
        Ok((TRIO_SCENARIOS_TOTAL / n_scenarios).log10() * logsum)
    }

    /// Annotate the variant with per-sample alt k-mer abundances and the
    /// likelihoods of being a false call (`FP`), de novo (`DN`) and, for trios,
    /// inherited (`IH`).
    ///
    /// Variants without evidence windows get a de novo likelihood of negative
    /// infinity. The same holds if any abundance cannot be obtained from the
    /// k-mer tables; abundances are recorded anyway.
    pub fn compute_likelihoods(
        &self,
        variant: &mut Variant,
        evidence: &SampleEvidence,
    ) -> Result<()> {
        let (alt_window, ref_window) = match (
            variant.info().variant_window(),
            variant.info().reference_window(),
        ) {
            (Some(alt_window), Some(ref_window)) => (alt_window.clone(), ref_window.clone()),
            _ => {
                variant.info_mut().set_likelihood_denovo(f64::NEG_INFINITY);
                return Ok(());
            }
        };

        let mut alt_kmers = evidence.case().kmers(&alt_window);
        let mut ref_kmers = evidence.case().kmers(&ref_window);
        if let Some(refr) = evidence.refr() {
            let (alt, refk) = filter_reference(alt_kmers, ref_kmers, refr);
            alt_kmers = alt;
            ref_kmers = refk;
        }

        let alt = get_abundances(&alt_kmers, evidence.case(), evidence.controls());
        let refr = get_abundances(&ref_kmers, evidence.case(), evidence.controls());
        for (label, row) in evidence.labels().iter().zip(alt.rows()) {
            variant.push_sample(SampleInfo::new(label.clone(), row.clone()));
        }

        match (alt.complete(), refr.complete()) {
            (Some(alt), Some(refr)) => {
                let fp = self.likelihood_false(&alt)?;
                let dn = self.likelihood_denovo(&alt, &refr)?;
                let ih = if alt.len() == 3 {
                    Some(self.likelihood_inherited(&alt)?)
                } else {
                    None
                };
                let info = variant.info_mut();
                info.set_likelihood_false(fp);
                info.set_likelihood_denovo(dn);
                if let Some(ih) = ih {
                    info.set_likelihood_inherited(ih);
                }
            }
            _ => {
                warn!(
                    "Missing k-mer abundances for variant at {}:{}, skipping likelihood computation.",
                    variant.seqid(),
                    variant.pos() + 1
                );
                variant.info_mut().set_likelihood_denovo(f64::NEG_INFINITY);
            }
        }
        Ok(())
    }
}
