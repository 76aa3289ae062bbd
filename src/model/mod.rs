// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::str::FromStr;

use anyhow::Result;
use statrs::distribution::Normal;

use crate::constants::DEFAULT_ERROR_RATE;
use crate::errors::{self, Error};

pub mod likelihood;

pub use self::likelihood::abund_log_prob;

/// Number of copies of the alternate allele carried by a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum CopyNumber {
    #[strum(serialize = "0")]
    Absent,
    #[strum(serialize = "1")]
    Heterozygous,
    #[strum(serialize = "2")]
    Homozygous,
}

/// Sequencing error rate, either shared by all samples or given per sample
/// (case first, then controls).
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorRate {
    Uniform(f64),
    PerSample(Vec<f64>),
}

impl Default for ErrorRate {
    fn default() -> Self {
        ErrorRate::Uniform(DEFAULT_ERROR_RATE)
    }
}

fn check_rate(rate: f64) -> Result<f64, Error> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(rate)
    } else {
        Err(errors::invalid_error_rate(&format!(
            "{} is not a non-negative number",
            rate
        )))
    }
}

impl ErrorRate {
    /// One error rate per sample. Fails if a per-sample list does not have
    /// exactly `n_samples` entries or any rate is invalid.
    pub fn per_sample(&self, n_samples: usize) -> Result<Vec<f64>, Error> {
        match self {
            ErrorRate::Uniform(rate) => Ok(vec![check_rate(*rate)?; n_samples]),
            ErrorRate::PerSample(rates) => {
                if rates.len() != n_samples {
                    return Err(errors::invalid_error_rate(&format!(
                        "got {} error rates for {} samples",
                        rates.len(),
                        n_samples
                    )));
                }
                rates.iter().map(|rate| check_rate(*rate)).collect()
            }
        }
    }

    /// Check all rates, regardless of the number of samples.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            ErrorRate::Uniform(rate) => check_rate(*rate).map(|_| ()),
            ErrorRate::PerSample(rates) => {
                if rates.is_empty() {
                    return Err(errors::invalid_error_rate("empty list of error rates"));
                }
                rates.iter().try_for_each(|rate| check_rate(*rate).map(|_| ()))
            }
        }
    }
}

impl FromStr for ErrorRate {
    type Err = Error;

    /// Parse a single rate (`0.01`) or a comma-separated list of rates, one per sample.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| errors::invalid_error_rate(&format!("unable to parse {:?}", value)))
        };
        let rate = if s.contains(',') {
            ErrorRate::PerSample(s.split(',').map(parse).collect::<Result<_, _>>()?)
        } else {
            ErrorRate::Uniform(parse(s)?)
        };
        rate.validate()?;
        Ok(rate)
    }
}

/// Model of k-mer abundances. Abundances of k-mers with copy number two are
/// normally distributed with the given mean and standard deviation, those of
/// copy number one with half of both. Absent k-mers are explained by
/// sequencing errors.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct AbundanceModel {
    #[getset(get_copy = "pub")]
    mean: f64,
    #[getset(get_copy = "pub")]
    sd: f64,
    #[getset(get = "pub")]
    error_rate: ErrorRate,
    heterozygous: Normal,
    homozygous: Normal,
}

impl AbundanceModel {
    pub fn new(mean: f64, sd: f64, error_rate: ErrorRate) -> Result<Self> {
        let invalid = |msg: String| Error::InvalidAbundanceModel { msg };
        if !(mean.is_finite() && mean > 0.0) {
            return Err(invalid(format!("mean abundance {} has to be positive", mean)).into());
        }
        if !(sd.is_finite() && sd > 0.0) {
            return Err(invalid(format!("standard deviation {} has to be positive", sd)).into());
        }
        error_rate.validate()?;

        let heterozygous = Normal::new(mean / 2.0, sd / 2.0)
            .map_err(|e| invalid(format!("heterozygous abundance distribution: {}", e)))?;
        let homozygous = Normal::new(mean, sd)
            .map_err(|e| invalid(format!("homozygous abundance distribution: {}", e)))?;

        Ok(AbundanceModel {
            mean,
            sd,
            error_rate,
            heterozygous,
            homozygous,
        })
    }

    pub(crate) fn distribution(&self, copy_number: CopyNumber) -> Option<&Normal> {
        match copy_number {
            CopyNumber::Absent => None,
            CopyNumber::Heterozygous => Some(&self.heterozygous),
            CopyNumber::Homozygous => Some(&self.homozygous),
        }
    }
}
