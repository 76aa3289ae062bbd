// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

/// Longest trailing match run that is still read as part of the preceding
/// window. Aligners tend to emit short spurious matches at contig ends.
/// This is a fixed design constant, not a user setting.
pub const MAX_TRAILING_MATCH: u64 = 5;

pub const DEFAULT_KSIZE: usize = 31;

pub const DEFAULT_MATCH: i32 = 1;
pub const DEFAULT_MISMATCH: i32 = 2;
pub const DEFAULT_GAP_OPEN: i32 = 5;
pub const DEFAULT_GAP_EXTEND: i32 = 0;

// Abundance distribution of k-mers with copy number two.
pub const DEFAULT_MEAN: f64 = 30.0;
pub const DEFAULT_SD: f64 = 8.0;
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// Number of genotype triples possible for a biallelic site in a trio.
pub const TRIO_SCENARIOS_TOTAL: f64 = 15.0;

// Localization padding around seed matches.
pub const DEFAULT_REGION_DELTA: u64 = 50;
pub const DEFAULT_REGION_MAXSPAN: u64 = 1000;
