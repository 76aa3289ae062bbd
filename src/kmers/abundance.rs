// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::ops::Index;

use crate::kmers::KmerTable;

/// Keep only the k-mer pairs whose alt k-mer has a count of zero in the
/// reference. Pairs whose alt k-mer the reference cannot be queried for are
/// dropped as well.
///
/// Alt and ref k-mers are paired by index. Surplus k-mers of the longer list
/// are dropped.
pub fn filter_reference(
    alt_kmers: Vec<Vec<u8>>,
    ref_kmers: Vec<Vec<u8>>,
    refr: &dyn KmerTable,
) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
    alt_kmers
        .into_iter()
        .zip(ref_kmers)
        .filter(|(alt, _)| refr.get(alt) == Some(0))
        .unzip()
}

/// K-mer abundances of a set of samples. Row 0 is the case (proband), rows
/// 1..N are the controls. Column `j` holds the abundances of k-mer `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceMatrix {
    rows: Vec<Vec<Option<u32>>>,
}

impl AbundanceMatrix {
    pub fn new(rows: Vec<Vec<Option<u32>>>) -> Self {
        AbundanceMatrix { rows }
    }

    pub fn rows(&self) -> &[Vec<Option<u32>>] {
        &self.rows
    }

    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    pub fn n_kmers(&self) -> usize {
        self.rows.first().map_or(0, |row| row.len())
    }

    pub fn case(&self) -> &[Option<u32>] {
        &self.rows[0]
    }

    pub fn controls(&self) -> &[Vec<Option<u32>>] {
        &self.rows[1..]
    }

    /// Whether every abundance could be queried.
    pub fn is_complete(&self) -> bool {
        self.rows.iter().flatten().all(|abundance| abundance.is_some())
    }

    /// Abundances with missing values resolved, or `None` if any is missing.
    pub fn complete(&self) -> Option<Vec<Vec<u32>>> {
        self.rows
            .iter()
            .map(|row| row.iter().copied().collect::<Option<Vec<_>>>())
            .collect()
    }
}

impl Index<usize> for AbundanceMatrix {
    type Output = [Option<u32>];

    fn index(&self, sample: usize) -> &Self::Output {
        &self.rows[sample]
    }
}

/// Query the abundance of each k-mer in the case table and all control tables.
pub fn get_abundances(
    kmers: &[Vec<u8>],
    case: &dyn KmerTable,
    controls: &[Box<dyn KmerTable>],
) -> AbundanceMatrix {
    let row = |table: &dyn KmerTable| -> Vec<Option<u32>> {
        kmers.iter().map(|kmer| table.get(kmer)).collect()
    };
    let mut rows = Vec::with_capacity(controls.len() + 1);
    rows.push(row(case));
    rows.extend(controls.iter().map(|table| row(table.as_ref())));
    AbundanceMatrix::new(rows)
}
