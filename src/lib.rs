// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Calling of SNVs and short indels from alignments of assembled contigs
//! against reference subregions, with k-mer abundance based likelihoods for a
//! variant being de novo, inherited or a false call.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate strum_macros;
#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod alignment;
pub mod calling;
pub mod cli;
pub mod constants;
pub mod errors;
pub mod kmers;
pub mod localize;
pub mod model;
pub mod reference;
pub mod variants;

pub use crate::calling::{Caller, CallerBuilder};
pub use crate::errors::Error;
pub use crate::reference::SeqRecord;
pub use crate::variants::Variant;
