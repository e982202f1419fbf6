//! Data rows and flow control.
//!
//! A [`FlowController`] owns the master row cursor of one traversal level and
//! exposes the row visible at that level. Moving to the next row derives a new
//! controller; the old one stays valid, which is what makes rollback free.

use quire_traits::DataError;
use thiserror::Error;

pub mod controller;
pub mod row;

pub use controller::{FlowController, MasterDataRow};
pub use row::{CompoundDataRow, StaticDataRow, TableDataRow};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Cannot advance past row {cursor:?}: no more rows at this level")]
    NotAdvanceable { cursor: Option<usize> },
    #[error(transparent)]
    Data(#[from] DataError),
}
