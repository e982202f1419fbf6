use crate::FlowError;
use crate::row::{CompoundDataRow, StaticDataRow, TableDataRow};
use quire_traits::{DataError, DataRow, TableModel};
use std::sync::Arc;

/// The master row cursor of one traversal level.
///
/// `cursor` is `None` only for an empty table. Parameters passed down from a
/// parent report shadow the table's own columns.
#[derive(Debug, Clone)]
pub struct MasterDataRow {
    table: Arc<dyn TableModel>,
    cursor: Option<usize>,
    parameters: Arc<StaticDataRow>,
}

impl MasterDataRow {
    pub fn new(table: Arc<dyn TableModel>) -> Self {
        let cursor = if table.is_empty() { None } else { Some(0) };
        Self {
            table,
            cursor,
            parameters: Arc::new(StaticDataRow::new()),
        }
    }

    pub fn with_parameters(mut self, parameters: StaticDataRow) -> Self {
        self.parameters = Arc::new(parameters);
        self
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// `true` if the underlying table has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.cursor.is_none()
    }

    /// `true` iff there is at least one more row after the current one.
    pub fn is_advanceable(&self) -> bool {
        match self.cursor {
            Some(row) => row + 1 < self.table.row_count(),
            None => false,
        }
    }

    /// Returns a copy positioned on the next row.
    ///
    /// # Errors
    ///
    /// `FlowError::NotAdvanceable` on the last row or for an empty table.
    pub fn advance(&self) -> Result<Self, FlowError> {
        if !self.is_advanceable() {
            return Err(FlowError::NotAdvanceable {
                cursor: self.cursor,
            });
        }
        Ok(Self {
            table: Arc::clone(&self.table),
            cursor: self.cursor.map(|row| row + 1),
            parameters: Arc::clone(&self.parameters),
        })
    }

    pub fn parameters(&self) -> &StaticDataRow {
        &self.parameters
    }

    pub fn data_row(&self) -> CompoundDataRow<&StaticDataRow, TableDataRow> {
        CompoundDataRow::new(
            self.parameters.as_ref(),
            TableDataRow::new(Arc::clone(&self.table), self.cursor),
        )
    }

    /// Returns `true` if any of `fields` holds a different value in `other`.
    ///
    /// # Errors
    ///
    /// Propagates read failures; an unknown field is `DataError::FieldNotFound`.
    pub fn differs_in(&self, other: &MasterDataRow, fields: &[String]) -> Result<bool, DataError> {
        let this_row = self.data_row();
        let other_row = other.data_row();
        for field in fields {
            if this_row.get(field)? != other_row.get(field)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl PartialEq for MasterDataRow {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
            && self.cursor == other.cursor
            && self.parameters == other.parameters
    }
}

/// Owns the master row of a traversal level plus the computed values layered
/// over it.
///
/// Every transition derives a new controller. A controller that was handed
/// out is never changed, so the caller can keep an older one as a rollback
/// point or run a trial commit and throw the result away.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowController {
    master: MasterDataRow,
    overrides: Arc<StaticDataRow>,
}

impl FlowController {
    pub fn new(table: Arc<dyn TableModel>) -> Self {
        Self::from_master(MasterDataRow::new(table))
    }

    pub fn from_master(master: MasterDataRow) -> Self {
        Self {
            master,
            overrides: Arc::new(StaticDataRow::new()),
        }
    }

    pub fn master_row(&self) -> &MasterDataRow {
        &self.master
    }

    pub fn cursor(&self) -> Option<usize> {
        self.master.cursor()
    }

    pub fn is_advanceable(&self) -> bool {
        self.master.is_advanceable()
    }

    /// Derives the controller for the next row. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// `FlowError::NotAdvanceable` when `is_advanceable()` is false.
    pub fn perform_commit(&self) -> Result<FlowController, FlowError> {
        let master = self.master.advance()?;
        log::trace!("Flow controller committed to row {:?}", master.cursor());
        Ok(Self {
            master,
            overrides: Arc::clone(&self.overrides),
        })
    }

    /// Derives a controller that exposes `overrides` in front of the master row.
    pub fn derive_with_overrides(&self, overrides: StaticDataRow) -> FlowController {
        Self {
            master: self.master.clone(),
            overrides: Arc::new(overrides),
        }
    }

    pub fn overrides(&self) -> &StaticDataRow {
        &self.overrides
    }

    /// The row visible at this level: overrides, then parameters, then the table.
    pub fn data_row(&self) -> CompoundDataRow<&StaticDataRow, CompoundDataRow<&StaticDataRow, TableDataRow>> {
        CompoundDataRow::new(self.overrides.as_ref(), self.master.data_row())
    }
}
