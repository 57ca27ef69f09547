//! Cell occupancy arena backing the unit grid.

use loop_defence_core::{CellCoord, GridLayout, OccupancyError, UnitId, UnitKind, CELL_CAPACITY};

/// Occupancy record of a single grid cell.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) coord: CellCoord,
    pub(crate) kind: Option<UnitKind>,
    pub(crate) occupants: Vec<UnitId>,
}

impl Cell {
    fn new(coord: CellCoord) -> Self {
        Self {
            coord,
            kind: None,
            occupants: Vec::with_capacity(CELL_CAPACITY),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.occupants.len() >= CELL_CAPACITY
    }

    fn accepts(&self, kind: UnitKind) -> Result<(), OccupancyError> {
        if self.is_empty() {
            return Ok(());
        }
        if self.kind != Some(kind) {
            return Err(OccupancyError::IdentityMismatch);
        }
        if self.is_full() {
            return Err(OccupancyError::Full);
        }
        Ok(())
    }
}

/// Dense arena of cells indexed in row-major order.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    layout: GridLayout,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new(layout: GridLayout) -> Self {
        let cells = layout.cells().map(Cell::new).collect();
        Self { layout, cells }
    }

    pub(crate) fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub(crate) fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(self.layout.index(coord)?)
    }

    fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        let index = self.layout.index(coord)?;
        self.cells.get_mut(index)
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Appends a unit to a cell, enforcing capacity and identity.
    pub(crate) fn add_occupant(
        &mut self,
        coord: CellCoord,
        unit: UnitId,
        kind: UnitKind,
    ) -> Result<(), OccupancyError> {
        let cell = self.cell_mut(coord).ok_or(OccupancyError::OutOfBounds)?;
        cell.accepts(kind)?;
        cell.kind = Some(kind);
        cell.occupants.push(unit);
        Ok(())
    }

    /// Removes a unit from a cell; absent units are ignored.
    pub(crate) fn remove_occupant(&mut self, coord: CellCoord, unit: UnitId) {
        let Some(cell) = self.cell_mut(coord) else {
            return;
        };
        cell.occupants.retain(|occupant| *occupant != unit);
        if cell.occupants.is_empty() {
            cell.kind = None;
        }
    }

    /// Exchanges the occupants and identities of two cells wholesale.
    pub(crate) fn exchange(&mut self, first: CellCoord, second: CellCoord) -> bool {
        let (Some(a), Some(b)) = (self.layout.index(first), self.layout.index(second)) else {
            return false;
        };
        if a == b {
            return false;
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.cells.split_at_mut(high);
        let lower = &mut head[low];
        let upper = &mut tail[0];
        std::mem::swap(&mut lower.kind, &mut upper.kind);
        std::mem::swap(&mut lower.occupants, &mut upper.occupants);
        true
    }

    pub(crate) fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.kind = None;
            cell.occupants.clear();
        }
    }
}
