//! Placement helpers that keep unit back-references and cell occupancy in step.

use loop_defence_core::{CellCoord, OccupancyError, UnitId, UnitKind};

use crate::{grid::Grid, units::UnitRegistry};

/// Finds the cell a new unit of `kind` should occupy.
///
/// Partially filled cells of the same identity win over empty cells; both
/// scans run in row-major order.
pub(crate) fn find_target_cell_for(grid: &Grid, kind: UnitKind) -> Option<CellCoord> {
    grid.cells()
        .find(|cell| cell.kind == Some(kind) && !cell.is_full())
        .or_else(|| grid.cells().find(|cell| cell.is_empty()))
        .map(|cell| cell.coord)
}

/// Places a detached unit into a cell and records the back-reference.
pub(crate) fn place(
    grid: &mut Grid,
    units: &mut UnitRegistry,
    unit: UnitId,
    cell: CellCoord,
) -> Result<(), OccupancyError> {
    let Some(state) = units.get_mut(unit) else {
        return Err(OccupancyError::OutOfBounds);
    };
    grid.add_occupant(cell, unit, state.kind)?;
    state.cell = Some(cell);
    Ok(())
}

/// Removes a unit from its cell and clears the back-reference.
pub(crate) fn detach(grid: &mut Grid, units: &mut UnitRegistry, unit: UnitId) -> Option<CellCoord> {
    let state = units.get_mut(unit)?;
    let cell = state.cell.take()?;
    grid.remove_occupant(cell, unit);
    Some(cell)
}

/// Moves the occupants of `source` onto `target`, swapping when the target is
/// occupied. Returns whether the cells were swapped.
pub(crate) fn move_or_swap(
    grid: &mut Grid,
    units: &mut UnitRegistry,
    source: CellCoord,
    target: CellCoord,
) -> Option<bool> {
    let swapped = !grid.cell(target)?.is_empty();
    if !grid.exchange(source, target) {
        return None;
    }
    for coord in [source, target] {
        let occupants = grid
            .cell(coord)
            .map(|cell| cell.occupants.clone())
            .unwrap_or_default();
        for occupant in occupants {
            if let Some(state) = units.get_mut(occupant) {
                state.cell = Some(coord);
            }
        }
    }
    Some(swapped)
}
