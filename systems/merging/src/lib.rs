#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that proposes three-of-a-kind merges.
//!
//! The system inspects a cell snapshot and, when the cell holds three
//! identical units below the top tier, picks the identity of the merged unit
//! uniformly from the next tier. The world performs the merge itself.

use loop_defence_core::{
    ActionError, CellCoord, CellSnapshot, Command, Lifecycle, RandomSource, Tier, UnitKind,
    UnitTable, CELL_CAPACITY,
};

/// Merge proposal system.
#[derive(Debug, Default)]
pub struct Merging {
    candidates: Vec<UnitKind>,
}

impl Merging {
    /// Creates a merging system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `Command::CombineCell` for the provided cell when it is mergeable.
    pub fn handle(
        &mut self,
        cell: &CellSnapshot,
        table: &UnitTable,
        rng: &mut dyn RandomSource,
        out: &mut Vec<Command>,
    ) -> Result<(), ActionError> {
        let next = merge_tier(cell, table)?;

        self.candidates.clear();
        self.candidates.extend(table.kinds_in_tier(next));
        let index = rng
            .next_index(self.candidates.len())
            .ok_or(ActionError::InvalidMergeResult)?;

        out.push(Command::CombineCell {
            cell: cell.coord,
            result: self.candidates[index],
        });
        Ok(())
    }
}

impl Lifecycle for Merging {
    fn initialize(&mut self) {
        self.candidates.clear();
    }

    fn teardown(&mut self) {
        self.candidates = Vec::new();
    }
}

/// Tier the merged unit of `cell` would belong to.
pub fn merge_tier(cell: &CellSnapshot, table: &UnitTable) -> Result<Tier, ActionError> {
    if cell.occupants.len() != CELL_CAPACITY {
        return Err(ActionError::CellNotMergeable);
    }
    let kind = cell.kind.ok_or(ActionError::CellNotMergeable)?;
    let archetype = table.get(kind).ok_or(ActionError::UnknownKind)?;
    archetype.tier.next().ok_or(ActionError::CellNotMergeable)
}

/// First cell, in row-major order, that can be merged.
#[must_use]
pub fn find_mergeable(cells: &[CellSnapshot], table: &UnitTable) -> Option<CellCoord> {
    cells
        .iter()
        .find(|cell| merge_tier(cell, table).is_ok())
        .map(|cell| cell.coord)
}
