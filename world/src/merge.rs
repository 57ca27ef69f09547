//! Atomic execution of three-of-a-kind merges.

use loop_defence_core::{ActionError, Balance, CellCoord, Tier, UnitId, UnitKind, UnitTable};

use crate::{
    economy::EconomyLedger,
    grid::Grid,
    placement::{detach, find_target_cell_for, place},
    units::UnitRegistry,
};

/// Summary of a completed merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MergeOutcome {
    pub(crate) consumed: [UnitId; 3],
    pub(crate) created: UnitId,
    pub(crate) kind: UnitKind,
    pub(crate) tier_before: Tier,
    pub(crate) tier_after: Tier,
    pub(crate) cell: CellCoord,
}

/// Borrowed world state a merge operates on.
pub(crate) struct MergeContext<'a> {
    pub(crate) grid: &'a mut Grid,
    pub(crate) units: &'a mut UnitRegistry,
    pub(crate) table: &'a UnitTable,
    pub(crate) balance: &'a Balance,
    pub(crate) ledger: &'a EconomyLedger,
}

/// Replaces the three units in `cell` with one level-one unit of `result`.
///
/// Validation completes before anything is mutated.
pub(crate) fn combine(
    context: MergeContext<'_>,
    cell: CellCoord,
    result: UnitKind,
) -> Result<MergeOutcome, ActionError> {
    let MergeContext {
        grid,
        units,
        table,
        balance,
        ledger,
    } = context;

    let stored = grid.cell(cell).ok_or(ActionError::UnknownCell { cell })?;
    let consumed: [UnitId; 3] = stored
        .occupants
        .clone()
        .try_into()
        .map_err(|_| ActionError::CellNotMergeable)?;
    let tier_before = units
        .get(consumed[0])
        .map(|unit| unit.tier)
        .ok_or(ActionError::CellNotMergeable)?;
    let tier_after = tier_before.next().ok_or(ActionError::CellNotMergeable)?;
    let archetype = table.get(result).ok_or(ActionError::InvalidMergeResult)?;
    if archetype.tier != tier_after {
        return Err(ActionError::InvalidMergeResult);
    }

    for unit in consumed {
        let _ = detach(grid, units, unit);
        let _ = units.remove(unit);
    }

    let permanent_level = ledger.permanent_level(tier_after.rarity_group());
    let created = units.create(archetype, balance, permanent_level);
    let destination = find_target_cell_for(grid, result).unwrap_or(cell);
    let placed = place(grid, units, created, destination)
        .map(|()| destination)
        .or_else(|_| place(grid, units, created, cell).map(|()| cell));
    let Ok(destination) = placed else {
        let _ = units.remove(created);
        return Err(ActionError::NoEligibleCell);
    };

    Ok(MergeOutcome {
        consumed,
        created,
        kind: result,
        tier_before,
        tier_after,
        cell: destination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_defence_core::Layout;

    struct Fixture {
        grid: Grid,
        units: UnitRegistry,
        table: UnitTable,
        balance: Balance,
        ledger: EconomyLedger,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                grid: Grid::new(Layout::default().grid_layout()),
                units: UnitRegistry::new(),
                table: UnitTable::standard(),
                balance: Balance::default(),
                ledger: EconomyLedger::new(0),
            }
        }

        fn fill(&mut self, kind: UnitKind, count: usize) -> CellCoord {
            let mut cell = None;
            for _ in 0..count {
                let archetype = self.table.get(kind).expect("known kind");
                let id = self.units.create(archetype, &self.balance, 0);
                let target = find_target_cell_for(&self.grid, kind).expect("free cell");
                place(&mut self.grid, &mut self.units, id, target).expect("fits");
                cell = Some(target);
            }
            cell.expect("at least one unit")
        }

        fn combine(&mut self, cell: CellCoord, result: UnitKind) -> Result<MergeOutcome, ActionError> {
            combine(
                MergeContext {
                    grid: &mut self.grid,
                    units: &mut self.units,
                    table: &self.table,
                    balance: &self.balance,
                    ledger: &self.ledger,
                },
                cell,
                result,
            )
        }
    }

    #[test]
    fn three_units_become_one_of_the_next_tier() {
        let mut fixture = Fixture::new();
        let cell = fixture.fill(UnitKind::new(1), 3);
        let outcome = fixture.combine(cell, UnitKind::new(5)).expect("mergeable");
        assert_eq!(outcome.tier_before, Tier::Normal);
        assert_eq!(outcome.tier_after, Tier::Rare);
        assert_eq!(outcome.cell, cell);
        assert_eq!(fixture.units.len(), 1);
        let created = fixture.units.get(outcome.created).expect("created");
        assert_eq!(created.level, 1);
        assert_eq!(created.cell, Some(cell));
        for consumed in outcome.consumed {
            assert!(fixture.units.get(consumed).is_none());
        }
    }

    #[test]
    fn created_unit_joins_a_partial_cell_of_its_identity() {
        let mut fixture = Fixture::new();
        let partner = fixture.fill(UnitKind::new(3), 1);
        let cell = fixture.fill(UnitKind::new(0), 3);
        let outcome = fixture.combine(cell, UnitKind::new(3)).expect("mergeable");
        assert_eq!(outcome.cell, partner);
        assert!(fixture.grid.cell(cell).expect("cell").is_empty());
        assert_eq!(fixture.grid.cell(partner).expect("partner").occupants.len(), 2);
    }

    #[test]
    fn incomplete_cells_and_wrong_results_are_refused() {
        let mut fixture = Fixture::new();
        let pair = fixture.fill(UnitKind::new(0), 2);
        assert_eq!(
            fixture.combine(pair, UnitKind::new(3)),
            Err(ActionError::CellNotMergeable)
        );
        let _ = fixture.fill(UnitKind::new(0), 1);
        assert_eq!(
            fixture.combine(pair, UnitKind::new(6)),
            Err(ActionError::InvalidMergeResult)
        );
        assert_eq!(fixture.units.len(), 3);
        assert_eq!(
            fixture.combine(CellCoord::new(9, 9), UnitKind::new(3)),
            Err(ActionError::UnknownCell {
                cell: CellCoord::new(9, 9)
            })
        );
    }

    #[test]
    fn top_tier_cells_cannot_merge() {
        let mut fixture = Fixture::new();
        let cell = fixture.fill(UnitKind::new(12), 3);
        assert_eq!(
            fixture.combine(cell, UnitKind::new(13)),
            Err(ActionError::CellNotMergeable)
        );
    }
}
