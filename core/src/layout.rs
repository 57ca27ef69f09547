//! Static playfield geometry: the loop path, the seat and the unit grid.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, WorldPoint};

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f32,
    /// Right edge.
    pub right: f32,
    /// Top edge.
    pub top: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl Rect {
    /// Width of the rectangle, never negative.
    #[must_use]
    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    /// Height of the rectangle, never negative.
    #[must_use]
    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

/// Parameters used to carve the unit grid out of the loop area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Horizontal padding between the area edge and the first cell.
    pub padding_x: f32,
    /// Vertical padding between the area edge and the first cell.
    pub padding_y: f32,
    /// Horizontal gap between neighbouring cells.
    pub gap_x: f32,
    /// Vertical gap between neighbouring cells.
    pub gap_y: f32,
}

/// Static layout of the playfield.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Rectangle traced by the enemy loop; the unit grid sits inside it.
    pub loop_area: Rect,
    /// Position where enemies enter the loop.
    pub seat: WorldPoint,
    /// Grid carving parameters.
    pub grid: GridParams,
    /// Upper-left corner of the region projectiles may travel in.
    pub playfield_min: WorldPoint,
    /// Lower-right corner of the region projectiles may travel in.
    pub playfield_max: WorldPoint,
    /// Distance between units sharing a cell.
    pub slot_spacing: f32,
    /// Radius around a unit that selects it.
    pub unit_pick_radius: f32,
    /// Collision radius of an enemy.
    pub enemy_radius: f32,
}

impl Layout {
    /// Loop waypoints in traversal order: top-left, top-right, bottom-right, bottom-left.
    #[must_use]
    pub fn waypoints(&self) -> [WorldPoint; 4] {
        let area = self.loop_area;
        [
            WorldPoint::new(area.left, area.top),
            WorldPoint::new(area.right, area.top),
            WorldPoint::new(area.right, area.bottom),
            WorldPoint::new(area.left, area.bottom),
        ]
    }

    /// Builds the unit grid geometry.
    #[must_use]
    pub fn grid_layout(&self) -> GridLayout {
        GridLayout::build(self.loop_area, self.grid)
    }

    /// Reports whether the point lies inside the projectile playfield.
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x() >= self.playfield_min.x()
            && point.x() <= self.playfield_max.x()
            && point.y() >= self.playfield_min.y()
            && point.y() <= self.playfield_max.y()
    }

    /// Offset of the `index`-th of `total` units sharing one cell.
    ///
    /// One unit sits in the center, two sit side by side and three form a
    /// triangle with its apex up.
    #[must_use]
    pub fn slot_offset(&self, index: usize, total: usize) -> WorldPoint {
        let half = self.slot_spacing / 2.0;
        match (total, index) {
            (2, 0) => WorldPoint::new(-half, 0.0),
            (2, _) => WorldPoint::new(half, 0.0),
            (3, 0) => WorldPoint::new(0.0, -half),
            (3, 1) => WorldPoint::new(-half, half),
            (3, _) => WorldPoint::new(half, half),
            _ => WorldPoint::new(0.0, 0.0),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            loop_area: Rect {
                left: 100.0,
                right: 620.0,
                top: 680.0,
                bottom: 980.0,
            },
            seat: WorldPoint::new(100.0, 1_060.0),
            grid: GridParams {
                columns: 6,
                rows: 3,
                padding_x: 24.0,
                padding_y: 24.0,
                gap_x: 0.0,
                gap_y: 0.0,
            },
            playfield_min: WorldPoint::new(-50.0, -50.0),
            playfield_max: WorldPoint::new(800.0, 1_400.0),
            slot_spacing: 35.0,
            unit_pick_radius: 20.0,
            enemy_radius: 16.0,
        }
    }
}

/// Fixed lattice of cells carved out of a rectangular area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    columns: u32,
    rows: u32,
    origin: WorldPoint,
    cell_width: f32,
    cell_height: f32,
    gap_x: f32,
    gap_y: f32,
}

impl GridLayout {
    /// Carves `params.columns` × `params.rows` cells out of `area`.
    ///
    /// Degenerate parameters that leave no room for a cell produce a grid
    /// without cells.
    #[must_use]
    pub fn build(area: Rect, params: GridParams) -> Self {
        let inner_width = area.width() - 2.0 * params.padding_x;
        let inner_height = area.height() - 2.0 * params.padding_y;
        let cell_width = cell_extent(inner_width, params.columns, params.gap_x);
        let cell_height = cell_extent(inner_height, params.rows, params.gap_y);
        let (columns, rows) = if cell_width > 0.0 && cell_height > 0.0 {
            (params.columns, params.rows)
        } else {
            (0, 0)
        };

        Self {
            columns,
            rows,
            origin: WorldPoint::new(area.left + params.padding_x, area.top + params.padding_y),
            cell_width: cell_width.max(0.0),
            cell_height: cell_height.max(0.0),
            gap_x: params.gap_x.max(0.0),
            gap_y: params.gap_y.max(0.0),
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Width of a single cell.
    #[must_use]
    pub const fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// Height of a single cell.
    #[must_use]
    pub const fn cell_height(&self) -> f32 {
        self.cell_height
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(0)
    }

    /// Reports whether the coordinate addresses a cell of this grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major arena index of a cell.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Cell coordinate stored at a row-major arena index.
    #[must_use]
    pub fn coord_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cell_count() {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Iterator over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// World-space center of a cell.
    #[must_use]
    pub fn cell_to_world(&self, cell: CellCoord) -> Option<WorldPoint> {
        if !self.contains(cell) {
            return None;
        }
        let pitch_x = self.cell_width + self.gap_x;
        let pitch_y = self.cell_height + self.gap_y;
        Some(WorldPoint::new(
            self.origin.x() + cell.column() as f32 * pitch_x + self.cell_width / 2.0,
            self.origin.y() + cell.row() as f32 * pitch_y + self.cell_height / 2.0,
        ))
    }

    /// Cell containing a world-space point.
    ///
    /// Points inside inter-cell gaps or outside the lattice resolve to `None`.
    #[must_use]
    pub fn world_to_cell(&self, point: WorldPoint) -> Option<CellCoord> {
        let column = axis_slot(
            point.x() - self.origin.x(),
            self.cell_width,
            self.gap_x,
            self.columns,
        )?;
        let row = axis_slot(
            point.y() - self.origin.y(),
            self.cell_height,
            self.gap_y,
            self.rows,
        )?;
        Some(CellCoord::new(column, row))
    }
}

fn cell_extent(inner: f32, count: u32, gap: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let gaps = gap.max(0.0) * count.saturating_sub(1) as f32;
    (inner - gaps) / count as f32
}

fn axis_slot(local: f32, extent: f32, gap: f32, count: u32) -> Option<u32> {
    if extent <= 0.0 || local < 0.0 || !local.is_finite() {
        return None;
    }

    let pitch = extent + gap;
    let slot = (local / pitch).floor();
    if slot >= count as f32 {
        return None;
    }

    let within = local - slot * pitch;
    if within > extent {
        return None;
    }

    Some(slot as u32)
}
