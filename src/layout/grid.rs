//! Fixed-slot grid container.

use std::any::Any;

use crate::dirty::Dirty;
use crate::entity::{Entity, EntityCore};
use crate::error::SceneError;
use crate::geometry::Rect;
use crate::layout::Container;
use crate::stage::{EntityId, Stage};

/// A grid of uniform slots addressed by column and row.
///
/// Slot origin follows `index * (slot extent + padding)`; the grid
/// sizes itself to cover all slots. Children are resized to fill their
/// slot.
pub struct Grid {
    core: EntityCore,
    columns: usize,
    rows: usize,
    slot_width: f32,
    slot_height: f32,
    padding: f32,
    /// Row-major, `columns * rows` entries.
    slots: Vec<Option<EntityId>>,
}

impl Grid {
    pub fn new(columns: usize, rows: usize, slot_width: f32, slot_height: f32) -> Self {
        let mut grid = Self {
            core: EntityCore::new(),
            columns,
            rows,
            slot_width,
            slot_height,
            padding: 0.0,
            slots: vec![None; columns * rows],
        };
        let (width, height) = grid.content_size();
        grid.core.frame.width = width;
        grid.core.frame.height = height;
        grid
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        let (width, height) = self.content_size();
        self.core.frame.width = width;
        self.core.frame.height = height;
        self
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    fn content_size(&self) -> (f32, f32) {
        let width = if self.columns == 0 {
            0.0
        } else {
            self.columns as f32 * (self.slot_width + self.padding) - self.padding
        };
        let height = if self.rows == 0 {
            0.0
        } else {
            self.rows as f32 * (self.slot_height + self.padding) - self.padding
        };
        (width, height)
    }

    fn slot_index(&self, column: usize, row: usize) -> Result<usize, SceneError> {
        if column >= self.columns || row >= self.rows {
            return Err(SceneError::SlotOutOfRange);
        }
        Ok(row * self.columns + column)
    }

    /// The local rect of a slot.
    pub fn slot_rect(&self, column: usize, row: usize) -> Result<Rect, SceneError> {
        self.slot_index(column, row)?;
        Ok(Rect::new(
            column as f32 * (self.slot_width + self.padding),
            row as f32 * (self.slot_height + self.padding),
            self.slot_width,
            self.slot_height,
        ))
    }

    /// The slot under a local point, `None` over padding gaps.
    pub fn slot_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let step_x = self.slot_width + self.padding;
        let step_y = self.slot_height + self.padding;
        let column = (x / step_x) as usize;
        let row = (y / step_y) as usize;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        if x - column as f32 * step_x > self.slot_width {
            return None;
        }
        if y - row as f32 * step_y > self.slot_height {
            return None;
        }
        Some((column, row))
    }

    pub fn child_at(&self, column: usize, row: usize) -> Option<EntityId> {
        let index = self.slot_index(column, row).ok()?;
        self.slots[index]
    }

    /// Find the slot currently holding a child.
    pub fn slot_of(&self, child: EntityId) -> Option<(usize, usize)> {
        self.slots
            .iter()
            .position(|s| *s == Some(child))
            .map(|index| (index % self.columns, index / self.columns))
    }

    /// Put a child into a slot, evicting any current occupant.
    pub fn set_child(
        &mut self,
        stage: &mut Stage,
        id: EntityId,
        column: usize,
        row: usize,
        child: EntityId,
    ) -> Result<(), SceneError> {
        let index = self.slot_index(column, row)?;
        if let Some(previous) = self.slots[index] {
            if previous == child {
                return Ok(());
            }
            self.slots[index] = None;
            let _ = stage.remove_parent(previous);
        }
        // A child moving between slots keeps its parent.
        if stage.parent(child) != Some(id) {
            stage.set_parent(child, id)?;
        } else if let Some(old) = self.slots.iter_mut().find(|s| **s == Some(child)) {
            *old = None;
        }
        self.slots[index] = Some(child);
        let rect = self.slot_rect(column, row)?;
        stage.set_frame(child, rect);
        stage.dirty(id, Dirty::CONTENT);
        Ok(())
    }

    /// Empty a slot, detaching its occupant.
    pub fn clear_slot(
        &mut self,
        stage: &mut Stage,
        id: EntityId,
        column: usize,
        row: usize,
    ) -> Result<Option<EntityId>, SceneError> {
        let index = self.slot_index(column, row)?;
        let Some(child) = self.slots[index].take() else {
            return Ok(None);
        };
        let _ = stage.remove_parent(child);
        stage.dirty(id, Dirty::CONTENT);
        Ok(Some(child))
    }

    /// Change the grid dimensions, keeping children whose slots survive
    /// and detaching the rest.
    pub fn set_grid_size(
        &mut self,
        stage: &mut Stage,
        id: EntityId,
        columns: usize,
        rows: usize,
    ) {
        if columns == self.columns && rows == self.rows {
            return;
        }
        let mut next = vec![None; columns * rows];
        let mut evicted = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(child) = *slot else { continue };
            let (column, row) = (index % self.columns, index / self.columns);
            if column < columns && row < rows {
                next[row * columns + column] = Some(child);
            } else {
                evicted.push(child);
            }
        }
        self.columns = columns;
        self.rows = rows;
        self.slots = next;
        for child in evicted {
            let _ = stage.remove_parent(child);
        }
        let (width, height) = self.content_size();
        self.core.frame.width = width;
        self.core.frame.height = height;
        self.core.invalidate_matrix();
        stage.dirty(id, Dirty::SIZE);
        self.reform_self(stage, id);
    }

    pub fn add_column(&mut self, stage: &mut Stage, id: EntityId) {
        self.set_grid_size(stage, id, self.columns + 1, self.rows);
    }

    pub fn add_row(&mut self, stage: &mut Stage, id: EntityId) {
        self.set_grid_size(stage, id, self.columns, self.rows + 1);
    }

    pub fn remove_column(&mut self, stage: &mut Stage, id: EntityId) {
        if self.columns > 0 {
            self.set_grid_size(stage, id, self.columns - 1, self.rows);
        }
    }

    pub fn remove_row(&mut self, stage: &mut Stage, id: EntityId) {
        if self.rows > 0 {
            self.set_grid_size(stage, id, self.columns, self.rows - 1);
        }
    }
}

impl Entity for Grid {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn form(&mut self, stage: &mut Stage, id: EntityId) {
        let _ = id;
        for index in 0..self.slots.len() {
            let Some(child) = self.slots[index] else { continue };
            let (column, row) = (index % self.columns, index / self.columns);
            if let Ok(rect) = self.slot_rect(column, row) {
                stage.set_frame(child, rect);
            }
        }
    }

    fn child_removed(&mut self, stage: &mut Stage, id: EntityId, child: EntityId) {
        // Externally detached children free their slot.
        if let Some(slot) = self.slots.iter_mut().find(|s| **s == Some(child)) {
            *slot = None;
            stage.dirty(id, Dirty::CONTENT);
        }
    }

    fn child_dirtied(&mut self, stage: &mut Stage, id: EntityId, _child: EntityId, flags: Dirty) {
        self.on_child_dirtied(stage, id, flags);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Container for Grid {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Leaf;

    #[test]
    fn test_slot_rect_math() {
        let grid = Grid::new(3, 2, 20.0, 10.0).with_padding(4.0);
        assert_eq!(grid.slot_rect(0, 0).unwrap(), Rect::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(
            grid.slot_rect(2, 1).unwrap(),
            Rect::new(48.0, 14.0, 20.0, 10.0)
        );
        assert!(grid.slot_rect(3, 0).is_err());
    }

    #[test]
    fn test_grid_sizes_to_slots() {
        let grid = Grid::new(3, 2, 20.0, 10.0).with_padding(4.0);
        let frame = grid.core().frame();
        assert_eq!((frame.width, frame.height), (68.0, 24.0));
    }

    #[test]
    fn test_slot_at_skips_padding() {
        let grid = Grid::new(2, 2, 10.0, 10.0).with_padding(5.0);
        assert_eq!(grid.slot_at(5.0, 5.0), Some((0, 0)));
        assert_eq!(grid.slot_at(12.0, 5.0), None);
        assert_eq!(grid.slot_at(16.0, 16.0), Some((1, 1)));
        assert_eq!(grid.slot_at(100.0, 5.0), None);
    }

    #[test]
    fn test_set_child_places_and_evicts() {
        let mut stage = Stage::new();
        let grid_id = stage.register(Grid::new(2, 2, 10.0, 10.0));
        let first = stage.register(Leaf::new());
        let second = stage.register(Leaf::new());
        stage.with_typed_mut::<Grid, _>(grid_id, |stage, grid| {
            grid.set_child(stage, grid_id, 1, 0, first).unwrap();
        });
        let frame = stage.try_core(first).unwrap().frame();
        assert_eq!((frame.x, frame.y), (10.0, 0.0));
        stage.with_typed_mut::<Grid, _>(grid_id, |stage, grid| {
            grid.set_child(stage, grid_id, 1, 0, second).unwrap();
            assert_eq!(grid.child_at(1, 0), Some(second));
        });
        assert_eq!(stage.parent(first), None);
    }

    #[test]
    fn test_move_between_slots() {
        let mut stage = Stage::new();
        let grid_id = stage.register(Grid::new(2, 1, 10.0, 10.0));
        let child = stage.register(Leaf::new());
        stage.with_typed_mut::<Grid, _>(grid_id, |stage, grid| {
            grid.set_child(stage, grid_id, 0, 0, child).unwrap();
            grid.set_child(stage, grid_id, 1, 0, child).unwrap();
            assert_eq!(grid.child_at(0, 0), None);
            assert_eq!(grid.slot_of(child), Some((1, 0)));
        });
        assert_eq!(stage.try_core(child).unwrap().frame().x, 10.0);
    }

    #[test]
    fn test_shrink_evicts_out_of_range() {
        let mut stage = Stage::new();
        let grid_id = stage.register(Grid::new(2, 2, 10.0, 10.0));
        let keep = stage.register(Leaf::new());
        let evict = stage.register(Leaf::new());
        stage.with_typed_mut::<Grid, _>(grid_id, |stage, grid| {
            grid.set_child(stage, grid_id, 0, 0, keep).unwrap();
            grid.set_child(stage, grid_id, 1, 1, evict).unwrap();
            grid.set_grid_size(stage, grid_id, 1, 2);
            assert_eq!(grid.child_at(0, 0), Some(keep));
        });
        assert_eq!(stage.parent(evict), None);
        assert_eq!(stage.parent(keep), Some(grid_id));
    }

    #[test]
    fn test_external_detach_frees_slot() {
        let mut stage = Stage::new();
        let grid_id = stage.register(Grid::new(1, 1, 10.0, 10.0));
        let child = stage.register(Leaf::new());
        stage.with_typed_mut::<Grid, _>(grid_id, |stage, grid| {
            grid.set_child(stage, grid_id, 0, 0, child).unwrap();
        });
        stage.remove_parent(child).unwrap();
        stage.with_typed_mut::<Grid, _>(grid_id, |_, grid| {
            assert_eq!(grid.child_at(0, 0), None);
        });
    }
}
