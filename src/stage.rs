//! The stage owns the scenegraph.
//!
//! Entities live in a generational arena and reference each other by
//! [`EntityId`]. The stage carries the hierarchy, the dependency edges
//! used for dirty propagation, the shared brush table, and the cursor
//! and button routing state.

use crate::brush::Brush;
use crate::dirty::Dirty;
use crate::entity::{Entity, EntityCore};
use crate::error::SceneError;
use crate::event::{Button, Event, EventKind, Key};
use crate::geometry::Rect;
use crate::responder::HandlerId;
use crate::shape::Shape;

/// Generational handle to an entity in a [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

/// Generational handle to a shared brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrushId {
    index: u32,
    generation: u32,
}

struct NodeMeta {
    parent: Option<EntityId>,
    /// Draw order: first entry paints at the bottom.
    children: Vec<EntityId>,
    /// Nodes informed when this one dirties, in attachment order.
    dependents: Vec<EntityId>,
    frozen: u32,
    /// Dirt coalesced while frozen.
    pending: Dirty,
    /// Dirt accumulated since the entity was last drawn.
    dirtied: Dirty,
    clean: bool,
    /// Scope at the owning scene's last refresh, in scene coordinates.
    prev_scope: Option<Rect>,
    forming: bool,
    /// A child was detached somewhere below this node.
    structure_changed: bool,
    /// This node's own cursor interest, as last counted.
    tracks_cursor: bool,
    /// Entities in this subtree, self included, with cursor interest.
    cursor_interest: u32,
}

impl NodeMeta {
    fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            dependents: Vec::new(),
            frozen: 0,
            pending: Dirty::empty(),
            dirtied: Dirty::ALL,
            clean: false,
            prev_scope: None,
            forming: false,
            structure_changed: false,
            tracks_cursor: false,
            cursor_interest: 0,
        }
    }
}

struct Entry {
    /// `None` while the entity is temporarily extracted for a hook.
    entity: Option<Box<dyn Entity>>,
    meta: NodeMeta,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

struct BrushEntry {
    brush: Brush,
    /// Entities to dirty when the brush changes, with the flags each
    /// attachment cares about.
    attached: Vec<(EntityId, Dirty)>,
}

struct BrushSlot {
    generation: u32,
    entry: Option<BrushEntry>,
}

/// Arena and bookkeeping for one scenegraph.
#[derive(Default)]
pub struct Stage {
    slots: Vec<Slot>,
    free: Vec<u32>,
    brushes: Vec<BrushSlot>,
    brush_free: Vec<u32>,
    /// Cursor position in root coordinates, when known.
    cursor: Option<(f32, f32)>,
    pressed: [Option<EntityId>; 3],
    dragging: Option<EntityId>,
    focus: Option<EntityId>,
}

fn button_index(button: Button) -> usize {
    match button {
        Button::Left => 0,
        Button::Middle => 1,
        Button::Right => 2,
    }
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- arena ----

    pub fn register(&mut self, entity: impl Entity + 'static) -> EntityId {
        let mut meta = NodeMeta::new();
        {
            let core = entity.core();
            meta.tracks_cursor = core.track_cursor || core.responder.tracks_cursor();
            meta.cursor_interest = meta.tracks_cursor as u32;
        }
        let entry = Entry {
            entity: Some(Box::new(entity)),
            meta,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            EntityId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove an entity and its whole subtree.
    pub fn remove(&mut self, id: EntityId) -> Result<(), SceneError> {
        if self.entry(id).is_none() {
            return Err(SceneError::UnknownEntity);
        }
        for child in self.children(id) {
            let _ = self.remove(child);
        }
        if self.parent(id).is_some() {
            let _ = self.remove_parent(id);
        }
        // Strip dangling dependency edges and brush attachments.
        for slot in &mut self.slots {
            if let Some(entry) = &mut slot.entry {
                entry.meta.dependents.retain(|d| *d != id);
            }
        }
        for slot in &mut self.brushes {
            if let Some(entry) = &mut slot.entry {
                entry.attached.retain(|(e, _)| *e != id);
            }
        }
        let slot = &mut self.slots[id.index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some_and(|s| s.entry.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: EntityId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }

    fn entry(&self, id: EntityId) -> Option<&Entry> {
        self.slot(id)?.entry.as_ref()
    }

    fn entry_mut(&mut self, id: EntityId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?
            .entry
            .as_mut()
    }

    fn meta(&self, id: EntityId) -> Option<&NodeMeta> {
        self.entry(id).map(|e| &e.meta)
    }

    fn meta_mut(&mut self, id: EntityId) -> Option<&mut NodeMeta> {
        self.entry_mut(id).map(|e| &mut e.meta)
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        self.entry(id)?.entity.as_deref()
    }

    pub fn try_core(&self, id: EntityId) -> Option<&EntityCore> {
        self.entity(id).map(|e| e.core())
    }

    pub fn try_core_mut(&mut self, id: EntityId) -> Option<&mut EntityCore> {
        self.entry_mut(id)?
            .entity
            .as_deref_mut()
            .map(|e| e.core_mut())
    }

    /// Run a hook with both the entity and the stage mutably borrowed.
    ///
    /// The entity is extracted from its slot for the duration, so the
    /// closure sees the stage without it; returns `None` for stale ids.
    pub fn with_entity_mut<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut Stage, &mut dyn Entity) -> R,
    ) -> Option<R> {
        let mut entity = self.entry_mut(id)?.entity.take()?;
        let result = f(self, entity.as_mut());
        if let Some(entry) = self.entry_mut(id) {
            entry.entity = Some(entity);
        }
        Some(result)
    }

    /// [`with_entity_mut`](Self::with_entity_mut) downcast to a concrete
    /// entity type.
    pub fn with_typed_mut<T: Entity + 'static, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut Stage, &mut T) -> R,
    ) -> Option<R> {
        self.with_entity_mut(id, |stage, entity| {
            entity.as_any_mut().downcast_mut::<T>().map(|t| f(stage, t))
        })
        .flatten()
    }

    /// Find an entity by its core name, linear over the arena.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            let entry = slot.entry.as_ref()?;
            let core = entry.entity.as_deref()?.core();
            if core.name.as_deref() == Some(name) {
                Some(EntityId {
                    index: index as u32,
                    generation: slot.generation,
                })
            } else {
                None
            }
        })
    }

    // ---- hierarchy ----

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.meta(id)?.parent
    }

    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.meta(id).map(|m| m.children.clone()).unwrap_or_default()
    }

    pub fn child_count(&self, id: EntityId) -> usize {
        self.meta(id).map_or(0, |m| m.children.len())
    }

    /// Preorder walk of the subtree below `id`, excluding `id` itself.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut queue = self.children(id);
        queue.reverse();
        while let Some(next) = queue.pop() {
            out.push(next);
            let mut kids = self.children(next);
            kids.reverse();
            queue.extend(kids);
        }
        out
    }

    fn is_ancestor_of(&self, candidate: EntityId, id: EntityId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            if p == candidate {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    /// Attach `child` under `parent` at the top of the z-order.
    ///
    /// Rejects a child that is already parented and any attachment that
    /// would close a cycle.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<(), SceneError> {
        if self.entry(child).is_none() || self.entry(parent).is_none() {
            return Err(SceneError::UnknownEntity);
        }
        if self.meta(child).is_some_and(|m| m.parent.is_some()) {
            return Err(SceneError::AlreadyParented);
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(SceneError::DependencyCycle);
        }
        if let Some(meta) = self.meta_mut(child) {
            meta.parent = Some(parent);
        }
        if let Some(meta) = self.meta_mut(parent) {
            meta.children.push(child);
        }
        let gained = self.meta(child).map_or(0, |m| m.cursor_interest);
        if gained > 0 {
            self.adjust_cursor_interest(Some(parent), gained as i32);
        }
        self.add_dependent(child, parent)?;
        self.fire(child, &Event::Added);
        self.with_entity_mut(parent, |stage, entity| {
            entity.child_added(stage, parent, child);
        });
        self.dirty(parent, Dirty::CONTENT);
        Ok(())
    }

    /// Detach an entity from its parent.
    ///
    /// Marks structure changes all the way up so owning scenes fall back
    /// to a full redraw on their next refresh.
    pub fn remove_parent(&mut self, child: EntityId) -> Result<(), SceneError> {
        let Some(parent) = self.parent(child) else {
            return Err(SceneError::NotParented);
        };
        if let Some(meta) = self.meta_mut(parent) {
            meta.children.retain(|c| *c != child);
        }
        if let Some(meta) = self.meta_mut(child) {
            meta.parent = None;
            meta.dependents.retain(|d| *d != parent);
        }
        let lost = self.meta(child).map_or(0, |m| m.cursor_interest);
        if lost > 0 {
            self.adjust_cursor_interest(Some(parent), -(lost as i32));
        }
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if let Some(meta) = self.meta_mut(a) {
                meta.structure_changed = true;
            }
            ancestor = self.parent(a);
        }
        self.fire(child, &Event::Removed);
        self.with_entity_mut(parent, |stage, entity| {
            entity.child_removed(stage, parent, child);
        });
        self.dirty(parent, Dirty::CONTENT);
        Ok(())
    }

    /// Move a child within its parent's z-order.
    pub fn set_child_index(&mut self, child: EntityId, index: usize) -> Result<(), SceneError> {
        let Some(parent) = self.parent(child) else {
            return Err(SceneError::NotParented);
        };
        if let Some(meta) = self.meta_mut(parent) {
            meta.children.retain(|c| *c != child);
            let index = index.min(meta.children.len());
            meta.children.insert(index, child);
        }
        // The moved child contributes its scope as damage so overlaps
        // repaint in the new order.
        self.mark_unclean(child);
        self.dirty(parent, Dirty::CONTENT);
        Ok(())
    }

    // ---- dependency graph ----

    /// Register `dependent` to be informed whenever `id` dirties.
    pub fn add_dependent(
        &mut self,
        id: EntityId,
        dependent: EntityId,
    ) -> Result<(), SceneError> {
        if self.entry(id).is_none() || self.entry(dependent).is_none() {
            return Err(SceneError::UnknownEntity);
        }
        if id == dependent || self.depends_transitively(id, dependent) {
            return Err(SceneError::DependencyCycle);
        }
        if let Some(meta) = self.meta_mut(id) {
            if !meta.dependents.contains(&dependent) {
                meta.dependents.push(dependent);
            }
        }
        Ok(())
    }

    pub fn remove_dependent(&mut self, id: EntityId, dependent: EntityId) {
        if let Some(meta) = self.meta_mut(id) {
            meta.dependents.retain(|d| *d != dependent);
        }
    }

    /// Whether `target` is reachable from `start` along dependency edges.
    fn depends_transitively(&self, start: EntityId, target: EntityId) -> bool {
        let mut queue = vec![start];
        let mut seen = vec![start];
        while let Some(next) = queue.pop() {
            let Some(meta) = self.meta(next) else { continue };
            for dep in &meta.dependents {
                if *dep == target {
                    return true;
                }
                if !seen.contains(dep) {
                    seen.push(*dep);
                    queue.push(*dep);
                }
            }
        }
        false
    }

    // ---- dirty machinery ----

    /// Deliver dirt to an entity.
    ///
    /// While frozen the flags coalesce into a pending mask; otherwise
    /// they accumulate, the Dirty handlers fire, child constraints
    /// re-evaluate on frame changes, and dependents are informed in
    /// attachment order.
    pub fn dirty(&mut self, id: EntityId, flags: Dirty) {
        let Some(meta) = self.meta_mut(id) else { return };
        if meta.frozen > 0 {
            meta.pending |= flags;
            return;
        }
        meta.dirtied |= flags;
        meta.clean = false;
        if flags.intersects(Dirty::POSITION | Dirty::SIZE | Dirty::TRANSFORMS) {
            if let Some(core) = self.try_core_mut(id) {
                core.invalidate_matrix();
            }
        }
        self.fire(id, &Event::Dirty(flags));
        if flags.intersects(Dirty::FRAME) {
            self.apply_child_constraints(id);
        }
        // A resized container lays its children out again. Leaves have a
        // no-op form, and the forming guard stops recursion.
        if flags.intersects(Dirty::SIZE) {
            self.reform(id);
        }
        let dependents = self
            .meta(id)
            .map(|m| m.dependents.clone())
            .unwrap_or_default();
        let parent = self.parent(id);
        for dep in dependents {
            if parent == Some(dep) {
                // The hook is unavailable while the parent is extracted
                // for its own layout pass; bubble plain content dirt.
                let hooked = self
                    .with_entity_mut(dep, |stage, entity| {
                        entity.child_dirtied(stage, dep, id, flags);
                    })
                    .is_some();
                if !hooked {
                    self.dirty(dep, Dirty::CONTENT);
                }
            } else {
                self.dirty(dep, Dirty::CONTENT);
            }
        }
    }

    /// Suspend dirty delivery for an entity. Nestable.
    ///
    /// Mutations still land on the core, so `frame()` reads the new
    /// geometry immediately; matrix invalidation rides dirty delivery,
    /// so hit testing and scope queries keep answering from the last
    /// delivered state until the matching unfreeze. Damage tracking
    /// relies on that deferral.
    pub fn freeze(&mut self, id: EntityId) {
        if let Some(meta) = self.meta_mut(id) {
            meta.frozen += 1;
        }
    }

    /// Balance a [`freeze`](Self::freeze); at zero the coalesced pending
    /// mask is delivered as one dirty.
    pub fn unfreeze(&mut self, id: EntityId) {
        let pending = {
            let Some(meta) = self.meta_mut(id) else { return };
            if meta.frozen == 0 {
                log::warn!("unfreeze without matching freeze");
                return;
            }
            meta.frozen -= 1;
            if meta.frozen == 0 {
                std::mem::replace(&mut meta.pending, Dirty::empty())
            } else {
                Dirty::empty()
            }
        };
        if !pending.is_empty() {
            self.dirty(id, pending);
        }
    }

    pub fn is_frozen(&self, id: EntityId) -> bool {
        self.meta(id).is_some_and(|m| m.frozen > 0)
    }

    pub fn dirtied(&self, id: EntityId) -> Dirty {
        self.meta(id).map(|m| m.dirtied).unwrap_or_default()
    }

    pub fn is_clean(&self, id: EntityId) -> bool {
        self.meta(id).is_some_and(|m| m.clean)
    }

    /// Force an entity to repaint at the next refresh without changing
    /// what it paints.
    pub fn mark_unclean(&mut self, id: EntityId) {
        if let Some(meta) = self.meta_mut(id) {
            meta.clean = false;
        }
    }

    /// Clear accumulated dirt after the entity was drawn.
    pub fn mark_drawn(&mut self, id: EntityId) {
        if let Some(meta) = self.meta_mut(id) {
            meta.dirtied = Dirty::empty();
            meta.clean = true;
        }
    }

    pub fn prev_scope(&self, id: EntityId) -> Option<Rect> {
        self.meta(id).and_then(|m| m.prev_scope)
    }

    pub fn set_prev_scope(&mut self, id: EntityId, scope: Option<Rect>) {
        if let Some(meta) = self.meta_mut(id) {
            meta.prev_scope = scope;
        }
    }

    /// Read and clear the structure-changed flag.
    pub fn take_structure_changed(&mut self, id: EntityId) -> bool {
        self.meta_mut(id)
            .map(|m| std::mem::replace(&mut m.structure_changed, false))
            .unwrap_or(false)
    }

    pub fn is_forming(&self, id: EntityId) -> bool {
        self.meta(id).is_some_and(|m| m.forming)
    }

    pub(crate) fn begin_forming(&mut self, id: EntityId) {
        if let Some(meta) = self.meta_mut(id) {
            meta.forming = true;
        }
    }

    pub(crate) fn end_forming(&mut self, id: EntityId) {
        if let Some(meta) = self.meta_mut(id) {
            meta.forming = false;
        }
    }

    /// Run an entity's layout pass, guarded against re-entry.
    pub fn reform(&mut self, id: EntityId) {
        if self.meta(id).map_or(true, |m| m.forming) {
            return;
        }
        if let Some(meta) = self.meta_mut(id) {
            meta.forming = true;
        }
        self.with_entity_mut(id, |stage, entity| {
            entity.form(stage, id);
        });
        if let Some(meta) = self.meta_mut(id) {
            meta.forming = false;
        }
    }

    fn apply_child_constraints(&mut self, id: EntityId) {
        let Some(parent_rect) = self.try_core(id).map(|c| c.local_rect()) else {
            return;
        };
        for child in self.children(id) {
            let flags = {
                let Some(core) = self.try_core_mut(child) else { continue };
                if core.constraints.is_empty() {
                    continue;
                }
                let before = core.frame();
                let mut constraints = std::mem::take(&mut core.constraints);
                for constraint in constraints.iter_mut() {
                    constraint(core, parent_rect);
                }
                core.constraints = constraints;
                let after = core.frame();
                let mut flags = Dirty::empty();
                if before.x != after.x || before.y != after.y {
                    flags |= Dirty::POSITION;
                }
                if before.width != after.width || before.height != after.height {
                    flags |= Dirty::SIZE;
                }
                flags
            };
            if !flags.is_empty() {
                self.dirty(child, flags);
            }
        }
    }

    /// Attach a positioning constraint, applied now and on every parent
    /// frame change.
    pub fn constrain(
        &mut self,
        id: EntityId,
        constraint: impl FnMut(&mut EntityCore, Rect) + 'static,
    ) -> Result<(), SceneError> {
        let mut constraint: Box<dyn FnMut(&mut EntityCore, Rect)> = Box::new(constraint);
        let parent_rect = self
            .parent(id)
            .and_then(|p| self.try_core(p))
            .map(|c| c.local_rect());
        let Some(core) = self.try_core_mut(id) else {
            return Err(SceneError::UnknownEntity);
        };
        let flags = if let Some(rect) = parent_rect {
            let before = core.frame();
            constraint(core, rect);
            let after = core.frame();
            let mut flags = Dirty::empty();
            if before.x != after.x || before.y != after.y {
                flags |= Dirty::POSITION;
            }
            if before.width != after.width || before.height != after.height {
                flags |= Dirty::SIZE;
            }
            flags
        } else {
            Dirty::empty()
        };
        core.constraints.push(constraint);
        if !flags.is_empty() {
            self.dirty(id, flags);
        }
        Ok(())
    }

    // ---- brushes ----

    pub fn add_brush(&mut self, brush: Brush) -> BrushId {
        let entry = BrushEntry {
            brush,
            attached: Vec::new(),
        };
        if let Some(index) = self.brush_free.pop() {
            let slot = &mut self.brushes[index as usize];
            slot.entry = Some(entry);
            BrushId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.brushes.len() as u32;
            self.brushes.push(BrushSlot {
                generation: 0,
                entry: Some(entry),
            });
            BrushId {
                index,
                generation: 0,
            }
        }
    }

    fn brush_entry(&self, id: BrushId) -> Option<&BrushEntry> {
        self.brushes
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)?
            .entry
            .as_ref()
    }

    fn brush_entry_mut(&mut self, id: BrushId) -> Option<&mut BrushEntry> {
        self.brushes
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?
            .entry
            .as_mut()
    }

    pub fn brush(&self, id: BrushId) -> Option<&Brush> {
        self.brush_entry(id).map(|e| &e.brush)
    }

    pub fn remove_brush(&mut self, id: BrushId) -> Result<(), SceneError> {
        let slot = self
            .brushes
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .ok_or(SceneError::UnknownBrush)?;
        if slot.entry.take().is_none() {
            return Err(SceneError::UnknownBrush);
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.brush_free.push(id.index);
        Ok(())
    }

    /// Register an entity to be dirtied with `flags` whenever the brush
    /// changes.
    pub fn attach_brush(
        &mut self,
        brush: BrushId,
        entity: EntityId,
        flags: Dirty,
    ) -> Result<(), SceneError> {
        let entry = self.brush_entry_mut(brush).ok_or(SceneError::UnknownBrush)?;
        entry.attached.push((entity, flags));
        Ok(())
    }

    pub fn detach_brush(&mut self, brush: BrushId, entity: EntityId) {
        if let Some(entry) = self.brush_entry_mut(brush) {
            if let Some(at) = entry.attached.iter().position(|(e, _)| *e == entity) {
                entry.attached.remove(at);
            }
        }
    }

    /// Mutate a shared brush and fan the change out to every attached
    /// entity.
    pub fn update_brush(
        &mut self,
        id: BrushId,
        f: impl FnOnce(&mut Brush),
    ) -> Result<(), SceneError> {
        let entry = self.brush_entry_mut(id).ok_or(SceneError::UnknownBrush)?;
        f(&mut entry.brush);
        let attached = entry.attached.clone();
        for (entity, flags) in attached {
            self.dirty(entity, flags);
        }
        Ok(())
    }

    /// Set or clear an entity's background brush.
    pub fn set_background(
        &mut self,
        id: EntityId,
        brush: Option<BrushId>,
    ) -> Result<(), SceneError> {
        let old = self
            .try_core(id)
            .ok_or(SceneError::UnknownEntity)?
            .background();
        if old == brush {
            return Ok(());
        }
        if let Some(old) = old {
            self.detach_brush(old, id);
        }
        if let Some(new) = brush {
            self.attach_brush(new, id, Dirty::BACKGROUND)?;
        }
        if let Some(core) = self.try_core_mut(id) {
            core.background = brush;
        }
        self.dirty(id, Dirty::BACKGROUND);
        Ok(())
    }

    // ---- frame and style setters ----

    pub fn set_position(&mut self, id: EntityId, x: f32, y: f32) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.frame.x == x && core.frame.y == y {
            return;
        }
        core.frame.x = x;
        core.frame.y = y;
        self.dirty(id, Dirty::POSITION);
    }

    pub fn translate_entity(&mut self, id: EntityId, dx: f32, dy: f32) {
        if let Some(frame) = self.try_core(id).map(|c| c.frame()) {
            self.set_position(id, frame.x + dx, frame.y + dy);
        }
    }

    /// Resize an entity, clamped to its minimum sizes.
    pub fn set_size(&mut self, id: EntityId, width: f32, height: f32) {
        let Some(core) = self.try_core_mut(id) else { return };
        let width = width.max(core.min_width);
        let height = height.max(core.min_height);
        if core.frame.width == width && core.frame.height == height {
            return;
        }
        core.frame.width = width;
        core.frame.height = height;
        self.dirty(id, Dirty::SIZE);
    }

    pub fn set_frame(&mut self, id: EntityId, frame: Rect) {
        let Some(core) = self.try_core_mut(id) else { return };
        let width = frame.width.max(core.min_width);
        let height = frame.height.max(core.min_height);
        let mut flags = Dirty::empty();
        if core.frame.x != frame.x || core.frame.y != frame.y {
            flags |= Dirty::POSITION;
        }
        if core.frame.width != width || core.frame.height != height {
            flags |= Dirty::SIZE;
        }
        if flags.is_empty() {
            return;
        }
        core.frame = Rect::new(frame.x, frame.y, width, height);
        self.dirty(id, flags);
    }

    pub fn set_visible(&mut self, id: EntityId, visible: bool) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.visible == visible {
            return;
        }
        core.visible = visible;
        self.dirty(id, Dirty::VISIBILITY);
    }

    pub fn set_alpha(&mut self, id: EntityId, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let Some(core) = self.try_core_mut(id) else { return };
        if core.alpha == alpha {
            return;
        }
        core.alpha = alpha;
        self.dirty(id, Dirty::VISIBILITY);
    }

    /// Include or exclude an entity from layout and drawing. Exclusion
    /// reads as a size change to the parent so containers reflow.
    pub fn set_included(&mut self, id: EntityId, included: bool) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.included == included {
            return;
        }
        core.included = included;
        self.dirty(id, Dirty::VISIBILITY | Dirty::SIZE);
    }

    pub fn set_rotation(&mut self, id: EntityId, rotation: f32) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.rotation == rotation {
            return;
        }
        core.rotation = rotation;
        self.dirty(id, Dirty::TRANSFORMS);
    }

    pub fn set_scale(&mut self, id: EntityId, scale_x: f32, scale_y: f32) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.scale_x == scale_x && core.scale_y == scale_y {
            return;
        }
        core.scale_x = scale_x;
        core.scale_y = scale_y;
        self.dirty(id, Dirty::TRANSFORMS);
    }

    pub fn set_anchor(&mut self, id: EntityId, anchor_x: f32, anchor_y: f32) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.anchor_x == anchor_x && core.anchor_y == anchor_y {
            return;
        }
        core.anchor_x = anchor_x;
        core.anchor_y = anchor_y;
        self.dirty(id, Dirty::TRANSFORMS);
    }

    pub fn set_flip(&mut self, id: EntityId, flip_x: bool, flip_y: bool) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.flip_x == flip_x && core.flip_y == flip_y {
            return;
        }
        core.flip_x = flip_x;
        core.flip_y = flip_y;
        self.dirty(id, Dirty::TRANSFORMS);
    }

    pub fn set_bounds(&mut self, id: EntityId, bounds: Option<Shape>) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.bounds == bounds {
            return;
        }
        core.bounds = bounds;
        self.dirty(id, Dirty::CONTENT);
    }

    pub fn set_buffered(&mut self, id: EntityId, buffered: bool) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.buffered == buffered {
            return;
        }
        core.buffered = buffered;
        core.display_list = None;
        self.dirty(id, Dirty::CONTENT);
    }

    // ---- events ----

    /// Register an event handler.
    ///
    /// Registration goes through the stage so cursor handlers surface
    /// as cursor interest on every ancestor, which routing prunes on.
    pub fn add_handler(
        &mut self,
        id: EntityId,
        kind: EventKind,
        callback: impl FnMut(&mut Stage, EntityId, &Event) -> bool + 'static,
    ) -> Result<HandlerId, SceneError> {
        let core = self.try_core_mut(id).ok_or(SceneError::UnknownEntity)?;
        let handler = core.responder.add_handler(kind, callback);
        self.sync_cursor_interest(id);
        Ok(handler)
    }

    /// Register a handler removed after its first invocation.
    pub fn add_handler_once(
        &mut self,
        id: EntityId,
        kind: EventKind,
        callback: impl FnMut(&mut Stage, EntityId, &Event) -> bool + 'static,
    ) -> Result<HandlerId, SceneError> {
        let core = self.try_core_mut(id).ok_or(SceneError::UnknownEntity)?;
        let handler = core.responder.add_handler_once(kind, callback);
        self.sync_cursor_interest(id);
        Ok(handler)
    }

    pub fn remove_handler(&mut self, id: EntityId, kind: EventKind, handler: HandlerId) {
        if let Some(core) = self.try_core_mut(id) {
            core.responder.remove_handler(kind, handler);
            self.sync_cursor_interest(id);
        }
    }

    /// Have an entity receive cursor events even without handlers.
    pub fn set_track_cursor(&mut self, id: EntityId, track: bool) {
        let Some(core) = self.try_core_mut(id) else { return };
        if core.track_cursor == track {
            return;
        }
        core.track_cursor = track;
        self.sync_cursor_interest(id);
    }

    /// Recount an entity's own cursor interest and bubble the change.
    fn sync_cursor_interest(&mut self, id: EntityId) {
        let tracks = self
            .try_core(id)
            .is_some_and(|c| c.track_cursor || c.responder.tracks_cursor());
        let was_quiet = {
            let Some(meta) = self.meta_mut(id) else { return };
            if meta.tracks_cursor == tracks {
                return;
            }
            meta.tracks_cursor = tracks;
            meta.cursor_interest == 0
        };
        if tracks && was_quiet {
            // Routing skipped this subtree while it was quiet, so its
            // containment flags are stale.
            self.clear_cursor_inside(id);
        }
        self.adjust_cursor_interest(Some(id), if tracks { 1 } else { -1 });
    }

    /// Apply a subtree interest delta at `start` and every ancestor.
    fn adjust_cursor_interest(&mut self, start: Option<EntityId>, delta: i32) {
        let mut node = start;
        while let Some(id) = node {
            if let Some(meta) = self.meta_mut(id) {
                meta.cursor_interest = (meta.cursor_interest as i32 + delta).max(0) as u32;
            }
            node = self.parent(id);
        }
    }

    fn clear_cursor_inside(&mut self, id: EntityId) {
        let mut ids = vec![id];
        ids.extend(self.descendants(id));
        for id in ids {
            if let Some(core) = self.try_core_mut(id) {
                core.cursor_inside = false;
            }
        }
    }

    /// Fire an event at an entity's handlers, in registration order,
    /// stopping once a handler reports it handled. Returns whether any
    /// handler did.
    pub fn fire(&mut self, id: EntityId, event: &Event) -> bool {
        let kind = event.kind();
        let entries = match self.try_core_mut(id) {
            Some(core) => core.responder.take_handlers(kind),
            None => return false,
        };
        let mut handled = false;
        let mut kept = Vec::with_capacity(entries.len());
        for mut entry in entries {
            if handled {
                kept.push(entry);
                continue;
            }
            let result = (entry.callback)(self, id, event);
            if !entry.remove_after_fire {
                kept.push(entry);
            }
            if result {
                handled = true;
            }
        }
        if let Some(core) = self.try_core_mut(id) {
            core.responder.restore_handlers(kind, kept);
        }
        if kind.is_cursor_kind() {
            // A spent once-handler may have been the last cursor one.
            self.sync_cursor_interest(id);
        }
        handled
    }

    /// The chain of entities under a root-space point, leafmost first,
    /// each paired with the point in its local coordinates. Topmost
    /// children win; an entity with no hit children matches on its own
    /// frame or custom bounds.
    pub fn hit_chain(&mut self, root: EntityId, x: f32, y: f32) -> Vec<(EntityId, f32, f32)> {
        fn descend(
            stage: &mut Stage,
            id: EntityId,
            x: f32,
            y: f32,
        ) -> Option<Vec<(EntityId, f32, f32)>> {
            let (visible, included) = match stage.try_core(id) {
                Some(core) => (core.visible(), core.included()),
                None => return None,
            };
            if !visible || !included {
                return None;
            }
            let (lx, ly) = stage.try_core_mut(id)?.parent_to_local(x, y)?;
            let children = stage.children(id);
            for child in children.into_iter().rev() {
                if let Some(mut chain) = descend(stage, child, lx, ly) {
                    chain.push((id, lx, ly));
                    return Some(chain);
                }
            }
            if stage.try_core(id)?.hit_test_local(lx, ly) {
                Some(vec![(id, lx, ly)])
            } else {
                None
            }
        }
        descend(self, root, x, y).unwrap_or_default()
    }

    /// Route a cursor move through the tree below `root`.
    ///
    /// Fires enter, move, and leave events against each entity's own
    /// containment state and advances an active drag.
    pub fn cursor_move(&mut self, root: EntityId, x: f32, y: f32) {
        let (dx, dy) = match self.cursor {
            Some((px, py)) => (x - px, y - py),
            None => (0.0, 0.0),
        };
        self.cursor = Some((x, y));
        if let Some(dragged) = self.dragging {
            self.translate_entity(dragged, dx, dy);
        }
        self.route_cursor(root, x, y, dx, dy);
    }

    fn route_cursor(&mut self, id: EntityId, x: f32, y: f32, dx: f32, dy: f32) {
        // Subtrees with no cursor interest anywhere below are skipped
        // outright.
        if self.meta(id).map_or(true, |m| m.cursor_interest == 0) {
            return;
        }
        let Some(core) = self.try_core_mut(id) else { return };
        if !core.visible || !core.included {
            return;
        }
        let local = core.parent_to_local(x, y);
        let was_inside = core.cursor_inside;
        let inside = local.is_some_and(|(lx, ly)| core.hit_test_local(lx, ly));
        core.cursor_inside = inside;
        let own_interest = core.track_cursor || core.responder.tracks_cursor();
        if own_interest {
            match (was_inside, inside, local) {
                (false, true, Some((lx, ly))) => {
                    self.fire(id, &Event::CursorEnter { x: lx, y: ly });
                    self.fire(id, &Event::CursorMove { x: lx, y: ly, dx, dy });
                }
                (true, true, Some((lx, ly))) => {
                    self.fire(id, &Event::CursorMove { x: lx, y: ly, dx, dy });
                }
                (true, false, _) => {
                    self.fire(id, &Event::CursorLeave);
                }
                _ => {}
            }
        }
        if let Some((lx, ly)) = local {
            for child in self.children(id) {
                self.route_cursor(child, lx, ly, dx, dy);
            }
        }
    }

    /// Clear cursor state, as when the cursor leaves the display.
    pub fn cursor_leave(&mut self, root: EntityId) {
        self.cursor = None;
        let mut ids = vec![root];
        ids.extend(self.descendants(root));
        for id in ids {
            let was_inside = match self.try_core_mut(id) {
                Some(core) => std::mem::replace(&mut core.cursor_inside, false),
                None => continue,
            };
            if was_inside {
                self.fire(id, &Event::CursorLeave);
            }
        }
    }

    pub fn cursor_position(&self) -> Option<(f32, f32)> {
        self.cursor
    }

    /// Route a button press at the current cursor position.
    ///
    /// The press bubbles from the topmost hit entity up the chain until
    /// handled. The hit entity is remembered for click synthesis, and a
    /// left press on a draggable entity in the chain starts a drag.
    pub fn press(&mut self, root: EntityId, button: Button) {
        let Some((x, y)) = self.cursor else { return };
        let chain = self.hit_chain(root, x, y);
        self.pressed[button_index(button)] = chain.first().map(|(id, _, _)| *id);
        if button == Button::Left {
            self.dragging = chain
                .iter()
                .find(|(id, _, _)| self.try_core(*id).is_some_and(|c| c.draggable))
                .map(|(id, _, _)| *id);
        }
        for (id, lx, ly) in chain {
            if self.fire(id, &Event::Press { x: lx, y: ly, button }) {
                break;
            }
        }
    }

    /// Route a button release; fires a click when the release lands on
    /// the entity that took the press.
    pub fn release(&mut self, root: EntityId, button: Button) {
        if button == Button::Left {
            self.dragging = None;
        }
        let Some((x, y)) = self.cursor else {
            self.pressed[button_index(button)] = None;
            return;
        };
        let chain = self.hit_chain(root, x, y);
        let pressed = self.pressed[button_index(button)].take();
        for (id, lx, ly) in &chain {
            if self.fire(*id, &Event::Release { x: *lx, y: *ly, button }) {
                break;
            }
        }
        if let Some(pressed) = pressed {
            if chain.iter().any(|(id, _, _)| *id == pressed) {
                self.fire(pressed, &Event::Click { button });
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Give key focus to an entity, or clear it.
    pub fn set_focus(&mut self, id: Option<EntityId>) {
        self.focus = match id {
            Some(id) if self.entry(id).is_some() => Some(id),
            Some(_) => {
                log::warn!("set_focus on an unknown entity");
                None
            }
            None => None,
        };
    }

    pub fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    /// Route a key press to the focused entity, bubbling up the tree
    /// until a handler takes it.
    pub fn key_press(&mut self, key: Key) {
        self.route_key(Event::KeyPress { key });
    }

    pub fn key_release(&mut self, key: Key) {
        self.route_key(Event::KeyRelease { key });
    }

    fn route_key(&mut self, event: Event) {
        let mut target = self.focus;
        while let Some(id) = target {
            if self.fire(id, &event) {
                return;
            }
            target = self.parent(id);
        }
    }
}
