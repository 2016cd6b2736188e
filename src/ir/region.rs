//! Region tree: the IR's structured-control-flow backbone (spec.md §3, §9).
//!
//! Rather than the source's pointer-linked tree, regions live in one flat
//! `Vec` per function and reference each other by [`RegionId`] index — the
//! "arena + indices" re-architecture spec.md §9 calls for. A region's
//! `instructions` list is the single source of truth for execution order;
//! `Instruction::Region` entries mark where a child region's control
//! construct is emitted, and `children` simply mirrors those same ids for
//! callers that want to walk the tree without scanning instructions.

use super::instruction::Instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Block,
    Loop,
    If,
    Function,
}

#[derive(Debug, Clone, Copy)]
pub enum RegionData {
    None,
    If {
        then_region: RegionId,
        else_region: Option<RegionId>,
    },
    Loop {
        condition_region: RegionId,
        body_region: RegionId,
        is_do_while: bool,
    },
}

#[derive(Debug)]
pub struct Region {
    pub id: RegionId,
    pub kind: RegionKind,
    pub instructions: Vec<Instruction>,
    pub children: Vec<RegionId>,
    pub parent: Option<RegionId>,
    /// Value-producing ("expression context") vs. void ("statement
    /// context"). Decides the WASM blocktype an `If` region emits as
    /// (spec.md §9, open question (a)).
    pub is_expression: bool,
    pub data: RegionData,
}

/// Owns every region belonging to one function.
#[derive(Debug, Default)]
pub struct RegionArena {
    regions: Vec<Region>,
}

impl RegionArena {
    pub fn new() -> Self {
        RegionArena::default()
    }

    pub fn create(&mut self, kind: RegionKind, parent: Option<RegionId>, is_expression: bool) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region {
            id,
            kind,
            instructions: Vec::new(),
            children: Vec::new(),
            parent,
            is_expression,
            data: RegionData::None,
        });
        id
    }

    pub fn get(&self, id: RegionId) -> &Region {
        &self.regions[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id.0 as usize]
    }

    pub fn set_data(&mut self, id: RegionId, data: RegionData) {
        self.get_mut(id).data = data;
    }

    pub fn emit(&mut self, id: RegionId, instr: Instruction) {
        self.get_mut(id).instructions.push(instr);
    }

    /// Attach `child` to `parent`: records it in `parent`'s `children` list
    /// and inlines an `Instruction::Region` marker at the current position
    /// in `parent`'s instruction stream.
    pub fn attach_child(&mut self, parent: RegionId, child: RegionId) {
        let region = self.get_mut(parent);
        region.children.push(child);
        region.instructions.push(Instruction::Region(child));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaching_a_child_records_it_in_both_places() {
        let mut arena = RegionArena::new();
        let parent = arena.create(RegionKind::Function, None, false);
        let child = arena.create(RegionKind::Block, Some(parent), false);
        arena.attach_child(parent, child);

        assert_eq!(arena.get(parent).children, vec![child]);
        assert!(matches!(
            arena.get(parent).instructions.as_slice(),
            [Instruction::Region(id)] if *id == child
        ));
    }

    #[test]
    fn parent_pointer_is_set_at_creation() {
        let mut arena = RegionArena::new();
        let root = arena.create(RegionKind::Function, None, false);
        let child = arena.create(RegionKind::Block, Some(root), false);
        assert_eq!(arena.get(child).parent, Some(root));
        assert_eq!(arena.get(root).parent, None);
    }
}
