//! Single-slot clicks and their effect on the mirror.
//!
//! The effects follow what the Java server does for a plain click on a
//! slot, so that applying them locally keeps the mirror in step without
//! waiting for the server's window updates.

use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::ClickMode;

use crate::inventory::InventoryMirror;
use crate::translator::SlotType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Left,
    Right,
    Shift,
}

impl Click {
    pub fn button(self) -> i8 {
        match self {
            Self::Left | Self::Shift => 0,
            Self::Right => 1,
        }
    }

    pub fn mode(self) -> ClickMode {
        match self {
            Self::Left | Self::Right => ClickMode::Pickup,
            Self::Shift => ClickMode::QuickMove,
        }
    }

    /// Apply this click on `slot` to the mirror.
    ///
    /// Shift clicks are left alone: where the items end up depends on the
    /// server's layout rules, so the mirror waits for the server instead.
    pub fn apply(self, mirror: &mut InventoryMirror, slot: usize, slot_type: SlotType) {
        match (self, slot_type) {
            (Self::Shift, _) => {}
            (_, SlotType::Output) => take_result(mirror, slot),
            (Self::Left, SlotType::Normal) => left_click(mirror, slot),
            (Self::Right, SlotType::Normal) => right_click(mirror, slot),
            (Self::Left, SlotType::FurnaceOutput) => take_result(mirror, slot),
            (Self::Right, SlotType::FurnaceOutput) => {
                // Nothing can be placed into a furnace result.
                if mirror.cursor.is_empty() {
                    right_click(mirror, slot);
                }
            }
        }
    }
}

/// Merge the cursor into the slot if they stack, otherwise swap them.
fn left_click(mirror: &mut InventoryMirror, slot: usize) {
    let clicked = mirror.get_item(slot).clone();
    if mirror.cursor.can_stack(&clicked) {
        let merged = clicked.with_count(clicked.count.saturating_add(mirror.cursor.count));
        mirror.set_item(slot, merged);
        mirror.cursor = ItemStack::empty();
    } else {
        let cursor = std::mem::replace(&mut mirror.cursor, clicked);
        mirror.set_item(slot, cursor);
    }
}

/// Split the slot into an empty cursor, or place a single item from the cursor.
fn right_click(mirror: &mut InventoryMirror, slot: usize) {
    let clicked = mirror.get_item(slot).clone();
    let cursor = mirror.cursor.clone();
    if cursor.is_empty() {
        if !clicked.is_empty() {
            // The larger half stays in the slot.
            let moved = clicked.count / 2;
            mirror.cursor = clicked.with_count(moved);
            mirror.set_item(slot, clicked.with_count(clicked.count - moved));
        }
    } else if clicked.is_empty() {
        mirror.set_item(slot, cursor.with_count(1));
        mirror.cursor = cursor.with_count(cursor.count - 1);
    } else if cursor.can_stack(&clicked) {
        mirror.set_item(slot, clicked.with_count(clicked.count.saturating_add(1)));
        mirror.cursor = cursor.with_count(cursor.count - 1);
    }
}

/// Take a whole result stack into the cursor if it is empty or compatible.
fn take_result(mirror: &mut InventoryMirror, slot: usize) {
    let result = mirror.get_item(slot).clone();
    if result.is_empty() {
        return;
    }
    if mirror.cursor.is_empty() {
        mirror.cursor = result;
    } else if mirror.cursor.can_stack(&result) {
        let total = mirror.cursor.count.saturating_add(result.count);
        mirror.cursor = result.with_count(total);
    } else {
        return;
    }
    mirror.set_item(slot, ItemStack::empty());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Inventory;

    fn mirror_with(slot: usize, item: ItemStack, cursor: ItemStack) -> InventoryMirror {
        let mut mirror = InventoryMirror::new(Inventory::new(0, 46));
        mirror.set_item(slot, item);
        mirror.cursor = cursor;
        mirror
    }

    #[test]
    fn left_click_picks_up_whole_stack() {
        let mut m = mirror_with(9, ItemStack::new(1, 32), ItemStack::empty());
        Click::Left.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(m.cursor, ItemStack::new(1, 32));
        assert!(m.get_item(9).is_empty());
    }

    #[test]
    fn left_click_merges_compatible_cursor() {
        let mut m = mirror_with(9, ItemStack::new(1, 10), ItemStack::new(1, 5));
        Click::Left.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(1, 15));
        assert!(m.cursor.is_empty());
    }

    #[test]
    fn left_click_swaps_different_items() {
        let mut m = mirror_with(9, ItemStack::new(1, 10), ItemStack::new(2, 3));
        Click::Left.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(2, 3));
        assert_eq!(m.cursor, ItemStack::new(1, 10));
    }

    #[test]
    fn right_click_splits_even_stack() {
        let mut m = mirror_with(9, ItemStack::new(1, 10), ItemStack::empty());
        Click::Right.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(1, 5));
        assert_eq!(m.cursor, ItemStack::new(1, 5));
    }

    #[test]
    fn right_click_keeps_larger_half_in_slot() {
        let mut m = mirror_with(9, ItemStack::new(1, 7), ItemStack::empty());
        Click::Right.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(1, 4));
        assert_eq!(m.cursor, ItemStack::new(1, 3));
    }

    #[test]
    fn right_click_places_one_into_empty_slot() {
        let mut m = mirror_with(9, ItemStack::empty(), ItemStack::new(1, 3));
        Click::Right.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(1, 1));
        assert_eq!(m.cursor, ItemStack::new(1, 2));
    }

    #[test]
    fn right_click_adds_one_to_stack() {
        let mut m = mirror_with(9, ItemStack::new(1, 4), ItemStack::new(1, 1));
        Click::Right.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(1, 5));
        assert!(m.cursor.is_empty());
    }

    #[test]
    fn right_click_on_foreign_stack_does_nothing() {
        let mut m = mirror_with(9, ItemStack::new(1, 4), ItemStack::new(2, 1));
        Click::Right.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(1, 4));
        assert_eq!(m.cursor, ItemStack::new(2, 1));
    }

    #[test]
    fn shift_click_leaves_mirror_alone() {
        let mut m = mirror_with(9, ItemStack::new(1, 4), ItemStack::empty());
        Click::Shift.apply(&mut m, 9, SlotType::Normal);
        assert_eq!(*m.get_item(9), ItemStack::new(1, 4));
        assert!(m.cursor.is_empty());
    }

    #[test]
    fn output_slot_is_taken_whole() {
        let mut m = mirror_with(0, ItemStack::new(5, 4), ItemStack::empty());
        Click::Right.apply(&mut m, 0, SlotType::Output);
        assert_eq!(m.cursor, ItemStack::new(5, 4));
        assert!(m.get_item(0).is_empty());

        let mut m = mirror_with(0, ItemStack::new(5, 4), ItemStack::new(5, 4));
        Click::Left.apply(&mut m, 0, SlotType::Output);
        assert_eq!(m.cursor, ItemStack::new(5, 8));
    }

    #[test]
    fn furnace_output_never_accepts_items() {
        let mut m = mirror_with(2, ItemStack::empty(), ItemStack::new(7, 3));
        Click::Left.apply(&mut m, 2, SlotType::FurnaceOutput);
        Click::Right.apply(&mut m, 2, SlotType::FurnaceOutput);
        assert!(m.get_item(2).is_empty());
        assert_eq!(m.cursor, ItemStack::new(7, 3));

        let mut m = mirror_with(2, ItemStack::new(7, 6), ItemStack::new(7, 3));
        Click::Left.apply(&mut m, 2, SlotType::FurnaceOutput);
        assert!(m.get_item(2).is_empty());
        assert_eq!(m.cursor, ItemStack::new(7, 9));
    }
}
