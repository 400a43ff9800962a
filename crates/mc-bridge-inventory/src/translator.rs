//! Slot layouts: how a Bedrock (container, slot) pair maps onto a Java
//! window slot, and which Java slots behave specially when clicked.

use serde::Deserialize;

use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::{container_id, InventoryActionData, InventoryContent};

use crate::inventory::{Inventory, HOTBAR_SLOTS, PLAYER_SLOTS};

/// How a Java slot reacts to clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    Normal,
    /// Crafting result: any click takes the whole result.
    Output,
    /// Furnace result: items can be taken but never placed.
    FurnaceOutput,
}

/// Per-window-type knowledge the planner needs.
pub trait InventoryTranslator {
    /// Java window size, including the 36 player slots.
    fn size(&self) -> usize;

    /// Java slot touched by a Bedrock action.
    fn bedrock_slot_to_java(&self, action: &InventoryActionData) -> usize;

    fn slot_type(&self, _java_slot: usize) -> SlotType {
        SlotType::Normal
    }

    /// Convert a mirrored Java item into what the client should see.
    fn translate_to_upstream(&self, item: &ItemStack) -> ItemStack {
        item.clone()
    }

    /// Full window contents for a client resync.
    fn update_inventory(&self, inventory: &Inventory) -> InventoryContent {
        InventoryContent {
            window_id: inventory.window_id as u32,
            items: inventory
                .items()
                .iter()
                .map(|item| self.translate_to_upstream(item))
                .collect(),
        }
    }
}

/// Map the player's own Bedrock inventory (container 0) into the trailing 36
/// slots of a Java window whose player section starts at `offset`.
fn player_slot(offset: usize, bedrock_slot: usize) -> usize {
    if bedrock_slot < HOTBAR_SLOTS {
        offset + PLAYER_SLOTS - HOTBAR_SLOTS + bedrock_slot
    } else {
        offset + bedrock_slot - HOTBAR_SLOTS
    }
}

/// Java window 0: crafting output, 2x2 grid, armour, main, hotbar, off-hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerInventoryTranslator;

impl PlayerInventoryTranslator {
    pub const SIZE: usize = 46;
    pub const CRAFTING_OUTPUT: usize = 0;
    pub const OFFHAND: usize = 45;
}

impl InventoryTranslator for PlayerInventoryTranslator {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn bedrock_slot_to_java(&self, action: &InventoryActionData) -> usize {
        let slot = action.slot as usize;
        match action.source.container_id() {
            Some(container_id::INVENTORY) => player_slot(9, slot),
            Some(container_id::ARMOR) => 5 + slot,
            Some(container_id::OFFHAND) => Self::OFFHAND,
            Some(container_id::UI) => match slot {
                28..=31 => slot - 27,
                50 => Self::CRAFTING_OUTPUT,
                _ => slot,
            },
            _ => slot,
        }
    }

    fn slot_type(&self, java_slot: usize) -> SlotType {
        if java_slot == Self::CRAFTING_OUTPUT {
            SlotType::Output
        } else {
            SlotType::Normal
        }
    }
}

/// Generic container (chest, barrel, shulker box) followed by the player slots.
#[derive(Debug, Clone, Copy)]
pub struct ChestInventoryTranslator {
    pub container_size: usize,
}

impl InventoryTranslator for ChestInventoryTranslator {
    fn size(&self) -> usize {
        self.container_size + PLAYER_SLOTS
    }

    fn bedrock_slot_to_java(&self, action: &InventoryActionData) -> usize {
        let slot = action.slot as usize;
        match action.source.container_id() {
            Some(container_id::INVENTORY) => player_slot(self.container_size, slot),
            _ => slot,
        }
    }
}

/// Furnace: input, fuel, result, then the player slots.
#[derive(Debug, Default, Clone, Copy)]
pub struct FurnaceInventoryTranslator;

impl FurnaceInventoryTranslator {
    pub const RESULT: usize = 2;
}

impl InventoryTranslator for FurnaceInventoryTranslator {
    fn size(&self) -> usize {
        3 + PLAYER_SLOTS
    }

    fn bedrock_slot_to_java(&self, action: &InventoryActionData) -> usize {
        let slot = action.slot as usize;
        match action.source.container_id() {
            Some(container_id::INVENTORY) => player_slot(3, slot),
            _ => slot,
        }
    }

    fn slot_type(&self, java_slot: usize) -> SlotType {
        if java_slot == Self::RESULT {
            SlotType::FurnaceOutput
        } else {
            SlotType::Normal
        }
    }
}

/// Window layouts selectable from configuration or a replay scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    Player,
    Chest { rows: usize },
    Furnace,
}

impl Layout {
    pub fn translator(self) -> Box<dyn InventoryTranslator + Send> {
        match self {
            Self::Player => Box::new(PlayerInventoryTranslator),
            Self::Chest { rows } => Box::new(ChestInventoryTranslator {
                container_size: rows * 9,
            }),
            Self::Furnace => Box::new(FurnaceInventoryTranslator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_bridge_proto::packets::InventorySource;

    fn action(container: i32, slot: u32) -> InventoryActionData {
        InventoryActionData {
            source: InventorySource::Container {
                container_id: container,
            },
            slot,
            from_item: ItemStack::empty(),
            to_item: ItemStack::empty(),
        }
    }

    #[test]
    fn player_layout_mapping() {
        let t = PlayerInventoryTranslator;
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::INVENTORY, 0)), 36);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::INVENTORY, 8)), 44);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::INVENTORY, 9)), 9);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::INVENTORY, 35)), 35);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::ARMOR, 0)), 5);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::OFFHAND, 0)), 45);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::UI, 28)), 1);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::UI, 31)), 4);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::UI, 50)), 0);
        assert_eq!(t.slot_type(0), SlotType::Output);
        assert_eq!(t.slot_type(9), SlotType::Normal);
    }

    #[test]
    fn chest_layout_mapping() {
        let t = ChestInventoryTranslator { container_size: 27 };
        assert_eq!(t.size(), 63);
        assert_eq!(t.bedrock_slot_to_java(&action(2, 5)), 5);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::INVENTORY, 9)), 27);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::INVENTORY, 0)), 54);
    }

    #[test]
    fn furnace_result_is_special() {
        let t = FurnaceInventoryTranslator;
        assert_eq!(t.size(), 39);
        assert_eq!(t.slot_type(2), SlotType::FurnaceOutput);
        assert_eq!(t.slot_type(0), SlotType::Normal);
        assert_eq!(t.bedrock_slot_to_java(&action(container_id::INVENTORY, 0)), 30);
    }

    #[test]
    fn default_update_inventory_copies_every_slot() {
        let mut inv = Inventory::new(0, 46);
        inv.set_item(9, ItemStack::new(1, 3));
        let pkt = PlayerInventoryTranslator.update_inventory(&inv);
        assert_eq!(pkt.window_id, 0);
        assert_eq!(pkt.items.len(), 46);
        assert_eq!(pkt.items[9], ItemStack::new(1, 3));
    }

    #[test]
    fn layout_builds_matching_translator() {
        assert_eq!(Layout::Player.translator().size(), 46);
        assert_eq!(Layout::Chest { rows: 6 }.translator().size(), 90);
        assert_eq!(Layout::Furnace.translator().size(), 39);
    }
}
