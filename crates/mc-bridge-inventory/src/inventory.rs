//! Local mirror of the Java window the player is interacting with.
//!
//! Every click the bridge sends is applied here first, so the next click in
//! the same plan (or the next plan) sees what the server will see.

use std::ops::Range;

use mc_bridge_proto::item_stack::ItemStack;

static EMPTY: ItemStack = ItemStack {
    runtime_id: 0,
    count: 0,
    metadata: 0,
    nbt_data: Vec::new(),
};

/// Number of main inventory + hotbar slots at the end of every Java window.
pub const PLAYER_SLOTS: usize = 36;
/// Hotbar width.
pub const HOTBAR_SLOTS: usize = 9;

/// One Java window: slot contents plus the window's action-number counter.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub window_id: u8,
    slots: Vec<ItemStack>,
    /// Last action number handed out for this window.
    last_action_id: i16,
}

impl Inventory {
    /// Create an empty window with `size` slots.
    pub fn new(window_id: u8, size: usize) -> Self {
        Self {
            window_id,
            slots: vec![ItemStack::empty(); size],
            last_action_id: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Item in a slot. Out-of-range slots read as empty.
    pub fn get_item(&self, slot: usize) -> &ItemStack {
        self.slots.get(slot).unwrap_or(&EMPTY)
    }

    /// Set a slot. Out-of-range slots are ignored.
    pub fn set_item(&mut self, slot: usize, item: ItemStack) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = item;
        }
    }

    pub fn items(&self) -> &[ItemStack] {
        &self.slots
    }

    /// Replace every slot with authoritative contents, keeping the window size.
    pub fn set_items(&mut self, items: Vec<ItemStack>) {
        let size = self.slots.len();
        self.slots = items;
        self.slots.resize(size, ItemStack::empty());
    }

    /// Reserve the next action number. Numbers are positive and wrap.
    pub fn next_action_id(&mut self) -> i16 {
        self.last_action_id = if self.last_action_id == i16::MAX {
            1
        } else {
            self.last_action_id + 1
        };
        self.last_action_id
    }

    /// Whether this is the player's own window (id 0), which ends in the off-hand slot.
    pub fn is_player_window(&self) -> bool {
        self.window_id == 0
    }

    /// Main inventory and hotbar slots, excluding the off-hand.
    pub fn player_range(&self) -> Range<usize> {
        let offset = usize::from(self.is_player_window());
        let end = self.slots.len().saturating_sub(offset);
        end.saturating_sub(PLAYER_SLOTS)..end
    }
}

/// Everything the click simulation touches: the open window, the cursor
/// shared by the whole session, and the selected hotbar slot.
#[derive(Debug, Clone)]
pub struct InventoryMirror {
    pub inventory: Inventory,
    pub cursor: ItemStack,
    /// Selected hotbar slot (0-8).
    pub held_slot: u8,
    /// Whether a container other than the player's own window is open.
    pub container_open: bool,
}

impl InventoryMirror {
    pub fn new(inventory: Inventory) -> Self {
        let container_open = !inventory.is_player_window();
        Self {
            inventory,
            cursor: ItemStack::empty(),
            held_slot: 0,
            container_open,
        }
    }

    pub fn get_item(&self, slot: usize) -> &ItemStack {
        self.inventory.get_item(slot)
    }

    pub fn set_item(&mut self, slot: usize, item: ItemStack) {
        self.inventory.set_item(slot, item);
    }

    /// Java slot of the selected hotbar item.
    pub fn hotbar_slot(&self) -> usize {
        let range = self.inventory.player_range();
        range.end - HOTBAR_SLOTS + self.held_slot as usize
    }
}
