//! Reconciliation planner.
//!
//! Bedrock reports what a gesture did as before/after pairs for the slots it
//! touched. Java wants the clicks that produce that result. The planner picks
//! the click sequence and falls back to a full resync whenever the delta does
//! not match a shape it can reproduce exactly.

use std::mem;

use tracing::{debug, warn};

use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::{container_id, InventoryActionData, InventorySource, SourceFlag};

use crate::action::{Action, ActionKind};
use crate::click::Click;
use crate::drop::DropKind;
use crate::inventory::InventoryMirror;
use crate::translator::{InventoryTranslator, SlotType};

/// State carried between batches while the client finishes moving a
/// crafting result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CraftFollowUp {
    #[default]
    None,
    /// The last batch touched the crafting output but could not continue a move.
    Blocked,
    /// A partial move out of the crafting output is in progress. The cursor
    /// was stashed in `temp_slot`, if anywhere.
    Pending { temp_slot: Option<usize> },
}

/// Ordered actions reproducing one batch.
#[derive(Debug, Default)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    /// Push the mirror to the client instead of guessing.
    pub fn resync() -> Self {
        Self {
            actions: vec![Action::refresh()],
        }
    }

    pub fn is_resync(&self) -> bool {
        matches!(self.actions.as_slice(), [only] if only.is_refresh())
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Actions collected while matching a batch, before sequence numbers are assigned.
#[derive(Debug, Default)]
struct Steps {
    kinds: Vec<ActionKind>,
    /// The mirror disagreed with the client's "before" state.
    refresh: bool,
    /// Follow the plan with a full resync.
    resync: bool,
}

impl Steps {
    fn new(refresh: bool) -> Self {
        Self {
            refresh,
            ..Self::default()
        }
    }

    fn click(&mut self, click: Click, slot: usize) {
        self.clicks(click, slot, 1);
    }

    fn clicks(&mut self, click: Click, slot: usize, times: u16) {
        for _ in 0..times {
            self.kinds.push(ActionKind::Click {
                click,
                slot,
                refresh: false,
            });
        }
    }

    fn drops(&mut self, kind: DropKind, slot: usize, times: u16) {
        for _ in 0..times {
            self.kinds.push(ActionKind::Drop { kind, slot });
        }
    }

    /// A furnace result can't be split onto an occupied cursor; shift-click
    /// it out and let the server tell us where it went.
    fn shift_and_resync(slot: usize) -> Self {
        Self {
            kinds: vec![ActionKind::Click {
                click: Click::Shift,
                slot,
                refresh: true,
            }],
            refresh: false,
            resync: true,
        }
    }

    fn finish(mut self, translator: &dyn InventoryTranslator) -> Plan {
        // Result slots are filled by the server, so our view of them is never trusted.
        let special = self.kinds.iter().any(|kind| {
            matches!(kind, ActionKind::Click { slot, .. } if translator.slot_type(*slot) != SlotType::Normal)
        });
        if self.refresh || special {
            if let Some(ActionKind::Click { refresh, .. }) = self.kinds.last_mut() {
                *refresh = true;
            }
        }
        let mut actions: Vec<Action> = self
            .kinds
            .into_iter()
            .map(|kind| Action::new(kind, 0))
            .collect();
        if self.resync {
            actions.push(Action::refresh());
        }
        Plan { actions }
    }
}

type Planned = Result<Steps, &'static str>;

/// Item count, treating empty stacks as zero.
fn amount(item: &ItemStack) -> u16 {
    if item.is_empty() {
        0
    } else {
        item.count
    }
}

/// Touched slots of one batch, sorted by role.
#[derive(Default)]
struct Touches<'a> {
    world: Option<&'a InventoryActionData>,
    cursor: Option<&'a InventoryActionData>,
    containers: Vec<&'a InventoryActionData>,
}

impl<'a> Touches<'a> {
    fn classify(actions: &'a [InventoryActionData]) -> Result<Self, &'static str> {
        let mut touches = Self::default();
        for action in actions {
            if action.source.is_world_interaction() {
                if touches.world.replace(action).is_some() {
                    return Err("two world touches");
                }
            } else if action.is_cursor() {
                if touches.cursor.replace(action).is_some() {
                    return Err("two cursor touches");
                }
            } else {
                touches.containers.push(action);
            }
        }
        Ok(touches)
    }
}

/// Turns Bedrock inventory batches into plans. One per session.
#[derive(Debug, Default)]
pub struct Planner {
    craft: CraftFollowUp,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn craft_follow_up(&self) -> CraftFollowUp {
        self.craft
    }

    /// Forget any crafting follow-up, e.g. after the window changed under us.
    pub fn reset(&mut self) {
        self.craft = CraftFollowUp::None;
    }

    /// Plan one batch. Returns `None` for batches that are not ours to plan:
    /// empty ones and those touching the crafting pseudo-containers.
    pub fn plan(
        &mut self,
        actions: &[InventoryActionData],
        mirror: &InventoryMirror,
        translator: &dyn InventoryTranslator,
    ) -> Option<Plan> {
        if actions.is_empty() {
            return None;
        }
        let crafting = actions.iter().any(|a| {
            matches!(
                a.source.container_id(),
                Some(container_id::CRAFTING_USE_INGREDIENT | container_id::CRAFTING_RESULT)
            )
        });
        if crafting {
            debug!("leaving crafting batch of {} actions alone", actions.len());
            return None;
        }

        let craft = mem::take(&mut self.craft);
        let planned = if actions.len() == 2 {
            self.plan_pair(actions, mirror, translator, craft)
        } else {
            Err("batch does not touch exactly two slots")
        };
        match planned {
            Ok(steps) => {
                let plan = steps.finish(translator);
                debug!("planned {} actions", plan.len());
                Some(plan)
            }
            Err(reason) => {
                warn!("cannot plan inventory batch ({}), resyncing", reason);
                Some(Plan::resync())
            }
        }
    }

    fn plan_pair(
        &mut self,
        actions: &[InventoryActionData],
        mirror: &InventoryMirror,
        translator: &dyn InventoryTranslator,
        craft: CraftFollowUp,
    ) -> Planned {
        let touches = Touches::classify(actions)?;

        let mut refresh = false;
        if let Some(cursor) = touches.cursor {
            refresh |= translator.translate_to_upstream(&mirror.cursor) != cursor.from_item;
        }
        for container in &touches.containers {
            let slot = translator.bedrock_slot_to_java(container);
            refresh |= translator.translate_to_upstream(mirror.get_item(slot)) != container.from_item;
        }
        if refresh {
            debug!("mirror disagrees with the client, last click will carry the refresh item");
        }

        match (touches.world, touches.cursor, touches.containers.as_slice()) {
            (Some(world), Some(source), []) => plan_drop(world, source, mirror, translator, refresh),
            (Some(world), None, [source]) => plan_drop(world, source, mirror, translator, refresh),
            (None, Some(cursor), [container]) => {
                plan_cursor_exchange(cursor, container, mirror, translator, refresh)
            }
            (None, None, [first, second]) => {
                self.plan_container_move(first, second, mirror, translator, refresh, craft)
            }
            _ => Err("unsupported combination of touched slots"),
        }
    }

    /// Move between two container slots, going through the cursor.
    fn plan_container_move(
        &mut self,
        first: &InventoryActionData,
        second: &InventoryActionData,
        mirror: &InventoryMirror,
        translator: &dyn InventoryTranslator,
        refresh: bool,
        craft: CraftFollowUp,
    ) -> Planned {
        let (from, to) = if amount(&first.from_item) >= amount(&first.to_item) {
            (first, second)
        } else {
            (second, first)
        };
        if from.from_item.is_empty() {
            return Err("move from an empty slot");
        }
        let from_slot = translator.bedrock_slot_to_java(from);
        let to_slot = translator.bedrock_slot_to_java(to);
        let from_type = translator.slot_type(from_slot);
        let added = amount(&to.to_item).saturating_sub(amount(&to.from_item));

        let mut steps = Steps::new(refresh);

        if from_type == SlotType::Output {
            if let CraftFollowUp::Pending { temp_slot } = craft {
                let dest = mirror.get_item(to_slot);
                if dest.is_empty() || mirror.cursor.can_stack(dest) {
                    if from.to_item.is_empty() {
                        steps.refresh = true;
                        steps.click(Click::Left, to_slot);
                        if let Some(temp) = temp_slot {
                            steps.click(Click::Left, temp);
                        }
                    } else {
                        steps.clicks(Click::Right, to_slot, added);
                        self.craft = CraftFollowUp::Pending { temp_slot };
                    }
                    return Ok(steps);
                }
            }
            self.craft = CraftFollowUp::Blocked;
        }

        let temp = if mirror.cursor.is_empty() {
            None
        } else {
            // Stashing on an occupied slot swaps; a full move never swaps back.
            let empty_only = from_type == SlotType::Output || from.to_item.is_empty();
            let temp = find_temp_slot(mirror, &mirror.cursor, &[from_slot, to_slot], empty_only)
                .ok_or("no temp slot for the cursor")?;
            steps.click(Click::Left, temp);
            Some(temp)
        };

        let swap = from.from_item == to.to_item && !from.from_item.can_stack(&to.from_item);
        if !swap && from.to_item.is_empty() && added != amount(&from.from_item) {
            return Err("move does not add up");
        }
        if swap || from.to_item.is_empty() {
            steps.click(Click::Left, from_slot);
            steps.click(Click::Left, to_slot);
            if !from.to_item.is_empty() {
                steps.click(Click::Left, from_slot);
            }
        } else if from.from_item.can_stack(&to.to_item) {
            if added == 0 {
                return Err("partial move adds nothing");
            }
            match from_type {
                SlotType::FurnaceOutput => return Ok(Steps::shift_and_resync(from_slot)),
                SlotType::Output => {
                    // The client finishes the transfer in a follow-up batch.
                    self.craft = CraftFollowUp::Pending { temp_slot: temp };
                    steps.click(Click::Left, from_slot);
                    steps.clicks(Click::Right, to_slot, added);
                    return Ok(steps);
                }
                SlotType::Normal => {
                    if amount(&from.from_item).saturating_sub(amount(&from.to_item)) != added {
                        return Err("partial move does not add up");
                    }
                    steps.click(Click::Left, from_slot);
                    steps.clicks(Click::Right, to_slot, added);
                    steps.click(Click::Left, from_slot);
                }
            }
        } else {
            return Err("container slots changed in an unrelated way");
        }

        if let Some(temp) = temp {
            steps.click(Click::Left, temp);
        }
        Ok(steps)
    }
}

/// Throw items out of the window, from a slot, the held item or the cursor.
fn plan_drop(
    world: &InventoryActionData,
    source: &InventoryActionData,
    mirror: &InventoryMirror,
    translator: &dyn InventoryTranslator,
    refresh: bool,
) -> Planned {
    if !matches!(
        world.source,
        InventorySource::WorldInteraction {
            flag: SourceFlag::DropItem
        }
    ) {
        return Err("world touch is not a drop");
    }
    let before = amount(&source.from_item);
    let after = amount(&source.to_item);
    if !source.to_item.is_empty() && !source.to_item.can_stack(&source.from_item) {
        return Err("drop changed the item type");
    }
    let consumed = before.saturating_sub(after);
    if consumed == 0 {
        return Err("drop consumed nothing");
    }

    let mut steps = Steps::new(refresh);
    if source.is_cursor() {
        if consumed < before {
            steps.drops(DropKind::OneFromCursor, 0, consumed);
        } else {
            steps.drops(DropKind::StackFromCursor, 0, 1);
        }
        return Ok(steps);
    }

    let from_hotbar = !mirror.container_open
        && source.source.container_id() == Some(container_id::INVENTORY)
        && source.slot == u32::from(mirror.held_slot);
    if from_hotbar {
        let slot = mirror.hotbar_slot();
        if source.to_item.is_empty() {
            steps.drops(DropKind::StackFromHand, slot, 1);
        } else {
            steps.drops(DropKind::OneFromHand, slot, consumed);
        }
        return Ok(steps);
    }

    let slot = translator.bedrock_slot_to_java(source);
    if consumed < before {
        steps.drops(DropKind::OneFromSlot, slot, consumed);
    } else {
        steps.drops(DropKind::StackFromSlot, slot, 1);
    }
    Ok(steps)
}

/// Exchange between the cursor and one container slot.
fn plan_cursor_exchange(
    cursor: &InventoryActionData,
    container: &InventoryActionData,
    mirror: &InventoryMirror,
    translator: &dyn InventoryTranslator,
    refresh: bool,
) -> Planned {
    let slot = translator.bedrock_slot_to_java(container);
    let slot_type = translator.slot_type(slot);
    let cursor_before = amount(&cursor.from_item);
    let cursor_after = amount(&cursor.to_item);
    let slot_before = amount(&container.from_item);
    let slot_after = amount(&container.to_item);
    let mut steps = Steps::new(refresh);

    let swap = cursor.from_item == container.to_item
        && container.from_item == cursor.to_item
        && !cursor.from_item.can_stack(&container.from_item);
    if swap {
        steps.click(Click::Left, slot);
        return Ok(steps);
    }

    if cursor_before > cursor_after {
        if slot_type != SlotType::Normal {
            return Err("release into a result slot");
        }
        let released = cursor_before - cursor_after;
        if slot_after.saturating_sub(slot_before) != released
            || !container.to_item.can_stack(&cursor.from_item)
        {
            return Err("release does not add up");
        }
        if cursor.to_item.is_empty() {
            steps.click(Click::Left, slot);
        } else {
            steps.clicks(Click::Right, slot, released);
        }
        return Ok(steps);
    }

    if cursor_after <= cursor_before {
        return Err("cursor unchanged");
    }

    if cursor.from_item.is_empty() {
        if slot_before.saturating_sub(slot_after) != cursor_after {
            return Err("pickup does not add up");
        }
        if container.to_item.is_empty() {
            steps.click(Click::Left, slot);
        } else if slot_type == SlotType::Output {
            return Err("partial pickup from a crafting result");
        } else if slot_type == SlotType::FurnaceOutput || slot_after == slot_before - slot_before / 2 {
            steps.click(Click::Right, slot);
        } else {
            steps.click(Click::Left, slot);
            steps.clicks(Click::Right, slot, slot_after);
        }
        return Ok(steps);
    }

    if !cursor.from_item.can_stack(&container.from_item) {
        return Err("pickup onto an incompatible cursor");
    }
    match slot_type {
        SlotType::FurnaceOutput if container.to_item.is_empty() => {
            steps.click(Click::Left, slot);
        }
        SlotType::FurnaceOutput => return Ok(Steps::shift_and_resync(slot)),
        SlotType::Output => steps.click(Click::Left, slot),
        SlotType::Normal => {
            let taken = cursor_after - cursor_before;
            if slot_before.saturating_sub(slot_after) != taken {
                return Err("pickup does not add up");
            }
            let temp = find_temp_slot(mirror, &mirror.cursor, &[slot], false)
                .ok_or("no temp slot for the cursor")?;
            // Park the cursor, pick up the slot, hand the extra to the parked
            // stack, put the rest back and take the parked stack again.
            steps.click(Click::Left, temp);
            steps.click(Click::Left, slot);
            steps.clicks(Click::Right, temp, taken);
            steps.click(Click::Left, slot);
            steps.click(Click::Left, temp);
        }
    }
    Ok(steps)
}

/// Find a main inventory or hotbar slot that can hold `item` for a moment.
///
/// Slots in `exclude` are skipped and so is anything that stacks with
/// `item` or with what the excluded slots hold. With `empty_only`, occupied
/// slots are never returned. The off-hand is not considered since some
/// servers disable it.
pub fn find_temp_slot(
    mirror: &InventoryMirror,
    item: &ItemStack,
    exclude: &[usize],
    empty_only: bool,
) -> Option<usize> {
    let blacklist: Vec<&ItemStack> = std::iter::once(item)
        .chain(
            exclude
                .iter()
                .map(|&slot| mirror.get_item(slot))
                .filter(|stack| !stack.is_empty()),
        )
        .collect();

    let found = mirror
        .inventory
        .player_range()
        .filter(|slot| !exclude.contains(slot))
        .find(|&slot| {
            let candidate = mirror.get_item(slot);
            if candidate.is_empty() {
                return true;
            }
            !empty_only && !blacklist.iter().any(|b| candidate.can_stack(b))
        });
    if found.is_none() {
        warn!("no temporary slot available in window {}", mirror.inventory.window_id);
    }
    found
}
