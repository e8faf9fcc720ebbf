use std::collections::BTreeMap;

use rubble_core::types::{BlockId, BlockTypeId, InstanceSlot};

/// Ids handed to one new block: its block id (also its shape index) and
/// its record slot in the buffer of its BlockType.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub block_id: BlockId,
    pub block_type: BlockTypeId,
    pub slot: InstanceSlot,
}

impl Reservation {
    /// Live count the buffer needs once this reservation is committed.
    pub fn live_count(&self) -> u32 {
        self.slot.0 + 1
    }
}

/// Single authority for block ids, shape indices and instance slots.
///
/// `reserve` computes the next ids without changing anything; `commit`
/// records all of them at once. A failed add between the two leaves the
/// allocator untouched, so block id, shape index and slot order can never
/// drift apart.
#[derive(Debug, Clone, Default)]
pub struct BlockAllocator {
    /// Indexed by block id.
    assigned: Vec<(BlockTypeId, InstanceSlot)>,
    /// Next free slot per BlockType (= live count of its buffer).
    next_slot: BTreeMap<BlockTypeId, u32>,
}

impl BlockAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids the next block of `block_type` would receive.
    pub fn reserve(&self, block_type: BlockTypeId) -> Reservation {
        Reservation {
            block_id: BlockId(self.assigned.len() as u32),
            block_type,
            slot: InstanceSlot(self.next_slot.get(&block_type).copied().unwrap_or(0)),
        }
    }

    /// Record a reservation. Panics if anything was committed since it was made.
    pub fn commit(&mut self, reservation: Reservation) {
        assert_eq!(
            reservation.block_id.index(),
            self.assigned.len(),
            "stale block id reservation"
        );
        let next = self.next_slot.entry(reservation.block_type).or_insert(0);
        assert_eq!(reservation.slot.0, *next, "stale instance slot reservation");

        *next += 1;
        self.assigned
            .push((reservation.block_type, reservation.slot));
    }

    /// BlockType and instance slot of a committed block. Panics if unknown.
    pub fn slot_of(&self, id: BlockId) -> (BlockTypeId, InstanceSlot) {
        *self.assigned.get(id.index()).unwrap_or_else(|| {
            panic!(
                "block id {} out of range (block count {})",
                id.0,
                self.assigned.len()
            )
        })
    }

    /// Committed blocks.
    pub fn len(&self) -> u32 {
        self.assigned.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Slots handed out for `block_type`.
    pub fn live_count(&self, block_type: BlockTypeId) -> u32 {
        self.next_slot.get(&block_type).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STONE: BlockTypeId = BlockTypeId(0);
    const PLANK: BlockTypeId = BlockTypeId(1);

    fn add(alloc: &mut BlockAllocator, t: BlockTypeId) -> Reservation {
        let r = alloc.reserve(t);
        alloc.commit(r);
        r
    }

    #[test]
    fn test_ids_follow_append_order() {
        let mut alloc = BlockAllocator::new();
        let ids: Vec<u32> = [STONE, PLANK, STONE, STONE, PLANK]
            .into_iter()
            .map(|t| add(&mut alloc, t).block_id.0)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_slots_contiguous_per_type() {
        let mut alloc = BlockAllocator::new();
        for t in [STONE, PLANK, STONE, STONE, PLANK] {
            add(&mut alloc, t);
        }
        assert_eq!(alloc.slot_of(BlockId(0)), (STONE, InstanceSlot(0)));
        assert_eq!(alloc.slot_of(BlockId(2)), (STONE, InstanceSlot(1)));
        assert_eq!(alloc.slot_of(BlockId(3)), (STONE, InstanceSlot(2)));
        assert_eq!(alloc.slot_of(BlockId(4)), (PLANK, InstanceSlot(1)));
        assert_eq!(alloc.live_count(STONE), 3);
        assert_eq!(alloc.live_count(PLANK), 2);
    }

    #[test]
    fn test_reserve_without_commit_changes_nothing() {
        let mut alloc = BlockAllocator::new();
        add(&mut alloc, STONE);
        let first = alloc.reserve(STONE);
        let second = alloc.reserve(STONE);
        assert_eq!(first, second);
        assert_eq!(alloc.len(), 1);
        assert_eq!(first.live_count(), 2);
    }

    #[test]
    #[should_panic(expected = "stale block id")]
    fn test_stale_reservation_panics() {
        let mut alloc = BlockAllocator::new();
        let r = alloc.reserve(STONE);
        alloc.commit(r);
        alloc.commit(r);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_unknown_block_panics() {
        let alloc = BlockAllocator::new();
        alloc.slot_of(BlockId(0));
    }
}
