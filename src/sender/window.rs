//! The sequence-indexed slot table that bounds the number of outstanding frames.
//!
//! 按序列号索引的槽表，用于限制在途帧的数量。

/// A fixed-capacity arena of optional frames indexed by sequence number.
///
/// The table holds twice as many slots as the window is wide. An insertion is
/// refused when it would take the number of occupied slots past the window
/// width, or when the new sequence number lies `window_width` or more slots
/// ahead of the oldest outstanding one. The second rule keeps every
/// outstanding sequence number inside one window's span, so a receiver can
/// always tell a new fragment from a late duplicate of an old one.
///
/// Lookups by sequence number are O(1); sequence numbers outside the table are
/// treated as empty slots.
///
/// 一个按序列号索引、容量固定的可选帧数组。
///
/// 槽的数量是窗口宽度的两倍。若插入会使占用槽数超过窗口宽度，或新序列号领先最旧的
/// 在途序列号 `window_width` 个槽及以上，则插入被拒绝。第二条规则使所有在途序列号
/// 都位于一个窗口跨度之内，接收方因此总能区分新分片与旧分片的迟到副本。
///
/// 按序列号查找为 O(1)；超出表范围的序列号被视为空槽。
#[derive(Debug)]
pub(crate) struct SlotTable<F> {
    slots: Box<[Option<F>]>,
    window_width: usize,
    active_count: usize,
}

impl<F> SlotTable<F> {
    /// `window_width` must be between 1 and 128 so that every slot index is a
    /// valid one-byte sequence number. `Config::validate` guarantees this.
    pub(crate) fn new(window_width: usize) -> Self {
        debug_assert!((1..=128).contains(&window_width));
        let slots = (0..window_width * 2).map(|_| None).collect();
        Self {
            slots,
            window_width,
            active_count: 0,
        }
    }

    pub(crate) fn window_width(&self) -> usize {
        self.window_width
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active_count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.active_count >= self.window_width
    }

    pub(crate) fn is_occupied(&self, seq: u8) -> bool {
        matches!(self.slots.get(usize::from(seq)), Some(Some(_)))
    }

    /// 检查能否把一个新帧放入 `seq` 对应的槽。
    /// Checks whether a new frame may be placed in the slot for `seq`.
    pub(crate) fn can_admit(&self, seq: u8) -> bool {
        let capacity = self.capacity();
        if self.is_full() || usize::from(seq) >= capacity || self.is_occupied(seq) {
            return false;
        }
        let seq = usize::from(seq);
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .all(|(outstanding, _)| (seq + capacity - outstanding) % capacity < self.window_width)
    }

    /// Places `frame` in the slot for `seq`, returning it back if
    /// [`can_admit`](Self::can_admit) refuses `seq`.
    ///
    /// 将 `frame` 放入 `seq` 对应的槽；若 [`can_admit`](Self::can_admit) 拒绝 `seq`，则原样返回。
    pub(crate) fn insert(&mut self, seq: u8, frame: F) -> Result<&mut F, F> {
        if !self.can_admit(seq) {
            return Err(frame);
        }
        self.active_count += 1;
        let slot = &mut self.slots[usize::from(seq)];
        Ok(slot.insert(frame))
    }

    #[cfg(test)]
    pub(crate) fn get(&self, seq: u8) -> Option<&F> {
        self.slots.get(usize::from(seq))?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, seq: u8) -> Option<&mut F> {
        self.slots.get_mut(usize::from(seq))?.as_mut()
    }

    /// Clears the slot for `seq`. Clearing an empty slot is a no-op.
    ///
    /// 清空 `seq` 对应的槽。清空空槽不做任何操作。
    pub(crate) fn remove(&mut self, seq: u8) -> Option<F> {
        let frame = self.slots.get_mut(usize::from(seq))?.take()?;
        self.active_count -= 1;
        Some(frame)
    }

    /// Empties every slot, yielding the frames with their sequence numbers.
    ///
    /// 清空所有槽，返回帧及其序列号。
    pub(crate) fn drain(&mut self) -> Vec<(u8, F)> {
        self.active_count = 0;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(seq, slot)| Some((seq as u8, slot.take()?)))
            .collect()
    }

    /// Sequence numbers of the occupied slots in ascending order.
    /// 按升序排列的已占用槽的序列号。
    pub(crate) fn outstanding(&self) -> Vec<u8> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(seq, _)| seq as u8)
            .collect()
    }
}

/// A modular counter handing out sequence numbers over the slot table's range.
///
/// 在槽表范围内分配序列号的模计数器。
#[derive(Debug, Clone)]
pub(crate) struct SequenceCounter {
    next: u8,
    modulus: usize,
}

impl SequenceCounter {
    /// `modulus` must be between 1 and 256 so every value fits in a byte and
    /// `advance` never divides by zero.
    pub(crate) fn new(modulus: usize) -> Self {
        debug_assert!((1..=256).contains(&modulus));
        Self { next: 0, modulus }
    }

    pub(crate) fn peek(&self) -> u8 {
        self.next
    }

    pub(crate) fn advance(&mut self) {
        self.next = ((usize::from(self.next) + 1) % self.modulus) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_twice_the_window() {
        let table: SlotTable<()> = SlotTable::new(5);
        assert_eq!(table.capacity(), 10);
        assert_eq!(table.window_width(), 5);
        assert!(table.is_empty());
    }

    #[test]
    fn test_insert_respects_window_width() {
        let mut table = SlotTable::new(3);
        for seq in 0..3 {
            assert!(table.insert(seq, seq).is_ok());
        }
        assert!(table.is_full());
        // Free slots exist, but the window is full.
        assert_eq!(table.insert(3, 3), Err(3));
        assert_eq!(table.active_count(), 3);
    }

    #[test]
    fn test_insert_refuses_occupied_or_out_of_range_slot() {
        let mut table = SlotTable::new(3);
        table.insert(1, "a").unwrap();
        assert_eq!(table.insert(1, "b"), Err("b"));
        assert_eq!(table.insert(6, "c"), Err("c"));
        assert_eq!(table.insert(200, "d"), Err("d"));
        assert_eq!(table.get(1), Some(&"a"));
        assert_eq!(table.active_count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut table = SlotTable::new(2);
        table.insert(0, 'x').unwrap();
        table.insert(1, 'y').unwrap();

        assert_eq!(table.remove(0), Some('x'));
        assert_eq!(table.active_count(), 1);
        assert_eq!(table.remove(0), None);
        assert_eq!(table.active_count(), 1, "second remove must not decrement");
        assert_eq!(table.remove(99), None);
        assert_eq!(table.active_count(), 1);
    }

    #[test]
    fn test_out_of_range_lookups_are_empty() {
        let mut table: SlotTable<u32> = SlotTable::new(2);
        assert!(table.get_mut(4).is_none());
        assert!(table.get_mut(255).is_none());
        assert!(!table.is_occupied(255));
    }

    #[test]
    fn test_insert_stays_within_width_of_oldest() {
        let mut table = SlotTable::new(3);
        table.insert(0, 'a').unwrap();
        table.insert(2, 'b').unwrap();
        // Only two slots are taken, but 3 is a full window ahead of 0.
        assert_eq!(table.insert(3, 'c'), Err('c'));

        table.remove(0);
        assert!(table.insert(3, 'c').is_ok());
        table.remove(2);
        table.insert(4, 'd').unwrap();
        // Wraps around: 0 is two slots ahead of 4 in a table of six.
        table.remove(3);
        assert!(table.can_admit(0));
        assert!(!table.can_admit(1));
    }

    #[test]
    fn test_drain_and_outstanding() {
        let mut table = SlotTable::new(4);
        table.insert(5, 'a').unwrap();
        table.insert(7, 'b').unwrap();
        assert_eq!(table.outstanding(), vec![5, 7]);

        let drained = table.drain();
        assert_eq!(drained, vec![(5, 'a'), (7, 'b')]);
        assert!(table.is_empty());
        assert!(table.outstanding().is_empty());
    }

    #[test]
    fn test_sequence_counter_wraps_at_modulus() {
        let mut counter = SequenceCounter::new(10);
        let seen: Vec<u8> = (0..12)
            .map(|_| {
                let seq = counter.peek();
                counter.advance();
                seq
            })
            .collect();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1]);
    }

    #[test]
    fn test_sequence_counter_full_byte_range() {
        let mut counter = SequenceCounter::new(256);
        for _ in 0..255 {
            counter.advance();
        }
        assert_eq!(counter.peek(), 255);
        counter.advance();
        assert_eq!(counter.peek(), 0);
    }
}
