use super::backend::MAX_TEXTURE_SLOTS;
use super::handle::TextureId;

/// Fixed-capacity texture-to-slot table for the shape batch.
///
/// Slot 0 always holds the white texture and is never evicted. The table does
/// not flush on its own: [`SlotTable::find`] and [`SlotTable::insert`] let the
/// owner decide what to do when it is full.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: [TextureId; MAX_TEXTURE_SLOTS],
    count: usize,
}

impl SlotTable {
    pub const CAPACITY: usize = MAX_TEXTURE_SLOTS;

    pub fn new(white: TextureId) -> Self {
        Self {
            slots: [white; MAX_TEXTURE_SLOTS],
            count: 1,
        }
    }

    #[inline]
    pub fn white(&self) -> TextureId {
        self.slots[0]
    }

    /// Slot already holding `texture`, if any.
    pub fn find(&self, texture: TextureId) -> Option<u32> {
        self.slots[..self.count]
            .iter()
            .position(|t| *t == texture)
            .map(|i| i as u32)
    }

    /// Binds `texture` to the next free slot. Returns `None` when full.
    pub fn insert(&mut self, texture: TextureId) -> Option<u32> {
        if self.is_full() {
            return None;
        }
        let slot = self.count;
        self.slots[slot] = texture;
        self.count += 1;
        Some(slot as u32)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == Self::CAPACITY
    }

    /// Number of occupied slots, including slot 0.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count <= 1
    }

    /// Occupied slots in slot order.
    #[inline]
    pub fn bound(&self) -> &[TextureId] {
        &self.slots[..self.count]
    }

    /// Drops every slot except the white one.
    pub fn reset(&mut self) {
        let white = self.slots[0];
        self.slots = [white; MAX_TEXTURE_SLOTS];
        self.count = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: TextureId = TextureId(0);

    #[test]
    fn white_is_preloaded() {
        let t = SlotTable::new(WHITE);
        assert_eq!(t.find(WHITE), Some(0));
        assert_eq!(t.len(), 1);
        assert!(t.is_empty());
    }

    #[test]
    fn insert_until_full() {
        let mut t = SlotTable::new(WHITE);
        for i in 1..16 {
            assert_eq!(t.insert(TextureId(i)), Some(i));
        }
        assert!(t.is_full());
        assert_eq!(t.insert(TextureId(99)), None);
        assert_eq!(t.find(TextureId(15)), Some(15));
    }

    #[test]
    fn reset_keeps_white_only() {
        let mut t = SlotTable::new(WHITE);
        t.insert(TextureId(4));
        t.reset();
        assert_eq!(t.bound(), &[WHITE]);
        assert_eq!(t.find(TextureId(4)), None);
    }
}
