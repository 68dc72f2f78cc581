use std::ops::{Index, IndexMut};

pub(crate) trait Resettable {
    fn reset(&mut self);
}

/// Arena of reusable slots addressed by `u32`. Released slots are reset and handed
/// out again by the next `acquire`; a handle must not be used after its release.
pub(crate) struct Pool<T: Resettable + Default> {
    slots: Vec<T>,
    free: Vec<u32>,
}

impl<T> Pool<T>
where
    T: Resettable + Default,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Pool {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    // Reuse a released slot if there is one, otherwise grow the backing store
    pub(crate) fn acquire(&mut self) -> u32 {
        match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(T::default());
                (self.slots.len() - 1) as u32
            }
        }
    }

    pub(crate) fn release(&mut self, index: u32) {
        self.slots[index as usize].reset();
        self.free.push(index);
    }

    /// Releases every slot while keeping the storage for reuse.
    pub(crate) fn release_all(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
        self.free.clear();
        self.free.extend((0..self.slots.len() as u32).rev());
    }

    /// Live (acquired) slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Total slots ever allocated, live or free.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl<T: Resettable + Default> Index<u32> for Pool<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: u32) -> &T {
        &self.slots[index as usize]
    }
}

impl<T: Resettable + Default> IndexMut<u32> for Pool<T> {
    #[inline(always)]
    fn index_mut(&mut self, index: u32) -> &mut T {
        &mut self.slots[index as usize]
    }
}
