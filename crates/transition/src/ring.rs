/// Role a state buffer plays during the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Previous,
    Current,
    Next,
}

/// Three owned state buffers with rotating roles.
///
/// Slot `current` holds the displayed state, `current + 1` (mod 3) is the next
/// write target, and `current + 2` (mod 3) the previous state. Rotating moves
/// the index only; buffers stay in their slots.
#[derive(Debug)]
pub struct StateRing<T> {
    slots: [T; 3],
    current: usize,
}

impl<T> StateRing<T> {
    pub fn new(slots: [T; 3]) -> Self {
        Self { slots, current: 0 }
    }

    /// Allocate all three buffers with `create`, failing on the first error.
    pub fn allocate<E>(mut create: impl FnMut() -> Result<T, E>) -> Result<Self, E> {
        Ok(Self::new([create()?, create()?, create()?]))
    }

    /// previous <- current, current <- next, next <- old previous storage.
    pub fn cycle(&mut self) {
        self.current = (self.current + 1) % 3;
    }

    /// Slot index holding `role`.
    pub fn slot_of(&self, role: Role) -> usize {
        match role {
            Role::Current => self.current,
            Role::Next => (self.current + 1) % 3,
            Role::Previous => (self.current + 2) % 3,
        }
    }

    /// Role of the buffer in `slot`.
    pub fn role_of(&self, slot: usize) -> Role {
        match (slot + 3 - self.current) % 3 {
            0 => Role::Current,
            1 => Role::Next,
            _ => Role::Previous,
        }
    }

    pub fn get(&self, role: Role) -> &T {
        &self.slots[self.slot_of(role)]
    }

    pub fn previous(&self) -> &T {
        self.get(Role::Previous)
    }

    pub fn current(&self) -> &T {
        self.get(Role::Current)
    }

    pub fn next(&self) -> &T {
        self.get(Role::Next)
    }

    /// Read access to the current buffer alongside write access to the next.
    pub fn current_and_next(&mut self) -> (&T, &mut T) {
        let cur = self.slot_of(Role::Current);
        let next = self.slot_of(Role::Next);
        if cur < next {
            let (lo, hi) = self.slots.split_at_mut(next);
            (&lo[cur], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(cur);
            (&hi[0], &mut lo[next])
        }
    }

    /// All slots in storage order.
    pub fn slots(&self) -> &[T; 3] {
        &self.slots
    }
}
