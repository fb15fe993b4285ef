/// Two slots whose read and write roles alternate.
///
/// The slots never move. Only the index of the slot currently playing the
/// "read" role changes, so everything tied to a slot (buffer, views, bind
/// groups) stays consistent with that slot after every swap.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    read_index: usize,
}

impl<T> PingPong<T> {
    /// Slot 0 starts as the read slot.
    pub fn new(first: T, second: T) -> Self {
        Self { slots: [first, second], read_index: 0 }
    }

    pub fn read(&self) -> &T {
        &self.slots[self.read_index]
    }

    pub fn write(&self) -> &T {
        &self.slots[self.write_index()]
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    pub fn write_index(&self) -> usize {
        1 - self.read_index
    }

    pub fn get(&self, index: usize) -> &T {
        &self.slots[index]
    }

    pub fn swap(&mut self) {
        self.read_index = self.write_index();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_reading_from_first_slot() {
        let pair = PingPong::new("a", "b");
        assert_eq!(*pair.read(), "a");
        assert_eq!(*pair.write(), "b");
        assert_eq!(pair.read_index(), 0);
        assert_eq!(pair.write_index(), 1);
    }

    #[test]
    fn swap_exchanges_roles() {
        let mut pair = PingPong::new("a", "b");
        pair.swap();
        assert_eq!(*pair.read(), "b");
        assert_eq!(*pair.write(), "a");
        assert_eq!(pair.read_index(), 1);
    }

    #[test]
    fn swapping_twice_restores_roles() {
        let mut pair = PingPong::new(10, 20);
        pair.swap();
        pair.swap();
        assert_eq!(*pair.read(), 10);
        assert_eq!(*pair.write(), 20);
        assert_eq!(pair.read_index(), 0);
    }

    #[test]
    fn slots_never_move() {
        let mut pair = PingPong::new('x', 'y');
        for _ in 0..5 {
            pair.swap();
            assert_eq!(*pair.get(0), 'x');
            assert_eq!(*pair.get(1), 'y');
            assert_ne!(pair.read_index(), pair.write_index());
        }
    }
}
