/// Pin count held against a cube. A pinned cube is never unloaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tickets {
    count: u32,
}

impl Tickets {
    #[inline]
    pub fn add(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Drops one pin. Returns false if none were held.
    pub fn remove(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        true
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn can_unload(&self) -> bool {
        self.count == 0
    }
}
