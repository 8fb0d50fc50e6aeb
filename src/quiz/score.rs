/// Running total of the points earned in one session.
///
/// Only ever grows; there is no way to take points back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score(u32);

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, points: u32) {
        self.0 = self.0.saturating_add(points);
    }

    pub fn total(&self) -> u32 {
        self.0
    }
}
