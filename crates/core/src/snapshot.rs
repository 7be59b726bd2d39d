use crate::board::Grid;
use crate::session::SlotSet;
use crate::types::Lifecycle;

/// Point-in-time copy of a session, safe to hand out without holding its lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub grid: Grid,
    pub score: u32,
    pub slots: SlotSet,
    pub lifecycle: Lifecycle,
}

impl SessionSnapshot {
    pub fn is_game_over(&self) -> bool {
        self.lifecycle.is_over()
    }
}
