/// Snapshot of a running game, for whoever renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameProgress {
    pub score: i32,
    pub question_value: i32,
    /// Questions answered correctly in the current pass over the pool.
    pub answered: usize,
    pub pool_size: usize,
    pub remaining: usize,
}
