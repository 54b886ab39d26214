use std::collections::{BTreeSet, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::debug;
use trivia_core::model::{BookId, Question, QuestionId};

use super::progress::GameProgress;

/// Points a question is worth when it is drawn.
pub const QUESTION_VALUE: i32 = 5;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One play-through: the eligible pool, the current question and the score.
///
/// The catalog is owned and never changed. The pool holds catalog indices of
/// the questions whose book is active, and the answered set is scoped to the
/// pool so a fully answered pool can be replayed.
pub struct GameSession {
    catalog: Vec<Question>,
    pool: Vec<usize>,
    current: Option<usize>,
    answered: HashSet<QuestionId>,
    answer_order: Vec<String>,
    question_value: i32,
    score: i32,
    rng: StdRng,
}

impl GameSession {
    #[must_use]
    pub fn new(catalog: Vec<Question>) -> Self {
        Self::with_rng(catalog, StdRng::from_os_rng())
    }

    /// Deterministic draws and shuffles, for tests and replays.
    #[must_use]
    pub fn with_seed(catalog: Vec<Question>, seed: u64) -> Self {
        Self::with_rng(catalog, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: Vec<Question>, rng: StdRng) -> Self {
        Self {
            catalog,
            pool: Vec::new(),
            current: None,
            answered: HashSet::new(),
            answer_order: Vec::new(),
            question_value: QUESTION_VALUE,
            score: 0,
            rng,
        }
    }

    // ─── Setup ─────────────────────────────────────────────────────────────────

    /// Rebuild the pool from the questions of `active` books. Nothing else is reset.
    pub fn filter_questions(&mut self, active: &BTreeSet<BookId>) {
        self.pool = self
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, question)| active.contains(&question.book()))
            .map(|(index, _)| index)
            .collect();
        debug!(pool = self.pool.len(), books = active.len(), "question pool rebuilt");
    }

    pub fn start_game(&mut self) {
        self.score = 0;
        self.question_value = QUESTION_VALUE;
        self.answered.clear();
    }

    // ─── Drawing ───────────────────────────────────────────────────────────────

    /// Pick a random unanswered question from the pool and shuffle its answers.
    ///
    /// Returns `None` and leaves the session untouched when the pool is empty.
    /// Once every pool question has been answered the answered set is cleared
    /// and the whole pool is eligible again. The current question is never
    /// drawn twice in a row while another candidate exists.
    pub fn draw_next_question(&mut self) -> Option<&Question> {
        if self.pool.is_empty() {
            return None;
        }
        if self.pool_exhausted() {
            debug!(pool = self.pool.len(), "every question answered, replaying pool");
            self.answered.clear();
        }

        let candidates: Vec<usize> = self
            .pool
            .iter()
            .copied()
            .filter(|&index| !self.answered.contains(&self.catalog[index].id()))
            .collect();
        let fresh: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&index| Some(index) != self.current)
            .collect();
        let choices = if fresh.is_empty() { &candidates } else { &fresh };
        let next = *choices.choose(&mut self.rng)?;

        self.current = Some(next);
        self.question_value = QUESTION_VALUE;
        self.answer_order = self.catalog[next]
            .answer_texts()
            .map(str::to_owned)
            .collect();
        self.answer_order.shuffle(&mut self.rng);
        self.current_question()
    }

    fn pool_exhausted(&self) -> bool {
        self.pool
            .iter()
            .all(|&index| self.answered.contains(&self.catalog[index].id()))
    }

    // ─── Scoring ───────────────────────────────────────────────────────────────

    /// Take one point off the current question. May go below zero.
    pub fn penalize(&mut self) {
        self.question_value -= 1;
    }

    /// Mark the current question answered and add its remaining value to the score.
    ///
    /// Nothing stops a second call for the same question from scoring again;
    /// `GameLoopService` only calls this once per round.
    pub fn record_correct(&mut self) {
        let Some(index) = self.current else {
            debug!("no current question, nothing to record");
            return;
        };
        self.answered.insert(self.catalog[index].id());
        self.score += self.question_value;
    }

    /// Final score of the session. State is left as is.
    #[must_use]
    pub fn end_game(&self) -> i32 {
        self.score
    }

    // Accessors
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current.map(|index| &self.catalog[index])
    }

    #[must_use]
    pub fn current_correct_answer_text(&self) -> Option<&str> {
        self.current_question().map(Question::correct_answer)
    }

    /// Answer texts of the current question in display order.
    #[must_use]
    pub fn answer_order(&self) -> &[String] {
        &self.answer_order
    }

    #[must_use]
    pub fn question_value(&self) -> i32 {
        self.question_value
    }

    #[must_use]
    pub fn score(&self) -> i32 {
        self.score
    }

    #[must_use]
    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.answered.contains(&id)
    }

    #[must_use]
    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn progress(&self) -> GameProgress {
        let answered = self
            .pool
            .iter()
            .filter(|&&index| self.answered.contains(&self.catalog[index].id()))
            .count();
        GameProgress {
            score: self.score,
            question_value: self.question_value,
            answered,
            pool_size: self.pool.len(),
            remaining: self.pool.len().saturating_sub(answered),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64, book: u8) -> Question {
        Question::from_answer_lists(
            QuestionId::new(id),
            format!("Question {id}?"),
            format!("right {id}"),
            vec![format!("wrong {id}a"), format!("wrong {id}b"), format!("wrong {id}c")],
            BookId::new(book),
            format!("hint {id}"),
        )
        .unwrap()
    }

    fn catalog() -> Vec<Question> {
        (1..=21).map(|id| question(id, ((id - 1) % 7 + 1) as u8)).collect()
    }

    fn books(ids: &[u8]) -> BTreeSet<BookId> {
        ids.iter().copied().map(BookId::new).collect()
    }

    fn started(seed: u64, active: &[u8]) -> GameSession {
        let mut session = GameSession::with_seed(catalog(), seed);
        session.filter_questions(&books(active));
        session.start_game();
        session
    }

    #[test]
    fn draws_only_from_active_books() {
        let active = books(&[2, 5]);
        let mut session = started(7, &[2, 5]);
        for round in 0..200 {
            let book = session.draw_next_question().unwrap().book();
            assert!(active.contains(&book));
            if round % 3 == 0 {
                session.record_correct();
            }
        }
    }

    #[test]
    fn never_repeats_back_to_back() {
        let mut session = started(11, &[1, 2, 3]);
        let mut previous = None;
        for _ in 0..100 {
            let id = session.draw_next_question().unwrap().id();
            assert_ne!(Some(id), previous);
            previous = Some(id);
        }
    }

    #[test]
    fn answered_questions_are_skipped_until_pool_exhausted() {
        let mut session = started(3, &[1, 2, 3]);
        let mut seen = HashSet::new();
        for _ in 0..session.pool_size() {
            let id = session.draw_next_question().unwrap().id();
            assert!(seen.insert(id), "question {id} drawn twice in one pass");
            session.record_correct();
        }
        assert_eq!(session.progress().remaining, 0);

        session.draw_next_question().unwrap();
        assert_eq!(session.progress().answered, 0);
    }

    #[test]
    fn progress_counts_only_the_current_pool() {
        let mut session = started(5, &[1]);
        session.draw_next_question().unwrap();
        session.record_correct();
        assert_eq!(session.progress().answered, 1);

        session.filter_questions(&books(&[2]));
        let progress = session.progress();
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.pool_size, 3);
        assert_eq!(progress.remaining, progress.pool_size);

        session.filter_questions(&books(&[1, 2]));
        assert_eq!(session.progress().answered, 1);
        assert_eq!(session.progress().remaining, 5);
    }

    #[test]
    fn single_question_pool_replays() {
        let mut session = GameSession::with_seed(vec![question(1, 1)], 0);
        session.filter_questions(&books(&[1]));
        session.start_game();
        session.draw_next_question().unwrap();
        session.record_correct();
        assert_eq!(session.draw_next_question().unwrap().id(), QuestionId::new(1));
        assert!(!session.is_answered(QuestionId::new(1)));
    }

    #[test]
    fn two_penalties_then_correct_scores_three() {
        let mut session = started(1, &[1]);
        session.draw_next_question().unwrap();
        session.penalize();
        session.penalize();
        session.record_correct();
        assert_eq!(session.end_game(), 3);
    }

    #[test]
    fn record_correct_twice_scores_twice() {
        let mut session = started(1, &[1]);
        session.draw_next_question().unwrap();
        session.record_correct();
        session.record_correct();
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn value_can_go_negative() {
        let mut session = started(1, &[1]);
        session.draw_next_question().unwrap();
        for _ in 0..7 {
            session.penalize();
        }
        session.record_correct();
        assert_eq!(session.score(), -2);
    }

    #[test]
    fn draw_resets_question_value() {
        let mut session = started(1, &[1, 2]);
        session.draw_next_question().unwrap();
        session.penalize();
        assert_eq!(session.question_value(), 4);
        session.draw_next_question().unwrap();
        assert_eq!(session.question_value(), QUESTION_VALUE);
    }

    #[test]
    fn answer_order_is_a_permutation() {
        let mut session = started(5, &[4]);
        let question = session.draw_next_question().unwrap().clone();
        let mut shown: Vec<&str> = session.answer_order().iter().map(String::as_str).collect();
        shown.sort_unstable();
        let expected: Vec<&str> = question.answer_texts().collect();
        assert_eq!(shown, expected);
        assert_eq!(
            session.current_correct_answer_text(),
            Some(question.correct_answer())
        );
    }

    #[test]
    fn empty_pool_is_a_no_op_until_refiltered() {
        let mut session = started(1, &[]);
        assert!(session.draw_next_question().is_none());
        assert!(session.current_question().is_none());
        assert!(session.current_correct_answer_text().is_none());

        session.filter_questions(&books(&[6]));
        assert_eq!(session.draw_next_question().unwrap().book(), BookId::new(6));
    }

    #[test]
    fn start_game_resets_score_and_answered() {
        let mut session = started(9, &[1]);
        session.draw_next_question().unwrap();
        session.record_correct();
        session.penalize();

        session.start_game();
        assert_eq!(session.score(), 0);
        assert_eq!(session.question_value(), QUESTION_VALUE);
        assert_eq!(session.progress().answered, 0);
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = started(42, &[1, 2, 3, 4]);
        let mut b = started(42, &[1, 2, 3, 4]);
        for _ in 0..20 {
            let left = a.draw_next_question().map(Question::id);
            let right = b.draw_next_question().map(Question::id);
            assert_eq!(left, right);
            assert_eq!(a.answer_order(), b.answer_order());
        }
    }
}
