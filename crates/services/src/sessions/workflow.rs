use std::collections::BTreeSet;

use tracing::info;
use trivia_core::model::{BookId, Entitlements, Question};

use super::progress::GameProgress;
use super::service::GameSession;
use crate::audio::{Fade, Jukebox};
use crate::score_service::ScoreHistoryService;

/// Result of tapping an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Scored `points`, the round is over.
    Correct { points: i32 },
    /// Cost one point.
    Wrong,
    /// This wrong answer was already tapped this round. Free.
    AlreadyTapped,
    /// The question was already solved, or there is no question.
    RoundOver,
    /// Not one of the current question's answers.
    UnknownAnswer,
}

/// Per-question state: what has been tapped and revealed so far.
#[derive(Debug, Default)]
struct Round {
    wrong_tapped: BTreeSet<String>,
    hint_revealed: bool,
    book_revealed: bool,
    solved: bool,
}

/// Drives a game: answer taps, reveals and the matching sound cues.
///
/// Each penalty is charged once per round; the correct answer is scored once
/// per round.
pub struct GameLoopService {
    session: GameSession,
    jukebox: Jukebox,
    round: Round,
}

impl GameLoopService {
    #[must_use]
    pub fn new(session: GameSession, jukebox: Jukebox) -> Self {
        Self {
            session,
            jukebox,
            round: Round::default(),
        }
    }

    /// Start a fresh game over the active books and draw the first question.
    pub fn start(&mut self, entitlements: &Entitlements) -> Option<&Question> {
        self.session.filter_questions(&entitlements.active_books());
        self.session.start_game();
        self.jukebox.fade(Fade::Out);
        self.jukebox.play_soundtrack();
        info!(pool = self.session.pool_size(), "game started");
        self.next_question()
    }

    pub fn next_question(&mut self) -> Option<&Question> {
        self.round = Round::default();
        self.session.draw_next_question()
    }

    pub fn answer(&mut self, text: &str) -> AnswerOutcome {
        if self.round.solved {
            return AnswerOutcome::RoundOver;
        }
        let Some(question) = self.session.current_question() else {
            return AnswerOutcome::RoundOver;
        };

        match question.is_correct(text) {
            None => AnswerOutcome::UnknownAnswer,
            Some(true) => {
                let points = self.session.question_value();
                self.session.record_correct();
                self.round.solved = true;
                self.jukebox.correct_answer();
                AnswerOutcome::Correct { points }
            }
            Some(false) => {
                if !self.round.wrong_tapped.insert(text.to_owned()) {
                    return AnswerOutcome::AlreadyTapped;
                }
                self.session.penalize();
                self.jukebox.wrong_answer();
                AnswerOutcome::Wrong
            }
        }
    }

    /// Show the hint. The first reveal in an unsolved round costs a point.
    pub fn reveal_hint(&mut self) -> Option<&str> {
        self.session.current_question()?;
        if !self.round.hint_revealed {
            self.round.hint_revealed = true;
            self.charge_reveal();
        }
        self.session.current_question().map(Question::hint)
    }

    /// Show which book the question comes from. Priced like the hint.
    pub fn reveal_book(&mut self) -> Option<BookId> {
        self.session.current_question()?;
        if !self.round.book_revealed {
            self.round.book_revealed = true;
            self.charge_reveal();
        }
        self.session.current_question().map(Question::book)
    }

    fn charge_reveal(&mut self) {
        if !self.round.solved {
            self.session.penalize();
        }
        self.jukebox.page_flip();
    }

    /// Finish the game, record its score and go back to the intro music.
    pub async fn end(&mut self, scores: &mut ScoreHistoryService) -> i32 {
        let score = self.session.end_game();
        scores.record_session(score).await;
        self.jukebox.play_intro();
        self.jukebox.fade(Fade::In);
        info!(score, "game over");
        score
    }

    // Accessors
    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub fn progress(&self) -> GameProgress {
        self.session.progress()
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.round.solved
    }

    #[must_use]
    pub fn was_tapped(&self, answer: &str) -> bool {
        self.round.wrong_tapped.contains(answer)
    }

    #[must_use]
    pub fn hint_revealed(&self) -> bool {
        self.round.hint_revealed
    }

    #[must_use]
    pub fn book_revealed(&self) -> bool {
        self.round.book_revealed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
