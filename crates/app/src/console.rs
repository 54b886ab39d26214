//! Line-based front end over `AppServices`.

use services::{
    AnswerOutcome, AppServices, GameLoopService, PurchaseOutcome, StoreError, StoreEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;
use trivia_core::model::{BOOK_COUNT, BookStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Playing,
}

/// Read commands from stdin until `quit` or end of input.
///
/// # Errors
///
/// Returns the underlying I/O error if stdin cannot be read.
pub async fn run(app: &mut AppServices) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut events = app.store().subscribe();
    let mut screen = Screen::Menu;

    print_menu();
    prompt(screen);
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        screen = match screen {
            Screen::Menu => match menu_command(app, input).await {
                Some(next) => next,
                None => break,
            },
            Screen::Playing => game_command(app, input).await,
        };
        report_store_events(&mut events);
        prompt(screen);
    }

    if screen == Screen::Playing {
        app.end_game().await;
    }
    Ok(())
}

fn prompt(screen: Screen) {
    match screen {
        Screen::Menu => println!("\n[menu] >"),
        Screen::Playing => println!("\n[game] 1-9 answer, h hint, b book, n next, e end >"),
    }
}

fn print_menu() {
    println!("Commands:");
    println!("  play          start a game with the active books");
    println!("  books         list books and their status");
    println!("  toggle <n>    switch book n on or off");
    println!("  buy <n>       purchase book n");
    println!("  scores        show the last three scores");
    println!("  quit");
}

fn report_store_events(events: &mut tokio::sync::broadcast::Receiver<StoreEvent>) {
    loop {
        match events.try_recv() {
            Ok(StoreEvent::OwnedChanged) => println!("(your purchases were updated)"),
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

// ─── Menu ──────────────────────────────────────────────────────────────────────

async fn menu_command(app: &mut AppServices, input: &str) -> Option<Screen> {
    let mut words = input.split_whitespace();
    let command = words.next().unwrap_or_default();
    let book_arg = words.next().and_then(parse_book_index);

    match (command, book_arg) {
        ("" | "menu", _) => {}
        ("help" | "?", _) => print_menu(),
        ("quit" | "q" | "exit", _) => return None,
        ("play" | "p", _) => return Some(start_game(app)),
        ("books", _) => print_books(app),
        ("scores", _) => {
            let scores = app.scores().history().scores();
            println!("Recent scores: {} (latest first)", join(scores));
        }
        ("toggle", Some(index)) => toggle_book(app, index).await,
        ("buy", Some(index)) => buy_book(app, index).await,
        ("toggle" | "buy", None) => println!("Give a book number between 1 and {BOOK_COUNT}."),
        (other, _) => println!("Unknown command `{other}`. Type help."),
    }
    Some(Screen::Menu)
}

fn parse_book_index(raw: &str) -> Option<usize> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| (1..=BOOK_COUNT).contains(n))
        .map(|n| n - 1)
}

fn start_game(app: &mut AppServices) -> Screen {
    if !app.store().has_active_book() {
        println!("Switch on at least one book first (see `books`).");
        return Screen::Menu;
    }
    if app.start_game().is_none() {
        println!("There are no questions for the active books.");
        return Screen::Menu;
    }
    show_question(app.game());
    Screen::Playing
}

fn print_books(app: &AppServices) {
    let store = app.store();
    for (book, status) in store.entitlements().iter() {
        let label = match status {
            BookStatus::Active => "on",
            BookStatus::Inactive => "off",
            BookStatus::Locked => "locked",
        };
        let extra = match (status, store.product_for_book(book)) {
            (BookStatus::Locked, _) if store.owns_book(book) => {
                " (owned, toggle to play)".to_owned()
            }
            (BookStatus::Locked, Some(product)) => {
                format!(" ({} for {})", product.display_name, product.display_price)
            }
            _ => String::new(),
        };
        println!("  {book}: {label}{extra}");
    }
}

async fn toggle_book(app: &mut AppServices, index: usize) {
    match app.store_mut().toggle(index).await {
        Ok(BookStatus::Active) => println!("Book {} is on.", index + 1),
        Ok(_) => println!("Book {} is off.", index + 1),
        Err(StoreError::Locked { book }) => {
            println!("Book {book} is locked. Type `buy {book}` to unlock it.");
        }
        Err(err) => println!("{err}"),
    }
}

async fn buy_book(app: &mut AppServices, index: usize) {
    let outcome = match app.store().purchase_book(index).await {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("{err}");
            return;
        }
    };
    match outcome {
        PurchaseOutcome::OwnedNow => {
            for book in app.store_mut().unlock_owned().await {
                println!("Book {book} unlocked and switched on.");
            }
        }
        PurchaseOutcome::PendingApproval => println!("The purchase is waiting for approval."),
        PurchaseOutcome::Cancelled => println!("Purchase cancelled."),
        PurchaseOutcome::VerificationFailed => println!("The purchase could not be verified."),
        PurchaseOutcome::Failed => println!("The store is not available right now."),
    }
}

// ─── Game ──────────────────────────────────────────────────────────────────────

async fn game_command(app: &mut AppServices, input: &str) -> Screen {
    match input {
        "h" => match app.game_mut().reveal_hint() {
            Some(hint) => println!("Hint: {hint}"),
            None => println!("No hint."),
        },
        "b" => {
            if let Some(book) = app.game_mut().reveal_book() {
                println!("From book {book}.");
            }
        }
        "n" => {
            if app.game_mut().next_question().is_some() {
                show_question(app.game());
            }
        }
        "e" => {
            let score = app.end_game().await;
            println!("Game over. Final score: {score}");
            return Screen::Menu;
        }
        other => match other.parse::<usize>() {
            Ok(choice) => answer(app.game_mut(), choice),
            Err(_) => show_question(app.game()),
        },
    }
    Screen::Playing
}

fn answer(game: &mut GameLoopService, choice: usize) {
    let Some(text) = choice
        .checked_sub(1)
        .and_then(|i| game.session().answer_order().get(i))
        .cloned()
    else {
        println!("Pick one of the numbered answers.");
        return;
    };

    match game.answer(&text) {
        AnswerOutcome::Correct { points } => {
            println!("Correct! +{points} (score {})", game.progress().score);
            println!("Type n for the next question.");
        }
        AnswerOutcome::Wrong => println!(
            "Wrong. This question is now worth {}.",
            game.progress().question_value
        ),
        AnswerOutcome::AlreadyTapped => println!("You already tried that one."),
        AnswerOutcome::RoundOver => println!("Already solved. Type n for the next question."),
        AnswerOutcome::UnknownAnswer => println!("That is not one of the answers."),
    }
}

fn show_question(game: &GameLoopService) {
    let session = game.session();
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = game.progress();
    println!(
        "\n{}  (worth {}, score {})",
        question.text(),
        progress.question_value,
        progress.score
    );
    for (n, text) in session.answer_order().iter().enumerate() {
        let mark = if game.was_tapped(text) { " x" } else { "" };
        println!("  {}. {text}{mark}", n + 1);
    }
}

fn join(scores: &[i32]) -> String {
    scores
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
