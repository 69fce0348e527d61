/// Playthrough: scripted, seeded run through a content table.
///
/// Usage: playthrough --content <path> [--role giver|seeker] [--difficulty easy|medium|hard]
///                    [--seed <n>] [--choice <index>]
///
/// Every puzzle is solved on the first try and the choice at `--choice`
/// (clamped to the last one offered) is taken at every level. Prints each
/// screen and the generated puzzle, then the ending.

use std::process;
use std::rc::Rc;
use winter_kindling::core::clock::{Clock, ManualClock};
use winter_kindling::core::controller::{
    CompletionSummary, GameController, JourneyStats, Phase, Presenter,
};
use winter_kindling::schema::choice::Choice;
use winter_kindling::schema::difficulty::{Difficulty, Position, Role};
use winter_kindling::schema::narrative::{Chapter, Ending, EndingKey, Level};

struct PrintPresenter;

impl Presenter for PrintPresenter {
    fn chapter_intro(&mut self, chapter: &Chapter, role: Role) {
        println!("\n=== {} ===", chapter.title);
        println!("{}", chapter.branch(role).intro);
    }

    fn level(&mut self, position: Position, level: &Level) {
        println!("\n--- {} {} [{}] ---", position.level_key(), level.title, level.puzzle_type);
    }

    fn choices(&mut self, choices: &[Choice]) {
        for (i, choice) in choices.iter().enumerate() {
            println!("  [{}] {} (+{})", i, choice.text, choice.kindling);
        }
    }

    fn completion(&mut self, summary: &CompletionSummary) {
        println!(
            "  {} +{} kindling in {}ms",
            summary.message, summary.kindling_awarded, summary.time_ms
        );
    }

    fn twist(&mut self, _chapter: &Chapter, text: &str) {
        println!("\n*** {} ***", text);
    }

    fn ending(&mut self, key: EndingKey, ending: Option<&Ending>, stats: &JourneyStats) {
        let title = ending.map(|e| e.title.as_str()).unwrap_or(key.tag());
        println!("\n=== {} ===", title);
        if let Some(ending) = ending {
            println!("{}", ending.epilogue);
        }
        println!(
            "\nKindling: {}  Choices: {}  Items: {}  Achievements: {}",
            stats.kindling, stats.choices, stats.items, stats.achievements
        );
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut content_path = None;
    let mut role = Role::Giver;
    let mut difficulty = Difficulty::Medium;
    let mut seed: u32 = 42;
    let mut choice_index: usize = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--content" if i + 1 < args.len() => {
                i += 1;
                content_path = Some(args[i].clone());
            }
            "--role" if i + 1 < args.len() => {
                i += 1;
                role = Role::from_tag(&args[i]).unwrap_or(Role::Giver);
            }
            "--difficulty" if i + 1 < args.len() => {
                i += 1;
                difficulty = Difficulty::from_tag(&args[i]);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--choice" if i + 1 < args.len() => {
                i += 1;
                choice_index = args[i].parse().unwrap_or(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(content_path) = content_path else {
        eprintln!("ERROR: --content is required");
        process::exit(1);
    };

    let clock = ManualClock::new(0);
    let mut game = match GameController::builder()
        .narrative_path(content_path)
        .clock(Rc::new(clock.clone()))
        .presenter(Box::new(PrintPresenter))
        .build()
    {
        Ok(game) => game,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    game.start_game(role, 1, difficulty, Some(seed));
    println!("Seed {} as {} on {}", seed, role, difficulty.tag());

    for _ in 0..1000 {
        while let Some(due) = game.next_timer_due() {
            clock.set(due.max(clock.now_ms()));
            game.tick();
        }

        let result = match game.phase() {
            Phase::ChapterIntro(_) | Phase::Twist(_) | Phase::Completion { .. } => game.confirm(),
            Phase::Puzzle => {
                if let Some(variant) = game.current_variant() {
                    println!("  puzzle: {:?}", variant);
                }
                let offered = game.available_choices().len();
                if offered > 0 {
                    if let Err(e) = game.choose(choice_index.min(offered - 1)) {
                        eprintln!("ERROR: {}", e);
                    }
                }
                game.complete_puzzle(true).map(|_| ())
            }
            Phase::Ending(_) => return,
            phase => {
                eprintln!("ERROR: stuck in {:?}", phase);
                process::exit(1);
            }
        };
        if let Err(e) = result {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    }

    eprintln!("ERROR: playthrough did not finish");
    process::exit(1);
}

fn print_usage() {
    println!("Usage: playthrough --content <path> [--role giver|seeker] [--difficulty easy|medium|hard]");
    println!("                   [--seed <n>] [--choice <index>]");
}
