/// Narrative Linter: checks a content table for structural problems.
///
/// Usage: narrative_linter <table.ron> [--levels-per-chapter <n>]

use std::path::Path;
use std::process;
use winter_kindling::core::ending::ending_for_consequence;
use winter_kindling::schema::difficulty::Role;
use winter_kindling::schema::narrative::{EndingKey, NarrativeTable, DEFAULT_ITEM_ICON};
use winter_kindling::schema::puzzle::Archetype;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: narrative_linter <table.ron> [--levels-per-chapter <n>]");
        process::exit(0);
    }

    let table_path = Path::new(&args[1]);
    let mut levels_per_chapter: usize = 3;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--levels-per-chapter" && i + 1 < args.len() {
            i += 1;
            levels_per_chapter = args[i].parse().unwrap_or(3);
        }
        i += 1;
    }

    let table = match NarrativeTable::load_from_ron(table_path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("ERROR: Failed to load table: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded '{}': {} chapters, {} endings",
        table.title,
        table.chapters.len(),
        table.endings.len()
    );

    let (errors, warnings) = lint_table(&table, levels_per_chapter);

    println!("\n=== Narrative Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_table(table: &NarrativeTable, levels_per_chapter: usize) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (index, chapter) in table.chapters.iter().enumerate() {
        if usize::from(chapter.id) != index + 1 {
            errors.push(format!(
                "Chapter at position {} has id {}",
                index + 1,
                chapter.id
            ));
        }

        for role in [Role::Giver, Role::Seeker] {
            let branch = chapter.branch(role);
            if branch.levels.len() != levels_per_chapter {
                errors.push(format!(
                    "Chapter {} {} branch has {} levels (expected {})",
                    chapter.id,
                    role,
                    branch.levels.len(),
                    levels_per_chapter
                ));
            }
            if branch.intro.is_empty() {
                warnings.push(format!("Chapter {} {} branch has no intro", chapter.id, role));
            }

            for (l, level) in branch.levels.iter().enumerate() {
                let at = format!("{}-{} ({})", chapter.id, l + 1, role);
                if usize::from(level.id) != l + 1 {
                    errors.push(format!("Level {} has id {}", at, level.id));
                }
                // Unknown tags are played as pattern-memory.
                if Archetype::parse(&level.puzzle_type).is_none() {
                    warnings.push(format!(
                        "Level {} puzzle type '{}' is unknown and will play as pattern-memory",
                        at, level.puzzle_type
                    ));
                }
                if level.choices.is_empty() {
                    warnings.push(format!("Level {} offers no choices", at));
                }
                for item in &level.items {
                    if table.item_icon(item) == DEFAULT_ITEM_ICON {
                        warnings.push(format!("Item '{}' at {} has no icon", item, at));
                    }
                }
            }
        }
    }

    for key in EndingKey::ALL {
        if table.ending(key).is_none() {
            errors.push(format!("Ending '{}' has no text", key));
        }
    }
    for name in table.endings.keys() {
        if !EndingKey::ALL.iter().any(|k| k.tag() == name) {
            warnings.push(format!("Ending '{}' can never be reached", name));
        }
    }

    // Every ending should be selectable by some final choice.
    if let Some(last) = table.chapters.last() {
        let mut reachable: Vec<EndingKey> = Vec::new();
        for role in [Role::Giver, Role::Seeker] {
            if let Some(level) = last.branch(role).levels.last() {
                for choice in &level.choices {
                    let ending = ending_for_consequence(&choice.consequence);
                    if !reachable.contains(&ending) {
                        reachable.push(ending);
                    }
                }
            }
        }
        for key in EndingKey::ALL {
            if !reachable.contains(&key) {
                warnings.push(format!("No final choice leads to ending '{}'", key));
            }
        }
    }

    for (key, hints) in &table.hints.levels {
        if hints.puzzle.is_empty() && hints.story.is_empty() {
            warnings.push(format!("Hint entry '{}' is empty", key));
        }
    }
    for tag in table.hints.archetypes.keys() {
        if Archetype::parse(tag).is_none() {
            warnings.push(format!("Hints given for unknown archetype '{}'", tag));
        }
    }

    (errors, warnings)
}
