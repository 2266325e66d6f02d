// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use best_card::{
    delete_saved_card, get_saved_card_records, insert_saved_card, load_saved_cards,
    open_database, AppConfig, Catalog, SavedCardRef, SearchEngine,
};
use std::env;

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("ui");
    let rest = args.get(1..).unwrap_or(&[]);

    if command != "ui" {
        best_card::logging::init_tracing("warn");
    }

    let config = AppConfig::load()?;

    match command {
        "search" => run_search(&config, &rest.join(" ")),
        "grouped" => run_grouped(&config, &rest.join(" ")),
        "suggest" => run_suggest(&config, rest),
        "cards" => run_cards(&config),
        "save" => run_save(&config, rest, true),
        "unsave" => run_save(&config, rest, false),
        "saved" => run_saved(&config),
        "ui" => run_ui_mode(&config),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("Unknown command: {}", other)
        }
    }
}

fn print_usage() {
    println!("best-card {}", best_card::VERSION);
    println!();
    println!("Usage:");
    println!("  best-card search <query...>     Top card benefits for a merchant or category");
    println!("  best-card grouped <query...>    Same, one row per card");
    println!("  best-card suggest [text]        Merchant and category suggestions");
    println!("  best-card suggest --by-category [text]");
    println!("                                  Suggestions grouped by category, with synonyms");
    println!("  best-card cards                 All cards in the catalog");
    println!("  best-card save <bank> <card>    Mark a card as owned");
    println!("  best-card unsave <bank> <card>  Unmark a card");
    println!("  best-card saved                 List saved cards");
    println!("  best-card ui                    Interactive terminal UI (default)");
}

fn load_engine(config: &AppConfig) -> Result<SearchEngine> {
    let catalog = Catalog::from_file(&config.catalog_path)?;
    for bank in catalog.skipped_banks() {
        eprintln!("⚠️  Skipped malformed bank entry: {}", bank);
    }
    Ok(SearchEngine::new(catalog, config.synonym_table()?).with_limit(config.result_limit))
}

fn run_search(config: &AppConfig, query: &str) -> Result<()> {
    let engine = load_engine(config)?;
    let conn = open_database(&config.database_path)?;
    let saved = load_saved_cards(&conn)?;

    let Some(results) = engine.search(query, &saved) else {
        bail!("Usage: best-card search <query...>");
    };

    println!("🔍 Best cards for \"{}\"", query.trim());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if results.is_empty() {
        println!("No matching card benefits found.");
        return Ok(());
    }

    for (i, r) in results.iter().enumerate() {
        let badge = if r.saved { " [Saved]" } else { "" };
        println!("{}. {}{}", i + 1, r.card, badge);
        println!("   {} — {}", best_card::nice_label(&r.category), r.description);
        match &r.matched_merchant {
            Some(merchant) => println!("   Merchant: {}  |  Score: {:.0}", merchant, r.score),
            None => println!("   Score: {:.0}", r.score),
        }
    }

    Ok(())
}

fn run_grouped(config: &AppConfig, query: &str) -> Result<()> {
    let engine = load_engine(config)?;
    let conn = open_database(&config.database_path)?;
    let saved = load_saved_cards(&conn)?;

    let Some(groups) = engine.search_grouped(query, &saved) else {
        bail!("Usage: best-card grouped <query...>");
    };

    if groups.is_empty() {
        println!("No matching card benefits found.");
        return Ok(());
    }

    for group in &groups {
        let badge = if group.saved { " [Saved]" } else { "" };
        println!("{}{}  (score {:.0})", group.card, badge, group.best_score);
        for benefit in &group.benefits {
            let merchant = benefit
                .matched_merchant
                .as_deref()
                .map(|m| format!(" — {}", m))
                .unwrap_or_default();
            println!("   • {}{}: {}", best_card::nice_label(&benefit.category), merchant, benefit.description);
        }
    }

    Ok(())
}

fn run_suggest(config: &AppConfig, args: &[String]) -> Result<()> {
    let engine = load_engine(config)?;

    let by_category = args.first().map(String::as_str) == Some("--by-category");
    let text = if by_category { args[1..].join(" ") } else { args.join(" ") };

    if !by_category {
        for suggestion in engine.suggestions_matching(&text, config.suggestion_limit) {
            println!("{}", suggestion);
        }
        return Ok(());
    }

    for group in engine.suggestion_groups(&text, config.suggestion_limit) {
        println!("📂 {}", group.label);
        for item in &group.items {
            println!("   {}", item);
        }
    }
    Ok(())
}

fn run_cards(config: &AppConfig) -> Result<()> {
    let engine = load_engine(config)?;
    let conn = open_database(&config.database_path)?;
    let saved = load_saved_cards(&conn)?;

    for card in engine.cards_sorted() {
        let mark = if saved.contains(&card.bank, &card.card_name) { "★" } else { " " };
        println!("{} {}", mark, card.label());
    }
    println!("\n✓ {} cards", engine.cards().len());
    Ok(())
}

fn run_save(config: &AppConfig, args: &[String], save: bool) -> Result<()> {
    let [bank, card_name] = args else {
        bail!("Usage: best-card {} <bank> <card name>", if save { "save" } else { "unsave" });
    };

    let conn = open_database(&config.database_path)?;
    let card = SavedCardRef::new(bank.as_str(), card_name.as_str());

    if save {
        let engine = load_engine(config)?;
        if !engine.index().contains_card(bank, card_name) {
            bail!("Card not in catalog: {} - {}", bank, card_name);
        }
        if insert_saved_card(&conn, &card)? {
            println!("✓ Saved {} - {}", bank, card_name);
        } else {
            println!("✓ Already saved: {} - {}", bank, card_name);
        }
    } else if delete_saved_card(&conn, &card)? {
        println!("✓ Removed {} - {}", bank, card_name);
    } else {
        println!("Not saved: {} - {}", bank, card_name);
    }

    Ok(())
}

fn run_saved(config: &AppConfig) -> Result<()> {
    let conn = open_database(&config.database_path)?;
    let records = get_saved_card_records(&conn)?;

    if records.is_empty() {
        println!("No saved cards yet. Add one with: best-card save <bank> <card>");
        return Ok(());
    }

    for record in records {
        println!(
            "★ {} - {}  (saved {})",
            record.bank,
            record.card_name,
            record.saved_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    // Logs would draw over the alternate screen unless explicitly requested
    best_card::logging::init_tracing("off");

    let engine = load_engine(config)?;
    let conn = open_database(&config.database_path)?;
    let saved = load_saved_cards(&conn)?;

    let mut app = ui::App::new(engine, saved, conn, config.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the CLI: best-card search <query>");
    std::process::exit(1);
}
