// 🗄️ Saved Card Storage - SQLite persistence for the CLI, TUI and server
// The search core never touches this; callers load a SavedCards set and pass it in

use crate::saved::{SavedCardRef, SavedCards};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;

/// A saved card row, with when it was saved
#[derive(Debug, Clone, Serialize)]
pub struct SavedCardRecord {
    pub bank: String,
    pub card_name: String,
    pub saved_at: DateTime<Utc>,
}

pub fn open_database<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path.as_ref())
        .with_context(|| format!("Failed to open database: {:?}", path.as_ref()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS saved_cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bank TEXT NOT NULL,
            card_name TEXT NOT NULL,
            saved_at TEXT NOT NULL,
            UNIQUE(bank, card_name)
        )",
        [],
    )?;

    Ok(())
}

/// Saved cards in the order they were added
pub fn load_saved_cards(conn: &Connection) -> Result<SavedCards> {
    Ok(get_saved_card_records(conn)?
        .into_iter()
        .map(|record| SavedCardRef::new(record.bank, record.card_name))
        .collect())
}

pub fn get_saved_card_records(conn: &Connection) -> Result<Vec<SavedCardRecord>> {
    let mut stmt = conn.prepare(
        "SELECT bank, card_name, saved_at
         FROM saved_cards
         ORDER BY id ASC",
    )?;

    let records = stmt
        .query_map([], |row| {
            let saved_at_str: String = row.get(2)?;
            let saved_at = DateTime::parse_from_rfc3339(&saved_at_str)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
                })?
                .with_timezone(&Utc);

            Ok(SavedCardRecord {
                bank: row.get(0)?,
                card_name: row.get(1)?,
                saved_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read saved cards")?;

    Ok(records)
}

/// Returns true if the card was newly saved
pub fn insert_saved_card(conn: &Connection, card: &SavedCardRef) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO saved_cards (bank, card_name, saved_at) VALUES (?1, ?2, ?3)",
        params![card.bank, card.card_name, Utc::now().to_rfc3339()],
    )?;

    Ok(inserted > 0)
}

/// Returns true if a saved card was removed
pub fn delete_saved_card(conn: &Connection, card: &SavedCardRef) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM saved_cards WHERE bank = ?1 AND card_name = ?2",
        params![card.bank, card.card_name],
    )?;

    Ok(deleted > 0)
}
