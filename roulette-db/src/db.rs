use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{parse_numbers, validate_round, Round};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS rounds (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    numbers     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS rounds_created_at ON rounds (created_at);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("roulette.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn encode_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

// Largeur fixe pour que l'ordre lexicographique suive l'ordre chronologique.
fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_row(id: i64, numbers: &str, created_at: &str) -> Result<Round> {
    let numbers = parse_numbers(numbers)
        .with_context(|| format!("Numéros corrompus pour la manche {}", id))?;
    let timestamp = DateTime::parse_from_rfc3339(created_at)
        .with_context(|| format!("Date corrompue pour la manche {}: '{}'", id, created_at))?
        .with_timezone(&Utc);
    Round::new(id, numbers, timestamp)
}

/// Valide puis enregistre une manche ; l'identifiant est attribué par la base.
pub fn insert_round(conn: &Connection, numbers: &[u8], timestamp: DateTime<Utc>) -> Result<Round> {
    validate_round(numbers)?;
    conn.execute(
        "INSERT INTO rounds (numbers, created_at) VALUES (?1, ?2)",
        rusqlite::params![encode_numbers(numbers), encode_timestamp(timestamp)],
    ).context("Échec de l'insertion")?;
    let id = conn.last_insert_rowid();
    log::info!("Manche {} enregistrée ({} numéros)", id, numbers.len());
    Round::new(id, numbers.to_vec(), timestamp)
}

/// Les `limit` dernières manches, la plus récente en premier.
pub fn fetch_last_rounds(conn: &Connection, limit: u32) -> Result<Vec<Round>> {
    let mut stmt = conn.prepare(
        "SELECT id, numbers, created_at
         FROM rounds ORDER BY created_at DESC, id DESC LIMIT ?1"
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    rows.iter()
        .map(|(id, numbers, created_at)| decode_row(*id, numbers, created_at))
        .collect()
}

pub fn fetch_all_rounds(conn: &Connection) -> Result<Vec<Round>> {
    let n = count_rounds(conn)?;
    fetch_last_rounds(conn, n)
}

pub fn count_rounds(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM rounds", [], |row| row.get(0))?;
    Ok(count)
}

/// Supprime tout l'historique ; retourne le nombre de manches effacées.
pub fn clear_rounds(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM rounds", [])
        .context("Échec de la suppression")?;
    log::info!("{} manches supprimées", deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_insert_and_count() {
        let conn = test_conn();
        assert_eq!(count_rounds(&conn).unwrap(), 0);

        let round = insert_round(&conn, &[1, 2, 3], at(0)).unwrap();
        assert_eq!(round.numbers(), &[1, 2, 3]);
        assert_eq!(count_rounds(&conn).unwrap(), 1);
    }

    #[test]
    fn test_insert_rejects_invalid() {
        let conn = test_conn();
        assert!(insert_round(&conn, &[], at(0)).is_err());
        assert!(insert_round(&conn, &[5, 37], at(0)).is_err());
        assert_eq!(count_rounds(&conn).unwrap(), 0);
    }

    #[test]
    fn test_fetch_order() {
        let conn = test_conn();

        insert_round(&conn, &[1], at(0)).unwrap();
        insert_round(&conn, &[2], at(10)).unwrap();
        insert_round(&conn, &[3], at(5)).unwrap();

        let rounds = fetch_last_rounds(&conn, 10).unwrap();
        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds[0].numbers(), &[2]);
        assert_eq!(rounds[1].numbers(), &[3]);
        assert_eq!(rounds[2].numbers(), &[1]);
        assert_eq!(rounds[0].timestamp(), at(10));
    }

    #[test]
    fn test_fetch_limit_and_all() {
        let conn = test_conn();
        for i in 0..8 {
            insert_round(&conn, &[i as u8, 0], at(i)).unwrap();
        }
        let last = fetch_last_rounds(&conn, 3).unwrap();
        assert_eq!(last.len(), 3);
        assert_eq!(last[0].numbers(), &[7, 0]);

        assert_eq!(fetch_all_rounds(&conn).unwrap().len(), 8);
    }

    #[test]
    fn test_clear_rounds() {
        let conn = test_conn();
        insert_round(&conn, &[1, 2], at(0)).unwrap();
        insert_round(&conn, &[3], at(1)).unwrap();
        assert_eq!(clear_rounds(&conn).unwrap(), 2);
        assert_eq!(count_rounds(&conn).unwrap(), 0);
        assert!(fetch_all_rounds(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_row_is_error() {
        let conn = test_conn();
        conn.execute(
            "INSERT INTO rounds (numbers, created_at) VALUES ('1,99', ?1)",
            [encode_timestamp(at(0))],
        ).unwrap();
        assert!(fetch_all_rounds(&conn).is_err());
    }
}
