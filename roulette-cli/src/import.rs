use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use roulette_db::rusqlite::Connection;
use std::path::Path;

use roulette_db::db::insert_round;
use roulette_db::models::validate_round;

/// Une manche par ligne, numéros séparés par `;`, dans l'ordre du tirage.
/// Un dernier champ au format RFC 3339 est lu comme date de la manche.
fn parse_record(record: &csv::StringRecord) -> Result<(Vec<u8>, Option<DateTime<Utc>>)> {
    let mut fields: Vec<&str> = record
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let parsed = fields.last().map(|s| DateTime::parse_from_rfc3339(s));
    let timestamp = match parsed {
        Some(Ok(ts)) => {
            fields.pop();
            Some(ts.with_timezone(&Utc))
        }
        _ => None,
    };

    let numbers = fields
        .iter()
        .map(|s| {
            s.parse::<u8>()
                .with_context(|| format!("Impossible de parser '{}'", s))
        })
        .collect::<Result<Vec<_>>>()?;
    validate_round(&numbers)?;

    Ok((numbers, timestamp))
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub errors: u32,
}

/// Les lignes sont supposées dans l'ordre chronologique (la plus ancienne d'abord).
pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => {
                match parse_record(&record) {
                    Ok((numbers, timestamp)) => {
                        match insert_round(&tx, &numbers, timestamp.unwrap_or_else(Utc::now)) {
                            Ok(_) => result.inserted += 1,
                            Err(e) => {
                                log::warn!("Erreur insertion ligne {}: {:#}", result.total_records, e);
                                result.errors += 1;
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Erreur parsing ligne {}: {:#}", result.total_records, e);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_db::db::{fetch_all_rounds, migrate};

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_record_numbers_only() {
        let (numbers, ts) = parse_record(&record(&["3", " 26 ", "0"])).unwrap();
        assert_eq!(numbers, vec![3, 26, 0]);
        assert!(ts.is_none());
    }

    #[test]
    fn test_parse_record_with_timestamp() {
        let (numbers, ts) = parse_record(&record(&["12", "35", "2024-03-01T20:15:00Z"])).unwrap();
        assert_eq!(numbers, vec![12, 35]);
        assert_eq!(ts.unwrap().to_rfc3339(), "2024-03-01T20:15:00+00:00");
    }

    #[test]
    fn test_parse_record_invalid() {
        assert!(parse_record(&record(&["12", "37"])).is_err());
        assert!(parse_record(&record(&["douze"])).is_err());
        assert!(parse_record(&record(&["", ""])).is_err());
        assert!(parse_record(&record(&["2024-03-01T20:15:00Z"])).is_err());
    }

    #[test]
    fn test_import_csv() {
        let path = std::env::temp_dir().join(format!("roulette-import-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "1;2;3;2024-01-01T10:00:00Z\n4;99\n5;6;2024-01-01T11:00:00Z\n",
        ).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = import_csv(&conn, &path).unwrap();
        assert_eq!(result.total_records, 3);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.errors, 1);

        let rounds = fetch_all_rounds(&conn).unwrap();
        assert_eq!(rounds[0].numbers(), &[5, 6]);
        assert_eq!(rounds[1].numbers(), &[1, 2, 3]);
        std::fs::remove_file(path).unwrap();
    }
}
