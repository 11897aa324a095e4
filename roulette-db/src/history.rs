use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::db::{clear_rounds, fetch_all_rounds, insert_round, migrate, open_db};
use crate::models::{validate_round, Round, RoundRecord};

/// Nombre de manches conservées dans le snapshot local.
pub const MAX_SNAPSHOT_ROUNDS: usize = 20;

pub fn snapshot_path() -> PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("rounds.json");
    path
}

/// Fournisseur d'historique. Les manches sont rendues la plus récente en premier.
pub trait HistorySource {
    fn name(&self) -> &str;
    fn load(&self) -> Result<Vec<Round>>;
}

/// Historique complet lu depuis la base SQLite.
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistorySource for SqliteSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> Result<Vec<Round>> {
        let conn = open_db(&self.path)?;
        migrate(&conn)?;
        fetch_all_rounds(&conn)
    }
}

/// Copie JSON locale des dernières manches, utilisée en secours.
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Un fichier absent équivaut à un historique vide.
    pub fn load(&self) -> Result<Vec<Round>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Impossible de lire {:?}", self.path))?;
        let records: Vec<RoundRecord> = serde_json::from_str(&json)
            .with_context(|| format!("Snapshot illisible {:?}", self.path))?;
        records.into_iter().map(Round::try_from).collect()
    }

    /// Copie de l'historique complet lu en base.
    pub fn save(&self, rounds: &[Round]) -> Result<()> {
        write_rounds_json(&self.path, rounds)?;
        log::info!("Snapshot écrit : {} manches dans {:?}", rounds.len(), self.path);
        Ok(())
    }

    /// Écrit au plus [`MAX_SNAPSHOT_ROUNDS`] manches (saisie hors base).
    pub fn save_recent(&self, rounds: &[Round]) -> Result<()> {
        let kept = rounds.len().min(MAX_SNAPSHOT_ROUNDS);
        self.save(&rounds[..kept])
    }
}

/// Écrit des manches au format JSON (snapshot, export).
pub fn write_rounds_json(path: &Path, rounds: &[Round]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
        }
    }
    let records: Vec<RoundRecord> = rounds.iter().map(RoundRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOrigin {
    Primary,
    Snapshot,
}

#[derive(Debug, Clone)]
pub struct LoadedHistory {
    pub rounds: Vec<Round>,
    pub origin: HistoryOrigin,
}

/// Lit l'historique depuis `primary` (jusqu'à `1 + retries` tentatives) et
/// rafraîchit le snapshot ; si toutes les tentatives échouent, se rabat sur le
/// snapshot local.
pub fn load_with_fallback(
    primary: &dyn HistorySource,
    snapshot: &JsonSnapshot,
    retries: u32,
) -> Result<LoadedHistory> {
    let attempts = retries + 1;
    for attempt in 1..=attempts {
        match primary.load() {
            Ok(rounds) => {
                if let Err(e) = snapshot.save(&rounds) {
                    log::warn!("Snapshot non mis à jour : {:#}", e);
                }
                return Ok(LoadedHistory {
                    rounds,
                    origin: HistoryOrigin::Primary,
                });
            }
            Err(e) => {
                log::warn!(
                    "Lecture {} échouée (tentative {}/{}) : {:#}",
                    primary.name(),
                    attempt,
                    attempts,
                    e
                );
            }
        }
    }

    log::warn!("Utilisation du snapshot local {:?}", snapshot.path());
    let rounds = snapshot.load()?;
    Ok(LoadedHistory {
        rounds,
        origin: HistoryOrigin::Snapshot,
    })
}

/// `total` : nombre de manches dans le magasin qui a reçu la manche.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Enregistrée en base, snapshot rafraîchi.
    Stored { round: Round, total: usize },
    /// Base indisponible : enregistrée dans le snapshot seulement.
    SnapshotOnly { round: Round, total: usize },
}

impl SaveOutcome {
    pub fn round(&self) -> &Round {
        match self {
            SaveOutcome::Stored { round, .. } | SaveOutcome::SnapshotOnly { round, .. } => round,
        }
    }

    pub fn total(&self) -> usize {
        match self {
            SaveOutcome::Stored { total, .. } | SaveOutcome::SnapshotOnly { total, .. } => *total,
        }
    }
}

fn store_round(db_path: &Path, numbers: &[u8], timestamp: DateTime<Utc>) -> Result<(Round, Vec<Round>)> {
    let conn = open_db(db_path)?;
    migrate(&conn)?;
    let round = insert_round(&conn, numbers, timestamp)?;
    let all = fetch_all_rounds(&conn)?;
    Ok((round, all))
}

/// Enregistre une manche en base ; en cas d'échec de la base, l'ajoute en tête
/// du snapshot local.
pub fn save_round_with_fallback(
    db_path: &Path,
    snapshot: &JsonSnapshot,
    numbers: &[u8],
    timestamp: DateTime<Utc>,
) -> Result<SaveOutcome> {
    validate_round(numbers)?;

    match store_round(db_path, numbers, timestamp) {
        Ok((round, all)) => {
            if let Err(e) = snapshot.save(&all) {
                log::warn!("Snapshot non mis à jour : {:#}", e);
            }
            Ok(SaveOutcome::Stored { round, total: all.len() })
        }
        Err(e) => {
            log::warn!("Enregistrement en base impossible, sauvegarde locale : {:#}", e);
            let mut rounds = snapshot.load()?;
            let id = rounds.iter().map(|r| r.id()).max().unwrap_or(0) + 1;
            let round = Round::new(id, numbers.to_vec(), timestamp)?;
            rounds.insert(0, round.clone());
            snapshot.save_recent(&rounds)?;
            let total = rounds.len().min(MAX_SNAPSHOT_ROUNDS);
            Ok(SaveOutcome::SnapshotOnly { round, total })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOutcome {
    /// Manches supprimées en base, `None` si la base est indisponible.
    pub deleted: Option<usize>,
    pub snapshot_cleared: bool,
}

fn clear_stored(db_path: &Path) -> Result<usize> {
    let conn = open_db(db_path)?;
    migrate(&conn)?;
    clear_rounds(&conn)
}

/// Vide la base puis le snapshot local. Le snapshot est vidé même si la base
/// est indisponible ; erreur seulement si aucun des deux n'a pu l'être.
pub fn clear_with_fallback(db_path: &Path, snapshot: &JsonSnapshot) -> Result<ClearOutcome> {
    let deleted = match clear_stored(db_path) {
        Ok(n) => Some(n),
        Err(e) => {
            log::warn!("Suppression en base impossible, effacement local : {:#}", e);
            None
        }
    };

    let snapshot_cleared = match snapshot.save(&[]) {
        Ok(()) => true,
        Err(e) if deleted.is_some() => {
            log::warn!("Snapshot non vidé : {:#}", e);
            false
        }
        Err(e) => return Err(e.context("Aucun historique n'a pu être effacé")),
    };

    Ok(ClearOutcome { deleted, snapshot_cleared })
}
