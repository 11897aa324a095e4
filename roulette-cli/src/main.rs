mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};

use roulette_db::db::{db_path, fetch_all_rounds, migrate, open_db};
use roulette_db::history::{
    clear_with_fallback, load_with_fallback, save_round_with_fallback, snapshot_path,
    write_rounds_json, JsonSnapshot, LoadedHistory, SaveOutcome, SqliteSource,
};
use roulette_db::models::{parse_numbers, MAX_NUMBER};
use roulette_engine::predict::MIN_SCORING_ROUNDS;
use roulette_engine::sampler::make_rng;
use roulette_engine::{cold_numbers, color_stats, hot_numbers, parity_stats, EngineConfig, Predictor};
use crate::display::{
    display_breakdown, display_import_summary, display_origin, display_prediction, display_rounds,
    display_stats,
};

#[derive(Parser)]
#[command(name = "roulette", about = "Suivi des manches de roulette et numéros probables")]
struct Cli {
    /// Chemin de la base SQLite (défaut : ./data/roulette.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Chemin du snapshot JSON local (défaut : ./data/rounds.json)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ajouter une manche (saisie interactive si aucun numéro n'est donné)
    Add {
        /// Numéros dans l'ordre du tirage (0-36)
        numbers: Vec<u8>,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les dernières manches
    List {
        /// Nombre de manches à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Numéros chauds/froids, répartition couleur et parité
    Stats {
        /// Nombre de numéros chauds
        #[arg(long, default_value = "3")]
        hot: usize,

        /// Nombre de numéros froids
        #[arg(long, default_value = "3")]
        cold: usize,
    },

    /// Prédire les numéros les plus probables de la prochaine manche
    Predict {
        /// Nombre de numéros à proposer
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Seed pour la reproductibilité (historique insuffisant)
        #[arg(long)]
        seed: Option<u64>,

        /// Fichier JSON de configuration du moteur (poids, fenêtre récente)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Afficher le détail des facteurs pour chaque numéro
        #[arg(long)]
        explain: bool,

        /// Nouvelles tentatives de lecture de la base avant le snapshot local
        #[arg(long, default_value = "1")]
        retries: u32,
    },

    /// Importer des manches depuis un fichier CSV (une manche par ligne, séparateur ';')
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Exporter tout l'historique au format JSON
    Export {
        /// Fichier de sortie
        #[arg(short, long, default_value = "rounds_export.json")]
        file: PathBuf,
    },

    /// Effacer tout l'historique
    Clear {
        /// Ne pas demander de confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = cli.db.unwrap_or_else(db_path);
    let snapshot = JsonSnapshot::new(cli.snapshot.unwrap_or_else(snapshot_path));

    match cli.command {
        Command::Add { numbers } => cmd_add(&path, &snapshot, numbers),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&path, &snapshot, last),
        Command::Stats { hot, cold } => cmd_stats(&path, &snapshot, hot, cold),
        Command::Predict {
            count,
            seed,
            config,
            explain,
            retries,
        } => cmd_predict(&path, &snapshot, count, seed, config.as_deref(), explain, retries),
        Command::Import { file } => cmd_import(&path, &snapshot, &file),
        Command::Export { file } => cmd_export(&path, &file),
        Command::Clear { yes } => cmd_clear(&path, &snapshot, yes),
    }
}

fn load_history(path: &Path, snapshot: &JsonSnapshot, retries: u32) -> Result<LoadedHistory> {
    let history = load_with_fallback(&SqliteSource::new(path), snapshot, retries)?;
    display_origin(history.origin);
    Ok(history)
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: EngineConfig = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide {:?}", path))?;
    Ok(config)
}

fn cmd_add(path: &Path, snapshot: &JsonSnapshot, numbers: Vec<u8>) -> Result<()> {
    let numbers = if numbers.is_empty() {
        prompt_round()?
    } else {
        numbers
    };

    let outcome = save_round_with_fallback(path, snapshot, &numbers, Utc::now())?;
    match &outcome {
        SaveOutcome::Stored { round, .. } => {
            println!("Manche enregistrée ({} numéros).", round.len());
        }
        SaveOutcome::SnapshotOnly { .. } => {
            println!("Base indisponible : manche enregistrée localement uniquement.");
        }
    }
    display_rounds(std::slice::from_ref(outcome.round()), outcome.total())
}

fn cmd_list(path: &Path, snapshot: &JsonSnapshot, last: usize) -> Result<()> {
    let history = load_history(path, snapshot, 0)?;
    if history.rounds.is_empty() {
        println!("Historique vide. Ajoutez une manche : roulette add <numéros>");
        return Ok(());
    }
    println!("{} manches enregistrées", history.rounds.len());
    let shown = last.min(history.rounds.len());
    display_rounds(&history.rounds[..shown], history.rounds.len())
}

fn cmd_stats(path: &Path, snapshot: &JsonSnapshot, hot: usize, cold: usize) -> Result<()> {
    let history = load_history(path, snapshot, 0)?;
    let rounds = &history.rounds;
    if rounds.is_empty() {
        println!("Historique vide. Ajoutez une manche : roulette add <numéros>");
        return Ok(());
    }

    display_stats(
        &hot_numbers(rounds, hot),
        &cold_numbers(rounds, cold),
        &color_stats(rounds),
        &parity_stats(rounds),
        rounds.len(),
    );
    Ok(())
}

fn cmd_predict(
    path: &Path,
    snapshot: &JsonSnapshot,
    count: usize,
    seed: Option<u64>,
    config: Option<&Path>,
    explain: bool,
    retries: u32,
) -> Result<()> {
    let config = match config {
        Some(p) => load_config(p)?,
        None => EngineConfig::default(),
    };
    let predictor = Predictor::new(config);

    let history = load_history(path, snapshot, retries)?;
    let rounds = &history.rounds;

    let mut rng = make_rng(seed);
    let prediction = predictor.predict_with_rng(rounds, count, &mut rng)?;
    let scored = rounds.len() >= MIN_SCORING_ROUNDS;
    display_prediction(&prediction, rounds.len(), scored);

    if explain && scored {
        display_breakdown(&predictor.score_all(rounds), &predictor.config().weights);
    }
    Ok(())
}

fn cmd_import(path: &Path, snapshot: &JsonSnapshot, file: &Path) -> Result<()> {
    let conn = open_db(path)?;
    migrate(&conn)?;
    let result = import::import_csv(&conn, file)?;
    display_import_summary(&result);

    if result.inserted > 0 {
        snapshot.save(&fetch_all_rounds(&conn)?)?;
    }
    Ok(())
}

fn cmd_export(path: &Path, file: &Path) -> Result<()> {
    let conn = open_db(path)?;
    migrate(&conn)?;
    let rounds = fetch_all_rounds(&conn)?;
    write_rounds_json(file, &rounds)?;
    println!("{} manches exportées vers {}", rounds.len(), file.display());
    Ok(())
}

fn cmd_clear(path: &Path, snapshot: &JsonSnapshot, yes: bool) -> Result<()> {
    let n = load_history(path, snapshot, 0)?.rounds.len();
    if n == 0 {
        println!("Historique déjà vide.");
        return Ok(());
    }

    if !yes {
        let confirm = prompt(&format!("Effacer les {} manches ? (o/n) : ", n))?;
        if confirm.trim().to_lowercase() != "o" {
            println!("Suppression annulée.");
            return Ok(());
        }
    }

    let outcome = clear_with_fallback(path, snapshot)?;
    match outcome.deleted {
        Some(deleted) => println!("{} manches supprimées.", deleted),
        None => println!("Base indisponible : historique local effacé uniquement."),
    }
    if !outcome.snapshot_cleared {
        println!("⚠ Le snapshot local {} n'a pas pu être vidé.", snapshot.path().display());
    }
    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

/// Saisie numéro par numéro : `u` annule le dernier, une ligne vide termine.
fn prompt_round() -> Result<Vec<u8>> {
    println!("Saisie d'une manche : un numéro par ligne (ou plusieurs séparés par des espaces),");
    println!("'u' pour annuler le dernier, ligne vide pour terminer.\n");

    let mut numbers: Vec<u8> = Vec::new();
    loop {
        let input = prompt(&format!("Numéro {} : ", numbers.len() + 1))?;
        match input.as_str() {
            "" => {
                if numbers.is_empty() {
                    bail!("Aucun numéro saisi : manche annulée");
                }
                return Ok(numbers);
            }
            "u" | "U" => match numbers.pop() {
                Some(n) => println!("{} retiré.", n),
                None => println!("Rien à annuler."),
            },
            other => match parse_numbers(other) {
                Ok(parsed) => numbers.extend(parsed),
                Err(_) => println!("Numéro invalide (0-{}). Réessayez.", MAX_NUMBER),
            },
        }
    }
}
