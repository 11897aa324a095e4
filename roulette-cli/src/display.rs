use anyhow::Result;
use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use roulette_db::history::HistoryOrigin;
use roulette_db::models::{Prediction, Round};
use roulette_engine::wheel::{self, color_of};
use roulette_engine::{compute_round_stats, ColorStats, ParityStats, PredictionWeights, ScoreBreakdown};

fn cell_color(number: u8) -> Color {
    match color_of(number) {
        wheel::Color::Red => Color::Red,
        wheel::Color::Black => Color::Grey,
        wheel::Color::Green => Color::Green,
    }
}

fn number_cell(number: u8) -> Cell {
    Cell::new(format!("{:2}", number)).fg(cell_color(number))
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_origin(origin: HistoryOrigin) {
    if origin == HistoryOrigin::Snapshot {
        println!("⚠ Base indisponible : historique local utilisé.");
    }
}

/// Historique, la manche la plus récente en premier. `total` est le nombre de
/// manches de tout l'historique : la première ligne porte ce numéro.
pub fn display_rounds(rounds: &[Round], total: usize) -> Result<()> {
    if rounds.is_empty() {
        println!("Aucune manche à afficher.");
        return Ok(());
    }
    println!("{}", rounds_table(rounds, total)?);
    Ok(())
}

fn rounds_table(rounds: &[Round], total: usize) -> Result<Table> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Manche", "Date", "Numéros", "Pairs", "Rouges", "Série max"]);

    for (i, round) in rounds.iter().enumerate() {
        let stats = compute_round_stats(round.numbers())?;
        table.add_row(vec![
            format!("{}", total.saturating_sub(i)),
            round.timestamp().format("%d/%m/%Y %H:%M").to_string(),
            join_numbers(round.numbers()),
            stats.evens.to_string(),
            stats.reds.to_string(),
            stats.max_sequence.to_string(),
        ]);
    }
    Ok(table)
}

pub fn display_stats(hot: &[u8], cold: &[u8], colors: &ColorStats, parity: &ParityStats, n_rounds: usize) {
    println!("\n📊 Statistiques sur {} manches\n", n_rounds);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Catégorie", "Numéros"]);

    let hot_str = if hot.is_empty() { "-".to_string() } else { join_numbers(hot) };
    let cold_str = if cold.is_empty() { "-".to_string() } else { join_numbers(cold) };
    table.add_row(vec![Cell::new("Chauds"), Cell::new(hot_str).fg(Color::Red)]);
    table.add_row(vec![Cell::new("Froids"), Cell::new(cold_str).fg(Color::Cyan)]);
    println!("{table}");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Rouge", "Noir", "Vert", "Pair", "Impair"]);
    table.add_row(vec![
        format!("{}%", colors.red),
        format!("{}%", colors.black),
        format!("{}%", colors.green),
        format!("{}%", parity.even),
        format!("{}%", parity.odd),
    ]);
    println!("{table}");
}

pub fn display_prediction(prediction: &Prediction, n_rounds: usize, scored: bool) {
    println!("\n🎯 Numéros probables pour la prochaine manche\n");
    if !scored {
        println!("Historique insuffisant ({} manche(s)) : sélection aléatoire.\n", n_rounds);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Rang", "Numéro", "Couleur"]);

    for (i, &n) in prediction.numbers.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            number_cell(n),
            Cell::new(color_of(n).to_string()),
        ]);
    }
    println!("{table}");
    println!("Généré le {}", prediction.timestamp.format("%d/%m/%Y %H:%M:%S"));
}

pub fn display_breakdown(scores: &[ScoreBreakdown], weights: &PredictionWeights) {
    println!("\n── Détail des scores ──");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Numéro".to_string(),
            format!("Fréq. ({:.2})", weights.frequency),
            format!("Récente ({:.2})", weights.recent_frequency),
            format!("Couleur ({:.2})", weights.color_trend),
            format!("Parité ({:.2})", weights.parity_trend),
            format!("Motif ({:.2})", weights.patterns),
            "Score".to_string(),
        ]);

    for s in scores {
        table.add_row(vec![
            number_cell(s.number),
            Cell::new(format!("{:.3}", s.overall_frequency)),
            Cell::new(format!("{:.3}", s.recent_frequency)),
            Cell::new(format!("{:.3}", s.color_trend)),
            Cell::new(format!("{:.3}", s.parity_trend)),
            Cell::new(format!("{:.3}", s.pattern)),
            Cell::new(format!("{:.4}", s.score)),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérées          : {}", result.inserted);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}
