use std::cmp::Ordering;

use anyhow::{bail, Result};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use roulette_db::models::{Prediction, Round, POOL_SIZE};

use crate::sampler::random_numbers;
use crate::stats::{color_stats, number_frequencies, parity_stats, ColorStats, FrequencyMap, ParityStats};
use crate::wheel::{color_of, neighbors, parity_of, Color};

/// Taille par défaut de la liste prédite.
pub const DEFAULT_COUNT: usize = 5;

/// En dessous, la prédiction retombe sur un tirage aléatoire.
pub const MIN_SCORING_ROUNDS: usize = 2;

const SUCCESSOR_BONUS: f64 = 0.25;
const POSITION_BONUS: f64 = 0.3;
const NEIGHBOR_BONUS: f64 = 0.15;
// Seules les 5 premières positions d'une manche sont suivies.
const TRACKED_POSITIONS: usize = 5;

/// Poids des cinq facteurs du score (somme = 1.0 par défaut).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionWeights {
    pub frequency: f64,
    pub recent_frequency: f64,
    pub color_trend: f64,
    pub parity_trend: f64,
    pub patterns: f64,
}

impl Default for PredictionWeights {
    fn default() -> Self {
        Self {
            frequency: 0.20,
            recent_frequency: 0.40,
            color_trend: 0.15,
            parity_trend: 0.10,
            patterns: 0.15,
        }
    }
}

impl PredictionWeights {
    pub fn total(&self) -> f64 {
        self.frequency + self.recent_frequency + self.color_trend + self.parity_trend + self.patterns
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: PredictionWeights,
    /// Nombre de manches récentes pour la fréquence récente.
    pub recent_window: usize,
    /// Plafond du facteur motif avant pondération.
    pub pattern_cap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: PredictionWeights::default(),
            recent_window: 5,
            pattern_cap: 1.5,
        }
    }
}

/// Détail du score d'un numéro : facteurs normalisés (avant poids) et score pondéré.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub number: u8,
    pub overall_frequency: f64,
    pub recent_frequency: f64,
    pub color_trend: f64,
    pub parity_trend: f64,
    /// Déjà plafonné.
    pub pattern: f64,
    pub score: f64,
}

/// Agrégats calculés une fois par appel et partagés par les 37 numéros.
struct HistoryContext<'a> {
    rounds: &'a [Round],
    overall: FrequencyMap,
    recent: FrequencyMap,
    colors: ColorStats,
    parity: ParityStats,
}

impl<'a> HistoryContext<'a> {
    fn new(rounds: &'a [Round], recent_window: usize) -> Self {
        let recent_len = recent_window.min(rounds.len());
        Self {
            rounds,
            overall: number_frequencies(rounds),
            recent: number_frequencies(&rounds[..recent_len]),
            colors: color_stats(rounds),
            parity: parity_stats(rounds),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Predictor {
    config: EngineConfig,
}

impl Predictor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn with_weights(weights: PredictionWeights) -> Self {
        Self::new(EngineConfig {
            weights,
            ..EngineConfig::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score des 37 numéros, classés par score décroissant puis numéro croissant.
    /// `rounds[0]` = manche la plus récente.
    pub fn score_all(&self, rounds: &[Round]) -> Vec<ScoreBreakdown> {
        let ctx = HistoryContext::new(rounds, self.config.recent_window);
        let mut scored: Vec<ScoreBreakdown> = (0..POOL_SIZE as u8)
            .map(|n| self.score_number(n, &ctx))
            .collect();
        // Tri stable sur l'ordre 0..=36 : à score égal, le plus petit numéro d'abord
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored
    }

    pub fn predict(&self, rounds: &[Round], count: usize) -> Result<Prediction> {
        self.predict_with_rng(rounds, count, &mut rand::rng())
    }

    /// Avec moins de [`MIN_SCORING_ROUNDS`] manches, tire `count` numéros au hasard
    /// dans `rng` ; sinon le résultat est déterministe.
    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        rounds: &[Round],
        count: usize,
        rng: &mut R,
    ) -> Result<Prediction> {
        if count > POOL_SIZE {
            bail!("Impossible de prédire {} numéros distincts (maximum {})", count, POOL_SIZE);
        }

        if rounds.len() < MIN_SCORING_ROUNDS {
            log::debug!("Historique insuffisant ({} manches) : tirage aléatoire", rounds.len());
            return Ok(Prediction {
                numbers: random_numbers(count, rng),
                timestamp: Utc::now(),
            });
        }

        let numbers = self
            .score_all(rounds)
            .into_iter()
            .take(count)
            .map(|s| s.number)
            .collect();
        log::debug!("Prédiction calculée sur {} manches", rounds.len());

        Ok(Prediction {
            numbers,
            timestamp: Utc::now(),
        })
    }

    fn score_number(&self, n: u8, ctx: &HistoryContext<'_>) -> ScoreBreakdown {
        let w = &self.config.weights;

        let overall_frequency = ctx.overall.normalized(n);
        let recent_frequency = ctx.recent.normalized(n);
        let color_trend = color_trend(n, &ctx.colors);
        let parity_trend = parity_trend(n, &ctx.parity);
        let pattern = pattern_bonus(n, ctx).min(self.config.pattern_cap);

        let mut score = 0.0;
        score += overall_frequency * w.frequency;
        score += recent_frequency * w.recent_frequency;
        score += color_trend * w.color_trend;
        score += parity_trend * w.parity_trend;
        score += pattern * w.patterns;

        ScoreBreakdown {
            number: n,
            overall_frequency,
            recent_frequency,
            color_trend,
            parity_trend,
            pattern,
            score,
        }
    }
}

/// Prédiction avec la configuration par défaut.
pub fn predict_next_numbers(rounds: &[Round], count: usize) -> Result<Prediction> {
    Predictor::default().predict(rounds, count)
}

fn color_trend(n: u8, stats: &ColorStats) -> f64 {
    match color_of(n) {
        Color::Red if stats.red > stats.black => stats.red as f64 / 100.0,
        Color::Black if stats.black > stats.red => stats.black as f64 / 100.0,
        Color::Green => stats.green as f64 / 100.0,
        _ => 0.0,
    }
}

fn parity_trend(n: u8, stats: &ParityStats) -> f64 {
    let Some(parity) = parity_of(n) else {
        return 0.0;
    };
    let own = stats.percentage(parity);
    let other = stats.even + stats.odd - own;
    if own > other {
        own as f64 / 100.0
    } else {
        0.0
    }
}

/// `n` apparaît dans au moins deux manches à la même position (première occurrence).
fn recurs_at_same_position(n: u8, rounds: &[Round]) -> bool {
    let mut position_counts = [0u32; TRACKED_POSITIONS];
    let mut rounds_with_n = 0;
    for round in rounds {
        if let Some(idx) = round.position_of(n) {
            rounds_with_n += 1;
            if idx < TRACKED_POSITIONS {
                position_counts[idx] += 1;
            }
        }
    }
    rounds_with_n >= 2 && position_counts.iter().any(|&c| c >= 2)
}

/// Somme brute (non plafonnée) du facteur motif.
///
/// Les bonus de position et de voisinage ne dépendent pas de la paire mais sont
/// ajoutés à chaque paire de manches adjacentes ; l'ordre des additions est
/// conservé pour que les égalités de score restent identiques.
fn pattern_bonus(n: u8, ctx: &HistoryContext<'_>) -> f64 {
    let recurs = recurs_at_same_position(n, ctx.rounds);
    let recent_neighbors = neighbors(n)
        .iter()
        .filter(|&&nb| ctx.recent.get(nb) > 0)
        .count();

    let mut bonus = 0.0;
    for pair in ctx.rounds.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if current.contains(n) {
            let first = current.first();
            for &p in previous.numbers() {
                if p == first {
                    bonus += SUCCESSOR_BONUS;
                }
            }
        }

        if recurs {
            bonus += POSITION_BONUS;
        }

        for _ in 0..recent_neighbors {
            bonus += NEIGHBOR_BONUS;
        }
    }
    bonus
}
