use anyhow::Result;

use roulette_db::models::{validate_round, Round, POOL_SIZE};

use crate::wheel::{color_of, is_even, parity_of, Color, Parity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundStats {
    /// Numéros pairs non nuls.
    pub evens: usize,
    pub reds: usize,
    /// Plus longue série de tirages consécutifs de même couleur.
    pub max_sequence: usize,
}

/// Statistiques d'une manche. La manche doit être non vide.
pub fn compute_round_stats(numbers: &[u8]) -> Result<RoundStats> {
    validate_round(numbers)?;

    let evens = numbers.iter().filter(|&&n| is_even(n)).count();
    let reds = numbers.iter().filter(|&&n| color_of(n) == Color::Red).count();

    let mut max_sequence = 0;
    let mut current = 1;
    for pair in numbers.windows(2) {
        if color_of(pair[1]) == color_of(pair[0]) {
            current += 1;
        } else {
            max_sequence = max_sequence.max(current);
            current = 1;
        }
    }
    max_sequence = max_sequence.max(current);

    Ok(RoundStats {
        evens,
        reds,
        max_sequence,
    })
}

/// Nombre d'occurrences de chaque numéro 0..=36. Les 37 entrées existent toujours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyMap {
    counts: [u32; POOL_SIZE],
}

impl FrequencyMap {
    pub fn get(&self, number: u8) -> u32 {
        self.counts[number as usize]
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Paires (numéro, fréquence) dans l'ordre croissant des numéros.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts.iter().enumerate().map(|(n, &c)| (n as u8, c))
    }

    /// Fréquence rapportée au maximum ; 0 si rien n'a été tiré.
    pub fn normalized(&self, number: u8) -> f64 {
        let max = self.max();
        if max > 0 {
            self.get(number) as f64 / max as f64
        } else {
            0.0
        }
    }
}

pub fn number_frequencies(rounds: &[Round]) -> FrequencyMap {
    let mut counts = [0u32; POOL_SIZE];
    for round in rounds {
        for &n in round.numbers() {
            counts[n as usize] += 1;
        }
    }
    FrequencyMap { counts }
}

/// Les `k` numéros les plus fréquents ; à égalité, le plus petit numéro d'abord.
pub fn hot_numbers(rounds: &[Round], k: usize) -> Vec<u8> {
    let mut entries: Vec<(u8, u32)> = number_frequencies(rounds).iter().collect();
    // sort_by est stable : l'ordre croissant des numéros départage les égalités
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().take(k).map(|(n, _)| n).collect()
}

/// Les `k` numéros les moins fréquents parmi ceux déjà sortis. Jamais complété.
pub fn cold_numbers(rounds: &[Round], k: usize) -> Vec<u8> {
    let mut entries: Vec<(u8, u32)> = number_frequencies(rounds)
        .iter()
        .filter(|&(_, freq)| freq > 0)
        .collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1));
    entries.into_iter().take(k).map(|(n, _)| n).collect()
}

/// Pourcentages entiers par couleur, arrondis indépendamment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorStats {
    pub red: u32,
    pub black: u32,
    pub green: u32,
}

impl ColorStats {
    pub fn percentage(&self, color: Color) -> u32 {
        match color {
            Color::Red => self.red,
            Color::Black => self.black,
            Color::Green => self.green,
        }
    }
}

/// Pourcentages entiers pair/impair, calculés sans le zéro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParityStats {
    pub even: u32,
    pub odd: u32,
}

impl ParityStats {
    pub fn percentage(&self, parity: Parity) -> u32 {
        match parity {
            Parity::Even => self.even,
            Parity::Odd => self.odd,
        }
    }
}

fn percentage(count: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

pub fn color_stats(rounds: &[Round]) -> ColorStats {
    let (mut red, mut black, mut green) = (0u32, 0u32, 0u32);
    for round in rounds {
        for &n in round.numbers() {
            match color_of(n) {
                Color::Red => red += 1,
                Color::Black => black += 1,
                Color::Green => green += 1,
            }
        }
    }
    let total = red + black + green;
    ColorStats {
        red: percentage(red, total),
        black: percentage(black, total),
        green: percentage(green, total),
    }
}

pub fn parity_stats(rounds: &[Round]) -> ParityStats {
    let (mut even, mut odd) = (0u32, 0u32);
    for round in rounds {
        for &n in round.numbers() {
            match parity_of(n) {
                Some(Parity::Even) => even += 1,
                Some(Parity::Odd) => odd += 1,
                None => {}
            }
        }
    }
    let total = even + odd;
    ParityStats {
        even: percentage(even, total),
        odd: percentage(odd, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roulette_db::models::make_test_rounds;

    fn rounds(data: &[&[u8]]) -> Vec<Round> {
        data.iter()
            .enumerate()
            .map(|(i, numbers)| Round::new(i as i64, numbers.to_vec(), Utc::now()).unwrap())
            .collect()
    }

    #[test]
    fn test_round_stats_single() {
        let stats = compute_round_stats(&[5]).unwrap();
        assert_eq!(stats, RoundStats { evens: 0, reds: 1, max_sequence: 1 });
    }

    #[test]
    fn test_round_stats_same_color_run() {
        assert!([2, 4, 6, 8].iter().all(|&n| color_of(n) == Color::Black));
        let stats = compute_round_stats(&[2, 4, 6, 8]).unwrap();
        assert_eq!(stats.max_sequence, 4);
        assert_eq!(stats.evens, 4);
        assert_eq!(stats.reds, 0);
    }

    #[test]
    fn test_round_stats_final_streak_counts() {
        // R R N N V V V
        let stats = compute_round_stats(&[1, 3, 2, 4, 0, 0, 0]).unwrap();
        assert_eq!(stats.max_sequence, 3);
        assert_eq!(stats.evens, 2);
        assert_eq!(stats.reds, 2);
    }

    #[test]
    fn test_round_stats_zero_not_even() {
        let stats = compute_round_stats(&[0, 0]).unwrap();
        assert_eq!(stats.evens, 0);
        assert_eq!(stats.max_sequence, 2);
    }

    #[test]
    fn test_round_stats_rejects_invalid() {
        assert!(compute_round_stats(&[]).is_err());
        assert!(compute_round_stats(&[3, 37]).is_err());
    }

    #[test]
    fn test_frequencies_have_all_keys() {
        let freqs = number_frequencies(&[]);
        assert_eq!(freqs.len(), 37);
        assert_eq!(freqs.total(), 0);
        assert_eq!(freqs.max(), 0);
        assert_eq!(freqs.normalized(5), 0.0);
    }

    #[test]
    fn test_frequencies_sum_to_drawn_count() {
        let history = make_test_rounds(12);
        let freqs = number_frequencies(&history);
        let drawn: usize = history.iter().map(|r| r.len()).sum();
        assert_eq!(freqs.iter().count(), 37);
        assert_eq!(freqs.total() as usize, drawn);
    }

    #[test]
    fn test_frequencies_count_duplicates() {
        let history = rounds(&[&[7, 7, 0], &[7, 36]]);
        let freqs = number_frequencies(&history);
        assert_eq!(freqs.get(7), 3);
        assert_eq!(freqs.get(0), 1);
        assert_eq!(freqs.get(36), 1);
        assert_eq!(freqs.get(1), 0);
        assert!((freqs.normalized(36) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hot_and_cold() {
        let history = rounds(&[&[1, 1, 1, 2, 2, 3], &[4, 4, 4, 4, 5, 5, 5, 5, 5, 6]]);
        assert_eq!(hot_numbers(&history, 3), vec![5, 4, 1]);
        assert_eq!(cold_numbers(&history, 3), vec![3, 6, 2]);
    }

    #[test]
    fn test_hot_and_cold_disjoint() {
        // 6 numéros aux fréquences distinctes 1..=6
        let history = rounds(&[&[10, 11, 11, 12, 12, 12], &[13, 13, 13, 13, 14, 14, 14, 14, 14], &[15, 15, 15, 15, 15, 15]]);
        let hot = hot_numbers(&history, 3);
        let cold = cold_numbers(&history, 3);
        assert_eq!(hot, vec![15, 14, 13]);
        assert_eq!(cold, vec![10, 11, 12]);
        assert!(hot.iter().all(|n| !cold.contains(n)));
    }

    #[test]
    fn test_hot_ties_lowest_first() {
        assert_eq!(hot_numbers(&[], 3), vec![0, 1, 2]);
        let history = rounds(&[&[30, 20, 10]]);
        assert_eq!(hot_numbers(&history, 2), vec![10, 20]);
    }

    #[test]
    fn test_cold_never_padded() {
        let history = rounds(&[&[9, 2]]);
        assert_eq!(cold_numbers(&history, 5), vec![2, 9]);
        assert!(cold_numbers(&[], 3).is_empty());
    }

    #[test]
    fn test_cold_excludes_unseen() {
        let history = make_test_rounds(8);
        let freqs = number_frequencies(&history);
        for n in cold_numbers(&history, 37) {
            assert!(freqs.get(n) > 0);
        }
    }

    #[test]
    fn test_color_stats() {
        let history = rounds(&[&[1, 2, 0]]);
        assert_eq!(color_stats(&history), ColorStats { red: 33, black: 33, green: 33 });

        let history = rounds(&[&[1, 3, 5, 7, 9, 12, 14, 2]]);
        // 7/8 = 87.5 -> 88, 1/8 = 12.5 -> 13
        assert_eq!(color_stats(&history), ColorStats { red: 88, black: 13, green: 0 });
    }

    #[test]
    fn test_parity_stats_ignore_zero() {
        let history = rounds(&[&[0, 0, 0, 2, 4, 5]]);
        let stats = parity_stats(&history);
        assert_eq!(stats, ParityStats { even: 67, odd: 33 });

        let only_zero = rounds(&[&[0, 0]]);
        assert_eq!(parity_stats(&only_zero), ParityStats { even: 0, odd: 0 });
    }

    #[test]
    fn test_empty_history_stats_are_zero() {
        assert_eq!(color_stats(&[]), ColorStats::default());
        assert_eq!(parity_stats(&[]), ParityStats::default());
    }
}
