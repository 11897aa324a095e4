//! Géométrie fixe de la roue européenne : couleurs, parité, voisins.

use roulette_db::models::POOL_SIZE;

/// Numéros rouges de la roulette européenne.
pub const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

/// Les deux voisins physiques de chaque numéro sur la roue, indexés par numéro.
pub const WHEEL_NEIGHBORS: [[u8; 2]; POOL_SIZE] = [
    [3, 26],  // 0
    [20, 14], // 1
    [21, 25], // 2
    [0, 35],  // 3
    [15, 19], // 4
    [10, 24], // 5
    [27, 13], // 6
    [36, 18], // 7
    [23, 10], // 8
    [22, 18], // 9
    [5, 8],   // 10
    [30, 36], // 11
    [35, 3],  // 12
    [6, 27],  // 13
    [1, 20],  // 14
    [4, 19],  // 15
    [33, 1],  // 16
    [34, 6],  // 17
    [7, 9],   // 18
    [4, 15],  // 19
    [1, 14],  // 20
    [2, 25],  // 21
    [9, 18],  // 22
    [8, 10],  // 23
    [5, 16],  // 24
    [2, 21],  // 25
    [0, 32],  // 26
    [6, 13],  // 27
    [12, 35], // 28
    [7, 28],  // 29
    [11, 36], // 30
    [33, 16], // 31
    [26, 0],  // 32
    [16, 31], // 33
    [17, 6],  // 34
    [3, 12],  // 35
    [7, 30],  // 36
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
    Green,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Red => write!(f, "ROUGE"),
            Color::Black => write!(f, "NOIR"),
            Color::Green => write!(f, "VERT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parity::Even => write!(f, "PAIR"),
            Parity::Odd => write!(f, "IMPAIR"),
        }
    }
}

pub fn color_of(number: u8) -> Color {
    if number == 0 {
        Color::Green
    } else if RED_NUMBERS.contains(&number) {
        Color::Red
    } else {
        Color::Black
    }
}

/// Le zéro n'a pas de parité.
pub fn parity_of(number: u8) -> Option<Parity> {
    match number {
        0 => None,
        n if n % 2 == 0 => Some(Parity::Even),
        _ => Some(Parity::Odd),
    }
}

pub fn is_even(number: u8) -> bool {
    parity_of(number) == Some(Parity::Even)
}

/// Voisins physiques de `number` (doit être dans 0..=36).
pub fn neighbors(number: u8) -> [u8; 2] {
    WHEEL_NEIGHBORS[number as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_partition() {
        let colors: Vec<Color> = (0..=36).map(color_of).collect();
        assert_eq!(colors.iter().filter(|&&c| c == Color::Red).count(), 18);
        assert_eq!(colors.iter().filter(|&&c| c == Color::Black).count(), 18);
        assert_eq!(colors.iter().filter(|&&c| c == Color::Green).count(), 1);
        assert_eq!(color_of(0), Color::Green);
    }

    #[test]
    fn test_color_examples() {
        assert_eq!(color_of(1), Color::Red);
        assert_eq!(color_of(2), Color::Black);
        assert_eq!(color_of(19), Color::Red);
        assert_eq!(color_of(20), Color::Black);
        assert_eq!(color_of(36), Color::Red);
    }

    #[test]
    fn test_zero_has_no_parity() {
        assert_eq!(parity_of(0), None);
        assert!(!is_even(0));
        assert_eq!(parity_of(2), Some(Parity::Even));
        assert_eq!(parity_of(35), Some(Parity::Odd));
    }

    #[test]
    fn test_neighbors_table() {
        assert_eq!(neighbors(0), [3, 26]);
        assert_eq!(neighbors(29), [7, 28]);
        assert_eq!(neighbors(36), [7, 30]);
        for n in 0..=36u8 {
            let [a, b] = neighbors(n);
            assert!(a <= 36 && b <= 36);
            assert_ne!(a, n);
            assert_ne!(b, n);
        }
    }
}
