use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Plus grand numéro de la roulette européenne.
pub const MAX_NUMBER: u8 = 36;

/// Nombre de cases de la roue (0 à 36).
pub const POOL_SIZE: usize = MAX_NUMBER as usize + 1;

/// Une manche : suite ordonnée de numéros tirés pendant une session.
///
/// Les champs sont privés : une `Round` ne se construit que via [`Round::new`],
/// qui garantit une manche non vide dont tous les numéros sont dans 0..=36.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    id: i64,
    numbers: Vec<u8>,
    timestamp: DateTime<Utc>,
}

impl Round {
    pub fn new(id: i64, numbers: Vec<u8>, timestamp: DateTime<Utc>) -> Result<Self> {
        validate_round(&numbers)?;
        Ok(Self {
            id,
            numbers,
            timestamp,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Premier numéro tiré de la manche (toujours présent).
    pub fn first(&self) -> u8 {
        self.numbers[0]
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    /// Index de la première occurrence de `number`.
    pub fn position_of(&self, number: u8) -> Option<usize> {
        self.numbers.iter().position(|&n| n == number)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

/// Forme sérialisable d'une manche (snapshot JSON, export).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub id: i64,
    pub numbers: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Round> for RoundRecord {
    fn from(round: &Round) -> Self {
        Self {
            id: round.id,
            numbers: round.numbers.clone(),
            timestamp: round.timestamp,
        }
    }
}

impl TryFrom<RoundRecord> for Round {
    type Error = anyhow::Error;

    fn try_from(record: RoundRecord) -> Result<Self> {
        let id = record.id;
        Round::new(record.id, record.numbers, record.timestamp)
            .with_context(|| format!("Manche {} invalide", id))
    }
}

/// Liste classée des numéros proposés pour le prochain tirage.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub numbers: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

pub fn validate_number(number: u8) -> Result<()> {
    if number > MAX_NUMBER {
        bail!("Numéro {} hors limites (0-{})", number, MAX_NUMBER);
    }
    Ok(())
}

pub fn validate_round(numbers: &[u8]) -> Result<()> {
    if numbers.is_empty() {
        bail!("Une manche doit contenir au moins un numéro");
    }
    for &n in numbers {
        validate_number(n)?;
    }
    Ok(())
}

/// Lit une liste de numéros séparés par des espaces, virgules ou points-virgules.
pub fn parse_numbers(input: &str) -> Result<Vec<u8>> {
    let numbers = input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .with_context(|| format!("Numéro invalide : '{}'", s))
        })
        .collect::<Result<Vec<_>>>()?;
    validate_round(&numbers)?;
    Ok(numbers)
}

/// Historique synthétique, le plus récent en premier.
pub fn make_test_rounds(n: usize) -> Vec<Round> {
    // 2024-01-01 12:00 UTC
    let origin = DateTime::UNIX_EPOCH + Duration::seconds(1_704_110_400);
    (0..n)
        .map(|i| {
            let base = (i * 7 % POOL_SIZE) as u8;
            let len = 3 + i % 3;
            let numbers = (0..len)
                .map(|k| ((base as usize + k * 11) % POOL_SIZE) as u8)
                .collect();
            Round {
                id: i as i64 + 1,
                numbers,
                timestamp: origin + Duration::minutes((n - i) as i64),
            }
        })
        .collect()
}
