use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use roulette_db::models::POOL_SIZE;

/// Générateur reproductible si un seed est fourni, aléatoire sinon.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// `count` numéros distincts tirés uniformément dans 0..=36, sans remise.
pub fn random_numbers<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<u8> {
    index::sample(rng, POOL_SIZE, count.min(POOL_SIZE))
        .into_iter()
        .map(|i| i as u8)
        .collect()
}
