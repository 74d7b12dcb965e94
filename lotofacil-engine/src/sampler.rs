use std::collections::HashSet;

use chrono::Datelike;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

use lotofacil_db::models::{NumberSet, DRAW_SIZE};
use crate::error::{EngineError, Result};
use crate::filters::FilterChain;
use crate::generator::MAX_BET_SIZE;

/// Tentatives autorisées par combinaison demandée.
pub const ATTEMPTS_PER_COMBINATION: usize = 500;

/// Réservation mémoire initiale maximale, quel que soit `count`.
const PREALLOCATED: usize = 4_096;

/// Seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub combinations: Vec<NumberSet>,
    pub attempts: usize,
}

impl SampleOutcome {
    pub fn is_complete(&self, requested: usize) -> bool {
        self.combinations.len() >= requested
    }
}

/// Tire jusqu'à `count` combinaisons distinctes de `size` numéros, chaque numéro
/// étant choisi sans remise selon `weights`, en ne gardant que celles acceptées
/// par `chain`. S'arrête après `count × 500` tentatives.
pub fn sample_combinations(
    weights: &[(u8, f64)],
    size: usize,
    count: usize,
    chain: &FilterChain,
    seed: u64,
) -> Result<SampleOutcome> {
    if !(DRAW_SIZE..=MAX_BET_SIZE).contains(&size) {
        return Err(EngineError::InvalidRange(format!(
            "taille de combinaison {} hors de {}-{}", size, DRAW_SIZE, MAX_BET_SIZE
        )));
    }
    if weights.len() < size {
        return Err(EngineError::InvalidPool(format!(
            "{} numéros disponibles pour des combinaisons de {}", weights.len(), size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let max_attempts = attempt_budget(count);
    let mut seen: HashSet<NumberSet> = HashSet::with_capacity(count.min(PREALLOCATED));
    let mut combinations = Vec::with_capacity(count.min(PREALLOCATED));
    let mut attempts = 0;

    while combinations.len() < count && attempts < max_attempts {
        attempts += 1;
        let candidate = sample_without_replacement(weights, size, &mut rng)?;
        if chain.accepts(candidate) && seen.insert(candidate) {
            combinations.push(candidate);
        }
    }

    if combinations.len() < count {
        tracing::warn!(
            requested = count,
            found = combinations.len(),
            attempts,
            "échantillonnage incomplet : filtres trop stricts ?"
        );
    }

    Ok(SampleOutcome { combinations, attempts })
}

/// `count × 500`, plafonné à `usize::MAX`.
pub fn attempt_budget(count: usize) -> usize {
    count.saturating_mul(ATTEMPTS_PER_COMBINATION)
}

fn sample_without_replacement(weights: &[(u8, f64)], count: usize, rng: &mut StdRng) -> Result<NumberSet> {
    let mut available: Vec<(u8, f64)> = weights.to_vec();
    let mut selected = NumberSet::EMPTY;

    for _ in 0..count {
        let w: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
        let dist = WeightedIndex::new(&w)
            .map_err(|e| EngineError::InvalidConfig(format!("poids d'échantillonnage invalides : {e}")))?;
        let idx = dist.sample(rng);
        let (number, _) = available.remove(idx);
        selected.insert(number);
    }

    Ok(selected)
}
