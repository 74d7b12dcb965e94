//! Réduction hybride d'un fichier de combinaisons de base.
//!
//! Les bases sont regroupées par similarité, puis chaque base produit des
//! variations qui en gardent `keep` numéros et complètent avec les numéros
//! externes les plus présents dans l'ensemble des bases. Chaque groupe produit
//! aussi un représentant construit sur ses numéros les plus communs. Une
//! sélection gloutonne garde ensuite les meilleures variations suffisamment
//! éloignées les unes des autres.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use lotofacil_db::models::{NumberSet, DRAW_SIZE, MAX_NUMBER};
use crate::combinatorics::combinations;
use crate::error::{EngineError, Result};
use crate::generator::MAX_BET_SIZE;
use crate::scoring::Candidate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    pub min_keep: usize,
    pub max_keep: usize,
    pub target_size: usize,
    /// Recouvrement minimal (intersection / taille) pour regrouper deux bases.
    pub similarity: f64,
    pub variations_per_base: usize,
    /// Nombre minimal de numéros différents entre deux combinaisons retenues.
    pub min_distance: usize,
    pub limit: Option<usize>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            min_keep: 6,
            max_keep: 10,
            target_size: DRAW_SIZE,
            similarity: 0.5,
            variations_per_base: 5,
            min_distance: 2,
            limit: None,
        }
    }
}

impl ReducerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(DRAW_SIZE..=MAX_BET_SIZE).contains(&self.target_size) {
            return Err(EngineError::InvalidConfig(format!(
                "taille finale {} hors de {}-{}", self.target_size, DRAW_SIZE, MAX_BET_SIZE
            )));
        }
        if self.min_keep == 0 || self.min_keep > self.max_keep || self.max_keep > self.target_size {
            return Err(EngineError::InvalidConfig(format!(
                "répétés {}-{} invalides pour une taille de {}",
                self.min_keep, self.max_keep, self.target_size
            )));
        }
        if !(self.similarity > 0.0 && self.similarity <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "seuil de similarité {} hors de ]0, 1]", self.similarity
            )));
        }
        if self.variations_per_base == 0 {
            return Err(EngineError::InvalidConfig("au moins une variation par base".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reduction {
    pub combinations: Vec<NumberSet>,
    pub bases: usize,
    pub clusters: usize,
    /// Variations distinctes produites avant la sélection diversifiée.
    pub generated: usize,
}

/// Regroupement glouton : chaque base non encore affectée ouvre un groupe et
/// attire les bases suivantes dont le recouvrement atteint le seuil.
pub fn cluster_by_similarity(bases: &[NumberSet], threshold: f64) -> Vec<Vec<NumberSet>> {
    let mut assigned = vec![false; bases.len()];
    let mut clusters = Vec::new();

    for i in 0..bases.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let head = bases[i];
        let mut cluster = vec![head];

        for j in (i + 1)..bases.len() {
            if assigned[j] || head.is_empty() {
                continue;
            }
            let similarity = head.overlap(bases[j]) as f64 / head.len() as f64;
            if similarity >= threshold {
                cluster.push(bases[j]);
                assigned[j] = true;
            }
        }
        clusters.push(cluster);
    }

    clusters
}

/// Occurrences de chaque numéro dans un groupe de combinaisons (index = numéro).
pub fn popularity(sets: &[NumberSet]) -> [u32; MAX_NUMBER as usize + 1] {
    let mut counts = [0u32; MAX_NUMBER as usize + 1];
    for set in sets {
        for n in set.iter() {
            counts[n as usize] += 1;
        }
    }
    counts
}

/// Numéros triés par popularité décroissante, puis numéro croissant.
fn by_popularity(counts: &[u32; MAX_NUMBER as usize + 1]) -> Vec<u8> {
    let mut numbers: Vec<u8> = (1..=MAX_NUMBER).collect();
    numbers.sort_by(|&a, &b| counts[b as usize].cmp(&counts[a as usize]).then(a.cmp(&b)));
    numbers
}

/// Variations d'une base : `keep` numéros de la base + numéros externes pris
/// dans l'ordre de popularité (avec deux décalages), au plus `max` variations.
pub fn coverage_variations(
    base: NumberSet,
    keep: usize,
    size: usize,
    ranked: &[u8],
    max: usize,
) -> Vec<NumberSet> {
    let externals: Vec<u8> = ranked.iter().copied().filter(|&n| !base.contains(n)).collect();
    let needed = size.saturating_sub(keep);
    if keep > base.len() || externals.len() < needed {
        return Vec::new();
    }

    let shifts = 2.min(externals.len() - needed + 1);
    let mut variations = Vec::new();
    for kept in combinations(base, keep) {
        for shift in 0..shifts {
            let variation: NumberSet = kept
                .iter()
                .chain(externals[shift..shift + needed].iter().copied())
                .collect();
            if variation.len() == size && !variations.contains(&variation) {
                variations.push(variation);
                if variations.len() >= max {
                    return variations;
                }
            }
        }
    }
    variations
}

/// Représentant d'un groupe : ses `keep` numéros les plus communs, complétés
/// par les numéros externes les plus populaires.
pub fn cluster_representative(cluster: &[NumberSet], keep: usize, size: usize, ranked: &[u8]) -> Option<NumberSet> {
    let local = by_popularity(&popularity(cluster));
    let core: NumberSet = local
        .iter()
        .copied()
        .filter(|&n| cluster.iter().any(|c| c.contains(n)))
        .take(keep)
        .collect();
    if core.len() < keep {
        return None;
    }
    let completed: NumberSet = core
        .iter()
        .chain(ranked.iter().copied().filter(|&n| !core.contains(n)).take(size.saturating_sub(keep)))
        .collect();
    (completed.len() == size).then_some(completed)
}

/// Nombre de numéros de `a` absents de `b`.
pub fn distance(a: NumberSet, b: NumberSet) -> usize {
    a.difference(b).len()
}

/// Sélection gloutonne : meilleur score + diversité minimum entre paires.
/// `candidates` doit déjà être trié par score décroissant.
pub fn select_diverse(candidates: &[Candidate], count: usize, min_diff: usize) -> Vec<Candidate> {
    let mut selected: Vec<Candidate> = Vec::with_capacity(count.min(candidates.len()));

    for candidate in candidates {
        if selected.len() >= count {
            break;
        }
        let dominated = selected.iter().any(|s| distance(candidate.numbers, s.numbers) < min_diff);
        if !dominated {
            selected.push(candidate.clone());
        }
    }

    // Pas assez de candidats diversifiés : compléter avec les meilleurs restants
    if selected.len() < count {
        for candidate in candidates {
            if selected.len() >= count {
                break;
            }
            if !selected.iter().any(|s| s.numbers == candidate.numbers) {
                selected.push(candidate.clone());
            }
        }
    }

    selected
}

/// Vérifie taille, bornes et unicité du résultat.
pub fn validate_output(combinations: &[NumberSet], size: usize) -> Result<()> {
    let mut seen = HashSet::with_capacity(combinations.len());
    for (i, c) in combinations.iter().enumerate() {
        if c.len() != size {
            return Err(EngineError::InvalidNumbers(format!(
                "combinaison {} : {} numéros au lieu de {}", i + 1, c.len(), size
            )));
        }
        if !seen.insert(*c) {
            return Err(EngineError::InvalidNumbers(format!("combinaison {} en double : {}", i + 1, c)));
        }
    }
    Ok(())
}

pub fn reduce(bases: &[NumberSet], config: &ReducerConfig) -> Result<Reduction> {
    config.validate()?;
    if bases.is_empty() {
        return Err(EngineError::InvalidNumbers("aucune combinaison de base".into()));
    }

    let counts = popularity(bases);
    let ranked = by_popularity(&counts);
    let clusters = cluster_by_similarity(bases, config.similarity);
    tracing::debug!(bases = bases.len(), clusters = clusters.len(), "bases regroupées");

    let mut seen = HashSet::new();
    let mut pool: Vec<NumberSet> = Vec::new();
    let mut push = |set: NumberSet| {
        if seen.insert(set) {
            pool.push(set);
        }
    };

    for keep in config.min_keep..=config.max_keep {
        for &base in bases {
            for variation in coverage_variations(base, keep, config.target_size, &ranked, config.variations_per_base) {
                push(variation);
            }
        }
        for cluster in &clusters {
            if let Some(rep) = cluster_representative(cluster, keep, config.target_size, &ranked) {
                push(rep);
            }
        }
    }

    let generated = pool.len();
    let total_bases = bases.len() as f64;
    let mut candidates: Vec<Candidate> = pool
        .into_iter()
        .map(|numbers| {
            let score = numbers.iter().map(|n| counts[n as usize] as f64).sum::<f64>()
                / (numbers.len() as f64 * total_bases);
            Candidate { numbers, score }
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.numbers.to_vec().cmp(&b.numbers.to_vec()))
    });

    let count = config.limit.unwrap_or(candidates.len());
    let combinations: Vec<NumberSet> = select_diverse(&candidates, count, config.min_distance)
        .into_iter()
        .map(|c| c.numbers)
        .collect();
    validate_output(&combinations, config.target_size)?;

    tracing::info!(
        bases = bases.len(),
        generated,
        kept = combinations.len(),
        "réduction terminée"
    );

    Ok(Reduction {
        combinations,
        bases: bases.len(),
        clusters: clusters.len(),
        generated,
    })
}
