//! Énumération base + complément.
//!
//! Chaque candidat prend `k` numéros du pool de base et `target - k` du pool
//! complémentaire, pour chaque `k` de l'intervalle configuré. Avec une base de 20
//! numéros, un complément de 5 et `k = 13`, on parcourt C(20,13) × C(5,2) = 775 200
//! combinaisons.

use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use lotofacil_db::models::{NumberSet, DRAW_SIZE};
use crate::combinatorics::{binomial, combinations};
use crate::error::{EngineError, Result};
use crate::filters::{FilterChain, FilterKind};

/// Taille maximale d'un pari (apostas de 16 à 20 numéros).
pub const MAX_BET_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplementaryGenerator {
    base: NumberSet,
    complement: NumberSet,
    k_min: usize,
    k_max: usize,
    target: usize,
}

impl ComplementaryGenerator {
    pub fn new(
        base: NumberSet,
        complement: NumberSet,
        k_range: RangeInclusive<usize>,
        target: usize,
    ) -> Result<Self> {
        let (k_min, k_max) = (*k_range.start(), *k_range.end());

        if !(DRAW_SIZE..=MAX_BET_SIZE).contains(&target) {
            return Err(EngineError::InvalidRange(format!(
                "taille de combinaison {} hors de {}-{}", target, DRAW_SIZE, MAX_BET_SIZE
            )));
        }
        if base.is_empty() && complement.is_empty() {
            return Err(EngineError::InvalidPool("les deux pools sont vides".into()));
        }
        if k_min > k_max {
            return Err(EngineError::InvalidRange(format!("k min {} > k max {}", k_min, k_max)));
        }
        if k_max > target {
            return Err(EngineError::InvalidRange(format!(
                "k max {} > taille de combinaison {}", k_max, target
            )));
        }
        if k_max > base.len() {
            return Err(EngineError::InvalidRange(format!(
                "k max {} > taille du pool de base {}", k_max, base.len()
            )));
        }

        Ok(Self { base, complement, k_min, k_max, target })
    }

    /// Construit depuis des listes brutes, en refusant doublons et numéros hors 1-25.
    pub fn from_lists(
        base: &[u8],
        complement: &[u8],
        k_range: RangeInclusive<usize>,
        target: usize,
    ) -> Result<Self> {
        let base = pool_from_list(base, "base")?;
        let complement = pool_from_list(complement, "complément")?;
        Self::new(base, complement, k_range, target)
    }

    pub fn base(&self) -> NumberSet {
        self.base
    }

    pub fn complement(&self) -> NumberSet {
        self.complement
    }

    pub fn k_range(&self) -> RangeInclusive<usize> {
        self.k_min..=self.k_max
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn pools_overlap(&self) -> bool {
        !self.base.is_disjoint(self.complement)
    }

    /// Σ C(|base|, k) · C(|complément|, target - k).
    pub fn total_candidates(&self) -> u64 {
        let b = self.base.len() as u64;
        let c = self.complement.len() as u64;
        self.k_range()
            .map(|k| binomial(b, k as u64) * binomial(c, (self.target - k) as u64))
            .sum()
    }

    /// Séquence paresseuse et déterministe des unions base ∪ complément.
    /// Si les pools se recouvrent, certaines unions sont plus courtes que `target`
    /// ou répétées : voir [`ComplementaryGenerator::filtered`].
    pub fn candidates(&self) -> impl Iterator<Item = NumberSet> + '_ {
        let complement = self.complement;
        let target = self.target;
        self.k_range().flat_map(move |k| {
            combinations(self.base, k).flat_map(move |from_base| {
                combinations(complement, target - k).map(move |from_comp| from_base.union(from_comp))
            })
        })
    }

    pub fn filtered<'a>(&'a self, chain: &'a FilterChain) -> Filtered<'a, impl Iterator<Item = NumberSet> + 'a> {
        self.filter(self.candidates(), chain)
    }

    /// Applique filtres et dé-duplication à une séquence de candidats fournie
    /// par l'appelant, typiquement [`candidates`](Self::candidates) enveloppée
    /// pour suivre l'avancement.
    pub fn filter<'a, I>(&self, candidates: I, chain: &'a FilterChain) -> Filtered<'a, I>
    where
        I: Iterator<Item = NumberSet>,
    {
        Filtered {
            inner: candidates,
            chain,
            target: self.target,
            seen: self.pools_overlap().then(HashSet::new),
            report: GenerationReport::default(),
        }
    }

    /// Exécute l'énumération complète (ou jusqu'à `limit` survivants).
    pub fn generate(&self, chain: &FilterChain, limit: Option<usize>) -> (Vec<NumberSet>, GenerationReport) {
        let mut it = self.filtered(chain);
        let accepted: Vec<NumberSet> = match limit {
            Some(n) => it.by_ref().take(n).collect(),
            None => it.by_ref().collect(),
        };
        let report = it.into_report();
        tracing::info!(
            enumerated = report.enumerated,
            accepted = report.accepted,
            rejected = report.rejected_total(),
            "énumération terminée"
        );
        (accepted, report)
    }
}

fn pool_from_list(numbers: &[u8], what: &str) -> Result<NumberSet> {
    NumberSet::from_numbers(numbers).ok_or_else(|| {
        EngineError::InvalidPool(format!("pool {what} invalide (doublon ou hors 1-25) : {:?}", numbers))
    })
}

/// Compteurs d'une énumération, uniquement pour le rapport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub enumerated: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub short_unions: u64,
    pub rejected_by: BTreeMap<FilterKind, u64>,
}

impl GenerationReport {
    pub fn rejected_total(&self) -> u64 {
        self.rejected_by.values().sum()
    }

    fn reject(&mut self, kind: FilterKind) {
        *self.rejected_by.entry(kind).or_insert(0) += 1;
    }
}

/// Adaptateur paresseux : filtre, dé-duplique et compte.
pub struct Filtered<'a, I> {
    inner: I,
    chain: &'a FilterChain,
    target: usize,
    seen: Option<HashSet<NumberSet>>,
    report: GenerationReport,
}

impl<I> Filtered<'_, I> {
    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    pub fn into_report(self) -> GenerationReport {
        self.report
    }
}

impl<I: Iterator<Item = NumberSet>> Iterator for Filtered<'_, I> {
    type Item = NumberSet;

    fn next(&mut self) -> Option<NumberSet> {
        for candidate in self.inner.by_ref() {
            self.report.enumerated += 1;

            if candidate.len() != self.target {
                self.report.short_unions += 1;
                continue;
            }
            if let Some(seen) = self.seen.as_mut() {
                if !seen.insert(candidate) {
                    self.report.duplicates += 1;
                    continue;
                }
            }
            match self.chain.check(candidate) {
                Ok(()) => {
                    self.report.accepted += 1;
                    return Some(candidate);
                }
                Err(kind) => self.report.reject(kind),
            }
        }
        None
    }
}
