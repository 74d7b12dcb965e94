use serde::{Deserialize, Serialize};

use lotofacil_db::models::{Draw, NumberSet, MAX_NUMBER};
use crate::error::{EngineError, Result};
use crate::features::count_evens;
use crate::stats::{debit_index, FrequencyTable, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW};

/// Attribue un score à une combinaison. Plus haut = mieux classé.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, set: NumberSet) -> f64;
}

/// Combinaison retenue avec son score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub numbers: NumberSet,
    pub score: f64,
}

/// Tri par score décroissant, puis numéros croissants ; `top` tronque le résultat.
pub fn rank_candidates(
    sets: impl IntoIterator<Item = NumberSet>,
    scorer: &dyn Scorer,
    top: Option<usize>,
) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = sets
        .into_iter()
        .map(|numbers| Candidate { numbers, score: scorer.score(numbers) })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.numbers.to_vec().cmp(&b.numbers.to_vec()))
    });
    if let Some(n) = top {
        ranked.truncate(n);
    }
    ranked
}

/// Poids par numéro, moyenne sur la combinaison.
fn mean_weight(weights: &[f64; MAX_NUMBER as usize + 1], set: NumberSet) -> f64 {
    if set.is_empty() {
        return 0.0;
    }
    set.iter().map(|n| weights[n as usize]).sum::<f64>() / set.len() as f64
}

/// Moyenne des pourcentages de sortie des numéros sur la fenêtre.
pub struct FrequencyScorer {
    weights: [f64; MAX_NUMBER as usize + 1],
}

impl FrequencyScorer {
    pub fn new(table: &FrequencyTable) -> Self {
        let mut weights = [0.0; MAX_NUMBER as usize + 1];
        for n in 1..=MAX_NUMBER {
            weights[n as usize] = table.percentage(n);
        }
        Self { weights }
    }
}

impl Scorer for FrequencyScorer {
    fn name(&self) -> &str {
        "frequence"
    }

    fn score(&self, set: NumberSet) -> f64 {
        mean_weight(&self.weights, set)
    }
}

/// Pénalise les numéros en surplus : moyenne de l'opposé du score d'exclusion.
pub struct DebitScorer {
    weights: [f64; MAX_NUMBER as usize + 1],
}

impl DebitScorer {
    pub fn new(draws: &[Draw], short: usize, long: usize) -> Result<Self> {
        let mut weights = [0.0; MAX_NUMBER as usize + 1];
        for entry in debit_index(draws, short, long)? {
            weights[entry.number as usize] = -(entry.score as f64);
        }
        Ok(Self { weights })
    }
}

impl Scorer for DebitScorer {
    fn name(&self) -> &str {
        "debit"
    }

    fn score(&self, set: NumberSet) -> f64 {
        mean_weight(&self.weights, set)
    }
}

/// Proximité d'une somme et d'un nombre de pairs cibles, dans ]0, 1].
pub struct BalanceScorer {
    pub target_sum: u32,
    pub target_evens: u32,
}

impl Default for BalanceScorer {
    fn default() -> Self {
        // moyennes historiques d'un tirage de 15
        Self { target_sum: 195, target_evens: 7 }
    }
}

impl Scorer for BalanceScorer {
    fn name(&self) -> &str {
        "equilibre"
    }

    fn score(&self, set: NumberSet) -> f64 {
        let sum_gap = (set.sum() as f64 - self.target_sum as f64).abs() / 10.0;
        let evens_gap = (count_evens(set) as f64 - self.target_evens as f64).abs();
        1.0 / (1.0 + sum_gap + evens_gap)
    }
}

/// Combinaison linéaire de scorers.
pub struct WeightedScorer {
    parts: Vec<(Box<dyn Scorer>, f64)>,
}

impl WeightedScorer {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn with(mut self, scorer: Box<dyn Scorer>, weight: f64) -> Self {
        if weight != 0.0 {
            self.parts.push((scorer, weight));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.parts.iter().map(|(s, w)| format!("{}×{w}", s.name())).collect()
    }
}

impl Default for WeightedScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer for WeightedScorer {
    fn name(&self) -> &str {
        "pondere"
    }

    fn score(&self, set: NumberSet) -> f64 {
        self.parts.iter().map(|(s, w)| w * s.score(set)).sum()
    }
}

/// Section `[scoring]` de la configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub frequency_weight: f64,
    pub debit_weight: f64,
    pub balance_weight: f64,
    pub window: usize,
    pub short_window: usize,
    pub long_window: usize,
    pub target_sum: u32,
    pub target_evens: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let balance = BalanceScorer::default();
        Self {
            frequency_weight: 1.0,
            debit_weight: 0.0,
            balance_weight: 0.0,
            window: DEFAULT_LONG_WINDOW,
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            target_sum: balance.target_sum,
            target_evens: balance.target_evens,
        }
    }
}

impl ScoringConfig {
    /// Construit le scorer pondéré. Les scorers historiques exigent au moins un tirage.
    pub fn build(&self, draws: &[Draw]) -> Result<WeightedScorer> {
        let needs_history = self.frequency_weight != 0.0 || self.debit_weight != 0.0;
        if needs_history && draws.is_empty() {
            return Err(EngineError::NoDraws);
        }

        let mut scorer = WeightedScorer::new();
        if self.frequency_weight != 0.0 {
            let window = &draws[..self.window.min(draws.len())];
            scorer = scorer.with(Box::new(FrequencyScorer::new(&FrequencyTable::from_draws(window))), self.frequency_weight);
        }
        if self.debit_weight != 0.0 {
            scorer = scorer.with(
                Box::new(DebitScorer::new(draws, self.short_window, self.long_window)?),
                self.debit_weight,
            );
        }
        scorer = scorer.with(
            Box::new(BalanceScorer { target_sum: self.target_sum, target_evens: self.target_evens }),
            self.balance_weight,
        );
        Ok(scorer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(numbers: &[u8]) -> NumberSet {
        NumberSet::from_numbers(numbers).unwrap()
    }

    fn draws() -> Vec<Draw> {
        vec![
            Draw { contest: 2, date: String::new(), numbers: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15] },
            Draw { contest: 1, date: String::new(), numbers: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 16, 17, 18, 19, 20] },
        ]
    }

    struct SumScorer;

    impl Scorer for SumScorer {
        fn name(&self) -> &str {
            "somme"
        }

        fn score(&self, set: NumberSet) -> f64 {
            set.sum() as f64
        }
    }

    #[test]
    fn test_rank_candidates_order_and_top() {
        let sets = vec![set(&[1, 2]), set(&[10, 11]), set(&[3, 20]), set(&[5, 6])];
        let ranked = rank_candidates(sets, &SumScorer, None);
        let scores: Vec<f64> = ranked.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![23.0, 21.0, 11.0, 3.0]);

        let top = rank_candidates(vec![set(&[1, 2]), set(&[10, 11])], &SumScorer, Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].numbers, set(&[10, 11]));
    }

    #[test]
    fn test_rank_candidates_ties_by_numbers() {
        let ranked = rank_candidates(vec![set(&[2, 9]), set(&[1, 10]), set(&[3, 8])], &SumScorer, None);
        let order: Vec<Vec<u8>> = ranked.iter().map(|c| c.numbers.to_vec()).collect();
        assert_eq!(order, vec![vec![1, 10], vec![2, 9], vec![3, 8]]);
    }

    #[test]
    fn test_frequency_scorer() {
        let scorer = FrequencyScorer::new(&FrequencyTable::from_draws(&draws()));
        assert_eq!(scorer.score(NumberSet::range(1, 10)), 100.0);
        assert_eq!(scorer.score(NumberSet::range(21, 25)), 0.0);
        assert_eq!(scorer.score(set(&[1, 25])), 50.0);
        assert_eq!(scorer.score(NumberSet::EMPTY), 0.0);
    }

    #[test]
    fn test_balance_scorer() {
        let scorer = BalanceScorer { target_sum: 195, target_evens: 7 };
        // 1..15 : somme 120, 7 pairs
        let low = NumberSet::range(1, 15);
        let high = NumberSet::range(11, 25);
        assert!(scorer.score(low) < 1.0);
        assert!(scorer.score(low) > 0.0);
        let exact = set(&[1, 3, 4, 7, 9, 10, 11, 12, 15, 16, 18, 20, 21, 22, 23]); // somme 192, 7 pairs
        assert!(scorer.score(exact) > scorer.score(low));
        assert!(scorer.score(exact) > scorer.score(high));
    }

    #[test]
    fn test_weighted_scorer() {
        let scorer = WeightedScorer::new()
            .with(Box::new(SumScorer), 2.0)
            .with(Box::new(BalanceScorer::default()), 0.0);
        assert_eq!(scorer.len(), 1);
        assert_eq!(scorer.score(set(&[1, 2])), 6.0);
        assert_eq!(scorer.names(), vec!["somme×2".to_string()]);
    }

    #[test]
    fn test_debit_scorer_penalizes_surplus() {
        let scorer = DebitScorer::new(&draws(), 1, 2).unwrap();
        // 11-15 : 100 % court, 50 % long → surplus fort → score négatif
        // 16-20 : 0 % court, 50 % long → débit fort
        assert!(scorer.score(NumberSet::range(11, 15)) < scorer.score(NumberSet::range(16, 20)));
    }

    #[test]
    fn test_scoring_config_build() {
        let config = ScoringConfig::default();
        let scorer = config.build(&draws()).unwrap();
        assert_eq!(scorer.len(), 1);
        assert!(matches!(config.build(&[]), Err(EngineError::NoDraws)));

        let balance_only = ScoringConfig { frequency_weight: 0.0, balance_weight: 1.0, ..Default::default() };
        assert_eq!(balance_only.build(&[]).unwrap().len(), 1);
    }
}
