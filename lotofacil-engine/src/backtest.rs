use serde::{Deserialize, Serialize};

use lotofacil_db::models::{Draw, NumberSet, DRAW_SIZE};
use crate::combinatorics::binomial;
use crate::error::{EngineError, Result};
use crate::pools::PoolParams;

/// Plus petit nombre de numéros trouvés qui rapporte un gain.
pub const MIN_PRIZE_HITS: usize = 11;

/// Section `[prizes]` : gains par nombre de numéros trouvés, coût d'un pari simple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrizeTable {
    pub cost_per_bet: f64,
    pub hits_11: f64,
    pub hits_12: f64,
    pub hits_13: f64,
    pub hits_14: f64,
    pub hits_15: f64,
}

impl Default for PrizeTable {
    fn default() -> Self {
        Self {
            cost_per_bet: 3.0,
            hits_11: 7.0,
            hits_12: 14.0,
            hits_13: 35.0,
            hits_14: 1_000.0,
            hits_15: 1_800_000.0,
        }
    }
}

impl PrizeTable {
    pub fn prize(&self, hits: usize) -> f64 {
        match hits {
            11 => self.hits_11,
            12 => self.hits_12,
            13 => self.hits_13,
            14 => self.hits_14,
            15 => self.hits_15,
            _ => 0.0,
        }
    }

    /// Coût d'une combinaison de `size` numéros (= C(size, 15) paris simples).
    pub fn cost(&self, size: usize) -> f64 {
        binomial(size as u64, DRAW_SIZE as u64) as f64 * self.cost_per_bet
    }

    /// Gain d'une combinaison de `size` numéros qui en a `hits` dans le tirage :
    /// somme sur ses sous-paris de 15 numéros.
    pub fn winnings(&self, size: usize, hits: usize) -> f64 {
        if size < DRAW_SIZE || hits > size {
            return 0.0;
        }
        let (size, hits) = (size as u64, hits as u64);
        (MIN_PRIZE_HITS..=DRAW_SIZE)
            .map(|j| {
                let j64 = j as u64;
                let ways = binomial(hits, j64) * binomial(size - hits, DRAW_SIZE as u64 - j64);
                ways as f64 * self.prize(j)
            })
            .sum()
    }
}

pub fn hits(set: NumberSet, draw: &Draw) -> usize {
    set.overlap(draw.set())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub contest: u32,
    pub best_hits: usize,
    /// Combinaisons avec au moins 11 numéros trouvés.
    pub winners: usize,
    pub winnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub combinations: usize,
    pub draws: usize,
    /// histogram[h] = nombre de couples (combinaison, tirage) avec h numéros trouvés.
    pub histogram: [u64; DRAW_SIZE + 1],
    pub per_draw: Vec<DrawOutcome>,
    pub best_hits: usize,
    pub total_cost: f64,
    pub total_winnings: f64,
    /// (gains − coût) / coût, en pourcentage.
    pub roi: f64,
}

impl BacktestReport {
    pub fn prize_count(&self) -> u64 {
        self.histogram[MIN_PRIZE_HITS..].iter().sum()
    }
}

/// Confronte chaque combinaison à chaque tirage, comme si elle avait été jouée à chaque concours.
pub fn backtest(combinations: &[NumberSet], draws: &[Draw], prizes: &PrizeTable) -> Result<BacktestReport> {
    if draws.is_empty() {
        return Err(EngineError::NoDraws);
    }
    if combinations.is_empty() {
        return Err(EngineError::InvalidNumbers("aucune combinaison à évaluer".into()));
    }
    if let Some(bad) = combinations.iter().find(|c| c.len() < DRAW_SIZE) {
        return Err(EngineError::InvalidNumbers(format!(
            "combinaison de {} numéros (minimum {}) : {}", bad.len(), DRAW_SIZE, bad
        )));
    }

    let cost_per_draw: f64 = combinations.iter().map(|c| prizes.cost(c.len())).sum();
    let mut histogram = [0u64; DRAW_SIZE + 1];
    let mut per_draw = Vec::with_capacity(draws.len());
    let mut total_winnings = 0.0;

    for draw in draws {
        let drawn = draw.set();
        let mut outcome = DrawOutcome { contest: draw.contest, best_hits: 0, winners: 0, winnings: 0.0 };
        for c in combinations {
            let h = c.overlap(drawn);
            histogram[h.min(DRAW_SIZE)] += 1;
            outcome.best_hits = outcome.best_hits.max(h);
            if h >= MIN_PRIZE_HITS {
                outcome.winners += 1;
            }
            outcome.winnings += prizes.winnings(c.len(), h);
        }
        total_winnings += outcome.winnings;
        per_draw.push(outcome);
    }

    let total_cost = cost_per_draw * draws.len() as f64;
    let roi = if total_cost > 0.0 {
        (total_winnings - total_cost) / total_cost * 100.0
    } else {
        0.0
    };
    let best_hits = per_draw.iter().map(|o| o.best_hits).max().unwrap_or(0);

    Ok(BacktestReport {
        combinations: combinations.len(),
        draws: draws.len(),
        histogram,
        per_draw,
        best_hits,
        total_cost,
        total_winnings,
        roi,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageOutcome {
    pub contest: u32,
    pub base_hits: usize,
    pub complement_hits: usize,
    pub excluded_hits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub outcomes: Vec<CoverageOutcome>,
    pub mean_base: f64,
    pub mean_complement: f64,
    pub mean_excluded: f64,
    /// Tests où aucun numéro exclu n'est sorti.
    pub clean_exclusions: usize,
}

/// Walk-forward : pour chaque tirage test t, les pools sont calculés sur
/// draws[t+1..] uniquement, puis confrontés au tirage t.
///
/// draws[0] = le plus récent.
pub fn pool_coverage(draws: &[Draw], params: &PoolParams, tests: usize) -> Result<CoverageReport> {
    let max_t = tests.min(draws.len().saturating_sub(1));
    if max_t == 0 {
        return Err(EngineError::NoDraws);
    }

    let mut outcomes = Vec::with_capacity(max_t);
    for t in 0..max_t {
        let history = &draws[t + 1..];
        let split = params.split(history)?;
        let drawn = draws[t].set();
        outcomes.push(CoverageOutcome {
            contest: draws[t].contest,
            base_hits: split.base.overlap(drawn),
            complement_hits: split.complement.overlap(drawn),
            excluded_hits: split.excluded.overlap(drawn),
        });
    }

    let n = outcomes.len() as f64;
    let mean_base = outcomes.iter().map(|o| o.base_hits as f64).sum::<f64>() / n;
    let mean_complement = outcomes.iter().map(|o| o.complement_hits as f64).sum::<f64>() / n;
    let mean_excluded = outcomes.iter().map(|o| o.excluded_hits as f64).sum::<f64>() / n;
    let clean_exclusions = outcomes.iter().filter(|o| o.excluded_hits == 0).count();

    Ok(CoverageReport { outcomes, mean_base, mean_complement, mean_excluded, clean_exclusions })
}
