use std::str::FromStr;

use serde::Serialize;

use lotofacil_db::models::{Draw, NumberSet, MAX_NUMBER};
use crate::error::{EngineError, Result};
use crate::stats::{debit_index, DebitEntry, FrequencyTable};

/// Partition des 25 numéros en pool de base, pool complémentaire et exclus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSplit {
    pub base: NumberSet,
    pub complement: NumberSet,
    pub excluded: NumberSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStrategy {
    /// Base = les plus fréquents de la fenêtre.
    Frequency,
    /// Exclut les numéros en plus fort surplus, base = les plus fréquents du reste sur la fenêtre longue.
    Debit,
}

impl FromStr for PoolStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "frequency" | "freq" | "frequence" => Ok(PoolStrategy::Frequency),
            "debit" | "debito" => Ok(PoolStrategy::Debit),
            other => Err(EngineError::InvalidConfig(format!(
                "stratégie de pool inconnue '{other}' (frequency, debit)"
            ))),
        }
    }
}

impl std::fmt::Display for PoolStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolStrategy::Frequency => write!(f, "frequency"),
            PoolStrategy::Debit => write!(f, "debit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParams {
    pub strategy: PoolStrategy,
    pub base_size: usize,
    /// Fenêtre de fréquence (stratégie Frequency) ou fenêtre courte (Debit).
    pub window: usize,
    pub long_window: usize,
    pub exclude: usize,
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            strategy: PoolStrategy::Frequency,
            base_size: 20,
            window: 50,
            long_window: 50,
            exclude: 2,
        }
    }
}

impl PoolParams {
    /// Calcule la partition à partir de tirages ordonnés du plus récent au plus ancien.
    pub fn split(&self, draws: &[Draw]) -> Result<PoolSplit> {
        if draws.is_empty() {
            return Err(EngineError::NoDraws);
        }
        match self.strategy {
            PoolStrategy::Frequency => {
                let window = &draws[..self.window.min(draws.len())];
                split_by_frequency(&FrequencyTable::from_draws(window), self.base_size)
            }
            PoolStrategy::Debit => {
                let entries = debit_index(draws, self.window, self.long_window)?;
                split_by_debit(&entries, self.exclude, self.base_size)
            }
        }
    }
}

pub fn split_by_frequency(table: &FrequencyTable, base_size: usize) -> Result<PoolSplit> {
    check_base_size(base_size, MAX_NUMBER as usize)?;
    let base = table.top(base_size);
    Ok(PoolSplit {
        base,
        complement: NumberSet::full().difference(base),
        excluded: NumberSet::EMPTY,
    })
}

/// `entries` doit être trié par score d'exclusion décroissant (voir [`debit_index`]).
pub fn split_by_debit(entries: &[DebitEntry], exclude: usize, base_size: usize) -> Result<PoolSplit> {
    if exclude >= entries.len() {
        return Err(EngineError::InvalidConfig(format!(
            "impossible d'exclure {exclude} numéros sur {}", entries.len()
        )));
    }
    check_base_size(base_size, entries.len() - exclude)?;

    let excluded: NumberSet = entries.iter().take(exclude).map(|e| e.number).collect();

    let mut rest: Vec<&DebitEntry> = entries.iter().skip(exclude).collect();
    rest.sort_by(|a, b| {
        b.long_pct
            .partial_cmp(&a.long_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.number.cmp(&b.number))
    });
    let base: NumberSet = rest.iter().take(base_size).map(|e| e.number).collect();
    let complement: NumberSet = rest.iter().skip(base_size).map(|e| e.number).collect();

    Ok(PoolSplit { base, complement, excluded })
}

fn check_base_size(base_size: usize, available: usize) -> Result<()> {
    if base_size == 0 || base_size > available {
        return Err(EngineError::InvalidPool(format!(
            "taille de base {base_size} hors de 1-{available}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws() -> Vec<Draw> {
        vec![
            Draw { contest: 3, date: String::new(), numbers: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15] },
            Draw { contest: 2, date: String::new(), numbers: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 16, 17, 18, 19, 20] },
            Draw { contest: 1, date: String::new(), numbers: [1, 2, 3, 4, 5, 11, 12, 13, 14, 15, 21, 22, 23, 24, 25] },
        ]
    }

    #[test]
    fn test_split_by_frequency_partitions_all_numbers() {
        let table = FrequencyTable::from_draws(&draws());
        let split = split_by_frequency(&table, 20).unwrap();
        assert_eq!(split.base.len(), 20);
        assert_eq!(split.complement.len(), 5);
        assert!(split.base.is_disjoint(split.complement));
        assert_eq!(split.base.union(split.complement), NumberSet::full());
        // 21-25 ne sortent qu'une fois
        assert_eq!(split.complement, NumberSet::range(21, 25));
    }

    #[test]
    fn test_split_by_debit_excludes_top_scores() {
        let entries = debit_index(&draws(), 1, 3).unwrap();
        let split = split_by_debit(&entries, 2, 15).unwrap();
        assert_eq!(split.excluded.len(), 2);
        assert!(split.excluded.contains(entries[0].number));
        assert!(split.excluded.contains(entries[1].number));
        assert_eq!(split.base.len(), 15);
        assert_eq!(split.complement.len(), 8);
        assert!(split.base.is_disjoint(split.excluded));
        assert!(split.complement.is_disjoint(split.excluded));
        assert_eq!(split.base.union(split.complement).union(split.excluded), NumberSet::full());
    }

    #[test]
    fn test_invalid_sizes() {
        let table = FrequencyTable::from_draws(&draws());
        assert!(matches!(split_by_frequency(&table, 0), Err(EngineError::InvalidPool(_))));
        assert!(matches!(split_by_frequency(&table, 26), Err(EngineError::InvalidPool(_))));
        let entries = debit_index(&draws(), 1, 3).unwrap();
        assert!(matches!(split_by_debit(&entries, 25, 10), Err(EngineError::InvalidConfig(_))));
        assert!(matches!(split_by_debit(&entries, 5, 21), Err(EngineError::InvalidPool(_))));
    }

    #[test]
    fn test_params_split() {
        let params = PoolParams { base_size: 15, ..Default::default() };
        let split = params.split(&draws()).unwrap();
        assert_eq!(split.base.len(), 15);
        assert!(matches!(params.split(&[]), Err(EngineError::NoDraws)));

        let debit = PoolParams { strategy: PoolStrategy::Debit, window: 1, long_window: 3, exclude: 2, base_size: 18 };
        let split = debit.split(&draws()).unwrap();
        assert_eq!(split.excluded.len(), 2);
        assert_eq!(split.base.len(), 18);
        assert_eq!(split.complement.len(), 5);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("debit".parse::<PoolStrategy>().unwrap(), PoolStrategy::Debit);
        assert_eq!("FREQ".parse::<PoolStrategy>().unwrap(), PoolStrategy::Frequency);
        assert!("neural".parse::<PoolStrategy>().is_err());
    }
}
