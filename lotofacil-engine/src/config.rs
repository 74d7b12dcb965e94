//! Configuration TOML des générations.
//!
//! ```
//! use lotofacil_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     [generator]
//!     base = "1-20"
//!     complement = "21-25"
//!     k_min = 13
//!     k_max = 13
//!
//!     [filters]
//!     sum = { min = 170, max = 210 }
//!     core = { numbers = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12], minimum = 10 }
//! "#).unwrap();
//!
//! assert_eq!(config.generator.base_pool().unwrap().len(), 20);
//! assert_eq!(config.filters.sum.unwrap().max, 210);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use lotofacil_db::models::{NumberSet, DRAW_SIZE, MAX_NUMBER};
use crate::backtest::PrizeTable;
use crate::error::{EngineError, Result};
use crate::filters::FilterConfig;
use crate::generator::ComplementaryGenerator;
use crate::reducer::ReducerConfig;
use crate::scoring::ScoringConfig;

/// Section `[generator]`. Les pools sont des listes (`"1,2,3"`) ou des
/// intervalles (`"1-20"`), éventuellement mélangés (`"1-10,15,20-22"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base: Option<String>,
    pub complement: Option<String>,
    pub k_min: usize,
    pub k_max: usize,
    pub target_size: usize,
    /// Nombre maximal de combinaisons retenues.
    pub limit: Option<usize>,
    /// Garde seulement les `top` meilleures après classement.
    pub top: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base: None,
            complement: None,
            k_min: 13,
            k_max: 13,
            target_size: DRAW_SIZE,
            limit: None,
            top: None,
        }
    }
}

impl GeneratorConfig {
    pub fn base_pool(&self) -> Result<NumberSet> {
        match &self.base {
            Some(s) => parse_number_list(s),
            None => Err(EngineError::InvalidConfig("pool de base non défini".into())),
        }
    }

    /// Sans complément explicite : les numéros absents de la base.
    pub fn complement_pool(&self) -> Result<NumberSet> {
        match &self.complement {
            Some(s) => parse_number_list(s),
            None => Ok(NumberSet::full().difference(self.base_pool()?)),
        }
    }

    pub fn build(&self) -> Result<ComplementaryGenerator> {
        ComplementaryGenerator::new(
            self.base_pool()?,
            self.complement_pool()?,
            self.k_min..=self.k_max,
            self.target_size,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub generator: GeneratorConfig,
    pub filters: FilterConfig,
    pub scoring: ScoringConfig,
    pub prizes: PrizeTable,
    pub reducer: ReducerConfig,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// `"1-20"`, `"1,2,3"`, `"1-5 8 10-12"` → ensemble. Doublons et numéros hors 1-25 refusés.
pub fn parse_number_list(s: &str) -> Result<NumberSet> {
    let invalid = |reason: String| EngineError::InvalidNumbers(format!("'{}' : {reason}", s.trim()));
    let mut set = NumberSet::EMPTY;

    for token in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let (from, to) = match token.split_once('-') {
            Some((a, b)) => (a, b),
            None => (token, token),
        };
        let from: u8 = from.parse().map_err(|_| invalid(format!("'{token}' illisible")))?;
        let to: u8 = to.parse().map_err(|_| invalid(format!("'{token}' illisible")))?;
        if from > to {
            return Err(invalid(format!("intervalle {token} décroissant")));
        }
        for n in from..=to {
            if n == 0 || n > MAX_NUMBER {
                return Err(invalid(format!("{n} hors de 1-{MAX_NUMBER}")));
            }
            if !set.insert(n) {
                return Err(invalid(format!("{n} en double")));
            }
        }
    }

    if set.is_empty() {
        return Err(invalid("liste vide".into()));
    }
    Ok(set)
}
