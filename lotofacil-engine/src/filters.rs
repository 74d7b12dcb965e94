use std::str::FromStr;

use serde::{Deserialize, Serialize};

use lotofacil_db::models::NumberSet;
use crate::error::{EngineError, Result};
use crate::features::{count_evens, count_fibonacci, count_primes, longest_run};

/// Intervalle fermé `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }

    fn validate(&self, what: &str) -> Result<()> {
        if self.min > self.max {
            return Err(EngineError::InvalidConfig(format!(
                "{what} : min {} > max {}", self.min, self.max
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// `"170-210"` ou `"8"` (intervalle réduit à une valeur).
impl FromStr for Bounds {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidConfig(format!("intervalle invalide : '{s}'"));
        let s = s.trim();
        let (min, max) = match s.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s, s),
        };
        let min = min.parse::<u32>().map_err(|_| invalid())?;
        let max = max.parse::<u32>().map_err(|_| invalid())?;
        Ok(Bounds { min, max })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreFilter {
    pub numbers: Vec<u8>,
    pub minimum: u32,
}

/// Configuration des filtres telle que lue en TOML ou construite depuis la CLI.
/// Un filtre absent n'est pas appliqué.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub sum: Option<Bounds>,
    pub evens: Option<Bounds>,
    pub primes: Option<Bounds>,
    pub fibonacci: Option<Bounds>,
    pub max_run: Option<u32>,
    pub overlap: Option<Bounds>,
    /// Tirage de référence explicite pour `overlap` ; sinon le dernier concours.
    pub reference: Option<Vec<u8>>,
    pub core: Option<CoreFilter>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.sum.is_none()
            && self.evens.is_none()
            && self.primes.is_none()
            && self.fibonacci.is_none()
            && self.max_run.is_none()
            && self.overlap.is_none()
            && self.core.is_none()
    }

    pub fn needs_reference(&self) -> bool {
        self.overlap.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Sum,
    Evens,
    Primes,
    Overlap,
    Core,
    Fibonacci,
    Run,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKind::Sum => write!(f, "somme"),
            FilterKind::Evens => write!(f, "pairs"),
            FilterKind::Primes => write!(f, "premiers"),
            FilterKind::Overlap => write!(f, "répétés"),
            FilterKind::Core => write!(f, "noyau"),
            FilterKind::Fibonacci => write!(f, "fibonacci"),
            FilterKind::Run => write!(f, "suite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Predicate {
    Sum(Bounds),
    Evens(Bounds),
    Primes(Bounds),
    Overlap { reference: NumberSet, bounds: Bounds },
    Core { core: NumberSet, minimum: u32 },
    Fibonacci(Bounds),
    Run(u32),
}

impl Predicate {
    fn kind(&self) -> FilterKind {
        match self {
            Predicate::Sum(_) => FilterKind::Sum,
            Predicate::Evens(_) => FilterKind::Evens,
            Predicate::Primes(_) => FilterKind::Primes,
            Predicate::Overlap { .. } => FilterKind::Overlap,
            Predicate::Core { .. } => FilterKind::Core,
            Predicate::Fibonacci(_) => FilterKind::Fibonacci,
            Predicate::Run(_) => FilterKind::Run,
        }
    }

    fn accepts(&self, set: NumberSet) -> bool {
        match *self {
            Predicate::Sum(b) => b.contains(set.sum()),
            Predicate::Evens(b) => b.contains(count_evens(set)),
            Predicate::Primes(b) => b.contains(count_primes(set)),
            Predicate::Overlap { reference, bounds } => bounds.contains(set.overlap(reference) as u32),
            Predicate::Core { core, minimum } => set.overlap(core) as u32 >= minimum,
            Predicate::Fibonacci(b) => b.contains(count_fibonacci(set)),
            Predicate::Run(max) => longest_run(set) <= max,
        }
    }
}

/// Chaîne de prédicats évalués dans un ordre fixe ; le premier échec est retenu.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    predicates: Vec<Predicate>,
}

impl FilterChain {
    /// Chaîne vide : tout passe.
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FilterConfig, reference: Option<NumberSet>) -> Result<Self> {
        let mut predicates = Vec::new();

        if let Some(b) = config.sum {
            b.validate("somme")?;
            predicates.push(Predicate::Sum(b));
        }
        if let Some(b) = config.evens {
            b.validate("pairs")?;
            predicates.push(Predicate::Evens(b));
        }
        if let Some(b) = config.primes {
            b.validate("premiers")?;
            predicates.push(Predicate::Primes(b));
        }
        if let Some(bounds) = config.overlap {
            bounds.validate("répétés")?;
            let reference = reference.ok_or_else(|| {
                EngineError::InvalidConfig("filtre de répétés sans tirage de référence".into())
            })?;
            predicates.push(Predicate::Overlap { reference, bounds });
        }
        if let Some(core) = &config.core {
            let set = NumberSet::from_numbers(&core.numbers).ok_or_else(|| {
                EngineError::InvalidConfig(format!("noyau invalide : {:?}", core.numbers))
            })?;
            if core.minimum as usize > set.len() {
                return Err(EngineError::InvalidConfig(format!(
                    "minimum du noyau {} > taille du noyau {}", core.minimum, set.len()
                )));
            }
            predicates.push(Predicate::Core { core: set, minimum: core.minimum });
        }
        if let Some(b) = config.fibonacci {
            b.validate("fibonacci")?;
            predicates.push(Predicate::Fibonacci(b));
        }
        if let Some(max) = config.max_run {
            predicates.push(Predicate::Run(max));
        }

        Ok(Self { predicates })
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn kinds(&self) -> Vec<FilterKind> {
        self.predicates.iter().map(Predicate::kind).collect()
    }

    /// `Err(kind)` = premier filtre qui rejette la combinaison.
    pub fn check(&self, set: NumberSet) -> std::result::Result<(), FilterKind> {
        match self.predicates.iter().find(|p| !p.accepts(set)) {
            Some(p) => Err(p.kind()),
            None => Ok(()),
        }
    }

    pub fn accepts(&self, set: NumberSet) -> bool {
        self.check(set).is_ok()
    }
}
