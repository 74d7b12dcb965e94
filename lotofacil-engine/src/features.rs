use serde::Serialize;

use lotofacil_db::models::{NumberSet, FIBONACCI, PRIMES};

/// Caractéristiques arithmétiques d'une combinaison, celles que testent les filtres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Features {
    pub size: usize,
    pub sum: u32,
    pub evens: u32,
    pub odds: u32,
    pub primes: u32,
    pub fibonacci: u32,
    pub max_run: u32,
    /// Lignes du bulletin 5x5 : 1-5, 6-10, 11-15, 16-20, 21-25.
    pub rows: [u8; 5],
    /// Colonnes du bulletin : 1,6,11,16,21 / 2,7,... / ...
    pub columns: [u8; 5],
}

impl Features {
    pub fn of(set: NumberSet) -> Self {
        let mut rows = [0u8; 5];
        let mut columns = [0u8; 5];
        for n in set.iter() {
            rows[((n - 1) / 5) as usize] += 1;
            columns[((n - 1) % 5) as usize] += 1;
        }
        let evens = count_evens(set);
        Self {
            size: set.len(),
            sum: set.sum(),
            evens,
            odds: set.len() as u32 - evens,
            primes: count_primes(set),
            fibonacci: count_fibonacci(set),
            max_run: longest_run(set),
            rows,
            columns,
        }
    }
}

pub fn prime_set() -> NumberSet {
    PRIMES.iter().copied().collect()
}

pub fn fibonacci_set() -> NumberSet {
    FIBONACCI.iter().copied().collect()
}

pub fn count_evens(set: NumberSet) -> u32 {
    set.iter().filter(|n| n % 2 == 0).count() as u32
}

pub fn count_primes(set: NumberSet) -> u32 {
    set.overlap(prime_set()) as u32
}

pub fn count_fibonacci(set: NumberSet) -> u32 {
    set.overlap(fibonacci_set()) as u32
}

/// Plus longue suite de numéros consécutifs.
pub fn longest_run(set: NumberSet) -> u32 {
    let mut best = 0u32;
    let mut current = 0u32;
    let mut previous: Option<u8> = None;
    for n in set.iter() {
        current = match previous {
            Some(p) if p + 1 == n => current + 1,
            _ => 1,
        };
        best = best.max(current);
        previous = Some(n);
    }
    best
}
