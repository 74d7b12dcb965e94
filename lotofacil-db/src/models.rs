use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Plus grand numéro de la grille (1-25).
pub const MAX_NUMBER: u8 = 25;
/// Nombre de numéros tirés à chaque concours.
pub const DRAW_SIZE: usize = 15;

pub const PRIMES: [u8; 9] = [2, 3, 5, 7, 11, 13, 17, 19, 23];
pub const FIBONACCI: [u8; 7] = [1, 2, 3, 5, 8, 13, 21];

/// Ensemble de numéros 1-25 stocké sur un bitmask (bit n = numéro n).
///
/// L'ordre d'itération est toujours croissant, ce qui en fait aussi la clé
/// canonique d'une combinaison (tuple trié).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NumberSet(u32);

impl NumberSet {
    pub const EMPTY: NumberSet = NumberSet(0);

    /// Les 25 numéros.
    pub fn full() -> Self {
        Self::range(1, MAX_NUMBER)
    }

    pub fn range(from: u8, to: u8) -> Self {
        let mut set = Self::EMPTY;
        for n in from..=to {
            set.insert(n);
        }
        set
    }

    /// Construit un ensemble si tous les numéros sont dans 1-25 et distincts.
    pub fn from_numbers(numbers: &[u8]) -> Option<Self> {
        let mut set = Self::EMPTY;
        for &n in numbers {
            if !is_valid_number(n) || !set.insert(n) {
                return None;
            }
        }
        Some(set)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Ajoute `n`. Retourne false si `n` est hors limites ou déjà présent.
    pub fn insert(&mut self, n: u8) -> bool {
        if !is_valid_number(n) || self.contains(n) {
            return false;
        }
        self.0 |= 1 << n;
        true
    }

    pub fn remove(&mut self, n: u8) -> bool {
        if !self.contains(n) {
            return false;
        }
        self.0 &= !(1 << n);
        true
    }

    pub fn contains(&self, n: u8) -> bool {
        is_valid_number(n) && self.0 & (1 << n) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(&self, other: NumberSet) -> NumberSet {
        NumberSet(self.0 | other.0)
    }

    pub fn intersection(&self, other: NumberSet) -> NumberSet {
        NumberSet(self.0 & other.0)
    }

    pub fn difference(&self, other: NumberSet) -> NumberSet {
        NumberSet(self.0 & !other.0)
    }

    pub fn is_disjoint(&self, other: NumberSet) -> bool {
        self.0 & other.0 == 0
    }

    /// Nombre de numéros en commun.
    pub fn overlap(&self, other: NumberSet) -> usize {
        (self.0 & other.0).count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=MAX_NUMBER).filter(move |&n| self.contains(n))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }

    pub fn sum(&self) -> u32 {
        self.iter().map(u32::from).sum()
    }

    /// Format fichier : `1,2,3,...`
    pub fn to_csv_line(&self) -> String {
        self.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
    }
}

impl std::fmt::Display for NumberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|n| format!("{:02}", n)).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Sérialisé comme la liste triée des numéros : `[1, 5, 21]`.
impl Serialize for NumberSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for NumberSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let numbers = Vec::<u8>::deserialize(deserializer)?;
        NumberSet::from_numbers(&numbers).ok_or_else(|| {
            serde::de::Error::custom(format!("ensemble invalide (doublon ou hors 1-{MAX_NUMBER}) : {numbers:?}"))
        })
    }
}

impl FromIterator<u8> for NumberSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = NumberSet::EMPTY;
        for n in iter {
            set.insert(n);
        }
        set
    }
}

pub fn is_valid_number(n: u8) -> bool {
    (1..=MAX_NUMBER).contains(&n)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub contest: u32,
    pub date: String,
    pub numbers: [u8; DRAW_SIZE],
}

impl Draw {
    pub fn set(&self) -> NumberSet {
        self.numbers.iter().copied().collect()
    }

    pub fn sorted_numbers(&self) -> [u8; DRAW_SIZE] {
        let mut sorted = self.numbers;
        sorted.sort();
        sorted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyTag {
    Hot,
    Cold,
    Normal,
}

impl std::fmt::Display for FrequencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrequencyTag::Hot => write!(f, "QUENTE"),
            FrequencyTag::Cold => write!(f, "FRIO"),
            FrequencyTag::Normal => write!(f, "-"),
        }
    }
}

pub fn validate_draw(numbers: &[u8]) -> Result<()> {
    if numbers.len() != DRAW_SIZE {
        bail!("Attendu {} numéros, reçu {}", DRAW_SIZE, numbers.len());
    }
    for &n in numbers {
        if !is_valid_number(n) {
            bail!("Numéro {} hors limites (1-{})", n, MAX_NUMBER);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [u8; 15] = [1, 3, 4, 7, 9, 10, 11, 12, 15, 16, 18, 20, 21, 22, 23];

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&SAMPLE).is_ok());
        assert!(validate_draw(&[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        let mut numbers = SAMPLE;
        numbers[0] = 0;
        assert!(validate_draw(&numbers).is_err());
        numbers[0] = 26;
        assert!(validate_draw(&numbers).is_err());
    }

    #[test]
    fn test_validate_draw_duplicate() {
        let mut numbers = SAMPLE;
        numbers[1] = 1;
        assert!(validate_draw(&numbers).is_err());
    }

    #[test]
    fn test_validate_draw_wrong_size() {
        assert!(validate_draw(&SAMPLE[..14]).is_err());
    }

    #[test]
    fn test_number_set_basics() {
        let set = NumberSet::from_numbers(&SAMPLE).unwrap();
        assert_eq!(set.len(), 15);
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert!(!set.contains(0));
        assert!(!set.contains(26));
        assert_eq!(set.sum(), SAMPLE.iter().map(|&n| n as u32).sum::<u32>());
        assert_eq!(set.to_vec(), SAMPLE.to_vec());
    }

    #[test]
    fn test_number_set_rejects_invalid() {
        assert!(NumberSet::from_numbers(&[1, 1]).is_none());
        assert!(NumberSet::from_numbers(&[0, 1]).is_none());
        assert!(NumberSet::from_numbers(&[26]).is_none());
        let mut set = NumberSet::EMPTY;
        assert!(!set.insert(30));
        assert!(set.is_empty());
    }

    #[test]
    fn test_number_set_algebra() {
        let low = NumberSet::range(1, 20);
        let high = NumberSet::range(21, 25);
        assert_eq!(low.len(), 20);
        assert_eq!(high.len(), 5);
        assert!(low.is_disjoint(high));
        assert_eq!(low.union(high), NumberSet::full());
        assert_eq!(NumberSet::full().difference(high), low);
        assert_eq!(low.overlap(NumberSet::range(18, 25)), 3);
    }

    #[test]
    fn test_number_set_display_and_csv() {
        let set = NumberSet::from_numbers(&[5, 1, 21]).unwrap();
        assert_eq!(set.to_string(), "01 05 21");
        assert_eq!(set.to_csv_line(), "1,5,21");
    }

    #[test]
    fn test_draw_set_and_sorted() {
        let draw = Draw {
            contest: 3613,
            date: "2026-01-20".to_string(),
            numbers: [23, 22, 21, 20, 18, 16, 15, 12, 11, 10, 9, 7, 4, 3, 1],
        };
        assert_eq!(draw.sorted_numbers(), SAMPLE);
        assert_eq!(draw.set(), NumberSet::from_numbers(&SAMPLE).unwrap());
    }

    #[test]
    fn test_number_set_serde_as_list() {
        let set = NumberSet::from_numbers(&[21, 1, 5]).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,5,21]");
        let back: NumberSet = serde_json::from_str("[5,21,1]").unwrap();
        assert_eq!(back, set);
        assert!(serde_json::from_str::<NumberSet>("[1,1]").is_err());
        assert!(serde_json::from_str::<NumberSet>("[0]").is_err());
    }
}
