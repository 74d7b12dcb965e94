use serde::Serialize;

use lotofacil_db::models::{Draw, FrequencyTag, NumberSet, DRAW_SIZE, MAX_NUMBER};
use crate::error::{EngineError, Result};

/// Fréquence attendue d'un numéro sur un tirage : 15/25.
pub const EXPECTED_RATE: f64 = DRAW_SIZE as f64 / MAX_NUMBER as f64;

/// Écart relatif à la fréquence attendue au-delà duquel un numéro est chaud/froid.
pub const TAG_THRESHOLD: f64 = 0.3;

/// Fenêtres par défaut de l'indice de débit (en tirages).
pub const DEFAULT_SHORT_WINDOW: usize = 5;
pub const DEFAULT_LONG_WINDOW: usize = 50;

/// Comptage des sorties par numéro sur une fenêtre de tirages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    window: usize,
    counts: [u32; MAX_NUMBER as usize + 1],
}

impl FrequencyTable {
    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut counts = [0u32; MAX_NUMBER as usize + 1];
        for draw in draws {
            for n in draw.set().iter() {
                counts[n as usize] += 1;
            }
        }
        Self { window: draws.len(), counts }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn count(&self, n: u8) -> u32 {
        self.counts.get(n as usize).copied().unwrap_or(0)
    }

    /// Pourcentage des tirages de la fenêtre où `n` est sorti (0-100).
    pub fn percentage(&self, n: u8) -> f64 {
        if self.window == 0 {
            return 0.0;
        }
        self.count(n) as f64 * 100.0 / self.window as f64
    }

    /// Numéros triés par fréquence décroissante, puis numéro croissant.
    pub fn ranked(&self) -> Vec<(u8, u32)> {
        let mut ranked: Vec<(u8, u32)> = (1..=MAX_NUMBER).map(|n| (n, self.count(n))).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    pub fn top(&self, count: usize) -> NumberSet {
        self.ranked().into_iter().take(count).map(|(n, _)| n).collect()
    }

    /// Poids d'échantillonnage : fréquence + 1 pour qu'aucun numéro ne soit impossible.
    pub fn weights(&self) -> Vec<(u8, f64)> {
        (1..=MAX_NUMBER).map(|n| (n, self.count(n) as f64 + 1.0)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    /// Nombre de tirages depuis la dernière sortie (0 = sorti au dernier tirage).
    pub gap: u32,
    #[serde(skip)]
    pub tag: FrequencyTag,
}

/// `draws` est ordonné du plus récent au plus ancien.
pub fn compute_stats(draws: &[Draw]) -> Vec<NumberStats> {
    let mut stats: Vec<NumberStats> = (1..=MAX_NUMBER)
        .map(|n| NumberStats {
            number: n,
            frequency: 0,
            gap: draws.len() as u32,
            tag: FrequencyTag::Normal,
        })
        .collect();

    for (i, draw) in draws.iter().enumerate() {
        for n in draw.set().iter() {
            let stat = &mut stats[(n - 1) as usize];
            if stat.frequency == 0 {
                stat.gap = i as u32;
            }
            stat.frequency += 1;
        }
    }

    tag_frequencies(&mut stats, draws.len());
    stats
}

pub fn tag_frequencies(stats: &mut [NumberStats], window: usize) {
    if window == 0 {
        return;
    }
    let expected = window as f64 * EXPECTED_RATE;

    for s in stats.iter_mut() {
        let deviation = (s.frequency as f64 - expected) / expected;
        s.tag = if deviation > TAG_THRESHOLD {
            FrequencyTag::Hot
        } else if deviation < -TAG_THRESHOLD {
            FrequencyTag::Cold
        } else {
            FrequencyTag::Normal
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebitStatus {
    HighSurplus,
    Surplus,
    LightSurplus,
    Balanced,
    HighDebit,
}

impl DebitStatus {
    pub fn from_index(index: f64) -> Self {
        if index < -30.0 {
            DebitStatus::HighSurplus
        } else if index < -15.0 {
            DebitStatus::Surplus
        } else if index < 0.0 {
            DebitStatus::LightSurplus
        } else if index < 15.0 {
            DebitStatus::Balanced
        } else {
            DebitStatus::HighDebit
        }
    }

    fn base_score(self) -> i32 {
        match self {
            DebitStatus::HighSurplus => 5,
            DebitStatus::Surplus => 4,
            DebitStatus::LightSurplus => 2,
            DebitStatus::Balanced => 0,
            DebitStatus::HighDebit => -3,
        }
    }
}

impl std::fmt::Display for DebitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DebitStatus::HighSurplus => "SURPLUS FORT",
            DebitStatus::Surplus => "SURPLUS",
            DebitStatus::LightSurplus => "surplus léger",
            DebitStatus::Balanced => "équilibré",
            DebitStatus::HighDebit => "DÉBIT FORT",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebitEntry {
    pub number: u8,
    pub short_pct: f64,
    pub long_pct: f64,
    /// long % − court % : positif = en retard (débit), négatif = en avance (surplus).
    pub index: f64,
    pub status: DebitStatus,
    /// Score d'exclusion : plus il est haut, plus le numéro est candidat à l'exclusion.
    pub score: i32,
}

fn exclusion_score(status: DebitStatus, short_pct: f64, long_pct: f64) -> i32 {
    let mut score = status.base_score();
    if short_pct >= 100.0 {
        score += 3;
    } else if short_pct >= 80.0 {
        score += 2;
    }
    if short_pct <= 40.0 && long_pct >= 55.0 {
        score -= 4;
    }
    score
}

impl DebitEntry {
    pub fn new(number: u8, short_pct: f64, long_pct: f64) -> Self {
        let index = long_pct - short_pct;
        let status = DebitStatus::from_index(index);
        Self {
            number,
            short_pct,
            long_pct,
            index,
            status,
            score: exclusion_score(status, short_pct, long_pct),
        }
    }
}

/// Indice de débit de chaque numéro, trié par score d'exclusion décroissant
/// (puis fréquence courte décroissante, puis numéro).
///
/// `draws` est ordonné du plus récent au plus ancien ; les fenêtres sont
/// tronquées au nombre de tirages disponibles.
pub fn debit_index(draws: &[Draw], short: usize, long: usize) -> Result<Vec<DebitEntry>> {
    if draws.is_empty() {
        return Err(EngineError::NoDraws);
    }
    if short == 0 || short > long {
        return Err(EngineError::InvalidConfig(format!(
            "fenêtres invalides : courte {short}, longue {long}"
        )));
    }
    let short_table = FrequencyTable::from_draws(&draws[..short.min(draws.len())]);
    let long_table = FrequencyTable::from_draws(&draws[..long.min(draws.len())]);

    let mut entries: Vec<DebitEntry> = (1..=MAX_NUMBER)
        .map(|n| DebitEntry::new(n, short_table.percentage(n), long_table.percentage(n)))
        .collect();
    sort_by_exclusion(&mut entries);
    Ok(entries)
}

/// Score d'exclusion décroissant ; à score égal, le plus petit numéro d'abord.
pub fn sort_by_exclusion(entries: &mut [DebitEntry]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.number.cmp(&b.number)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(contest: u32, numbers: [u8; 15]) -> Draw {
        Draw { contest, date: String::new(), numbers }
    }

    fn sample_draws() -> Vec<Draw> {
        vec![
            draw(3, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
            draw(2, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 16, 17, 18, 19, 20]),
            draw(1, [1, 2, 3, 4, 5, 11, 12, 13, 14, 15, 21, 22, 23, 24, 25]),
        ]
    }

    #[test]
    fn test_frequency_table() {
        let table = FrequencyTable::from_draws(&sample_draws());
        assert_eq!(table.window(), 3);
        assert_eq!(table.count(1), 3);
        assert_eq!(table.count(6), 2);
        assert_eq!(table.count(21), 1);
        assert_eq!(table.count(0), 0);
        assert!((table.percentage(1) - 100.0).abs() < 1e-9);
        let ranked = table.ranked();
        assert_eq!(ranked[0], (1, 3));
        assert_eq!(ranked[4], (5, 3));
        assert_eq!(ranked[5], (6, 2));
        assert_eq!(table.top(5), NumberSet::range(1, 5));
    }

    #[test]
    fn test_frequency_table_empty_window() {
        let table = FrequencyTable::from_draws(&[]);
        assert_eq!(table.percentage(7), 0.0);
        assert!(table.weights().iter().all(|&(_, w)| w == 1.0));
    }

    #[test]
    fn test_compute_stats_gap() {
        let stats = compute_stats(&sample_draws());
        assert_eq!(stats.len(), 25);
        // 1 est sorti au dernier tirage
        assert_eq!(stats[0].frequency, 3);
        assert_eq!(stats[0].gap, 0);
        // 16 est sorti à l'avant-dernier
        assert_eq!(stats[15].gap, 1);
        // 21 seulement au plus ancien
        assert_eq!(stats[20].gap, 2);
        assert_eq!(stats[20].frequency, 1);
    }

    #[test]
    fn test_compute_stats_never_drawn() {
        let draws = vec![draw(1, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15])];
        let stats = compute_stats(&draws);
        assert_eq!(stats[24].frequency, 0);
        assert_eq!(stats[24].gap, 1);
    }

    #[test]
    fn test_tags() {
        let stats = compute_stats(&sample_draws());
        // attendu 1.8 sur 3 tirages : 3 → chaud, 1 → froid, 2 → normal
        assert_eq!(stats[0].tag, FrequencyTag::Hot);
        assert_eq!(stats[24].tag, FrequencyTag::Cold);
        assert_eq!(stats[5].tag, FrequencyTag::Normal);
    }

    #[test]
    fn test_debit_status_buckets() {
        assert_eq!(DebitStatus::from_index(-40.0), DebitStatus::HighSurplus);
        assert_eq!(DebitStatus::from_index(-30.0), DebitStatus::Surplus);
        assert_eq!(DebitStatus::from_index(-15.0), DebitStatus::LightSurplus);
        assert_eq!(DebitStatus::from_index(0.0), DebitStatus::Balanced);
        assert_eq!(DebitStatus::from_index(14.9), DebitStatus::Balanced);
        assert_eq!(DebitStatus::from_index(15.0), DebitStatus::HighDebit);
    }

    #[test]
    fn test_exclusion_score_examples() {
        // court 100 %, long 60 % : surplus fort (+5) + bonus (+3)
        assert_eq!(DebitEntry::new(25, 100.0, 60.0).score, 8);
        // court 80 %, long 62 % : surplus (+4) + bonus (+2)
        assert_eq!(DebitEntry::new(6, 80.0, 62.0).score, 6);
        // court 40 %, long 62 % : débit fort (-3) et pénalité (-4)
        assert_eq!(DebitEntry::new(15, 40.0, 62.0).score, -7);
        // court 60 %, long 60 % : équilibré
        assert_eq!(DebitEntry::new(10, 60.0, 60.0).score, 0);
    }

    #[test]
    fn test_debit_index_sorted() {
        let entries = debit_index(&sample_draws(), 1, 3).unwrap();
        assert_eq!(entries.len(), 25);
        for pair in entries.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        let one = entries.iter().find(|e| e.number == 1).unwrap();
        assert_eq!(one.short_pct, 100.0);
        assert_eq!(one.long_pct, 100.0);
        assert_eq!(one.status, DebitStatus::Balanced);
    }

    #[test]
    fn test_exclusion_ties_by_number() {
        let mut entries = vec![
            DebitEntry::new(3, 60.0, 60.0),
            DebitEntry::new(9, 80.0, 80.0),
            DebitEntry::new(5, 40.0, 40.0),
            DebitEntry::new(4, 20.0, 22.0),
        ];
        sort_by_exclusion(&mut entries);
        let order: Vec<u8> = entries.iter().map(|e| e.number).collect();
        assert_eq!(order, vec![9, 3, 4, 5]);
        assert_eq!(entries[0].score, 2);
        assert!(entries[1..].iter().all(|e| e.score == 0));
    }

    #[test]
    fn test_debit_index_errors() {
        assert!(matches!(debit_index(&[], 5, 50), Err(EngineError::NoDraws)));
        assert!(matches!(debit_index(&sample_draws(), 10, 5), Err(EngineError::InvalidConfig(_))));
        assert!(matches!(debit_index(&sample_draws(), 0, 5), Err(EngineError::InvalidConfig(_))));
    }
}
