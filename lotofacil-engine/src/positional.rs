//! Analyse positionnelle : le tirage trié donne N1 (plus petit) à N15 (plus
//! grand), et chaque position a sa propre distribution de valeurs.
//!
//! ```
//! use lotofacil_db::models::Draw;
//! use lotofacil_engine::positional::PositionalTable;
//!
//! let draws = vec![
//!     Draw { contest: 2, date: String::new(), numbers: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15] },
//!     Draw { contest: 1, date: String::new(), numbers: [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16] },
//! ];
//! let table = PositionalTable::from_draws(&draws);
//! assert_eq!(table.count(1, 1), 1);
//! assert_eq!(table.gap(1, 2), Some(1));
//! ```

use serde::Serialize;

use lotofacil_db::models::{Draw, DRAW_SIZE, MAX_NUMBER};
use crate::error::{EngineError, Result};

/// Seuil de débit positionnel : récent < historique × seuil.
pub const DEFAULT_DEBIT_RATIO: f64 = 0.3;

/// Présence historique minimale (%) d'un numéro à une position pour être suivi.
pub const MIN_PRESENCE_PCT: f64 = 5.0;

type Grid<T> = [[T; MAX_NUMBER as usize + 1]; DRAW_SIZE];

/// Comptage valeur × position sur une fenêtre de tirages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalTable {
    window: usize,
    counts: Grid<u32>,
    gaps: Grid<Option<u32>>,
    /// Valeur de chaque position au tirage le plus récent.
    latest: Option<[u8; DRAW_SIZE]>,
    /// Tirages consécutifs (depuis le plus récent) où cette valeur est restée en place.
    streaks: [u32; DRAW_SIZE],
}

impl PositionalTable {
    /// `draws` est ordonné du plus récent au plus ancien.
    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut counts = [[0u32; MAX_NUMBER as usize + 1]; DRAW_SIZE];
        let mut gaps = [[None; MAX_NUMBER as usize + 1]; DRAW_SIZE];
        let latest = draws.first().map(Draw::sorted_numbers);
        let mut streaks = [0u32; DRAW_SIZE];
        let mut streak_open = [true; DRAW_SIZE];

        for (i, draw) in draws.iter().enumerate() {
            for (pos, n) in draw.sorted_numbers().into_iter().enumerate() {
                let slot = n as usize;
                counts[pos][slot] += 1;
                if gaps[pos][slot].is_none() {
                    gaps[pos][slot] = Some(i as u32);
                }
                if streak_open[pos] {
                    match latest {
                        Some(last) if last[pos] == n => streaks[pos] += 1,
                        _ => streak_open[pos] = false,
                    }
                }
            }
        }

        Self { window: draws.len(), counts, gaps, latest, streaks }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn slot(position: usize, n: u8) -> Option<(usize, usize)> {
        ((1..=DRAW_SIZE).contains(&position) && (1..=MAX_NUMBER).contains(&n))
            .then_some((position - 1, n as usize))
    }

    /// Sorties de `n` à la position `position` (1 à 15).
    pub fn count(&self, position: usize, n: u8) -> u32 {
        Self::slot(position, n).map_or(0, |(p, v)| self.counts[p][v])
    }

    pub fn percentage(&self, position: usize, n: u8) -> f64 {
        if self.window == 0 {
            return 0.0;
        }
        self.count(position, n) as f64 * 100.0 / self.window as f64
    }

    /// Tirages depuis la dernière sortie de `n` à cette position ; `None` si
    /// jamais sorti là sur la fenêtre.
    pub fn gap(&self, position: usize, n: u8) -> Option<u32> {
        Self::slot(position, n).and_then(|(p, v)| self.gaps[p][v])
    }

    pub fn latest(&self, position: usize) -> Option<u8> {
        let last = self.latest?;
        Self::slot(position, 1).map(|(p, _)| last[p])
    }

    pub fn streak(&self, position: usize) -> u32 {
        Self::slot(position, 1).map_or(0, |(p, _)| self.streaks[p])
    }

    /// Valeurs d'une position triées par fréquence décroissante, puis valeur croissante.
    pub fn ranked(&self, position: usize) -> Vec<(u8, u32)> {
        let mut ranked: Vec<(u8, u32)> = (1..=MAX_NUMBER)
            .map(|n| (n, self.count(position, n)))
            .filter(|&(_, c)| c > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Plus petite et plus grande valeur observées à cette position.
    pub fn bounds(&self, position: usize) -> Option<(u8, u8)> {
        let mut seen = (1..=MAX_NUMBER).filter(|&n| self.count(position, n) > 0);
        let min = seen.next()?;
        Some((min, seen.last().unwrap_or(min)))
    }

    /// Valeur au quantile `q` (0-1) de la distribution d'une position :
    /// la valeur d'indice `⌊len × q⌋` dans la liste triée des sorties.
    pub fn quantile(&self, position: usize, q: f64) -> Option<u8> {
        if self.window == 0 || !(0.0..=1.0).contains(&q) {
            return None;
        }
        let index = ((self.window as f64 * q) as usize).min(self.window - 1) as u32;
        let mut cumulative = 0u32;
        for n in 1..=MAX_NUMBER {
            cumulative += self.count(position, n);
            if cumulative > index {
                return Some(n);
            }
        }
        None
    }

    /// Plage P10-P90 d'une position.
    pub fn amplitude(&self, position: usize) -> Option<(u8, u8)> {
        Some((self.quantile(position, 0.10)?, self.quantile(position, 0.90)?))
    }

    pub fn summary(&self) -> Vec<PositionSummary> {
        (1..=DRAW_SIZE)
            .map(|position| PositionSummary {
                position,
                bounds: self.bounds(position),
                amplitude: self.amplitude(position),
                latest: self.latest(position),
                streak: self.streak(position),
                top: self.ranked(position),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub position: usize,
    pub bounds: Option<(u8, u8)>,
    pub amplitude: Option<(u8, u8)>,
    pub latest: Option<u8>,
    pub streak: u32,
    /// Valeurs classées, de la plus fréquente à la moins fréquente.
    pub top: Vec<(u8, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalDebit {
    pub number: u8,
    pub position: usize,
    pub historical_pct: f64,
    pub recent_pct: f64,
    /// Historique % − récent %.
    pub deficit: f64,
}

/// Numéros nettement sous leur présence habituelle à une position : les
/// `recent` premiers tirages sont comparés aux tirages plus anciens de `draws`.
/// Résultat trié par déficit décroissant, puis position et numéro croissants.
pub fn positional_debits(draws: &[Draw], recent: usize, ratio: f64) -> Result<Vec<PositionalDebit>> {
    if draws.is_empty() {
        return Err(EngineError::NoDraws);
    }
    if recent == 0 || recent >= draws.len() {
        return Err(EngineError::InvalidConfig(format!(
            "fenêtre récente {recent} invalide pour {} tirages", draws.len()
        )));
    }
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(EngineError::InvalidConfig(format!("seuil de débit {ratio} hors de ]0, 1]")));
    }

    let recent_table = PositionalTable::from_draws(&draws[..recent]);
    let history_table = PositionalTable::from_draws(&draws[recent..]);

    let mut debits = Vec::new();
    for position in 1..=DRAW_SIZE {
        for n in 1..=MAX_NUMBER {
            let historical_pct = history_table.percentage(position, n);
            let recent_pct = recent_table.percentage(position, n);
            if historical_pct >= MIN_PRESENCE_PCT && recent_pct < historical_pct * ratio {
                debits.push(PositionalDebit {
                    number: n,
                    position,
                    historical_pct,
                    recent_pct,
                    deficit: historical_pct - recent_pct,
                });
            }
        }
    }

    debits.sort_by(|a, b| {
        b.deficit
            .total_cmp(&a.deficit)
            .then(a.position.cmp(&b.position))
            .then(a.number.cmp(&b.number))
    });
    tracing::debug!(recent, history = draws.len() - recent, found = debits.len(), "débits positionnels");
    Ok(debits)
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
            draw(2, [20, 19, 18, 17, 16, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]),
            draw(1, [1, 2, 3, 4, 5, 11, 12, 13, 14, 15, 21, 22, 23, 24, 25]),
        ]
    }

    #[test]
    fn test_counts_use_sorted_positions() {
        let table = PositionalTable::from_draws(&sample_draws());
        assert_eq!(table.window(), 3);
        assert_eq!(table.count(1, 1), 3);
        assert_eq!(table.count(6, 6), 2);
        assert_eq!(table.count(6, 11), 1);
        assert_eq!(table.count(11, 16), 1);
        assert_eq!(table.count(15, 20), 1);
        // 20 n'est jamais en première position
        assert_eq!(table.count(1, 20), 0);
        assert!((table.percentage(6, 6) - 200.0 / 3.0).abs() < 1e-9);

        let total: u32 = (1..=MAX_NUMBER).map(|n| table.count(6, n)).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_out_of_range_positions() {
        let table = PositionalTable::from_draws(&sample_draws());
        assert_eq!(table.count(0, 1), 0);
        assert_eq!(table.count(16, 1), 0);
        assert_eq!(table.count(1, 26), 0);
        assert_eq!(table.gap(0, 1), None);
        assert_eq!(table.latest(16), None);
        assert_eq!(table.streak(0), 0);
    }

    #[test]
    fn test_gaps() {
        let table = PositionalTable::from_draws(&sample_draws());
        assert_eq!(table.gap(6, 6), Some(0));
        assert_eq!(table.gap(6, 11), Some(2));
        assert_eq!(table.gap(11, 16), Some(1));
        assert_eq!(table.gap(6, 7), None);
    }

    #[test]
    fn test_latest_and_streak() {
        let table = PositionalTable::from_draws(&sample_draws());
        assert_eq!(table.latest(1), Some(1));
        assert_eq!(table.latest(15), Some(15));
        assert_eq!(table.streak(1), 3);
        assert_eq!(table.streak(6), 2);
        assert_eq!(table.streak(11), 1);
    }

    #[test]
    fn test_ranked_and_bounds() {
        let table = PositionalTable::from_draws(&sample_draws());
        assert_eq!(table.ranked(6), vec![(6, 2), (11, 1)]);
        assert_eq!(table.ranked(11), vec![(11, 1), (16, 1), (21, 1)]);
        assert_eq!(table.bounds(11), Some((11, 21)));
        assert_eq!(table.bounds(1), Some((1, 1)));
    }

    #[test]
    fn test_amplitude() {
        let table = PositionalTable::from_draws(&sample_draws());
        // valeurs triées de N11 : 11, 16, 21
        assert_eq!(table.quantile(11, 0.10), Some(11));
        assert_eq!(table.quantile(11, 0.50), Some(16));
        assert_eq!(table.quantile(11, 0.90), Some(21));
        assert_eq!(table.quantile(11, 1.0), Some(21));
        assert_eq!(table.quantile(11, 1.5), None);
        assert_eq!(table.amplitude(6), Some((6, 11)));
    }

    #[test]
    fn test_empty_window() {
        let table = PositionalTable::from_draws(&[]);
        assert_eq!(table.percentage(1, 1), 0.0);
        assert_eq!(table.latest(1), None);
        assert_eq!(table.bounds(1), None);
        assert_eq!(table.amplitude(1), None);
        let summary = table.summary();
        assert_eq!(summary.len(), 15);
        assert!(summary.iter().all(|s| s.top.is_empty() && s.streak == 0));
    }

    #[test]
    fn test_summary() {
        let summary = PositionalTable::from_draws(&sample_draws()).summary();
        assert_eq!(summary.len(), 15);
        assert_eq!(summary[0].position, 1);
        assert_eq!(summary[5].top[0], (6, 2));
        assert_eq!(summary[5].latest, Some(6));
        assert_eq!(summary[14].bounds, Some((15, 25)));
    }

    #[test]
    fn test_positional_debits() {
        // deux tirages récents décalés d'un cran par rapport aux huit précédents
        let mut draws: Vec<Draw> = (0..2)
            .map(|i| draw(10 - i, [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]))
            .collect();
        draws.extend((0..8).map(|i| draw(8 - i, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15])));

        let debits = positional_debits(&draws, 2, DEFAULT_DEBIT_RATIO).unwrap();
        assert_eq!(debits.len(), 15);
        assert_eq!((debits[0].position, debits[0].number), (1, 1));
        assert_eq!((debits[14].position, debits[14].number), (15, 15));
        for d in &debits {
            assert_eq!(d.number as usize, d.position);
            assert!((d.historical_pct - 100.0).abs() < 1e-9);
            assert_eq!(d.recent_pct, 0.0);
            assert!((d.deficit - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_positional_debits_sorted_by_deficit() {
        let mut draws = vec![draw(5, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15])];
        draws.push(draw(4, [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]));
        draws.push(draw(3, [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]));
        draws.push(draw(2, [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]));
        draws.push(draw(1, [1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]));

        let debits = positional_debits(&draws, 1, DEFAULT_DEBIT_RATIO).unwrap();
        // N2..N15 valent p+1 dans tous les anciens tirages (100 %), N1 = 2 dans 3 sur 4 (75 %)
        assert_eq!(debits.len(), 15);
        assert_eq!((debits[0].position, debits[0].number), (2, 3));
        assert_eq!((debits[14].position, debits[14].number), (1, 2));
        assert!((debits[14].deficit - 75.0).abs() < 1e-9);
        assert!(debits.windows(2).all(|w| w[0].deficit >= w[1].deficit));
        // N1 = 1 est sorti au dernier tirage : pas en débit
        assert!(!debits.iter().any(|d| d.position == 1 && d.number == 1));
    }

    #[test]
    fn test_positional_debits_invalid() {
        let draws = sample_draws();
        assert!(matches!(positional_debits(&[], 1, 0.3), Err(EngineError::NoDraws)));
        assert!(matches!(positional_debits(&draws, 0, 0.3), Err(EngineError::InvalidConfig(_))));
        assert!(matches!(positional_debits(&draws, 3, 0.3), Err(EngineError::InvalidConfig(_))));
        assert!(matches!(positional_debits(&draws, 1, 0.0), Err(EngineError::InvalidConfig(_))));
    }
}
