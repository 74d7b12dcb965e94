use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use lotofacil_db::models::{NumberSet, DRAW_SIZE};
use crate::error::{EngineError, Result};
use crate::filters::FilterConfig;
use crate::generator::{GenerationReport, MAX_BET_SIZE};
use crate::scoring::Candidate;

/// Lit une ligne de fichier TXT. `Ok(None)` pour une ligne vide ou un commentaire
/// (`#` ou `//`). Séparateurs acceptés : virgule, point-virgule, espaces.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<NumberSet>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return Ok(None);
    }
    let parse_err = |reason: String| EngineError::Parse { line: line_no, reason };

    let mut set = NumberSet::EMPTY;
    let mut count = 0usize;
    for token in line.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let n: u8 = token
            .parse()
            .map_err(|_| parse_err(format!("'{token}' n'est pas un numéro")))?;
        if !set.insert(n) {
            return Err(parse_err(format!("numéro {n} hors limites ou en double")));
        }
        count += 1;
    }

    if !(DRAW_SIZE..=MAX_BET_SIZE).contains(&count) {
        return Err(parse_err(format!(
            "{count} numéros (attendu {DRAW_SIZE}-{MAX_BET_SIZE})"
        )));
    }
    Ok(Some(set))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    pub combinations: Vec<NumberSet>,
    /// Lignes mal formées ignorées.
    pub skipped: usize,
}

/// Lit un fichier de combinaisons ; les lignes invalides sont ignorées avec un avertissement.
pub fn read_combinations(path: &Path) -> Result<ReadOutcome> {
    let file = fs::File::open(path)?;
    let mut outcome = ReadOutcome::default();

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        match parse_line(&line, i + 1) {
            Ok(Some(set)) => outcome.combinations.push(set),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(file = %path.display(), "{e}");
                outcome.skipped += 1;
            }
        }
    }

    tracing::debug!(
        file = %path.display(),
        read = outcome.combinations.len(),
        skipped = outcome.skipped,
        "combinaisons lues"
    );
    Ok(outcome)
}

/// Écrit une combinaison par ligne (`1,2,3,...`) précédée des lignes d'en-tête en commentaire.
pub fn write_combinations(path: &Path, combinations: &[NumberSet], header: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut out = BufWriter::new(fs::File::create(path)?);
    for line in header {
        writeln!(out, "# {line}")?;
    }
    for set in combinations {
        writeln!(out, "{}", set.to_csv_line())?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)?;
    let value: T = serde_json::from_str(&json)?;
    Ok(value)
}

/// Résumé JSON d'une génération, écrit à côté du fichier TXT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Horodatage RFC 3339.
    pub created_at: String,
    pub base: NumberSet,
    pub complement: NumberSet,
    pub k_min: usize,
    pub k_max: usize,
    pub target_size: usize,
    pub filters: FilterConfig,
    pub total_candidates: u64,
    pub report: GenerationReport,
    pub output: String,
    pub top: Vec<Candidate>,
}

pub fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}
