use anyhow::{Context, Result, bail};
use lotofacil_db::rusqlite::Connection;
use std::path::Path;

use lotofacil_db::db::insert_draw;
use lotofacil_db::models::{Draw, DRAW_SIZE, validate_draw};

/// Colonnes de l'export Caixa : Concurso;Data;Bola1;...;Bola15
const CONTEST_COL: usize = 0;
const DATE_COL: usize = 1;
const FIRST_BALL_COL: usize = 2;

fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let raw_contest = get(CONTEST_COL)?;
    let contest: u32 = raw_contest
        .parse()
        .with_context(|| format!("Numéro de concours invalide : '{}'", raw_contest))?;

    let date = parse_date(&get(DATE_COL)?)?;

    let mut numbers = [0u8; DRAW_SIZE];
    for (i, slot) in numbers.iter_mut().enumerate() {
        *slot = get_u8(FIRST_BALL_COL + i)?;
    }
    validate_draw(&numbers).with_context(|| format!("Concours {}", contest))?;

    Ok(Draw { contest, date, numbers })
}

/// `JJ/MM/AAAA` → `AAAA-MM-JJ`. Une date déjà ISO est conservée.
pub fn parse_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return Ok(raw.to_string());
    }
    match chrono::NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        Ok(date) => Ok(date.format("%Y-%m-%d").to_string()),
        Err(_) => bail!("Format de date invalide: '{}'", raw),
    }
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        tracing::warn!(line, "insertion impossible : {e:#}");
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(line, "ligne ignorée : {e:#}");
                    result.errors += 1;
                }
            },
            Err(e) => {
                tracing::warn!(line, "lecture impossible : {e}");
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    tracing::info!(
        inserted = result.inserted,
        skipped = result.skipped,
        errors = result.errors,
        "import terminé"
    );
    Ok(result)
}
