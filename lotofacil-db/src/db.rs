use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use crate::models::{Draw, DRAW_SIZE};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS resultados_int (
    concurso  INTEGER PRIMARY KEY,
    data      TEXT NOT NULL DEFAULT '',
    n1        INTEGER NOT NULL,
    n2        INTEGER NOT NULL,
    n3        INTEGER NOT NULL,
    n4        INTEGER NOT NULL,
    n5        INTEGER NOT NULL,
    n6        INTEGER NOT NULL,
    n7        INTEGER NOT NULL,
    n8        INTEGER NOT NULL,
    n9        INTEGER NOT NULL,
    n10       INTEGER NOT NULL,
    n11       INTEGER NOT NULL,
    n12       INTEGER NOT NULL,
    n13       INTEGER NOT NULL,
    n14       INTEGER NOT NULL,
    n15       INTEGER NOT NULL
);
";

const SELECT_COLUMNS: &str =
    "concurso, data, n1, n2, n3, n4, n5, n6, n7, n8, n9, n10, n11, n12, n13, n14, n15";

/// Variable d'environnement qui remplace le chemin par défaut de la base.
pub const DB_ENV_VAR: &str = "LOTOFACIL_DB";

pub fn db_path() -> PathBuf {
    if let Ok(custom) = std::env::var(DB_ENV_VAR) {
        if !custom.trim().is_empty() {
            return PathBuf::from(custom);
        }
    }
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotofacil.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
        }
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let n = &draw.numbers;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO resultados_int (concurso, data, n1, n2, n3, n4, n5, n6, n7, n8, n9, n10, n11, n12, n13, n14, n15)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        rusqlite::params![
            draw.contest,
            draw.date,
            n[0], n[1], n[2], n[3], n[4],
            n[5], n[6], n[7], n[8], n[9],
            n[10], n[11], n[12], n[13], n[14],
        ],
    ).with_context(|| format!("Échec de l'insertion du concours {}", draw.contest))?;
    Ok(changed > 0)
}

fn row_to_draw(row: &Row<'_>) -> rusqlite::Result<Draw> {
    let mut numbers = [0u8; DRAW_SIZE];
    for (i, slot) in numbers.iter_mut().enumerate() {
        *slot = row.get::<_, u8>(i + 2)?;
    }
    Ok(Draw {
        contest: row.get(0)?,
        date: row.get(1)?,
        numbers,
    })
}

/// Derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM resultados_int ORDER BY concurso DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Tirages strictement antérieurs à `contest`, le plus récent en premier.
pub fn fetch_draws_before(conn: &Connection, contest: u32, limit: u32) -> Result<Vec<Draw>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM resultados_int WHERE concurso < ?1 ORDER BY concurso DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let draws = stmt
        .query_map([contest, limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_draw(conn: &Connection, contest: u32) -> Result<Option<Draw>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM resultados_int WHERE concurso = ?1");
    let draw = conn
        .query_row(&sql, [contest], row_to_draw)
        .optional()
        .with_context(|| format!("Échec de lecture du concours {}", contest))?;
    Ok(draw)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM resultados_int", [], |row| row.get(0))?;
    Ok(count)
}

pub fn last_contest(conn: &Connection) -> Result<Option<u32>> {
    let last: Option<u32> = conn.query_row("SELECT MAX(concurso) FROM resultados_int", [], |row| row.get(0))?;
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(contest: u32, first: u8) -> Draw {
        let mut numbers = [0u8; DRAW_SIZE];
        for (i, slot) in numbers.iter_mut().enumerate() {
            *slot = first + i as u8;
        }
        Draw {
            contest,
            date: format!("2024-01-{:02}", contest % 28 + 1),
            numbers,
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);
        assert_eq!(last_contest(&conn).unwrap(), None);

        insert_draw(&conn, &test_draw(1, 1)).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
        assert_eq!(last_contest(&conn).unwrap(), Some(1));
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw(1, 1)).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw(1, 2)).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw(10, 1)).unwrap();
        insert_draw(&conn, &test_draw(30, 5)).unwrap();
        insert_draw(&conn, &test_draw(20, 3)).unwrap();

        let draws = fetch_last_draws(&conn, 10).unwrap();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].contest, 30);
        assert_eq!(draws[1].contest, 20);
        assert_eq!(draws[2].contest, 10);
        assert_eq!(draws[0].numbers[0], 5);

        let limited = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_fetch_before_and_single() {
        let conn = memory_db();
        for c in 1..=5 {
            insert_draw(&conn, &test_draw(c, c as u8)).unwrap();
        }

        let before = fetch_draws_before(&conn, 4, 10).unwrap();
        assert_eq!(before.iter().map(|d| d.contest).collect::<Vec<_>>(), vec![3, 2, 1]);

        let draw = fetch_draw(&conn, 2).unwrap().unwrap();
        assert_eq!(draw.numbers, test_draw(2, 2).numbers);
        assert!(fetch_draw(&conn, 99).unwrap().is_none());
    }
}
