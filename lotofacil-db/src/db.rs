use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, Row};
use std::path::Path;

use crate::models::{Draw, PICK_COUNT};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    contest_number INTEGER PRIMARY KEY,
    draw_date      TEXT NOT NULL,
    ball_1  INTEGER NOT NULL, ball_2  INTEGER NOT NULL, ball_3  INTEGER NOT NULL,
    ball_4  INTEGER NOT NULL, ball_5  INTEGER NOT NULL, ball_6  INTEGER NOT NULL,
    ball_7  INTEGER NOT NULL, ball_8  INTEGER NOT NULL, ball_9  INTEGER NOT NULL,
    ball_10 INTEGER NOT NULL, ball_11 INTEGER NOT NULL, ball_12 INTEGER NOT NULL,
    ball_13 INTEGER NOT NULL, ball_14 INTEGER NOT NULL, ball_15 INTEGER NOT NULL,
    prize_amount   REAL NOT NULL DEFAULT 0.0,
    accumulated    INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_draws_date ON draws (draw_date);
";

const COLUMNS: &str = "contest_number, draw_date, \
    ball_1, ball_2, ball_3, ball_4, ball_5, ball_6, ball_7, ball_8, \
    ball_9, ball_10, ball_11, ball_12, ball_13, ball_14, ball_15, \
    prize_amount, accumulated";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotofacil.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Não foi possível criar o diretório {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Não foi possível abrir a base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).context("Falha na migração")?;
    Ok(())
}

/// Retorna `false` quando o concurso já existe (a linha existente é mantida).
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let n = &draw.numbers;
    let changed = conn
        .execute(
            &format!(
                "INSERT OR IGNORE INTO draws ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
            ),
            rusqlite::params![
                draw.contest_number,
                draw.draw_date,
                n[0], n[1], n[2], n[3], n[4], n[5], n[6], n[7],
                n[8], n[9], n[10], n[11], n[12], n[13], n[14],
                draw.prize_amount,
                draw.accumulated,
            ],
        )
        .with_context(|| format!("Falha ao inserir o concurso {}", draw.contest_number))?;
    Ok(changed > 0)
}

fn row_to_draw(row: &Row<'_>) -> rusqlite::Result<Draw> {
    let mut numbers = [0u8; PICK_COUNT];
    for (i, slot) in numbers.iter_mut().enumerate() {
        *slot = row.get::<_, u8>(2 + i)?;
    }
    numbers.sort_unstable();
    Ok(Draw {
        contest_number: row.get(0)?,
        draw_date: row.get::<_, NaiveDateTime>(1)?,
        numbers,
        prize_amount: row.get(17)?,
        accumulated: row.get(18)?,
    })
}

/// Histórico completo em ordem crescente de concurso.
pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM draws ORDER BY contest_number ASC"
    ))?;
    let draws = stmt
        .query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()
        .context("Falha ao ler os concursos")?;
    Ok(draws)
}

/// Concursos cuja data está em `[start, end]`, em ordem crescente de concurso.
pub fn fetch_draws_in_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM draws
         WHERE date(draw_date) BETWEEN date(?1) AND date(?2)
         ORDER BY contest_number ASC"
    ))?;
    let draws = stmt
        .query_map(rusqlite::params![start, end], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Falha ao ler os concursos entre {} e {}", start, end))?;
    Ok(draws)
}

/// Os `limit` concursos mais recentes, do mais novo para o mais antigo.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM draws ORDER BY contest_number DESC LIMIT ?1"
    ))?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn latest_contest(conn: &Connection) -> Result<Option<u32>> {
    let latest: Option<u32> =
        conn.query_row("SELECT MAX(contest_number) FROM draws", [], |row| row.get(0))?;
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(contest: u32, date: &str, first: u8) -> Draw {
        let at = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let numbers: Vec<u8> = (first..first + 15).collect();
        Draw::new(contest, at, &numbers, 1_234_567.89, false).unwrap()
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
        assert_eq!(latest_contest(&conn).unwrap(), None);

        insert_draw(&conn, &test_draw(1, "2024-01-01", 1)).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
        assert_eq!(latest_contest(&conn).unwrap(), Some(1));
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        assert!(insert_draw(&conn, &test_draw(1, "2024-01-01", 1)).unwrap());
        assert!(!insert_draw(&conn, &test_draw(1, "2024-01-01", 5)).unwrap());
        assert_eq!(count_draws(&conn).unwrap(), 1);

        let all = fetch_all_draws(&conn).unwrap();
        assert_eq!(all[0].numbers[0], 1);
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let conn = memory_db();
        let draw = test_draw(7, "2024-02-10", 3);
        insert_draw(&conn, &draw).unwrap();

        let all = fetch_all_draws(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], draw);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw(2, "2024-01-05", 2)).unwrap();
        insert_draw(&conn, &test_draw(3, "2024-01-08", 3)).unwrap();
        insert_draw(&conn, &test_draw(1, "2024-01-01", 1)).unwrap();

        let all = fetch_all_draws(&conn).unwrap();
        let contests: Vec<u32> = all.iter().map(|d| d.contest_number).collect();
        assert_eq!(contests, vec![1, 2, 3]);

        let last = fetch_last_draws(&conn, 2).unwrap();
        let contests: Vec<u32> = last.iter().map(|d| d.contest_number).collect();
        assert_eq!(contests, vec![3, 2]);
    }

    #[test]
    fn test_fetch_range_inclusive() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw(1, "2024-01-01", 1)).unwrap();
        insert_draw(&conn, &test_draw(2, "2024-01-05", 2)).unwrap();
        insert_draw(&conn, &test_draw(3, "2024-01-08", 3)).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let ranged = fetch_draws_in_range(&conn, start, end).unwrap();
        let contests: Vec<u32> = ranged.iter().map(|d| d.contest_number).collect();
        assert_eq!(contests, vec![2, 3]);
    }
}
