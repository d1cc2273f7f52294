//! Fontes de histórico consumidas pelo motor de análise.
//!
//! O motor só conhece o trait [`DrawLedger`]; como os concursos são guardados
//! fica a cargo de cada implementação.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;

use crate::db;
use crate::models::{validate_draw, Draw};

pub trait DrawLedger: Send + Sync {
    /// Todos os concursos, em ordem crescente de número de concurso.
    fn all_draws(&self) -> Result<Vec<Draw>>;

    /// Concursos com data em `[start, end]` (inclusivo), em ordem crescente.
    fn draws_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Draw>>;
}

pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = db::open_db(path)?;
        db::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Falha ao abrir base em memória")?;
        db::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        db::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn insert(&self, draw: &Draw) -> Result<bool> {
        validate_draw(&draw.numbers)?;
        db::insert_draw(&self.conn.lock(), draw)
    }

    pub fn count(&self) -> Result<u32> {
        db::count_draws(&self.conn.lock())
    }

    pub fn latest_contest(&self) -> Result<Option<u32>> {
        db::latest_contest(&self.conn.lock())
    }

    pub fn last_draws(&self, limit: u32) -> Result<Vec<Draw>> {
        db::fetch_last_draws(&self.conn.lock(), limit)
    }

    /// Executa `f` com a conexão travada; usado pelo import em transação.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        f(&self.conn.lock())
    }
}

impl DrawLedger for SqliteLedger {
    fn all_draws(&self) -> Result<Vec<Draw>> {
        db::fetch_all_draws(&self.conn.lock())
    }

    fn draws_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Draw>> {
        db::fetch_draws_in_range(&self.conn.lock(), start, end)
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    draws: RwLock<Vec<Draw>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_draws(mut draws: Vec<Draw>) -> Result<Self> {
        for d in &draws {
            validate_draw(&d.numbers)
                .with_context(|| format!("Concurso {} inválido", d.contest_number))?;
        }
        draws.sort_by_key(|d| d.contest_number);
        draws.dedup_by_key(|d| d.contest_number);
        Ok(Self { draws: RwLock::new(draws) })
    }

    /// Mesmo contrato do `INSERT OR IGNORE` da base: concurso repetido é ignorado.
    pub fn push(&self, draw: Draw) -> Result<bool> {
        validate_draw(&draw.numbers)?;
        let mut draws = self.draws.write();
        match draws.binary_search_by_key(&draw.contest_number, |d| d.contest_number) {
            Ok(_) => Ok(false),
            Err(pos) => {
                draws.insert(pos, draw);
                Ok(true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.draws.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.read().is_empty()
    }
}

impl DrawLedger for MemoryLedger {
    fn all_draws(&self) -> Result<Vec<Draw>> {
        Ok(self.draws.read().clone())
    }

    fn draws_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Draw>> {
        Ok(self
            .draws
            .read()
            .iter()
            .filter(|d| d.date() >= start && d.date() <= end)
            .cloned()
            .collect())
    }
}
