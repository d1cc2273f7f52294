//! Agregador de frequências : uma única passada por concurso alimenta as
//! tabelas de dezenas, pares e trincas e os contadores de padrões.

pub mod distribution;
pub mod patterns;
pub mod tables;

use rayon::prelude::*;
use tracing::debug;

use lotofacil_db::models::{Draw, PICK_COUNT, POOL_SIZE};

use crate::error::{EngineError, Result};
pub use distribution::{DistributionReport, GeneralReport, IntervalStats, PatternSummary};
pub use tables::{ComboTable, FrequencyTable, PairTable, TripleTable, PAIRS_PER_DRAW, TRIPLES_PER_DRAW};

/// Abaixo disto o rebuild é sequencial.
const PARALLEL_THRESHOLD: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Singles,
    Pairs,
    Triples,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub numbers: Vec<u8>,
    pub count: u64,
}

/// Tabelas cuja soma é associativa (podem ser montadas em paralelo).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CoOccurrence {
    singles: FrequencyTable,
    pairs: PairTable,
    triples: TripleTable,
}

impl CoOccurrence {
    fn record(&mut self, numbers: &[u8]) {
        self.singles.record(numbers);
        self.pairs.record(numbers);
        self.triples.record(numbers);
    }

    fn merged(mut self, other: Self) -> Self {
        self.singles.merge(&other.singles);
        self.pairs.merge(&other.pairs);
        self.triples.merge(&other.triples);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IntervalTracker {
    pub last_seen: Option<u32>,
    pub sum: u64,
    pub count: u64,
    pub max: u32,
}

/// Contadores que dependem da ordem dos concursos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SequenceCounters {
    consecutive_pairs: u64,
    longest_run_total: u64,
    longest_run_max: u32,
    repeat_total: u64,
    repeat_samples: u64,
    previous: Option<[u8; PICK_COUNT]>,
    intervals: [IntervalTracker; POOL_SIZE],
}

impl SequenceCounters {
    fn record(&mut self, draw: &Draw) {
        let numbers = &draw.numbers;
        self.consecutive_pairs += patterns::consecutive_pairs(numbers) as u64;
        let run = patterns::longest_run(numbers) as u32;
        self.longest_run_total += run as u64;
        self.longest_run_max = self.longest_run_max.max(run);

        if let Some(prev) = &self.previous {
            self.repeat_total += patterns::overlap(prev, numbers) as u64;
            self.repeat_samples += 1;
        }
        self.previous = Some(*numbers);

        for &n in numbers {
            let tracker = &mut self.intervals[n as usize - 1];
            if let Some(last) = tracker.last_seen {
                let gap = draw.contest_number.saturating_sub(last);
                tracker.sum += gap as u64;
                tracker.count += 1;
                tracker.max = tracker.max.max(gap);
            }
            tracker.last_seen = Some(draw.contest_number);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregator {
    draws: u64,
    latest_contest: Option<u32>,
    tables: CoOccurrence,
    sequence: SequenceCounters,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recalcula tudo a partir do histórico (qualquer ordem; ordenado por concurso aqui).
    pub fn rebuild(draws: &[Draw]) -> Self {
        let mut ordered: Vec<&Draw> = draws.iter().collect();
        ordered.sort_by_key(|d| d.contest_number);

        let tables = if ordered.len() >= PARALLEL_THRESHOLD {
            ordered
                .par_iter()
                .fold(CoOccurrence::default, |mut acc, d| {
                    acc.record(&d.numbers);
                    acc
                })
                .reduce(CoOccurrence::default, CoOccurrence::merged)
        } else {
            let mut acc = CoOccurrence::default();
            for d in &ordered {
                acc.record(&d.numbers);
            }
            acc
        };

        let mut sequence = SequenceCounters::default();
        for d in &ordered {
            sequence.record(d);
        }

        debug!(draws = ordered.len(), "agregador reconstruído");
        Self {
            draws: ordered.len() as u64,
            latest_contest: ordered.last().map(|d| d.contest_number),
            tables,
            sequence,
        }
    }

    /// Acrescenta um concurso novo. Recusa concursos que não sejam posteriores
    /// ao último já agregado, para não contar duas vezes.
    pub fn apply_new_draw(&mut self, draw: &Draw) -> Result<()> {
        if let Some(latest) = self.latest_contest {
            if draw.contest_number <= latest {
                return Err(EngineError::StaleDraw {
                    contest: draw.contest_number,
                    latest,
                });
            }
        }
        self.tables.record(&draw.numbers);
        self.sequence.record(draw);
        self.draws += 1;
        self.latest_contest = Some(draw.contest_number);
        debug!(contest = draw.contest_number, draws = self.draws, "concurso agregado");
        Ok(())
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn is_empty(&self) -> bool {
        self.draws == 0
    }

    pub fn latest_contest(&self) -> Option<u32> {
        self.latest_contest
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.tables.singles
    }

    pub fn pairs(&self) -> &PairTable {
        &self.tables.pairs
    }

    pub fn triples(&self) -> &TripleTable {
        &self.tables.triples
    }

    pub fn top_n(&self, table: TableKind, n: usize, ascending: bool) -> Vec<RankedEntry> {
        fn ranked<const K: usize>(t: &ComboTable<K>, n: usize, ascending: bool) -> Vec<RankedEntry> {
            t.top_n(n, ascending)
                .into_iter()
                .map(|(key, count)| RankedEntry {
                    numbers: key.to_vec(),
                    count,
                })
                .collect()
        }
        match table {
            TableKind::Singles => ranked(&self.tables.singles, n, ascending),
            TableKind::Pairs => ranked(&self.tables.pairs, n, ascending),
            TableKind::Triples => ranked(&self.tables.triples, n, ascending),
        }
    }

    fn ensure_history(&self) -> Result<()> {
        if self.is_empty() {
            Err(EngineError::EmptyHistory)
        } else {
            Ok(())
        }
    }
}
