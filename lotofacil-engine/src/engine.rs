//! Motor de análise : um único escritor publica snapshots imutáveis, os
//! leitores clonam o `Arc` corrente e calculam sem trava nenhuma.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use lotofacil_db::ledger::DrawLedger;
use lotofacil_db::models::{validate_draw, Draw};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::frequency::Aggregator;

/// Estado agregado de um conjunto de concursos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// 0 para snapshots fora do motor (intervalo ou concursos enviados na requisição).
    pub version: u64,
    /// Ordem crescente de concurso.
    pub draws: Vec<Draw>,
    pub aggregator: Aggregator,
}

impl Snapshot {
    pub fn from_draws(mut draws: Vec<Draw>) -> Result<Self> {
        for d in &draws {
            check_draw(d)?;
        }
        draws.sort_by_key(|d| d.contest_number);
        if let Some(pair) = draws.windows(2).find(|w| w[0].contest_number == w[1].contest_number) {
            return Err(EngineError::InvalidDraw {
                contest: pair[0].contest_number,
                reason: "concurso repetido".into(),
            });
        }
        let aggregator = Aggregator::rebuild(&draws);
        Ok(Self {
            version: 0,
            draws,
            aggregator,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

fn check_draw(draw: &Draw) -> Result<()> {
    validate_draw(&draw.numbers).map_err(|e| EngineError::InvalidDraw {
        contest: draw.contest_number,
        reason: e.to_string(),
    })
}

fn ledger_error(e: anyhow::Error) -> EngineError {
    EngineError::LedgerUnavailable(format!("{:#}", e))
}

pub struct AnalyticsEngine {
    ledger: Arc<dyn DrawLedger>,
    config: EngineConfig,
    writer: Mutex<()>,
    current: RwLock<Arc<Snapshot>>,
}

impl AnalyticsEngine {
    /// Motor vazio; chame [`rebuild`](Self::rebuild) para carregar o histórico.
    pub fn new(ledger: Arc<dyn DrawLedger>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            config,
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(Snapshot::default())),
        })
    }

    pub fn load(ledger: Arc<dyn DrawLedger>, config: EngineConfig) -> Result<Self> {
        let engine = Self::new(ledger, config)?;
        engine.rebuild()?;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Relê todo o histórico do ledger e publica um snapshot novo.
    pub fn rebuild(&self) -> Result<Arc<Snapshot>> {
        let _gate = self.writer.lock();
        let draws = self.ledger.all_draws().map_err(ledger_error)?;
        let mut next = Snapshot::from_draws(draws)?;
        next.version = self.current.read().version + 1;
        Ok(self.publish(next))
    }

    /// Acrescenta um concurso recém-publicado. Concursos repetidos ou
    /// anteriores ao último agregado são recusados com `StaleDraw`.
    pub fn apply_new_draw(&self, draw: Draw) -> Result<Arc<Snapshot>> {
        check_draw(&draw)?;
        let _gate = self.writer.lock();
        let base = self.snapshot();
        let mut next = Snapshot::clone(&base);
        next.aggregator.apply_new_draw(&draw)?;
        next.draws.push(draw);
        next.version = base.version + 1;
        Ok(self.publish(next))
    }

    /// Notificação de concurso novo vinda do ledger. Reentregas não são erro:
    /// o snapshot corrente é devolvido sem alteração.
    pub fn on_new_draw(&self, draw: Draw) -> Result<Arc<Snapshot>> {
        match self.apply_new_draw(draw) {
            Err(EngineError::StaleDraw { contest, latest }) => {
                warn!(contest, latest, "concurso já agregado, ignorado");
                Ok(self.snapshot())
            }
            other => other,
        }
    }

    /// Snapshot avulso para um intervalo de datas, lido do ledger.
    pub fn scoped(&self, start: NaiveDate, end: NaiveDate) -> Result<Snapshot> {
        if start > end {
            return Err(EngineError::MalformedRequest(format!(
                "intervalo invertido: {} > {}",
                start, end
            )));
        }
        let draws = self.ledger.draws_in_range(start, end).map_err(ledger_error)?;
        Snapshot::from_draws(draws)
    }

    fn publish(&self, next: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(next);
        *self.current.write() = next.clone();
        info!(
            version = next.version,
            draws = next.draws.len(),
            latest = ?next.aggregator.latest_contest(),
            "snapshot publicado"
        );
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{PAIRS_PER_DRAW, TRIPLES_PER_DRAW};
    use lotofacil_db::ledger::MemoryLedger;
    use lotofacil_db::models::make_test_draws;
    use std::thread;

    struct BrokenLedger;

    impl DrawLedger for BrokenLedger {
        fn all_draws(&self) -> anyhow::Result<Vec<Draw>> {
            anyhow::bail!("conexão recusada")
        }

        fn draws_in_range(&self, _: NaiveDate, _: NaiveDate) -> anyhow::Result<Vec<Draw>> {
            anyhow::bail!("conexão recusada")
        }
    }

    fn memory_engine(n: usize) -> AnalyticsEngine {
        let ledger = MemoryLedger::from_draws(make_test_draws(n)).unwrap();
        AnalyticsEngine::load(Arc::new(ledger), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_load_publishes_first_version() {
        let engine = memory_engine(10);
        let snap = engine.snapshot();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.draws.len(), 10);
        assert_eq!(snap.aggregator.draw_count(), 10);
        assert_eq!(snap.aggregator.latest_contest(), Some(10));
    }

    #[test]
    fn test_snapshot_rejects_repeated_contest() {
        let mut draws = make_test_draws(3);
        draws[2].contest_number = draws[0].contest_number;
        match Snapshot::from_draws(draws) {
            Err(EngineError::InvalidDraw { contest, reason }) => {
                assert_eq!(contest, 1);
                assert!(reason.contains("repetido"));
            }
            other => panic!("esperado InvalidDraw, obtido {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_broken_ledger_is_unavailable() {
        let result = AnalyticsEngine::load(Arc::new(BrokenLedger), EngineConfig::default());
        match result {
            Err(EngineError::LedgerUnavailable(msg)) => assert!(msg.contains("recusada")),
            other => panic!("esperado LedgerUnavailable, obtido {:?}", other.map(|_| ())),
        }

        let engine = AnalyticsEngine::new(Arc::new(BrokenLedger), EngineConfig::default()).unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            engine.scoped(d, d),
            Err(EngineError::LedgerUnavailable(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            trend_window: 0,
            ..Default::default()
        };
        let ledger = Arc::new(MemoryLedger::new());
        assert!(matches!(
            AnalyticsEngine::new(ledger, config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_apply_matches_rebuild() {
        let all = make_test_draws(30);
        let ledger = MemoryLedger::from_draws(all[..20].to_vec()).unwrap();
        let engine = AnalyticsEngine::load(Arc::new(ledger), EngineConfig::default()).unwrap();
        for d in &all[20..] {
            engine.apply_new_draw(d.clone()).unwrap();
        }
        let snap = engine.snapshot();
        assert_eq!(snap.version, 11);
        assert_eq!(snap.aggregator, Aggregator::rebuild(&all));
        assert_eq!(snap.draws, all);
    }

    #[test]
    fn test_stale_draw_rejected_and_replay_tolerated() {
        let engine = memory_engine(5);
        let replay = make_test_draws(5).pop().unwrap();
        assert_eq!(
            engine.apply_new_draw(replay.clone()),
            Err(EngineError::StaleDraw { contest: 5, latest: 5 })
        );
        let before = engine.snapshot();
        let after = engine.on_new_draw(replay).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.version, 1);
    }

    #[test]
    fn test_invalid_draw_rejected() {
        let engine = memory_engine(2);
        let mut bad = make_test_draws(3).pop().unwrap();
        bad.numbers[1] = bad.numbers[0];
        assert!(matches!(
            engine.apply_new_draw(bad),
            Err(EngineError::InvalidDraw { contest: 3, .. })
        ));
        assert_eq!(engine.snapshot().version, 1);
    }

    #[test]
    fn test_scoped_range() {
        let engine = memory_engine(10);
        // concursos de 2 em 2 dias a partir de 2024-01-01
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let scoped = engine.scoped(start, end).unwrap();
        let contests: Vec<u32> = scoped.draws.iter().map(|d| d.contest_number).collect();
        assert_eq!(contests, vec![2, 3, 4]);
        assert_eq!(scoped.version, 0);
        assert!(matches!(
            engine.scoped(end, start),
            Err(EngineError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_readers_see_whole_snapshots() {
        let all = make_test_draws(60);
        let ledger = MemoryLedger::from_draws(all[..1].to_vec()).unwrap();
        let engine = Arc::new(AnalyticsEngine::load(Arc::new(ledger), EngineConfig::default()).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = engine.snapshot();
                        let n = snap.draws.len() as u64;
                        assert_eq!(snap.aggregator.draw_count(), n);
                        assert_eq!(snap.aggregator.frequencies().total(), 15 * n);
                        assert_eq!(snap.aggregator.pairs().total(), PAIRS_PER_DRAW * n);
                        assert_eq!(snap.aggregator.triples().total(), TRIPLES_PER_DRAW * n);
                    }
                })
            })
            .collect();

        for d in &all[1..] {
            engine.apply_new_draw(d.clone()).unwrap();
        }
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(engine.snapshot().draws.len(), 60);
    }
}
