//! Montagem das respostas : converte o pedido em uma variante tipada,
//! resolve de onde vêm os concursos e delega aos componentes de cálculo.

pub mod wire;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use lotofacil_db::models::Draw;

use crate::config::EngineConfig;
use crate::engine::{AnalyticsEngine, Snapshot};
use crate::error::{EngineError, Result};
use crate::frequency::patterns::analyze_combination;
use crate::frequency::TableKind;
use crate::probability::compute_distribution_with;
use crate::selection;
use crate::suggestion::suggest_numbers;
use crate::temporal::{by_period, by_weekday, recent_trend, Granularity};
pub use wire::{RequestKind, RequestPayload, WireDraw};
use wire::*;

/// De onde vêm os concursos analisados.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawSource {
    /// Enviados na própria requisição. `dated` é falso se algum veio sem data.
    Inline { draws: Vec<Draw>, dated: bool },
    /// Intervalo de datas lido do ledger.
    Range { start: NaiveDate, end: NaiveDate },
    /// Snapshot global corrente do motor.
    Global,
}

impl DrawSource {
    fn from_payload(payload: &mut RequestPayload) -> Result<Self> {
        if let Some(wire) = payload.concursos.take() {
            let mut dated = true;
            let mut draws = Vec::with_capacity(wire.len());
            for (i, w) in wire.into_iter().enumerate() {
                let (draw, has_date) = w.into_draw(i + 1)?;
                dated &= has_date;
                draws.push(draw);
            }
            return Ok(DrawSource::Inline { draws, dated });
        }
        match (payload.inicio, payload.fim) {
            (Some(start), Some(end)) => Ok(DrawSource::Range { start, end }),
            (None, None) => Ok(DrawSource::Global),
            _ => Err(EngineError::MalformedRequest(
                "'inicio' e 'fim' devem vir juntos".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    Probability { numbers: Vec<i64> },
    Frequency { source: DrawSource, limit: usize },
    Patterns { source: DrawSource },
    Suggestion { source: DrawSource, quantity: i64 },
    Combination { numbers: Vec<i64> },
    GeneralStats { source: DrawSource },
    FrequentCombos { source: DrawSource, limit: usize },
    Temporal { source: DrawSource, granularity: Granularity },
}

impl AnalysisRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            AnalysisRequest::Probability { .. } => RequestKind::Probability,
            AnalysisRequest::Frequency { .. } => RequestKind::Frequency,
            AnalysisRequest::Patterns { .. } => RequestKind::Patterns,
            AnalysisRequest::Suggestion { .. } => RequestKind::Suggestion,
            AnalysisRequest::Combination { .. } => RequestKind::Combination,
            AnalysisRequest::GeneralStats { .. } => RequestKind::GeneralStats,
            AnalysisRequest::FrequentCombos { .. } => RequestKind::FrequentCombos,
            AnalysisRequest::Temporal { .. } => RequestKind::Temporal,
        }
    }

    pub fn parse(
        kind: RequestKind,
        mut payload: RequestPayload,
        defaults: &EngineConfig,
    ) -> Result<Self> {
        let limit = match payload.limite {
            None => defaults.default_limit,
            Some(n) if n >= 1 => n as usize,
            Some(n) => {
                return Err(EngineError::MalformedRequest(format!(
                    "limite deve ser positivo, recebido {}",
                    n
                )))
            }
        };

        let request = match kind {
            RequestKind::Probability => AnalysisRequest::Probability {
                numbers: payload.numeros.take().unwrap_or_default(),
            },
            RequestKind::Combination => AnalysisRequest::Combination {
                numbers: payload.numeros.take().unwrap_or_default(),
            },
            RequestKind::Frequency => AnalysisRequest::Frequency {
                source: DrawSource::from_payload(&mut payload)?,
                limit,
            },
            RequestKind::Patterns => AnalysisRequest::Patterns {
                source: DrawSource::from_payload(&mut payload)?,
            },
            RequestKind::Suggestion => AnalysisRequest::Suggestion {
                source: DrawSource::from_payload(&mut payload)?,
                quantity: payload
                    .quantidade
                    .unwrap_or(defaults.default_suggestion_size as i64),
            },
            RequestKind::GeneralStats => AnalysisRequest::GeneralStats {
                source: DrawSource::from_payload(&mut payload)?,
            },
            RequestKind::FrequentCombos => AnalysisRequest::FrequentCombos {
                source: DrawSource::from_payload(&mut payload)?,
                limit,
            },
            RequestKind::Temporal => {
                let granularity = match payload.granularidade.as_deref() {
                    Some(raw) => raw.parse()?,
                    None => Granularity::Month,
                };
                AnalysisRequest::Temporal {
                    source: DrawSource::from_payload(&mut payload)?,
                    granularity,
                }
            }
        };
        Ok(request)
    }
}

pub struct ReportAssembler {
    engine: Arc<AnalyticsEngine>,
}

impl ReportAssembler {
    pub fn new(engine: Arc<AnalyticsEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &AnalyticsEngine {
        &self.engine
    }

    fn resolve(&self, source: DrawSource) -> Result<Arc<Snapshot>> {
        let snapshot = match source {
            DrawSource::Inline { draws, .. } => Arc::new(Snapshot::from_draws(draws)?),
            DrawSource::Range { start, end } => Arc::new(self.engine.scoped(start, end)?),
            DrawSource::Global => self.engine.snapshot(),
        };
        if snapshot.is_empty() {
            return Err(EngineError::EmptyHistory);
        }
        Ok(snapshot)
    }

    /// Resposta já serializada. Os mapas saem na ordem em que foram montados
    /// (dezenas e acertos em ordem crescente).
    pub fn execute(&self, request: AnalysisRequest) -> Result<String> {
        let config = self.engine.config();
        let kind = request.kind();
        let body = match request {
            AnalysisRequest::Probability { numbers } => {
                let selection = selection::validate(&numbers)?;
                let report = compute_distribution_with(&selection, config.percent_decimals);
                to_json(ProbabilityResponse::from(&report))
            }
            AnalysisRequest::Combination { numbers } => {
                let selection = selection::validate(&numbers)?;
                to_json(CombinationResponse::from(analyze_combination(&selection)))
            }
            AnalysisRequest::Frequency { source, limit } => {
                let snap = self.resolve(source)?;
                let agg = &snap.aggregator;
                to_json(FrequencyResponse {
                    total_concursos: agg.draw_count(),
                    mais_sorteados: agg
                        .top_n(TableKind::Singles, limit, false)
                        .iter()
                        .map(NumberCount::from)
                        .collect(),
                    menos_sorteados: agg
                        .top_n(TableKind::Singles, limit, true)
                        .iter()
                        .map(NumberCount::from)
                        .collect(),
                    frequencias: NumberMap(agg.frequencies().numbers().collect()),
                    media_frequencia: agg.mean_frequency()?,
                })
            }
            AnalysisRequest::Patterns { source } => {
                let snap = self.resolve(source)?;
                let summary = snap.aggregator.pattern_summary()?;
                let dist = snap.aggregator.distribution_stats()?;
                to_json(PatternsResponse::new(&summary, &dist))
            }
            AnalysisRequest::Suggestion { source, quantity } => {
                let snap = self.resolve(source)?;
                let suggestion = suggest_numbers(
                    snap.aggregator.frequencies(),
                    quantity,
                    config.suggestion_frequent_share,
                )?;
                to_json(SuggestionResponse::from(suggestion))
            }
            AnalysisRequest::GeneralStats { source } => {
                let snap = self.resolve(source)?;
                let report = snap.aggregator.general_report()?;
                to_json(GeneralStatsResponse::new(report))
            }
            AnalysisRequest::FrequentCombos { source, limit } => {
                let snap = self.resolve(source)?;
                let agg = &snap.aggregator;
                to_json(CombosResponse {
                    total_concursos: agg.draw_count(),
                    pares_frequentes: agg
                        .top_n(TableKind::Pairs, limit, false)
                        .into_iter()
                        .map(ComboCount::from)
                        .collect(),
                    trincas_frequentes: agg
                        .top_n(TableKind::Triples, limit, false)
                        .into_iter()
                        .map(ComboCount::from)
                        .collect(),
                })
            }
            AnalysisRequest::Temporal { source, granularity } => {
                if let DrawSource::Inline { dated: false, .. } = source {
                    return Err(EngineError::MalformedRequest(
                        "análise temporal exige 'data' em todos os concursos".into(),
                    ));
                }
                let snap = self.resolve(source)?;
                to_json(TemporalResponse {
                    granularidade: granularity.as_str(),
                    total_concursos: snap.draws.len(),
                    periodos: by_period(&snap.draws, granularity, true)
                        .into_iter()
                        .map(PeriodWire::from)
                        .collect(),
                    concursos_por_dia_semana: WeekdayCounts(by_weekday(&snap.draws)),
                    tendencia: recent_trend(
                        &snap.draws,
                        config.trend_window,
                        config.trend_high,
                        config.trend_medium,
                    )
                    .into_iter()
                    .map(TrendWire::from)
                    .collect(),
                })
            }
        }?;
        debug!(kind = %kind, "requisição atendida");
        Ok(body)
    }

    /// Ponto de entrada por texto : tipo + JSON, sempre devolve JSON.
    /// Em caso de falha, `{"erro": ...}` com o `id` da requisição como prefixo.
    pub fn execute_calculation(&self, tipo: &str, json: &str) -> String {
        let raw: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => return self.fail(None, tipo, EngineError::MalformedRequest(e.to_string())),
        };
        let id = raw.get("id").filter(|v| !v.is_null()).map(render_id);

        let result = tipo
            .parse::<RequestKind>()
            .and_then(|kind| {
                let payload: RequestPayload = serde_json::from_value(raw)
                    .map_err(|e| EngineError::MalformedRequest(e.to_string()))?;
                AnalysisRequest::parse(kind, payload, self.engine.config())
            })
            .and_then(|request| self.execute(request));

        match result {
            Ok(body) => body,
            Err(e) => self.fail(id.as_deref(), tipo, e),
        }
    }

    fn fail(&self, id: Option<&str>, tipo: &str, error: EngineError) -> String {
        warn!(tipo, id, %error, "requisição recusada");
        let erro = match id {
            Some(id) => format!("[{}] {}", id, error),
            None => error.to_string(),
        };
        let mut body = serde_json::Map::new();
        body.insert("erro".into(), Value::String(erro));
        Value::Object(body).to_string()
    }
}

fn render_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_json<T: Serialize>(response: T) -> Result<String> {
    serde_json::to_string(&response).map_err(|e| EngineError::MalformedRequest(e.to_string()))
}
