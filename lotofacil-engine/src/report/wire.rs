//! Formato JSON trocado com o cliente. As chaves em português são as do
//! aplicativo e não podem mudar.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lotofacil_db::models::{parse_draw_date, Draw, PICK_COUNT};

use crate::error::{EngineError, Result};
use crate::frequency::patterns::CombinationAnalysis;
use crate::frequency::{DistributionReport, GeneralReport, PatternSummary, RankedEntry};
use crate::probability::ProbabilityReport;
use crate::suggestion::Suggestion;
use crate::temporal::{weekday_name, PeriodBucket, TrendEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Probability,
    Frequency,
    Patterns,
    Suggestion,
    Combination,
    GeneralStats,
    FrequentCombos,
    Temporal,
}

impl RequestKind {
    pub const ALL: [RequestKind; 8] = [
        RequestKind::Probability,
        RequestKind::Frequency,
        RequestKind::Patterns,
        RequestKind::Suggestion,
        RequestKind::Combination,
        RequestKind::GeneralStats,
        RequestKind::FrequentCombos,
        RequestKind::Temporal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Probability => "probabilidade_simples",
            RequestKind::Frequency => "frequencia_numeros",
            RequestKind::Patterns => "padroes",
            RequestKind::Suggestion => "sugestao_numeros",
            RequestKind::Combination => "analise_combinacao",
            RequestKind::GeneralStats => "estatisticas_gerais",
            RequestKind::FrequentCombos => "combinacoes_frequentes",
            RequestKind::Temporal => "padroes_temporais",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        RequestKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EngineError::UnknownRequest(s.to_string()))
    }
}

/// Corpo da requisição. Cada tipo lê só os campos que usa.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestPayload {
    pub numeros: Option<Vec<i64>>,
    pub concursos: Option<Vec<WireDraw>>,
    pub quantidade: Option<i64>,
    pub limite: Option<i64>,
    pub inicio: Option<NaiveDate>,
    pub fim: Option<NaiveDate>,
    pub granularidade: Option<String>,
    pub id: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireDraw {
    #[serde(default)]
    pub concurso: Option<u32>,
    #[serde(default)]
    pub data: Option<String>,
    pub dezenas: Vec<i64>,
}

impl WireDraw {
    /// `position` numera os concursos que chegam sem `concurso` (a partir de 1).
    /// Sem `data`, a data fica no início da época UNIX e o segundo valor é `false`.
    pub fn into_draw(self, position: usize) -> Result<(Draw, bool)> {
        let contest = self.concurso.unwrap_or(position as u32);
        let invalid = |reason: String| EngineError::InvalidDraw { contest, reason };

        if self.dezenas.len() != PICK_COUNT {
            return Err(invalid(format!(
                "{} dezenas, esperado {}",
                self.dezenas.len(),
                PICK_COUNT
            )));
        }
        let numbers = self
            .dezenas
            .iter()
            .map(|&n| u8::try_from(n).map_err(|_| invalid(format!("dezena {} fora dos limites", n))))
            .collect::<Result<Vec<u8>>>()?;

        let (date, dated) = match self.data.as_deref() {
            Some(raw) => {
                let at = parse_draw_date(raw).ok_or_else(|| invalid(format!("data ilegível: '{}'", raw)))?;
                (at, true)
            }
            None => (NaiveDateTime::default(), false),
        };

        let draw = Draw::new(contest, date, &numbers, 0.0, false).map_err(|e| invalid(e.to_string()))?;
        Ok((draw, dated))
    }
}

/// Mapa indexado por dezena, serializado em ordem numérica.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberMap<T>(pub Vec<(u8, T)>);

impl<T: Serialize> Serialize for NumberMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (n, v) in &self.0 {
            map.serialize_entry(n, v)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct MatchEntry {
    pub probabilidade: f64,
    pub percentual: f64,
    pub chance_em_1: String,
}

/// `"{k}_acertos"` em ordem crescente de k.
#[derive(Debug)]
pub struct ProbabilityTable(pub Vec<(usize, MatchEntry)>);

impl Serialize for ProbabilityTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, entry) in &self.0 {
            map.serialize_entry(&format!("{}_acertos", k), entry)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct ProbabilityResponse {
    pub numeros: Vec<u8>,
    pub probabilidades: ProbabilityTable,
    pub total_combinacoes: u64,
}

impl From<&ProbabilityReport> for ProbabilityResponse {
    fn from(report: &ProbabilityReport) -> Self {
        let probabilidades = report
            .entries
            .iter()
            .map(|e| {
                (
                    e.matches,
                    MatchEntry {
                        probabilidade: e.probability,
                        percentual: e.percent,
                        chance_em_1: e.odds.to_string(),
                    },
                )
            })
            .collect();
        Self {
            numeros: report.selection.numbers().to_vec(),
            probabilidades: ProbabilityTable(probabilidades),
            total_combinacoes: report.total_combinations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NumberCount {
    pub numero: u8,
    pub frequencia: u64,
}

impl From<&RankedEntry> for NumberCount {
    fn from(e: &RankedEntry) -> Self {
        Self {
            numero: e.numbers[0],
            frequencia: e.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FrequencyResponse {
    pub total_concursos: u64,
    pub mais_sorteados: Vec<NumberCount>,
    pub menos_sorteados: Vec<NumberCount>,
    pub frequencias: NumberMap<u64>,
    pub media_frequencia: f64,
}

#[derive(Debug, Serialize)]
pub struct ParityMeans {
    pub media_pares: f64,
    pub media_impares: f64,
}

#[derive(Debug, Serialize)]
pub struct HalfMeans {
    pub media_baixos: f64,
    pub media_altos: f64,
}

#[derive(Debug, Serialize)]
pub struct PatternBlock {
    pub pares_impares: ParityMeans,
    pub baixos_altos: HalfMeans,
    pub soma_total: f64,
    pub maior_sequencia: f64,
}

#[derive(Debug, Serialize)]
pub struct RangeWire {
    pub inicio: u8,
    pub fim: u8,
    pub ocorrencias: u64,
}

#[derive(Debug, Serialize)]
pub struct DistributionWire {
    pub pares: u64,
    pub impares: u64,
    pub baixos: u64,
    pub altos: u64,
    pub primos: u64,
    pub nao_primos: u64,
    pub faixas: Vec<RangeWire>,
    pub pares_consecutivos: u64,
}

#[derive(Debug, Serialize)]
pub struct PatternsResponse {
    pub total_concursos: u64,
    pub padroes_analisados: PatternBlock,
    pub distribuicao: DistributionWire,
}

impl PatternsResponse {
    pub fn new(summary: &PatternSummary, dist: &DistributionReport) -> Self {
        Self {
            total_concursos: summary.draws,
            padroes_analisados: PatternBlock {
                pares_impares: ParityMeans {
                    media_pares: summary.mean_evens,
                    media_impares: summary.mean_odds,
                },
                baixos_altos: HalfMeans {
                    media_baixos: summary.mean_lows,
                    media_altos: summary.mean_highs,
                },
                soma_total: summary.mean_sum,
                maior_sequencia: summary.mean_longest_run,
            },
            distribuicao: DistributionWire {
                pares: dist.evens,
                impares: dist.odds,
                baixos: dist.lows,
                altos: dist.highs,
                primos: dist.primes,
                nao_primos: dist.non_primes,
                faixas: dist
                    .ranges
                    .iter()
                    .map(|r| RangeWire {
                        inicio: r.start,
                        fim: r.end,
                        ocorrencias: r.occurrences,
                    })
                    .collect(),
                pares_consecutivos: dist.consecutive_pairs,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub numeros_sugeridos: Vec<u8>,
    pub quantidade: usize,
    pub estrategia: &'static str,
    pub observacao: &'static str,
}

impl From<Suggestion> for SuggestionResponse {
    fn from(s: Suggestion) -> Self {
        Self {
            quantidade: s.numbers.len(),
            numeros_sugeridos: s.numbers,
            estrategia: s.strategy,
            observacao: s.disclaimer,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CombinationResponse {
    pub combinacao: Vec<u8>,
    pub soma: u32,
    pub media: f64,
    pub max_sequencia: usize,
    pub pares: usize,
    pub impares: usize,
    pub baixos: usize,
    pub altos: usize,
    pub primos: usize,
}

impl From<CombinationAnalysis> for CombinationResponse {
    fn from(a: CombinationAnalysis) -> Self {
        Self {
            combinacao: a.numbers,
            soma: a.sum,
            media: a.mean,
            max_sequencia: a.longest_run,
            pares: a.evens,
            impares: a.odds,
            baixos: a.lows,
            altos: a.highs,
            primos: a.primes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntervalWire {
    pub media_intervalo: Option<f64>,
    pub max_intervalo: Option<u32>,
    pub ultima_aparicao: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GeneralStatsResponse {
    pub total_concursos_analisados: u64,
    pub media_soma_geral: f64,
    pub media_numeros_repetidos_concurso_anterior: f64,
    pub maximo_sequencia: u32,
    pub numero_mais_frequente: u8,
    pub numero_menos_frequente: u8,
    pub frequencia_relativa_numeros: NumberMap<f64>,
    /// Dezena → intervalo médio; 0 para dezenas que ainda não se repetiram.
    pub media_intervalo_aparicoes_numeros: NumberMap<f64>,
    pub intervalo_aparicoes: NumberMap<IntervalWire>,
}

impl GeneralStatsResponse {
    pub fn new(report: GeneralReport) -> Self {
        Self {
            total_concursos_analisados: report.draws,
            media_soma_geral: report.mean_sum,
            media_numeros_repetidos_concurso_anterior: report.mean_repetition,
            maximo_sequencia: report.max_run,
            numero_mais_frequente: report.most_frequent,
            numero_menos_frequente: report.least_frequent,
            frequencia_relativa_numeros: NumberMap(report.relative_frequency),
            media_intervalo_aparicoes_numeros: NumberMap(
                report
                    .intervals
                    .iter()
                    .map(|i| (i.number, i.mean_interval.unwrap_or(0.0)))
                    .collect(),
            ),
            intervalo_aparicoes: NumberMap(
                report
                    .intervals
                    .into_iter()
                    .map(|i| {
                        (
                            i.number,
                            IntervalWire {
                                media_intervalo: i.mean_interval,
                                max_intervalo: i.max_interval,
                                ultima_aparicao: i.since_last,
                            },
                        )
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComboCount {
    pub dezenas: Vec<u8>,
    pub frequencia: u64,
}

impl From<RankedEntry> for ComboCount {
    fn from(e: RankedEntry) -> Self {
        Self {
            dezenas: e.numbers,
            frequencia: e.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CombosResponse {
    pub total_concursos: u64,
    pub pares_frequentes: Vec<ComboCount>,
    pub trincas_frequentes: Vec<ComboCount>,
}

#[derive(Debug, Serialize)]
pub struct PeriodWire {
    pub periodo: String,
    pub concursos: usize,
    pub frequencias: NumberMap<u64>,
}

impl From<PeriodBucket> for PeriodWire {
    fn from(b: PeriodBucket) -> Self {
        Self {
            periodo: b.label,
            concursos: b.draws,
            frequencias: NumberMap(b.frequency.map(|t| t.numbers().collect()).unwrap_or_default()),
        }
    }
}

/// Dia da semana → concursos, de segunda a domingo.
#[derive(Debug)]
pub struct WeekdayCounts(pub Vec<(chrono::Weekday, usize)>);

impl Serialize for WeekdayCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (day, count) in &self.0 {
            map.serialize_entry(weekday_name(*day), count)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct TrendWire {
    pub numero: u8,
    pub frequencia_recente: u64,
    pub tendencia: String,
}

impl From<TrendEntry> for TrendWire {
    fn from(t: TrendEntry) -> Self {
        Self {
            numero: t.number,
            frequencia_recente: t.recent_frequency,
            tendencia: t.label.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemporalResponse {
    pub granularidade: &'static str,
    pub total_concursos: usize,
    pub periodos: Vec<PeriodWire>,
    pub concursos_por_dia_semana: WeekdayCounts,
    pub tendencia: Vec<TrendWire>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_kind_tags() {
        for kind in RequestKind::ALL {
            assert_eq!(kind.as_str().parse::<RequestKind>().unwrap(), kind);
        }
        assert_eq!(
            "loteria_magica".parse::<RequestKind>(),
            Err(EngineError::UnknownRequest("loteria_magica".into()))
        );
    }

    #[test]
    fn test_payload_defaults() {
        let p: RequestPayload = serde_json::from_str("{}").unwrap();
        assert!(p.numeros.is_none() && p.concursos.is_none() && p.id.is_none());

        let p: RequestPayload =
            serde_json::from_str(r#"{"inicio": "2024-01-01", "fim": "2024-02-01", "id": 7}"#).unwrap();
        assert_eq!(p.inicio, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(p.id, Some(Value::from(7)));
    }

    #[test]
    fn test_wire_draw_conversion() {
        let wire = WireDraw {
            concurso: None,
            data: Some("15/03/2024".into()),
            dezenas: (1..=15).rev().collect(),
        };
        let (draw, dated) = wire.into_draw(3).unwrap();
        assert!(dated);
        assert_eq!(draw.contest_number, 3);
        assert_eq!(draw.numbers[0], 1);

        let undated = WireDraw {
            concurso: Some(42),
            data: None,
            dezenas: (11..=25).collect(),
        };
        let (draw, dated) = undated.into_draw(1).unwrap();
        assert!(!dated);
        assert_eq!(draw.contest_number, 42);
    }

    #[test]
    fn test_wire_draw_rejections() {
        let short = WireDraw {
            concurso: Some(9),
            data: None,
            dezenas: (1..=14).collect(),
        };
        assert!(matches!(
            short.into_draw(1),
            Err(EngineError::InvalidDraw { contest: 9, .. })
        ));

        let mut dezenas: Vec<i64> = (1..=15).collect();
        dezenas[0] = -1;
        let negative = WireDraw { concurso: None, data: None, dezenas };
        assert!(matches!(
            negative.into_draw(2),
            Err(EngineError::InvalidDraw { contest: 2, .. })
        ));

        let bad_date = WireDraw {
            concurso: None,
            data: Some("amanhã".into()),
            dezenas: (1..=15).collect(),
        };
        assert!(bad_date.into_draw(1).is_err());
    }

    #[test]
    fn test_number_map_keeps_numeric_order() {
        let map = NumberMap(vec![(2u8, 5u64), (10, 1)]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2":5,"10":1}"#);
    }
}
