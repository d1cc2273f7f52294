//! Agrupamento dos concursos por período de calendário.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Duration, NaiveDateTime, NaiveTime, Timelike, Weekday};

use lotofacil_db::models::{Draw, POOL_SIZE};

use crate::error::EngineError;
use crate::frequency::FrequencyTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hour,
    Day,
    Month,
    Year,
}

impl Granularity {
    /// Início do período que contém `at`.
    pub fn truncate(&self, at: NaiveDateTime) -> NaiveDateTime {
        let day_start = at.date().and_time(NaiveTime::MIN);
        match self {
            Granularity::Hour => day_start + Duration::hours(at.hour() as i64),
            Granularity::Day => day_start,
            Granularity::Month => day_start - Days::new(at.day0() as u64),
            Granularity::Year => day_start - Days::new(at.ordinal0() as u64),
        }
    }

    pub fn label(&self, start: NaiveDateTime) -> String {
        let fmt = match self {
            Granularity::Hour => "%Y-%m-%d %H:00",
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
            Granularity::Year => "%Y",
        };
        start.format(fmt).to_string()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hora",
            Granularity::Day => "dia",
            Granularity::Month => "mes",
            Granularity::Year => "ano",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hora" | "hour" => Ok(Granularity::Hour),
            "dia" | "day" => Ok(Granularity::Day),
            "mes" | "mês" | "month" => Ok(Granularity::Month),
            "ano" | "year" => Ok(Granularity::Year),
            other => Err(EngineError::MalformedRequest(format!(
                "granularidade desconhecida: '{}' (use hora, dia, mes ou ano)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBucket {
    pub start: NaiveDateTime,
    pub label: String,
    pub draws: usize,
    pub frequency: Option<FrequencyTable>,
}

/// Um balde por período com pelo menos um concurso, em ordem cronológica.
/// Períodos vazios não aparecem.
pub fn by_period(draws: &[Draw], granularity: Granularity, with_frequency: bool) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<NaiveDateTime, (usize, Option<FrequencyTable>)> = BTreeMap::new();
    for draw in draws {
        let start = granularity.truncate(draw.draw_date);
        let entry = buckets
            .entry(start)
            .or_insert_with(|| (0, with_frequency.then(FrequencyTable::new)));
        entry.0 += 1;
        if let Some(table) = entry.1.as_mut() {
            table.record(&draw.numbers);
        }
    }

    buckets
        .into_iter()
        .map(|(start, (count, frequency))| PeriodBucket {
            start,
            label: granularity.label(start),
            draws: count,
            frequency,
        })
        .collect()
}

/// Concursos por dia da semana (segunda a domingo), sem os dias zerados.
pub fn by_weekday(draws: &[Draw]) -> Vec<(Weekday, usize)> {
    let mut counts = [0usize; 7];
    for draw in draws {
        counts[draw.draw_date.weekday().num_days_from_monday() as usize] += 1;
    }
    let mut day = Weekday::Mon;
    let mut out = Vec::new();
    for &count in &counts {
        if count > 0 {
            out.push((day, count));
        }
        day = day.succ();
    }
    out
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "segunda",
        Weekday::Tue => "terca",
        Weekday::Wed => "quarta",
        Weekday::Thu => "quinta",
        Weekday::Fri => "sexta",
        Weekday::Sat => "sabado",
        Weekday::Sun => "domingo",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendLabel {
    High,
    Medium,
    Low,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendLabel::High => write!(f, "alta"),
            TrendLabel::Medium => write!(f, "media"),
            TrendLabel::Low => write!(f, "baixa"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendEntry {
    pub number: u8,
    pub recent_frequency: u64,
    pub label: TrendLabel,
}

/// Frequência de cada dezena nos `window` concursos mais recentes
/// (`draws` em ordem crescente de concurso).
pub fn recent_trend(draws: &[Draw], window: usize, high: u64, medium: u64) -> Vec<TrendEntry> {
    let recent = &draws[draws.len().saturating_sub(window)..];
    let mut table = FrequencyTable::new();
    for d in recent {
        table.record(&d.numbers);
    }
    (1..=POOL_SIZE as u8)
        .map(|n| {
            let count = table.count(n);
            let label = if count > high {
                TrendLabel::High
            } else if count > medium {
                TrendLabel::Medium
            } else {
                TrendLabel::Low
            };
            TrendEntry {
                number: n,
                recent_frequency: count,
                label,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lotofacil_db::models::make_test_draws;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 37, 12)
            .unwrap()
    }

    fn draw_at(contest: u32, when: NaiveDateTime) -> Draw {
        let numbers: Vec<u8> = (1..=15).collect();
        Draw::new(contest, when, &numbers, 0.0, false).unwrap()
    }

    #[test]
    fn test_truncate() {
        let t = at(2024, 3, 17, 20);
        assert_eq!(Granularity::Hour.truncate(t), at(2024, 3, 17, 20) - Duration::seconds(37 * 60 + 12));
        assert_eq!(Granularity::Day.label(Granularity::Day.truncate(t)), "2024-03-17");
        assert_eq!(Granularity::Month.label(Granularity::Month.truncate(t)), "2024-03");
        assert_eq!(
            Granularity::Month.truncate(t),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_time(NaiveTime::MIN)
        );
        assert_eq!(
            Granularity::Year.truncate(t),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_time(NaiveTime::MIN)
        );
        assert_eq!(Granularity::Hour.label(Granularity::Hour.truncate(t)), "2024-03-17 20:00");
    }

    #[test]
    fn test_parse_granularity() {
        assert_eq!("mes".parse::<Granularity>().unwrap(), Granularity::Month);
        assert_eq!("Mês".parse::<Granularity>().unwrap(), Granularity::Month);
        assert_eq!("hour".parse::<Granularity>().unwrap(), Granularity::Hour);
        assert!(matches!(
            "semana".parse::<Granularity>(),
            Err(EngineError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_by_period_omits_empty_buckets() {
        let draws = vec![
            draw_at(1, at(2024, 1, 5, 20)),
            draw_at(2, at(2024, 1, 20, 20)),
            draw_at(3, at(2024, 4, 2, 20)),
        ];
        let buckets = by_period(&draws, Granularity::Month, true);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-04"]);
        assert_eq!(buckets[0].draws, 2);
        assert_eq!(buckets[1].draws, 1);
        let jan = buckets[0].frequency.as_ref().unwrap();
        assert_eq!(jan.count(1), 2);
        assert_eq!(jan.total(), 30);

        let years = by_period(&draws, Granularity::Year, false);
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].draws, 3);
        assert!(years[0].frequency.is_none());
    }

    #[test]
    fn test_by_period_hour() {
        let draws = vec![
            draw_at(1, at(2024, 1, 5, 20)),
            draw_at(2, at(2024, 1, 5, 21)),
            draw_at(3, at(2024, 1, 6, 20)),
        ];
        let buckets = by_period(&draws, Granularity::Hour, false);
        assert_eq!(buckets.len(), 3);
        let days = by_period(&draws, Granularity::Day, false);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].draws, 2);
    }

    #[test]
    fn test_by_weekday() {
        // 2024-01-01 é segunda; make_test_draws avança de 2 em 2 dias
        let draws = make_test_draws(4);
        let days = by_weekday(&draws);
        assert_eq!(
            days,
            vec![(Weekday::Mon, 1), (Weekday::Wed, 1), (Weekday::Fri, 1), (Weekday::Sun, 1)]
        );
        assert_eq!(weekday_name(Weekday::Sat), "sabado");
    }

    #[test]
    fn test_recent_trend_labels() {
        let draws: Vec<Draw> = (1..=6).map(|c| draw_at(c, at(2024, 1, c, 20))).collect();
        let trend = recent_trend(&draws, 5, 4, 2);
        assert_eq!(trend.len(), 25);
        // 1..=15 nos 5 últimos : 5 > 4
        assert_eq!(trend[0].recent_frequency, 5);
        assert_eq!(trend[0].label, TrendLabel::High);
        assert_eq!(trend[24].label, TrendLabel::Low);

        let short = recent_trend(&draws[..3], 20, 4, 2);
        assert_eq!(short[0].recent_frequency, 3);
        assert_eq!(short[0].label, TrendLabel::Medium);
        assert_eq!(TrendLabel::Medium.to_string(), "media");
    }
}
