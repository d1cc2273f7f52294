use lotofacil_db::models::POOL_SIZE;

use super::patterns::{self, RANGES};
use super::Aggregator;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct RangeBucket {
    pub start: u8,
    pub end: u8,
    pub occurrences: u64,
}

/// Ocorrências (não concursos) agregadas por propriedade da dezena.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionReport {
    pub draws: u64,
    pub evens: u64,
    pub odds: u64,
    pub lows: u64,
    pub highs: u64,
    pub ranges: Vec<RangeBucket>,
    pub primes: u64,
    pub non_primes: u64,
    pub consecutive_pairs: u64,
}

/// Médias por concurso, arredondadas a 2 casas.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSummary {
    pub draws: u64,
    pub mean_evens: f64,
    pub mean_odds: f64,
    pub mean_lows: f64,
    pub mean_highs: f64,
    pub mean_sum: f64,
    pub mean_longest_run: f64,
}

/// Intervalos medidos em números de concurso.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStats {
    pub number: u8,
    pub mean_interval: Option<f64>,
    pub max_interval: Option<u32>,
    /// Concursos desde a última aparição.
    pub since_last: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralReport {
    pub draws: u64,
    pub mean_sum: f64,
    pub mean_repetition: f64,
    pub max_run: u32,
    pub relative_frequency: Vec<(u8, f64)>,
    pub most_frequent: u8,
    pub least_frequent: u8,
    pub intervals: Vec<IntervalStats>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl Aggregator {
    fn occurrences_where(&self, pred: impl Fn(u8) -> bool) -> u64 {
        self.frequencies()
            .numbers()
            .filter(|&(n, _)| pred(n))
            .map(|(_, c)| c)
            .sum()
    }

    pub fn distribution_stats(&self) -> Result<DistributionReport> {
        self.ensure_history()?;
        let total = self.frequencies().total();
        let evens = self.occurrences_where(|n| n % 2 == 0);
        let lows = self.occurrences_where(patterns::is_low);
        let primes = self.occurrences_where(patterns::is_prime);
        let ranges = RANGES
            .iter()
            .map(|&(start, end)| RangeBucket {
                start,
                end,
                occurrences: self.occurrences_where(|n| n >= start && n <= end),
            })
            .collect();

        Ok(DistributionReport {
            draws: self.draws,
            evens,
            odds: total - evens,
            lows,
            highs: total - lows,
            ranges,
            primes,
            non_primes: total - primes,
            consecutive_pairs: self.sequence.consecutive_pairs,
        })
    }

    /// Média de aparições por dezena : 15 × concursos / 25.
    pub fn mean_frequency(&self) -> Result<f64> {
        self.ensure_history()?;
        Ok(self.frequencies().total() as f64 / POOL_SIZE as f64)
    }

    pub fn pattern_summary(&self) -> Result<PatternSummary> {
        self.ensure_history()?;
        let d = self.draws as f64;
        let total = self.frequencies().total();
        let evens = self.occurrences_where(|n| n % 2 == 0);
        let lows = self.occurrences_where(patterns::is_low);
        let sum: u64 = self
            .frequencies()
            .numbers()
            .map(|(n, c)| n as u64 * c)
            .sum();

        Ok(PatternSummary {
            draws: self.draws,
            mean_evens: round2(evens as f64 / d),
            mean_odds: round2((total - evens) as f64 / d),
            mean_lows: round2(lows as f64 / d),
            mean_highs: round2((total - lows) as f64 / d),
            mean_sum: round2(sum as f64 / d),
            mean_longest_run: round2(self.sequence.longest_run_total as f64 / d),
        })
    }

    pub fn general_report(&self) -> Result<GeneralReport> {
        self.ensure_history()?;
        let total = self.frequencies().total() as f64;
        let sum: u64 = self
            .frequencies()
            .numbers()
            .map(|(n, c)| n as u64 * c)
            .sum();

        let mean_repetition = if self.sequence.repeat_samples > 0 {
            self.sequence.repeat_total as f64 / self.sequence.repeat_samples as f64
        } else {
            0.0
        };

        // top_n já desempata pela menor dezena
        let most_frequent = self.frequencies().top_n(1, false)[0].0[0];
        let least_frequent = self.frequencies().top_n(1, true)[0].0[0];

        let latest = self.latest_contest.unwrap_or(0);
        let intervals = self
            .sequence
            .intervals
            .iter()
            .enumerate()
            .map(|(i, t)| IntervalStats {
                number: i as u8 + 1,
                mean_interval: (t.count > 0).then(|| t.sum as f64 / t.count as f64),
                max_interval: (t.count > 0).then_some(t.max),
                since_last: t.last_seen.map(|seen| latest - seen),
            })
            .collect();

        Ok(GeneralReport {
            draws: self.draws,
            mean_sum: sum as f64 / self.draws as f64,
            mean_repetition,
            max_run: self.sequence.longest_run_max,
            relative_frequency: self
                .frequencies()
                .numbers()
                .map(|(n, c)| (n, c as f64 / total))
                .collect(),
            most_frequent,
            least_frequent,
            intervals,
        })
    }
}
