//! Distribuição exata do número de acertos de uma aposta.
//!
//! População de 25 dezenas, 15 "sucessos" (as sorteadas), amostra de 15 (as
//! apostadas). Como |A ∩ B| >= |A| + |B| - 25, o suporte é 5..=15.

use num_bigint::BigUint;

use lotofacil_db::models::{PICK_COUNT, POOL_SIZE};

use crate::combinatorics::{choose, hypergeometric, small_choose, ExactRatio};
use crate::error::Result;
use crate::selection::{self, Selection};

pub const MIN_MATCHES: usize = (2 * PICK_COUNT).saturating_sub(POOL_SIZE);
pub const MAX_MATCHES: usize = PICK_COUNT;
pub const PERCENT_DECIMALS: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchProbability {
    pub matches: usize,
    pub exact: ExactRatio,
    pub probability: f64,
    /// Probabilidade em %, arredondada.
    pub percent: f64,
    /// "1 em N" : round(1 / P(k)).
    pub odds: BigUint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityReport {
    pub selection: Selection,
    /// Um item por k em MIN_MATCHES..=MAX_MATCHES, em ordem crescente.
    pub entries: Vec<MatchProbability>,
    /// C(25, 15).
    pub total_combinations: u64,
}

impl ProbabilityReport {
    pub fn get(&self, matches: usize) -> Option<&MatchProbability> {
        self.entries.iter().find(|e| e.matches == matches)
    }
}

/// P(k) exata. Zero fora do suporte (inclusive k negativo), nunca erro.
pub fn match_probability(k: i64) -> ExactRatio {
    let n = POOL_SIZE as i64;
    let pick = PICK_COUNT as i64;
    if k < MIN_MATCHES as i64 || k > MAX_MATCHES as i64 {
        return ExactRatio {
            numerator: BigUint::default(),
            denominator: choose(n, pick),
        };
    }
    hypergeometric(n, pick, pick, k)
}

pub fn probability_of(k: i64) -> f64 {
    match_probability(k).to_f64()
}

pub fn total_combinations() -> BigUint {
    choose(POOL_SIZE as i64, PICK_COUNT as i64)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

pub fn compute_distribution(selection: &Selection) -> ProbabilityReport {
    compute_distribution_with(selection, PERCENT_DECIMALS)
}

/// A distribuição não depende de quais dezenas foram escolhidas, só de que
/// a aposta é válida; a seleção vai junto no relatório para o chamador.
pub fn compute_distribution_with(selection: &Selection, percent_decimals: u32) -> ProbabilityReport {
    let entries = (MIN_MATCHES..=MAX_MATCHES)
        .filter_map(|k| {
            let exact = match_probability(k as i64);
            let odds = exact.rounded_reciprocal()?;
            let probability = exact.to_f64();
            Some(MatchProbability {
                matches: k,
                probability,
                percent: round_to(probability * 100.0, percent_decimals),
                odds,
                exact,
            })
        })
        .collect();

    ProbabilityReport {
        selection: *selection,
        entries,
        total_combinations: small_choose(POOL_SIZE, PICK_COUNT),
    }
}

/// Valida e calcula; nada é calculado se a validação falhar.
pub fn distribution_for(numbers: &[i64], percent_decimals: u32) -> Result<ProbabilityReport> {
    let selection = selection::validate(numbers)?;
    Ok(compute_distribution_with(&selection, percent_decimals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn first_fifteen() -> Selection {
        let numbers: Vec<i64> = (1..=15).collect();
        selection::validate(&numbers).unwrap()
    }

    #[test]
    fn test_support_bounds() {
        assert_eq!(MIN_MATCHES, 5);
        assert_eq!(MAX_MATCHES, 15);
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let report = compute_distribution(&first_fifteen());
        assert_eq!(report.entries.len(), 11);
        let sum: f64 = report.entries.iter().map(|e| e.probability).sum();
        assert!((sum - 1.0).abs() < 1e-9, "Sum = {}", sum);
    }

    #[test]
    fn test_exact_numerators_sum_to_total() {
        // Vandermonde : Σ C(15,k) C(10,15-k) = C(25,15)
        let total: BigUint = (0..=15i64).map(|k| match_probability(k).numerator).sum();
        assert_eq!(total, total_combinations());
        assert_eq!(
            BigUint::from(compute_distribution(&first_fifteen()).total_combinations),
            total
        );
    }

    #[test]
    fn test_k5_matches_formula() {
        let report = compute_distribution(&first_fifteen());
        let expected = choose(15, 5) * choose(10, 10);
        let k5 = report.get(5).unwrap();
        assert_eq!(k5.exact.numerator, expected);
        assert_eq!(k5.exact.denominator, choose(25, 15));
        assert!((k5.probability - 3003.0 / 3_268_760.0).abs() < 1e-15);
    }

    #[test]
    fn test_k15_is_one_in_total() {
        let report = compute_distribution(&first_fifteen());
        let k15 = report.get(15).unwrap();
        assert!((k15.probability - 1.0 / 3_268_760.0).abs() < 1e-18);
        assert_eq!(k15.odds, BigUint::from(3_268_760u64));
        assert_eq!(k15.percent, 0.0);
    }

    #[test]
    fn test_known_odds_table() {
        let report = compute_distribution(&first_fifteen());
        let odds = |k: usize| report.get(k).unwrap().odds.to_string();
        assert_eq!(odds(11), "11");
        assert_eq!(odds(12), "60");
        assert_eq!(odds(13), "692");
        assert_eq!(odds(14), "21792");
        assert_eq!(odds(15), "3268760");
    }

    #[test]
    fn test_percent_has_four_decimals() {
        let report = compute_distribution(&first_fifteen());
        // P(11) = 286650 / 3268760 = 8.76938...%
        assert_eq!(report.get(11).unwrap().percent, 8.7694);
        // P(14) = 150 / 3268760 = 0.004588...%
        assert_eq!(report.get(14).unwrap().percent, 0.0046);
    }

    #[test]
    fn test_out_of_support_is_zero_not_error() {
        for k in 0..5 {
            assert_eq!(probability_of(k), 0.0, "k = {}", k);
        }
        assert_eq!(probability_of(16), 0.0);
        assert_eq!(probability_of(-1), 0.0);
        let uniform: f64 = (0..=15).map(probability_of).sum();
        assert!((uniform - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_independent() {
        let a = compute_distribution(&first_fifteen());
        let other: Vec<i64> = (11..=25).collect();
        let b = compute_distribution(&selection::validate(&other).unwrap());
        assert_eq!(a.entries, b.entries);
    }

    #[test]
    fn test_invalid_selection_propagates() {
        let short: Vec<i64> = (1..=14).collect();
        assert_eq!(
            distribution_for(&short, PERCENT_DECIMALS),
            Err(EngineError::InvalidSelectionSize { len: 14 })
        );
    }
}
