//! Propriedades estruturais de um conjunto de dezenas.

use crate::selection::Selection;

/// Primos até 25.
pub const PRIMES: [u8; 9] = [2, 3, 5, 7, 11, 13, 17, 19, 23];
/// Dezenas 1..=12 são "baixas", 13..=25 "altas".
pub const LOW_MAX: u8 = 12;
/// Faixas de dezenas (inclusivas).
pub const RANGES: [(u8, u8); 3] = [(1, 10), (11, 20), (21, 25)];

pub fn is_prime(n: u8) -> bool {
    PRIMES.contains(&n)
}

pub fn is_low(n: u8) -> bool {
    n <= LOW_MAX
}

pub fn even_count(numbers: &[u8]) -> usize {
    numbers.iter().filter(|&&n| n % 2 == 0).count()
}

pub fn low_count(numbers: &[u8]) -> usize {
    numbers.iter().filter(|&&n| is_low(n)).count()
}

pub fn prime_count(numbers: &[u8]) -> usize {
    numbers.iter().filter(|&&n| is_prime(n)).count()
}

pub fn sum(numbers: &[u8]) -> u32 {
    numbers.iter().map(|&n| n as u32).sum()
}

/// Pares (n, n+1) presentes; `numbers` em ordem crescente.
pub fn consecutive_pairs(numbers: &[u8]) -> usize {
    numbers.windows(2).filter(|w| w[1] == w[0] + 1).count()
}

/// Maior sequência de dezenas consecutivas; `numbers` em ordem crescente.
pub fn longest_run(numbers: &[u8]) -> usize {
    if numbers.is_empty() {
        return 0;
    }
    let mut best = 1;
    let mut current = 1;
    for w in numbers.windows(2) {
        if w[1] == w[0] + 1 {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    best
}

/// Quantas dezenas dois concursos (ordenados) têm em comum.
pub fn overlap(a: &[u8], b: &[u8]) -> usize {
    let (mut i, mut j, mut common) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                common += 1;
                i += 1;
                j += 1;
            }
        }
    }
    common
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinationAnalysis {
    pub numbers: Vec<u8>,
    pub sum: u32,
    pub mean: f64,
    pub longest_run: usize,
    pub evens: usize,
    pub odds: usize,
    pub lows: usize,
    pub highs: usize,
    pub primes: usize,
}

pub fn analyze_combination(selection: &Selection) -> CombinationAnalysis {
    let numbers = selection.numbers();
    let total = sum(numbers);
    let evens = even_count(numbers);
    let lows = low_count(numbers);
    CombinationAnalysis {
        numbers: numbers.to_vec(),
        sum: total,
        mean: total as f64 / numbers.len() as f64,
        longest_run: longest_run(numbers),
        evens,
        odds: numbers.len() - evens,
        lows,
        highs: numbers.len() - lows,
        primes: prime_count(numbers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection;

    #[test]
    fn test_runs_and_pairs() {
        assert_eq!(longest_run(&[1, 2, 3, 5, 6, 9]), 3);
        assert_eq!(consecutive_pairs(&[1, 2, 3, 5, 6, 9]), 3);
        assert_eq!(longest_run(&[4]), 1);
        assert_eq!(longest_run(&[]), 0);
        assert_eq!(consecutive_pairs(&[2, 4, 6]), 0);
    }

    #[test]
    fn test_overlap() {
        assert_eq!(overlap(&[1, 2, 3, 4], &[2, 4, 6]), 2);
        assert_eq!(overlap(&[1, 3], &[2, 4]), 0);
    }

    #[test]
    fn test_counts() {
        let numbers: Vec<u8> = (1..=15).collect();
        assert_eq!(even_count(&numbers), 7);
        assert_eq!(low_count(&numbers), 12);
        assert_eq!(prime_count(&numbers), 6);
        assert_eq!(sum(&numbers), 120);
    }

    #[test]
    fn test_analyze_combination() {
        let input: Vec<i64> = (1..=14).chain([25]).collect();
        let sel = selection::validate(&input).unwrap();
        let analysis = analyze_combination(&sel);
        assert_eq!(analysis.sum, 130);
        assert!((analysis.mean - 130.0 / 15.0).abs() < 1e-12);
        assert_eq!(analysis.longest_run, 14);
        assert_eq!(analysis.evens, 7);
        assert_eq!(analysis.odds, 8);
        assert_eq!(analysis.lows, 12);
        assert_eq!(analysis.highs, 3);
        assert_eq!(analysis.primes, 6);
    }
}
