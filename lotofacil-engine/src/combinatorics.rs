//! Aritmética combinatória exata.
//!
//! `choose` trabalha com inteiros de precisão arbitrária; a tabela de Pascal
//! `SMALL_BINOMIAL` cobre apenas `n <= 25`, onde todo C(n, r) cabe em `u64`.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use lotofacil_db::models::POOL_SIZE;

/// C(n, r), exato. Zero quando `r < 0`, `n < 0` ou `r > n`.
pub fn choose(n: i64, r: i64) -> BigUint {
    if n < 0 || r < 0 || r > n {
        return BigUint::zero();
    }
    // C(n, r) = C(n, n - r) : menos iterações
    let r = r.min(n - r) as u64;
    let n = n as u64;

    let mut acc = BigUint::one();
    for i in 0..r {
        // acc * (n - i) é sempre divisível por (i + 1) : acc = C(n, i) neste ponto
        acc *= n - i;
        acc /= i + 1;
    }
    acc
}

pub const SMALL_BINOMIAL: [[u64; POOL_SIZE + 1]; POOL_SIZE + 1] = pascal();

const fn pascal() -> [[u64; POOL_SIZE + 1]; POOL_SIZE + 1] {
    let mut t = [[0u64; POOL_SIZE + 1]; POOL_SIZE + 1];
    let mut n = 0;
    while n <= POOL_SIZE {
        t[n][0] = 1;
        let mut r = 1;
        while r <= n {
            t[n][r] = t[n - 1][r - 1] + t[n - 1][r];
            r += 1;
        }
        n += 1;
    }
    t
}

/// C(n, r) para `n <= 25`; zero fora da tabela.
pub fn small_choose(n: usize, r: usize) -> u64 {
    if n > POOL_SIZE || r > n {
        return 0;
    }
    SMALL_BINOMIAL[n][r]
}

/// Razão exata `numerator / denominator` entre inteiros não negativos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactRatio {
    pub numerator: BigUint,
    pub denominator: BigUint,
}

impl ExactRatio {
    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn to_f64(&self) -> f64 {
        match (self.numerator.to_f64(), self.denominator.to_f64()) {
            (Some(n), Some(d)) if d > 0.0 => n / d,
            _ => 0.0,
        }
    }

    /// round(denominator / numerator), meio arredondado para longe de zero.
    /// `None` quando a razão é zero.
    pub fn rounded_reciprocal(&self) -> Option<BigUint> {
        if self.numerator.is_zero() {
            return None;
        }
        // floor((2d + n) / 2n) = round(d / n) com empate para cima
        let two = BigUint::from(2u32);
        Some((&self.denominator * &two + &self.numerator) / (&self.numerator * &two))
    }
}

/// Probabilidade hipergeométrica exata de `k` sucessos numa amostra de
/// `sample` itens retirada sem reposição de `population` itens dos quais
/// `successes` são sucessos.
pub fn hypergeometric(population: i64, successes: i64, sample: i64, k: i64) -> ExactRatio {
    ExactRatio {
        numerator: choose(successes, k) * choose(population - successes, sample - k),
        denominator: choose(population, sample),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_known_values() {
        assert_eq!(choose(25, 15), BigUint::from(3_268_760u64));
        assert_eq!(choose(15, 5), BigUint::from(3003u32));
        assert_eq!(choose(10, 10), BigUint::one());
        assert_eq!(choose(0, 0), BigUint::one());
        assert_eq!(choose(5, 0), BigUint::one());
    }

    #[test]
    fn test_choose_symmetry() {
        assert_eq!(choose(25, 15), choose(25, 10));
        for r in 0..=25 {
            assert_eq!(choose(25, r), choose(25, 25 - r));
        }
    }

    #[test]
    fn test_choose_out_of_domain_is_zero() {
        assert!(choose(10, 11).is_zero());
        assert!(choose(10, -1).is_zero());
        assert!(choose(-3, 2).is_zero());
    }

    #[test]
    fn test_choose_does_not_overflow() {
        // C(100, 50) > u64::MAX
        let big = choose(100, 50);
        assert_eq!(
            big.to_string(),
            "100891344545564193334812497256"
        );
    }

    #[test]
    fn test_small_table_matches_choose() {
        for n in 0..=POOL_SIZE {
            for r in 0..=n {
                assert_eq!(
                    BigUint::from(small_choose(n, r)),
                    choose(n as i64, r as i64),
                    "C({}, {})",
                    n,
                    r
                );
            }
        }
        assert_eq!(small_choose(3, 4), 0);
        assert_eq!(small_choose(26, 1), 0);
    }

    #[test]
    fn test_rounded_reciprocal_ties_away_from_zero() {
        let ratio = ExactRatio {
            numerator: BigUint::from(2u32),
            denominator: BigUint::from(5u32),
        };
        // 5 / 2 = 2.5 -> 3
        assert_eq!(ratio.rounded_reciprocal(), Some(BigUint::from(3u32)));

        let ratio = ExactRatio {
            numerator: BigUint::from(3u32),
            denominator: BigUint::from(7u32),
        };
        // 7 / 3 = 2.33 -> 2
        assert_eq!(ratio.rounded_reciprocal(), Some(BigUint::from(2u32)));

        let zero = ExactRatio {
            numerator: BigUint::zero(),
            denominator: BigUint::one(),
        };
        assert_eq!(zero.rounded_reciprocal(), None);
        assert_eq!(zero.to_f64(), 0.0);
    }

    #[test]
    fn test_hypergeometric_full_match() {
        let p = hypergeometric(25, 15, 15, 15);
        assert_eq!(p.numerator, BigUint::one());
        assert_eq!(p.denominator, BigUint::from(3_268_760u64));
    }
}
