//! Tabelas densas de contagem por combinação de dezenas.
//!
//! Uma combinação ordenada `a1 < a2 < ... < aK` ocupa a posição
//! `Σ C(ai - 1, i)` (sistema combinatório, ordem colex), logo uma tabela de
//! ordem K tem exatamente C(25, K) posições.

use lotofacil_db::models::{PICK_COUNT, POOL_SIZE};

use crate::combinatorics::{small_choose, SMALL_BINOMIAL};

/// Pares incrementados por concurso : C(15, 2).
pub const PAIRS_PER_DRAW: u64 = SMALL_BINOMIAL[PICK_COUNT][2];
/// Trincas incrementadas por concurso : C(15, 3).
pub const TRIPLES_PER_DRAW: u64 = SMALL_BINOMIAL[PICK_COUNT][3];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboTable<const K: usize> {
    counts: Vec<u64>,
}

/// Frequência de cada dezena.
pub type FrequencyTable = ComboTable<1>;
/// Coocorrência de pares.
pub type PairTable = ComboTable<2>;
/// Coocorrência de trincas.
pub type TripleTable = ComboTable<3>;

impl<const K: usize> Default for ComboTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const K: usize> ComboTable<K> {
    pub fn new() -> Self {
        Self {
            counts: vec![0; Self::slots()],
        }
    }

    pub fn slots() -> usize {
        small_choose(POOL_SIZE, K) as usize
    }

    /// Posição de uma combinação; `None` se não for estritamente crescente em 1..=25.
    pub fn rank(key: &[u8; K]) -> Option<usize> {
        let mut rank = 0usize;
        let mut prev = 0u8;
        for (i, &n) in key.iter().enumerate() {
            if n <= prev || n as usize > POOL_SIZE {
                return None;
            }
            rank += small_choose(n as usize - 1, i + 1) as usize;
            prev = n;
        }
        Some(rank)
    }

    pub fn unrank(mut rank: usize) -> [u8; K] {
        let mut key = [0u8; K];
        let mut upper = POOL_SIZE;
        for i in (0..K).rev() {
            // maior c com C(c, i + 1) <= rank
            let mut c = upper;
            while c > i && small_choose(c - 1, i + 1) as usize > rank {
                c -= 1;
            }
            let c = c - 1;
            key[i] = (c + 1) as u8;
            rank -= small_choose(c, i + 1) as usize;
            upper = c;
        }
        key
    }

    /// Incrementa toda combinação de K dezenas de um concurso (`numbers` em ordem crescente).
    pub fn record(&mut self, numbers: &[u8]) {
        for_each_subset::<K>(numbers, |key| {
            if let Some(rank) = Self::rank(&key) {
                self.counts[rank] += 1;
            }
        });
    }

    /// Contagem de uma combinação em qualquer ordem; zero se inválida.
    pub fn get(&self, mut key: [u8; K]) -> u64 {
        key.sort_unstable();
        Self::rank(&key).map_or(0, |r| self.counts[r])
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn merge(&mut self, other: &Self) {
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ([u8; K], u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(rank, &count)| (Self::unrank(rank), count))
    }

    /// As `n` combinações de maior contagem (ou menor, se `ascending`).
    /// Empates saem em ordem crescente da combinação.
    pub fn top_n(&self, n: usize, ascending: bool) -> Vec<([u8; K], u64)> {
        let mut entries: Vec<([u8; K], u64)> = self.iter().collect();
        entries.sort_by(|a, b| {
            let by_count = if ascending { a.1.cmp(&b.1) } else { b.1.cmp(&a.1) };
            by_count.then_with(|| a.0.cmp(&b.0))
        });
        entries.truncate(n);
        entries
    }
}

impl ComboTable<1> {
    pub fn count(&self, number: u8) -> u64 {
        self.get([number])
    }

    /// (dezena, contagem) para 1..=25.
    pub fn numbers(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| (i as u8 + 1, count))
    }
}

/// Visita cada subconjunto de tamanho K de `numbers`, preservando a ordem.
pub fn for_each_subset<const K: usize>(numbers: &[u8], mut f: impl FnMut([u8; K])) {
    let n = numbers.len();
    if K == 0 || K > n {
        return;
    }
    let mut idx = [0usize; K];
    for (i, slot) in idx.iter_mut().enumerate() {
        *slot = i;
    }
    loop {
        let mut key = [0u8; K];
        for (slot, &i) in key.iter_mut().zip(&idx) {
            *slot = numbers[i];
        }
        f(key);

        let mut i = K;
        while i > 0 && idx[i - 1] == n - K + i - 1 {
            i -= 1;
        }
        if i == 0 {
            return;
        }
        idx[i - 1] += 1;
        for j in i..K {
            idx[j] = idx[j - 1] + 1;
        }
    }
}
