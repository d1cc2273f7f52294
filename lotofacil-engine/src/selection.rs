use lotofacil_db::models::{PICK_COUNT, POOL_SIZE};

use crate::error::{EngineError, Result};

/// Aposta validada : 15 dezenas distintas em 1..=25, em ordem crescente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    numbers: [u8; PICK_COUNT],
}

impl Selection {
    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.numbers
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.binary_search(&number).is_ok()
    }
}

/// Valida uma lista de dezenas vinda do chamador.
///
/// Ordem das verificações : tamanho, limites, duplicidade.
pub fn validate(numbers: &[i64]) -> Result<Selection> {
    if numbers.len() != PICK_COUNT {
        return Err(EngineError::InvalidSelectionSize { len: numbers.len() });
    }
    if let Some(&bad) = numbers
        .iter()
        .find(|&&n| n < 1 || n > POOL_SIZE as i64)
    {
        return Err(EngineError::OutOfRange(bad));
    }

    let mut seen = [false; POOL_SIZE + 1];
    let mut sorted = [0u8; PICK_COUNT];
    for (slot, &n) in sorted.iter_mut().zip(numbers) {
        let n = n as u8;
        if seen[n as usize] {
            return Err(EngineError::DuplicateNumber(n));
        }
        seen[n as usize] = true;
        *slot = n;
    }
    sorted.sort_unstable();

    Ok(Selection { numbers: sorted })
}
