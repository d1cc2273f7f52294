//! Sugestão de aposta a partir do ranking de frequências.
//!
//! Não é previsão : os sorteios são independentes e a sugestão só combina
//! dezenas mais e menos sorteadas do histórico.

use lotofacil_db::models::POOL_SIZE;

use crate::error::{EngineError, Result};
use crate::frequency::FrequencyTable;

pub const STRATEGY: &str = "Combinação de números mais e menos frequentes";
pub const DISCLAIMER: &str =
    "Esta é apenas uma sugestão baseada em estatísticas. Não garante vitória.";

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub numbers: Vec<u8>,
    pub strategy: &'static str,
    pub disclaimer: &'static str,
}

pub fn suggest_numbers(
    frequency: &FrequencyTable,
    quantity: i64,
    frequent_share: f64,
) -> Result<Suggestion> {
    if quantity < 1 || quantity > POOL_SIZE as i64 {
        return Err(EngineError::InvalidQuantity(quantity));
    }
    let quantity = quantity as usize;

    // decrescente por frequência, empate pela menor dezena
    let ranking: Vec<u8> = frequency
        .top_n(POOL_SIZE, false)
        .into_iter()
        .map(|(key, _)| key[0])
        .collect();

    let from_top = ((quantity as f64 * frequent_share).floor() as usize).min(quantity);
    let from_bottom = quantity - from_top;

    let mut picked: Vec<u8> = Vec::with_capacity(quantity);
    let candidates = ranking[..from_top]
        .iter()
        .chain(&ranking[POOL_SIZE - from_bottom..])
        .chain(&ranking);
    for &n in candidates {
        if picked.len() == quantity {
            break;
        }
        if !picked.contains(&n) {
            picked.push(n);
        }
    }
    picked.sort_unstable();

    Ok(Suggestion {
        numbers: picked,
        strategy: STRATEGY,
        disclaimer: DISCLAIMER,
    })
}
