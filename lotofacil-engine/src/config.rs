use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tamanho padrão dos rankings quando a requisição não traz `limite`.
    pub default_limit: usize,
    /// Concursos mais recentes considerados na tendência.
    pub trend_window: usize,
    /// Acima disto (na janela de tendência) a dezena é "alta".
    pub trend_high: u64,
    /// Acima disto, "media"; senão "baixa".
    pub trend_medium: u64,
    /// Fração da sugestão tirada das dezenas mais sorteadas.
    pub suggestion_frequent_share: f64,
    pub default_suggestion_size: usize,
    pub percent_decimals: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            trend_window: 20,
            trend_high: 4,
            trend_medium: 2,
            suggestion_frequent_share: 0.6,
            default_suggestion_size: 15,
            percent_decimals: 4,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.trend_window == 0 {
            return Err(EngineError::InvalidConfig("trend_window deve ser positivo".into()));
        }
        if self.trend_medium > self.trend_high {
            return Err(EngineError::InvalidConfig(format!(
                "trend_medium ({}) maior que trend_high ({})",
                self.trend_medium, self.trend_high
            )));
        }
        if !(0.0..=1.0).contains(&self.suggestion_frequent_share) {
            return Err(EngineError::InvalidConfig(format!(
                "suggestion_frequent_share fora de [0, 1]: {}",
                self.suggestion_frequent_share
            )));
        }
        if self.default_suggestion_size == 0
            || self.default_suggestion_size > lotofacil_db::models::POOL_SIZE
        {
            return Err(EngineError::InvalidConfig(format!(
                "default_suggestion_size fora de 1-25: {}",
                self.default_suggestion_size
            )));
        }
        if self.percent_decimals > 12 {
            return Err(EngineError::InvalidConfig(format!(
                "percent_decimals acima de 12: {}",
                self.percent_decimals
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.percent_decimals, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"trend_window": 30}"#).unwrap();
        assert_eq!(config.trend_window, 30);
        assert_eq!(config.default_limit, 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            trend_medium: 9,
            trend_high: 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let config = EngineConfig {
            suggestion_frequent_share: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
