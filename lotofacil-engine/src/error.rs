use thiserror::Error;

use lotofacil_db::models::{PICK_COUNT, POOL_SIZE};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("a aposta deve ter {} dezenas, recebidas {len}", PICK_COUNT)]
    InvalidSelectionSize { len: usize },
    #[error("dezena repetida: {0}")]
    DuplicateNumber(u8),
    #[error("dezena {0} fora dos limites (1-{})", POOL_SIZE)]
    OutOfRange(i64),
    #[error("nenhum concurso disponível para análise")]
    EmptyHistory,
    #[error("base de concursos indisponível: {0}")]
    LedgerUnavailable(String),
    #[error("concurso {contest} inválido: {reason}")]
    InvalidDraw { contest: u32, reason: String },
    #[error("concurso {contest} não é posterior ao último agregado ({latest})")]
    StaleDraw { contest: u32, latest: u32 },
    #[error("tipo de cálculo não reconhecido: {0}")]
    UnknownRequest(String),
    #[error("requisição malformada: {0}")]
    MalformedRequest(String),
    #[error("quantidade inválida: {0} (esperado 1-{})", POOL_SIZE)]
    InvalidQuantity(i64),
    #[error("configuração inválida: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Erros de entrada do chamador: nunca adianta repetir a mesma requisição.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, EngineError::LedgerUnavailable(_))
    }
}
