use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Dezenas possíveis (1 a 25).
pub const POOL_SIZE: usize = 25;
/// Dezenas sorteadas por concurso, e dezenas marcadas por aposta.
pub const PICK_COUNT: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub contest_number: u32,
    pub draw_date: NaiveDateTime,
    /// Sempre em ordem crescente.
    pub numbers: [u8; PICK_COUNT],
    pub prize_amount: f64,
    pub accumulated: bool,
}

impl Draw {
    pub fn new(
        contest_number: u32,
        draw_date: NaiveDateTime,
        numbers: &[u8],
        prize_amount: f64,
        accumulated: bool,
    ) -> Result<Self> {
        if contest_number == 0 {
            bail!("Número de concurso deve ser positivo");
        }
        if !(prize_amount >= 0.0) {
            bail!("Prêmio inválido no concurso {}: {}", contest_number, prize_amount);
        }
        validate_draw(numbers)?;

        let mut sorted = [0u8; PICK_COUNT];
        sorted.copy_from_slice(numbers);
        sorted.sort_unstable();

        Ok(Self {
            contest_number,
            draw_date,
            numbers: sorted,
            prize_amount,
            accumulated,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.draw_date.date()
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.binary_search(&number).is_ok()
    }
}

pub fn validate_draw(numbers: &[u8]) -> Result<()> {
    if numbers.len() != PICK_COUNT {
        bail!(
            "Um concurso tem {} dezenas, recebidas {}",
            PICK_COUNT,
            numbers.len()
        );
    }
    let mut seen = [false; POOL_SIZE + 1];
    for &n in numbers {
        if n < 1 || n as usize > POOL_SIZE {
            bail!("Dezena {} fora dos limites (1-{})", n, POOL_SIZE);
        }
        if seen[n as usize] {
            bail!("Dezena em duplicidade : {}", n);
        }
        seen[n as usize] = true;
    }
    Ok(())
}

/// Aceita ISO (`2024-03-15`, `2024-03-15T20:00:00`, `2024-03-15 20:00`) e o
/// formato brasileiro (`15/03/2024`, `15/03/2024 20:00`). Sem hora, meia-noite.
pub fn parse_draw_date(raw: &str) -> Option<NaiveDateTime> {
    const DATE_TIMES: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    const DATES: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

    let raw = raw.trim();
    DATE_TIMES
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATES
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Histórico sintético e determinístico, em ordem crescente de concurso.
/// Cada concurso pega 15 dezenas consecutivas (circularmente) a partir de um deslocamento variável.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(20, 0, 0))
        .unwrap_or_default();

    (0..n)
        .map(|i| {
            let offset = (i * 7) % POOL_SIZE;
            let mut numbers = [0u8; PICK_COUNT];
            for (j, slot) in numbers.iter_mut().enumerate() {
                *slot = ((offset + j) % POOL_SIZE + 1) as u8;
            }
            numbers.sort_unstable();
            Draw {
                contest_number: i as u32 + 1,
                draw_date: start + chrono::Duration::days(2 * i as i64),
                numbers,
                prize_amount: 1_500_000.0,
                accumulated: i % 5 == 0,
            }
        })
        .collect()
}
