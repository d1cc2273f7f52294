use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use lotofacil_db::rusqlite::Connection;
use tracing::warn;

use lotofacil_db::db::insert_draw;
use lotofacil_db::models::{parse_draw_date, Draw, PICK_COUNT};

/// Colunas : Concurso;Data;Bola1..Bola15[;Premio15;Acumulado]
const FIRST_BALL: usize = 2;
const PRIZE_COL: usize = FIRST_BALL + PICK_COUNT;
const ACCUMULATED_COL: usize = PRIZE_COL + 1;

/// `1.234.567,89` (com ou sem `R$`) → 1234567.89. Vazio vale 0.
pub fn parse_brazilian_decimal(s: &str) -> Result<f64> {
    let s = s.trim().trim_start_matches("R$").trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    let normalized = s.replace('.', "").replace(',', ".");
    normalized
        .parse::<f64>()
        .with_context(|| format!("Não foi possível ler o valor: '{}'", s))
}

pub fn parse_accumulated(s: &str) -> bool {
    matches!(
        s.trim().to_uppercase().as_str(),
        "SIM" | "S" | "TRUE" | "1"
    )
}

fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Campo ausente no índice {}", idx))
    };

    let raw_contest = get(0)?;
    let contest: u32 = raw_contest
        .parse()
        .with_context(|| format!("Número de concurso inválido: '{}'", raw_contest))?;

    let raw_date = get(1)?;
    let date = parse_draw_date(&raw_date).with_context(|| format!("Data inválida: '{}'", raw_date))?;

    let numbers = (FIRST_BALL..PRIZE_COL)
        .map(|idx| {
            let s = get(idx)?;
            s.parse::<u8>()
                .with_context(|| format!("Dezena inválida '{}' (índice {})", s, idx))
        })
        .collect::<Result<Vec<u8>>>()?;

    let prize = match record.get(PRIZE_COL) {
        Some(raw) => parse_brazilian_decimal(raw)?,
        None => 0.0,
    };
    let accumulated = record.get(ACCUMULATED_COL).is_some_and(parse_accumulated);

    Draw::new(contest, date, &numbers, prize, accumulated)
        .with_context(|| format!("Concurso {} inválido", contest))
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Não foi possível abrir {:?}", path))?;

    let records: Vec<csv::Result<csv::StringRecord>> = reader.records().collect();

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .context("Modelo de barra de progresso inválido")?
            .progress_chars("=> "),
    );

    let tx = conn
        .unchecked_transaction()
        .context("Não foi possível iniciar a transação")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in records {
        result.total_records += 1;
        let line = result.total_records + 1;
        match record_result
            .context("leitura")
            .and_then(|record| parse_record(&record))
        {
            Ok(draw) => match insert_draw(&tx, &draw) {
                Ok(true) => result.inserted += 1,
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    warn!(line, contest = draw.contest_number, "falha ao inserir: {:#}", e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                warn!(line, "linha ignorada: {:#}", e);
                result.errors += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    tx.commit().context("Falha no commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotofacil_db::db::{count_draws, fetch_all_draws, migrate};
    use std::io::Write;

    const HEADER: &str = "Concurso;Data;Bola1;Bola2;Bola3;Bola4;Bola5;Bola6;Bola7;Bola8;Bola9;Bola10;Bola11;Bola12;Bola13;Bola14;Bola15;Premio15;Acumulado";

    fn write_csv(name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("lotofacil-{}-{}.csv", name, std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{}", HEADER).unwrap();
        for l in lines {
            writeln!(f, "{}", l).unwrap();
        }
        path
    }

    #[test]
    fn test_parse_brazilian_decimal() {
        assert!((parse_brazilian_decimal("1.234.567,89").unwrap() - 1234567.89).abs() < 0.001);
        assert!((parse_brazilian_decimal("R$ 3,80").unwrap() - 3.80).abs() < 0.001);
        assert!((parse_brazilian_decimal("").unwrap() - 0.0).abs() < 0.001);
        assert!((parse_brazilian_decimal(" 42 ").unwrap() - 42.0).abs() < 0.001);
        assert!(parse_brazilian_decimal("muito").is_err());
    }

    #[test]
    fn test_parse_accumulated() {
        assert!(parse_accumulated("SIM"));
        assert!(parse_accumulated(" sim "));
        assert!(!parse_accumulated("NAO"));
        assert!(!parse_accumulated(""));
    }

    #[test]
    fn test_import_csv() {
        let path = write_csv(
            "import",
            &[
                "1;29/09/2003;2;3;5;6;9;10;11;13;14;16;18;20;23;24;25;49.765,82;NAO",
                "2;06/10/2003 20:00;1;4;5;6;7;9;11;12;13;15;16;19;20;23;24;596.323,70;SIM",
                "2;06/10/2003;1;4;5;6;7;9;11;12;13;15;16;19;20;23;24;0;NAO",
                "3;13/10/2003;1;1;5;6;7;9;11;12;13;15;16;19;20;23;24",
                "4;data;1;4;5;6;7;9;11;12;13;15;16;19;20;23;24",
                "5;20/10/2003;1;2;3;4;5;6;7;8;9;10;11;12;13;14;15",
            ],
        );
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let result = import_csv(&conn, &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(result.total_records, 6);
        assert_eq!(result.inserted, 3);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 2);
        assert_eq!(count_draws(&conn).unwrap(), 3);

        let draws = fetch_all_draws(&conn).unwrap();
        assert!((draws[0].prize_amount - 49765.82).abs() < 0.001);
        assert!(draws[1].accumulated);
        assert_eq!(draws[1].draw_date.format("%H:%M").to_string(), "20:00");
        assert_eq!(draws[2].contest_number, 5);
        assert_eq!(draws[2].prize_amount, 0.0);
    }

    #[test]
    fn test_import_missing_file() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let missing = std::env::temp_dir().join("lotofacil-nao-existe.csv");
        assert!(import_csv(&conn, &missing).is_err());
    }
}
