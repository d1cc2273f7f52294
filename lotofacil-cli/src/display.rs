use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use lotofacil_db::models::Draw;
use lotofacil_engine::frequency::patterns::CombinationAnalysis;
use lotofacil_engine::frequency::{DistributionReport, GeneralReport, PatternSummary, RankedEntry};
use lotofacil_engine::probability::ProbabilityReport;
use lotofacil_engine::suggestion::Suggestion;
use lotofacil_engine::temporal::{weekday_name, PeriodBucket, TrendEntry, TrendLabel};

use crate::import::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Nenhum concurso para exibir.");
        return;
    }

    let mut table = new_table(vec!["Concurso", "Data", "Dezenas", "Prêmio (15)", "Acumulou"]);
    for draw in draws {
        let prize = if draw.prize_amount > 0.0 {
            format!("R$ {:.2}", draw.prize_amount)
        } else {
            "—".to_string()
        };
        table.add_row(vec![
            draw.contest_number.to_string(),
            draw.draw_date.format("%d/%m/%Y").to_string(),
            join_numbers(&draw.numbers),
            prize,
            if draw.accumulated { "sim" } else { "não" }.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Importação concluída :");
    println!("  Linhas lidas       : {}", result.total_records);
    println!("  Inseridos          : {}", result.inserted);
    println!("  Repetidos ignorados: {}", result.skipped);
    if result.errors > 0 {
        println!("  Erros              : {}", result.errors);
    }
}

pub fn display_probabilities(report: &ProbabilityReport) {
    println!("\nAposta : {}\n", join_numbers(report.selection.numbers()));

    let mut table = new_table(vec!["Acertos", "Probabilidade (%)", "Chance (1 em)"]);
    for entry in &report.entries {
        let mut matches = Cell::new(entry.matches);
        if entry.matches >= 11 {
            matches = matches.fg(Color::Green);
        }
        table.add_row(vec![
            matches,
            Cell::new(format!("{:.4}", entry.percent)),
            Cell::new(entry.odds.to_string()),
        ]);
    }
    println!("{table}");
}

pub fn display_combination(analysis: &CombinationAnalysis) {
    let mut table = new_table(vec!["Soma", "Média", "Maior sequência", "Pares/Ímpares", "Baixos/Altos", "Primos"]);
    table.add_row(vec![
        analysis.sum.to_string(),
        format!("{:.2}", analysis.mean),
        analysis.longest_run.to_string(),
        format!("{}/{}", analysis.evens, analysis.odds),
        format!("{}/{}", analysis.lows, analysis.highs),
        analysis.primes.to_string(),
    ]);
    println!("{table}");
}

pub fn display_ranking(title: &str, entries: &[RankedEntry]) {
    println!("\n── {} ──", title);
    let mut table = new_table(vec!["#", "Dezenas", "Frequência"]);
    for (i, e) in entries.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            join_numbers(&e.numbers),
            e.count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_patterns(summary: &PatternSummary, dist: &DistributionReport) {
    println!("\nPadrões em {} concursos\n", summary.draws);

    let mut table = new_table(vec!["Medida", "Média por concurso"]);
    table.add_row(vec!["Pares".to_string(), format!("{:.2}", summary.mean_evens)]);
    table.add_row(vec!["Ímpares".to_string(), format!("{:.2}", summary.mean_odds)]);
    table.add_row(vec!["Baixos (1-12)".to_string(), format!("{:.2}", summary.mean_lows)]);
    table.add_row(vec!["Altos (13-25)".to_string(), format!("{:.2}", summary.mean_highs)]);
    table.add_row(vec!["Soma".to_string(), format!("{:.2}", summary.mean_sum)]);
    table.add_row(vec!["Maior sequência".to_string(), format!("{:.2}", summary.mean_longest_run)]);
    println!("{table}");

    let mut table = new_table(vec!["Distribuição", "Ocorrências"]);
    table.add_row(vec!["Pares / ímpares".to_string(), format!("{} / {}", dist.evens, dist.odds)]);
    table.add_row(vec!["Baixos / altos".to_string(), format!("{} / {}", dist.lows, dist.highs)]);
    table.add_row(vec!["Primos / não primos".to_string(), format!("{} / {}", dist.primes, dist.non_primes)]);
    for r in &dist.ranges {
        table.add_row(vec![format!("Faixa {:02}-{:02}", r.start, r.end), r.occurrences.to_string()]);
    }
    table.add_row(vec!["Pares consecutivos".to_string(), dist.consecutive_pairs.to_string()]);
    println!("{table}");
}

pub fn display_periods(buckets: &[PeriodBucket], weekdays: &[(chrono::Weekday, usize)], trend: &[TrendEntry]) {
    let mut table = new_table(vec!["Período", "Concursos", "Mais sorteada"]);
    for b in buckets {
        let top = b
            .frequency
            .as_ref()
            .and_then(|f| f.top_n(1, false).first().copied())
            .map(|(key, count)| format!("{:02} ({}x)", key[0], count))
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![b.label.clone(), b.draws.to_string(), top]);
    }
    println!("{table}");

    let mut table = new_table(vec!["Dia da semana", "Concursos"]);
    for (day, count) in weekdays {
        table.add_row(vec![weekday_name(*day).to_string(), count.to_string()]);
    }
    println!("{table}");

    println!("\n── Tendência recente ──");
    let mut table = new_table(vec!["Dezena", "Frequência recente", "Tendência"]);
    for t in trend {
        let color = match t.label {
            TrendLabel::High => Color::Green,
            TrendLabel::Medium => Color::Yellow,
            TrendLabel::Low => Color::Red,
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", t.number)),
            Cell::new(t.recent_frequency),
            Cell::new(t.label.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_suggestion(suggestion: &Suggestion) {
    println!("\n🎯 {}\n", suggestion.strategy);
    let mut table = new_table(vec!["Dezenas sugeridas"]);
    table.add_row(vec![join_numbers(&suggestion.numbers)]);
    println!("{table}");
    println!("{}", suggestion.disclaimer);
}

pub fn display_general(report: &GeneralReport) {
    println!("\n📊 Estatísticas de {} concursos\n", report.draws);
    println!("  Soma média                  : {:.2}", report.mean_sum);
    println!("  Repetidas do anterior       : {:.2}", report.mean_repetition);
    println!("  Maior sequência             : {}", report.max_run);
    println!("  Mais frequente              : {:02}", report.most_frequent);
    println!("  Menos frequente             : {:02}\n", report.least_frequent);

    let mut table = new_table(vec!["Dezena", "Freq. relativa", "Intervalo médio", "Maior intervalo", "Atraso"]);
    for ((number, rel), interval) in report.relative_frequency.iter().zip(&report.intervals) {
        let dash = || "—".to_string();
        table.add_row(vec![
            format!("{:02}", number),
            format!("{:.4}", rel),
            interval.mean_interval.map(|m| format!("{:.2}", m)).unwrap_or_else(dash),
            interval.max_interval.map(|m| m.to_string()).unwrap_or_else(dash),
            interval.since_last.map(|m| m.to_string()).unwrap_or_else(dash),
        ]);
    }
    println!("{table}");
}
