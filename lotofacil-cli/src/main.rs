mod display;
mod import;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lotofacil_db::db::db_path;
use lotofacil_db::ledger::SqliteLedger;
use lotofacil_db::models::{parse_draw_date, Draw, PICK_COUNT};
use lotofacil_engine::frequency::patterns::analyze_combination;
use lotofacil_engine::frequency::TableKind;
use lotofacil_engine::probability::compute_distribution_with;
use lotofacil_engine::selection;
use lotofacil_engine::suggestion::suggest_numbers;
use lotofacil_engine::temporal::{by_period, by_weekday, recent_trend, Granularity};
use lotofacil_engine::{AnalyticsEngine, EngineConfig, ReportAssembler, Snapshot};

use crate::display::{
    display_combination, display_draws, display_general, display_import_summary, display_patterns,
    display_periods, display_probabilities, display_ranking, display_suggestion,
};

#[derive(Parser)]
#[command(name = "lotofacil", about = "Analisador de probabilidades e estatísticas da Lotofácil")]
struct Cli {
    /// Caminho da base SQLite (padrão : ./data/lotofacil.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Arquivo JSON com a configuração do motor
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Intervalo de datas opcional (ISO, inclusivo). Sem ele, todo o histórico.
#[derive(clap::Args, Clone, Copy)]
struct RangeArgs {
    /// Data inicial (AAAA-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Data final (AAAA-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Command {
    /// Importar concursos de um arquivo CSV
    Import {
        /// Caminho do arquivo CSV (separador ';')
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Mostrar o caminho da base de dados
    DbPath,

    /// Listar os últimos concursos
    List {
        /// Quantidade de concursos
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Cadastrar um concurso manualmente
    Add,

    /// Distribuição exata de acertos para uma aposta de 15 dezenas
    Probability {
        /// As 15 dezenas da aposta
        #[arg(num_args = 1.., allow_negative_numbers = true)]
        numbers: Vec<i64>,
    },

    /// Dezenas mais e menos sorteadas
    Frequency {
        /// Tamanho do ranking
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Pares e trincas que mais saíram juntos
    Combos {
        /// Tamanho do ranking
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Médias de pares/ímpares, baixos/altos, soma e sequência por concurso
    Patterns {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Concursos por período, por dia da semana e tendência recente
    Temporal {
        /// hora, dia, mes ou ano
        #[arg(short, long, default_value = "mes")]
        granularity: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Sugerir dezenas combinando as mais e as menos sorteadas
    Suggest {
        /// Quantidade de dezenas (1-25)
        #[arg(short, long)]
        quantity: Option<i64>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Estatísticas gerais : somas, repetições, intervalos
    Stats {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Executar uma requisição JSON crua e imprimir a resposta
    Exec {
        /// Tipo do cálculo (ex : probabilidade_simples)
        tipo: String,

        /// Corpo JSON; '-' lê da entrada padrão
        #[arg(default_value = "{}")]
        json: String,
    },

    /// Mostrar a configuração efetiva
    Config {
        /// Imprimir como JSON
        #[arg(long)]
        dump: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Não foi possível ler a configuração {:?}", path))?;
            serde_json::from_str::<EngineConfig>(&raw)
                .with_context(|| format!("Configuração inválida em {:?}", path))?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let path = cli.db.unwrap_or_else(db_path);

    match cli.command {
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::Config { dump } => cmd_config(&config, dump),
        Command::Probability { numbers } => cmd_probability(&config, &numbers),
        command => {
            let ledger = Arc::new(SqliteLedger::open(&path)?);
            run_with_ledger(ledger, config, command)
        }
    }
}

fn run_with_ledger(ledger: Arc<SqliteLedger>, config: EngineConfig, command: Command) -> Result<()> {
    match command {
        Command::Import { file } => {
            let result = ledger.with_connection(|conn| import::import_csv(conn, &file))?;
            display_import_summary(&result);
            Ok(())
        }
        Command::List { last } => {
            if ledger.count()? == 0 {
                println!("Base vazia. Rode primeiro : lotofacil import");
                return Ok(());
            }
            display_draws(&ledger.last_draws(last)?);
            Ok(())
        }
        Command::Add => cmd_add(&ledger),
        Command::Exec { tipo, json } => {
            let engine = AnalyticsEngine::load(ledger, config)?;
            let body = if json == "-" {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Erro de leitura da entrada padrão")?;
                buf
            } else {
                json
            };
            let assembler = ReportAssembler::new(Arc::new(engine));
            println!("{}", assembler.execute_calculation(&tipo, &body));
            Ok(())
        }
        command => {
            let engine = AnalyticsEngine::load(ledger, config)?;
            if engine.snapshot().is_empty() {
                println!("Base vazia. Rode primeiro : lotofacil import");
                return Ok(());
            }
            run_analysis(&engine, command)
        }
    }
}

fn scope(engine: &AnalyticsEngine, range: RangeArgs) -> Result<Arc<Snapshot>> {
    let snapshot = match (range.from, range.to) {
        (None, None) => engine.snapshot(),
        (Some(start), Some(end)) => Arc::new(engine.scoped(start, end)?),
        _ => bail!("Informe --from e --to juntos"),
    };
    if snapshot.is_empty() {
        bail!("Nenhum concurso no intervalo informado");
    }
    Ok(snapshot)
}

fn run_analysis(engine: &AnalyticsEngine, command: Command) -> Result<()> {
    let config = engine.config();
    match command {
        Command::Frequency { limit, range } => {
            let snap = scope(engine, range)?;
            let limit = limit.unwrap_or(config.default_limit);
            println!("\n{} concursos analisados", snap.aggregator.draw_count());
            display_ranking("Mais sorteadas", &snap.aggregator.top_n(TableKind::Singles, limit, false));
            display_ranking("Menos sorteadas", &snap.aggregator.top_n(TableKind::Singles, limit, true));
        }
        Command::Combos { limit, range } => {
            let snap = scope(engine, range)?;
            let limit = limit.unwrap_or(config.default_limit);
            display_ranking("Pares frequentes", &snap.aggregator.top_n(TableKind::Pairs, limit, false));
            display_ranking("Trincas frequentes", &snap.aggregator.top_n(TableKind::Triples, limit, false));
        }
        Command::Patterns { range } => {
            let snap = scope(engine, range)?;
            display_patterns(
                &snap.aggregator.pattern_summary()?,
                &snap.aggregator.distribution_stats()?,
            );
        }
        Command::Temporal { granularity, range } => {
            let granularity: Granularity = granularity.parse()?;
            let snap = scope(engine, range)?;
            display_periods(
                &by_period(&snap.draws, granularity, true),
                &by_weekday(&snap.draws),
                &recent_trend(&snap.draws, config.trend_window, config.trend_high, config.trend_medium),
            );
        }
        Command::Suggest { quantity, range } => {
            let snap = scope(engine, range)?;
            let quantity = quantity.unwrap_or(config.default_suggestion_size as i64);
            let suggestion = suggest_numbers(
                snap.aggregator.frequencies(),
                quantity,
                config.suggestion_frequent_share,
            )?;
            display_suggestion(&suggestion);
        }
        Command::Stats { range } => {
            let snap = scope(engine, range)?;
            display_general(&snap.aggregator.general_report()?);
        }
        _ => bail!("Comando sem análise associada"),
    }
    Ok(())
}

fn cmd_probability(config: &EngineConfig, numbers: &[i64]) -> Result<()> {
    let selection = selection::validate(numbers)?;
    let report = compute_distribution_with(&selection, config.percent_decimals);
    display_probabilities(&report);
    display_combination(&analyze_combination(&selection));
    Ok(())
}

fn cmd_config(config: &EngineConfig, dump: bool) -> Result<()> {
    if dump {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("Janela de tendência   : {} concursos", config.trend_window);
        println!("Limiares de tendência : alta > {}, media > {}", config.trend_high, config.trend_medium);
        println!("Ranking padrão        : {}", config.default_limit);
        println!(
            "Sugestão              : {} dezenas, {:.0}% das mais sorteadas",
            config.default_suggestion_size,
            config.suggestion_frequent_share * 100.0
        );
        println!("Casas decimais (%)    : {}", config.percent_decimals);
    }
    Ok(())
}

fn cmd_add(ledger: &SqliteLedger) -> Result<()> {
    println!("Cadastro manual de concurso\n");

    let raw_contest = prompt("Número do concurso (ex: 3200) : ")?;
    let contest: u32 = raw_contest
        .parse()
        .with_context(|| format!("Número de concurso inválido: '{}'", raw_contest))?;

    let raw_date = prompt("Data (DD/MM/AAAA [HH:MM]) : ")?;
    let date = parse_draw_date(&raw_date).with_context(|| format!("Data inválida: '{}'", raw_date))?;

    let numbers = prompt_numbers()?;

    let raw_prize = prompt("Prêmio para 15 acertos (vazio = 0) : ")?;
    let prize = import::parse_brazilian_decimal(&raw_prize)?;
    let accumulated = import::parse_accumulated(&prompt("Acumulou? (SIM/NAO) : ")?);

    let draw = Draw::new(contest, date, &numbers, prize, accumulated)?;

    println!("\nConcurso a inserir :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmar? (s/n) : ")?;
    if confirm.trim().to_lowercase() == "s" {
        if ledger.insert(&draw)? {
            println!("Concurso inserido.");
        } else {
            println!("Este concurso já existe (repetido ignorado).");
        }
    } else {
        println!("Inserção cancelada.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erro de leitura")?;
    Ok(input.trim().to_string())
}

fn prompt_numbers() -> Result<Vec<u8>> {
    loop {
        let input = prompt("15 dezenas (separadas por espaço, 1-25) : ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == PICK_COUNT => {
                if lotofacil_db::models::validate_draw(&v).is_ok() {
                    return Ok(v);
                }
                println!("Dezenas inválidas (1-25, sem repetição). Tente de novo.");
            }
            _ => println!("Informe exatamente {} dezenas. Tente de novo.", PICK_COUNT),
        }
    }
}
