use clap::Parser;
use log::{debug, error};
use rowql::rowql::datasource::CsvSourceConfig;
use rowql::rowql::sql::ast::OutputKind;
use rowql::rowql::{Query, QueryOptions};
use std::collections::HashMap;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rowql")]
#[command(about = "Run a SQL-shaped query over CSV, JSON lines, or text rows")]
#[command(version)]
struct Cli {
    /// The query, e.g. "SELECT col1 * 10 AS y FROM csv WHERE col1 > 1 TO json"
    query: String,

    /// Read input from this file instead of standard input
    #[arg(short, long)]
    input: Option<String>,

    /// Write output to this file instead of standard output
    #[arg(short, long)]
    output: Option<String>,

    /// CSV field delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Treat the first CSV record as data, not as a header
    #[arg(long)]
    no_header: bool,

    /// Output format when the query has no TO clause
    #[arg(long, default_value = "csv", value_parser = parse_output_kind)]
    default_to: OutputKind,

    /// Table name for SQL output
    #[arg(long)]
    table: Option<String>,

    /// Flush output after every row
    #[arg(short = 'u', long)]
    unbuffered: bool,

    /// Treat warnings as errors
    #[arg(short = 'W', long)]
    error_on_warning: bool,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_output_kind(word: &str) -> Result<OutputKind, String> {
    OutputKind::from_keyword(word)
        .ok_or_else(|| format!("unknown output format '{}' (csv, json, sql, pretty, plot)", word))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let options = QueryOptions {
        input_path: cli.input,
        output_path: cli.output,
        csv: CsvSourceConfig {
            delimiter: cli.delimiter,
            has_header: !cli.no_header,
        },
        sql_table: cli.table,
        unbuffered: cli.unbuffered,
        default_output: Some(cli.default_to),
        escalate_warnings: cli.error_on_warning,
    };

    let query = match Query::with_options(&cli.query, options) {
        Ok(query) => query,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match query.run(HashMap::new()) {
        Ok(result) => {
            debug!("emitted {} rows", result.rows_emitted);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
