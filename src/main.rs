use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mysql_on_sqlite::{Driver, DriverConfig, JournalMode};

/// MySQL on SQLite - runs MySQL statements against a SQLite database
#[derive(Parser)]
#[command(name = "mysql-on-sqlite")]
#[command(about = "Run MySQL statements against an embedded SQLite database")]
struct Cli {
    /// SQL file to run (stdin when neither a file nor -e is given)
    source_file: Option<PathBuf>,

    /// Statement to run; may be repeated
    #[arg(short = 'e', long = "execute")]
    execute: Vec<String>,

    /// TOML configuration file; the flags below override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// MySQL database name reported by DATABASE() and SHOW TABLES
    #[arg(short = 'd', long, env = "MYSQL_ON_SQLITE_DATABASE")]
    database: Option<String>,

    /// SQLite database file (in memory if not specified)
    #[arg(short = 'p', long, env = "MYSQL_ON_SQLITE_PATH")]
    path: Option<PathBuf>,

    /// SQLite journal mode
    #[arg(long)]
    journal_mode: Option<JournalMode>,

    /// Print the native SQLite statements with each result
    #[arg(long)]
    native: bool,
}

fn build_config(cli: &Cli) -> Result<DriverConfig, String> {
    let mut config = match &cli.config {
        Some(path) => DriverConfig::from_toml_file(path).map_err(|e| e.to_string())?,
        None => DriverConfig::default(),
    };
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(path) = &cli.path {
        config.path = Some(path.clone());
    }
    if let Some(mode) = cli.journal_mode {
        config.journal_mode = Some(mode);
    }
    Ok(config)
}

fn read_queries(cli: &Cli) -> Result<Vec<String>, String> {
    if !cli.execute.is_empty() {
        return Ok(cli.execute.clone());
    }
    let sql = match &cli.source_file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Error reading '{}': {}", path.display(), e))?,
        None => {
            let mut sql = String::new();
            io::stdin()
                .read_to_string(&mut sql)
                .map_err(|e| format!("Error reading stdin: {}", e))?;
            sql
        }
    };
    Ok(vec![sql])
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let queries = match read_queries(&cli) {
        Ok(queries) => queries,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let mut driver = match Driver::open(&config) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            process::exit(1);
        }
    };

    for query in &queries {
        let outcome = match driver.query(query) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Query error: {}", e);
                for statement in &e.native_statements {
                    eprintln!("  {}", statement.sql);
                }
                process::exit(1);
            }
        };

        let json = if cli.native {
            serde_json::to_string_pretty(&outcome)
        } else {
            serde_json::to_string_pretty(&outcome.result)
        };
        match json {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error encoding result: {}", e);
                process::exit(1);
            }
        }
    }
}
