//! `ferry` - move data between ClickHouse and delimited flat files
//!
//! Every subcommand drives one [`TransferOrchestrator`] session: configure
//! the endpoints, discover the schema, pick a projection, then preview or
//! ingest.

mod config;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use ferry_core::{ApiResponse, EndpointDescriptor, EndpointKind, FerryError};
use ferry_services::{SchemaCatalogClient, TransferOrchestrator};
use ferry_transfer::EngineBackend;

use config::FerryConfig;

#[derive(Parser, Debug)]
#[command(name = "ferry", version, about = "Move data between ClickHouse and flat files")]
struct Cli {
    /// Config file (default: ./ferry.toml, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the JSON response envelope instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the source and list its tables
    Tables {
        #[command(flatten)]
        endpoints: EndpointArgs,
    },
    /// Load the columns of a table, a join or a file
    Columns {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Show a bounded sample of the projected rows
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Rows to fetch (default from config, 10)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Move every projected row to the target
    Ingest {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Target kind
        #[arg(long, value_parser = parse_kind, default_value = "flatfile")]
        target: EndpointKind,

        /// Target ClickHouse table (created when missing)
        #[arg(long)]
        target_table: Option<String>,

        /// Target file (default: --file; required when the source is a flat file)
        #[arg(long)]
        target_file: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct EndpointArgs {
    /// Source kind
    #[arg(long, value_parser = parse_kind, default_value = "clickhouse")]
    source: EndpointKind,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    user: Option<String>,

    /// Credential token, sent as the HTTP password
    #[arg(long, env = "FERRY_CLICKHOUSE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Use HTTPS
    #[arg(long)]
    secure: bool,

    /// Flat file path
    #[arg(long)]
    file: Option<String>,

    /// Field delimiter: a single character or comma|tab|semicolon|pipe|space
    #[arg(long, value_parser = parse_delimiter)]
    delimiter: Option<char>,

    /// The flat file has no header row
    #[arg(long)]
    no_header: bool,
}

#[derive(Args, Debug, Clone)]
struct SelectionArgs {
    #[command(flatten)]
    endpoints: EndpointArgs,

    /// Source table; repeat to join several tables
    #[arg(long = "table")]
    tables: Vec<String>,

    /// Join condition used when more than one table is given
    #[arg(long)]
    join_on: Option<String>,

    /// Comma separated columns to project (default: all)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
}

fn parse_kind(value: &str) -> std::result::Result<EndpointKind, String> {
    value.parse::<EndpointKind>().map_err(|e| e.to_string())
}

fn parse_delimiter(value: &str) -> std::result::Result<char, String> {
    match value.to_ascii_lowercase().as_str() {
        "comma" => return Ok(','),
        "tab" | "\\t" => return Ok('\t'),
        "semicolon" => return Ok(';'),
        "pipe" => return Ok('|'),
        "space" => return Ok(' '),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!(
            "invalid delimiter '{}': expected a single character or comma|tab|semicolon|pipe|space",
            value
        )),
    }
}

impl EndpointArgs {
    /// Apply the flags on top of the loaded config
    fn apply(&self, config: &mut FerryConfig) {
        let db = &mut config.database;
        if let Some(host) = &self.host {
            db.host = host.clone();
        }
        if let Some(port) = &self.port {
            db.port = port.clone();
        }
        if let Some(database) = &self.database {
            db.database = database.clone();
        }
        if let Some(user) = &self.user {
            db.username = user.clone();
        }
        if let Some(token) = &self.token {
            db.token = token.clone();
        }
        if self.secure {
            db.secure = true;
        }

        let ff = &mut config.flat_file;
        if let Some(file) = &self.file {
            ff.path = file.clone();
        }
        if let Some(delimiter) = self.delimiter {
            ff.delimiter = delimiter;
        }
        if self.no_header {
            ff.has_header = false;
        }
    }
}

struct App {
    config: FerryConfig,
    json: bool,
    backend: Arc<EngineBackend>,
}

impl App {
    fn orchestrator(&self, source: EndpointKind) -> Result<TransferOrchestrator> {
        let orch = TransferOrchestrator::with_endpoints(
            self.backend.clone(),
            self.config.database.clone(),
            self.config.flat_file.clone(),
        );
        orch.set_source_kind(source)?;
        Ok(orch)
    }

    /// Print an action's failure and turn it into an error
    fn failed(&self, orch: &TransferOrchestrator, err: FerryError) -> anyhow::Error {
        if self.json {
            if let Err(print_err) = output::failure_json(&orch.message(), &err) {
                return print_err;
            }
        }
        anyhow::Error::new(err)
    }

    async fn tables(&self, endpoints: &EndpointArgs) -> Result<()> {
        let tables = match endpoints.source {
            EndpointKind::Database => {
                let orch = self.orchestrator(EndpointKind::Database)?;
                let tables = orch.connect().await.map_err(|e| self.failed(&orch, e))?;
                self.report(&orch.message(), tables)?
            }
            EndpointKind::FlatFile => {
                let catalog = SchemaCatalogClient::new(self.backend.clone());
                let descriptor: EndpointDescriptor = self.config.flat_file.clone().into();
                match catalog.list_tables(&descriptor).await {
                    Ok(tables) => self.report("Flat file found.", tables)?,
                    Err(err) => {
                        if self.json {
                            output::failure_json(&err.to_string(), &err)?;
                        }
                        return Err(err.into());
                    }
                }
            }
        };
        if let Some(tables) = tables {
            println!("{}", output::tables_table(&tables));
        }
        Ok(())
    }

    /// JSON mode prints the envelope and returns `None`; table mode hands
    /// the data back for rendering
    fn report<T: serde::Serialize>(&self, message: &str, data: Vec<T>) -> Result<Option<Vec<T>>> {
        if self.json {
            let count = data.len() as u64;
            output::print_json(&ApiResponse::success(message, Some(data), count))?;
            Ok(None)
        } else {
            eprintln!("{}", message);
            Ok(Some(data))
        }
    }

    /// Configure the table reference and load the column catalog
    async fn load(&self, selection: &SelectionArgs) -> Result<TransferOrchestrator> {
        let orch = self.orchestrator(selection.endpoints.source)?;

        match selection.tables.as_slice() {
            [] => {}
            [table] => orch.select_table(table)?,
            tables => {
                orch.set_join_mode(true)?;
                for table in tables {
                    orch.toggle_table(table)?;
                }
                if let Some(condition) = &selection.join_on {
                    orch.set_join_condition(condition)?;
                }
            }
        }

        orch.load_schema().await.map_err(|e| self.failed(&orch, e))?;
        Ok(orch)
    }

    fn select_columns(&self, orch: &TransferOrchestrator, columns: &[String]) -> Result<()> {
        if columns.is_empty() {
            return Ok(orch.select_all()?);
        }
        for column in columns {
            let column = column.trim();
            if !orch.toggle_column(column)? {
                bail!("Unknown column '{}'", column);
            }
        }
        Ok(())
    }

    async fn columns(&self, selection: &SelectionArgs) -> Result<()> {
        let orch = self.load(selection).await?;
        let projection = orch.projection();
        if self.json {
            let catalog = projection.catalog().to_vec();
            let count = catalog.len() as u64;
            return output::print_json(&ApiResponse::success(orch.message(), Some(catalog), count));
        }
        eprintln!("{}", orch.message());
        println!(
            "{}",
            output::columns_table(projection.catalog(), &projection.selected_columns())
        );
        Ok(())
    }

    async fn preview(&self, selection: &SelectionArgs, limit: Option<usize>) -> Result<()> {
        let orch = self.load(selection).await?;
        self.select_columns(&orch, &selection.columns)?;

        let limit = limit.unwrap_or(self.config.transfer.preview_limit);
        let rows = orch.preview(limit).await.map_err(|e| self.failed(&orch, e))?;
        let columns = orch.projection().selected_columns();

        if let Some(rows) = self.report(&orch.message(), rows)? {
            println!("{}", output::records_table(&columns, &rows));
        }
        Ok(())
    }

    async fn ingest(
        &self,
        selection: &SelectionArgs,
        target: EndpointKind,
        target_table: Option<&str>,
        target_file: Option<&str>,
    ) -> Result<()> {
        let orch = self.load(selection).await?;
        self.select_columns(&orch, &selection.columns)?;

        orch.set_target_kind(target)?;
        if let Some(table) = target_table {
            orch.set_target_table(table)?;
        }
        if let Some(file) = target_file {
            orch.set_target_file(file)?;
        }

        let count = orch.ingest().await.map_err(|e| self.failed(&orch, e))?;
        if self.json {
            output::print_json(&ApiResponse::<()>::success(orch.message(), None, count))
        } else {
            println!("{}", orch.message());
            Ok(())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (mut config, config_path) = FerryConfig::load(cli.config.as_deref())?;

    let _log_guard = logging::init(&logging::LoggingConfig::from_settings(
        &config.logging,
        cli.verbose,
    ))
    .context("Failed to initialize logging")?;
    tracing::debug!(config = ?config_path, "configuration loaded");

    match &cli.command {
        Command::Tables { endpoints } => endpoints.apply(&mut config),
        Command::Columns { selection }
        | Command::Preview { selection, .. }
        | Command::Ingest { selection, .. } => selection.endpoints.apply(&mut config),
    }

    let app = App {
        backend: Arc::new(EngineBackend::new(config.transfer.engine_config())),
        config,
        json: cli.json,
    };

    match &cli.command {
        Command::Tables { endpoints } => app.tables(endpoints).await,
        Command::Columns { selection } => app.columns(selection).await,
        Command::Preview { selection, limit } => app.preview(selection, *limit).await,
        Command::Ingest {
            selection,
            target,
            target_table,
            target_file,
        } => {
            app.ingest(
                selection,
                *target,
                target_table.as_deref(),
                target_file.as_deref(),
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            if !json {
                eprintln!("error: {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::comma("comma", ',')]
    #[case::tab_name("tab", '\t')]
    #[case::tab_escape("\\t", '\t')]
    #[case::semicolon("semicolon", ';')]
    #[case::pipe("PIPE", '|')]
    #[case::space("space", ' ')]
    #[case::literal(":", ':')]
    fn test_parse_delimiter(#[case] input: &str, #[case] expected: char) {
        assert_eq!(parse_delimiter(input), Ok(expected));
    }

    #[test]
    fn test_parse_delimiter_rejects_words() {
        assert!(parse_delimiter("colon").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn test_preview_flags() {
        let cli = Cli::try_parse_from([
            "ferry",
            "preview",
            "--table",
            "users",
            "--table",
            "orders",
            "--join-on",
            "users.id = orders.user_id",
            "--columns",
            "users.id,orders.total",
            "--limit",
            "5",
        ])
        .unwrap();

        let Command::Preview { selection, limit } = cli.command else {
            panic!("expected preview");
        };
        assert_eq!(limit, Some(5));
        assert_eq!(selection.tables, vec!["users", "orders"]);
        assert_eq!(selection.join_on.as_deref(), Some("users.id = orders.user_id"));
        assert_eq!(selection.columns, vec!["users.id", "orders.total"]);
        assert_eq!(selection.endpoints.source, EndpointKind::Database);
    }

    #[test]
    fn test_ingest_flags() {
        let cli = Cli::try_parse_from([
            "ferry",
            "ingest",
            "--source",
            "flatfile",
            "--file",
            "in.tsv",
            "--delimiter",
            "tab",
            "--no-header",
            "--target",
            "clickhouse",
            "--target-table",
            "events",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let Command::Ingest {
            selection,
            target,
            target_table,
            ..
        } = cli.command
        else {
            panic!("expected ingest");
        };
        assert_eq!(target, EndpointKind::Database);
        assert_eq!(target_table.as_deref(), Some("events"));

        let mut config = FerryConfig::default();
        selection.endpoints.apply(&mut config);
        assert_eq!(config.flat_file.path, "in.tsv");
        assert_eq!(config.flat_file.delimiter, '\t');
        assert!(!config.flat_file.has_header);
    }

    #[test]
    fn test_unknown_source_kind_is_rejected() {
        let err = Cli::try_parse_from(["ferry", "tables", "--source", "postgres"]).unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "ferry", "tables", "--host", "ch.local", "--port", "8443", "--secure",
        ])
        .unwrap();
        let Command::Tables { endpoints } = cli.command else {
            panic!("expected tables");
        };

        let mut config = FerryConfig::default();
        config.database.database = "analytics".to_string();
        endpoints.apply(&mut config);

        assert_eq!(config.database.host, "ch.local");
        assert_eq!(config.database.port, "8443");
        assert!(config.database.secure);
        assert_eq!(config.database.database, "analytics");
    }

    #[tokio::test]
    async fn test_columns_for_flat_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("users.csv");
        std::fs::write(&path, "id,name\n1,alice\n2,\n")?;

        let mut config = FerryConfig::default();
        config.flat_file.path = path.to_string_lossy().to_string();
        let app = App {
            backend: Arc::new(EngineBackend::default()),
            config,
            json: false,
        };

        let orch = app.orchestrator(EndpointKind::FlatFile)?;
        orch.load_schema().await?;
        app.select_columns(&orch, &[])?;

        let projection = orch.projection();
        assert_eq!(projection.selected_columns(), vec!["id", "name"]);
        assert_eq!(
            projection.catalog()[1].data_type.as_deref(),
            Some("Nullable(String)")
        );
        assert!(app.select_columns(&orch, &["missing".to_string()]).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_flat_to_flat_ingest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("in.csv");
        let target = dir.path().join("out.csv");
        std::fs::write(&source, "id,name\n1,alice\n2,bob\n")?;

        let mut config = FerryConfig::default();
        config.flat_file.path = source.to_string_lossy().to_string();
        let app = App {
            backend: Arc::new(EngineBackend::default()),
            config,
            json: false,
        };

        let selection = SelectionArgs {
            endpoints: EndpointArgs {
                source: EndpointKind::FlatFile,
                host: None,
                port: None,
                database: None,
                user: None,
                token: None,
                secure: false,
                file: None,
                delimiter: None,
                no_header: false,
            },
            tables: vec![],
            join_on: None,
            columns: vec!["name".to_string()],
        };
        let target_path = target.to_string_lossy().to_string();
        app.ingest(
            &selection,
            EndpointKind::FlatFile,
            None,
            Some(target_path.as_str()),
        )
        .await?;

        assert_eq!(std::fs::read_to_string(&target)?, "name\nalice\nbob\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_flat_ingest_without_target_file_keeps_source() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("in.csv");
        let original = "id,name,secret\n1,alice,x\n2,bob,y\n";
        std::fs::write(&source, original)?;

        let mut config = FerryConfig::default();
        config.flat_file.path = source.to_string_lossy().to_string();
        let app = App {
            backend: Arc::new(EngineBackend::default()),
            config,
            json: false,
        };
        let args = Cli::try_parse_from([
            "ferry",
            "ingest",
            "--source",
            "flatfile",
            "--columns",
            "name",
        ])?;
        let Command::Ingest { selection, target, .. } = args.command else {
            panic!("expected ingest");
        };

        let err = app.ingest(&selection, target, None, None).await.unwrap_err();

        assert!(err.to_string().contains("different from the source file"));
        assert_eq!(std::fs::read_to_string(&source)?, original);
        Ok(())
    }
}
