mod commands;

use std::process::ExitCode;

use amnesia::errors::Error;
use amnesia::output::{print_json, ErrorResponse};
use amnesia::Config;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Commands;

/// amnesia - Save and query conversation memories with semantic search
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless `--verbose` is set.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let config = Config::load()?;
    tracing::debug!(database = %config.database_path.display(), "configuration loaded");
    commands::execute(&cli.command, &config, cli.json)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                print_json(&ErrorResponse {
                    error: e.to_string(),
                });
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amnesia::Database;
    use std::path::Path;
    use tempfile::TempDir;

    /// Config under `dir` whose model cannot be downloaded, so any test that
    /// reaches model loading fails with an embedding error instead.
    fn offline_config(dir: &Path) -> Config {
        Config {
            database_path: dir.join("db").join("memories.db"),
            embedding_model: "amnesia-test/no-such-model".to_string(),
            embedding_dims: 8,
            model_cache: dir.join("models"),
            search_limit: 5,
        }
    }

    fn run_command(config: &Config, args: &[&str]) -> Result<ExitCode, Error> {
        let cli = Cli::parse_from(std::iter::once("amnesia").chain(args.iter().copied()));
        commands::execute(&cli.command, config, cli.json)
    }

    fn write_summary(dir: &Path, text: &str) -> String {
        let path = dir.join("summary.txt");
        std::fs::write(&path, text).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_query_rejects_empty_search_before_touching_storage() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());

        let result = run_command(&config, &["query", "  ", "--init"]);

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(!config.database_path.exists());
    }

    #[test]
    fn test_query_rejects_zero_limit_before_touching_storage() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());

        let result = run_command(&config, &["query", "lifetimes", "-n", "0", "--init"]);

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(!config.database_path.exists());
    }

    #[test]
    fn test_save_rejects_empty_title_before_export_or_init() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());
        let summary = write_summary(dir.path(), "A useful summary");

        // Without --no-export this would run the exporter if validation came later.
        let result = run_command(
            &config,
            &["save", "--id", "ses_1", "-t", " ", "--summary-file", &summary, "--init"],
        );

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(!config.database_path.exists());
    }

    #[test]
    fn test_save_rejects_empty_summary() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());
        let summary = write_summary(dir.path(), "  \n");

        let result = run_command(
            &config,
            &["save", "--id", "ses_1", "-t", "Title", "--summary-file", &summary, "--init"],
        );

        assert!(matches!(result, Err(Error::Validation(msg)) if msg == "No summary provided"));
        assert!(!config.database_path.exists());
    }

    #[test]
    fn test_query_init_on_missing_database_creates_it_without_model() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());

        let result = run_command(&config, &["query", "anything", "--init"]);

        assert_eq!(result.unwrap(), ExitCode::SUCCESS);
        let db = Database::open(&config.database_path).unwrap();
        assert_eq!(db.vector_dimension(), 8);
        assert_eq!(db.count_memories().unwrap(), 0);
    }

    #[test]
    fn test_save_without_init_on_missing_database_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());
        let summary = write_summary(dir.path(), "A useful summary");

        let result = run_command(
            &config,
            &["save", "--id", "ses_1", "-t", "Title", "--summary-file", &summary, "--no-export"],
        );

        assert!(matches!(result, Err(Error::NotInitialized(p)) if p == config.database_path));
        assert!(!config.database_path.exists());
    }

    #[test]
    fn test_query_without_init_on_missing_database_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());

        let result = run_command(&config, &["query", "anything"]);

        assert!(matches!(result, Err(Error::NotInitialized(_))));
    }

    #[test]
    fn test_get_and_list_open_only_the_database() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(dir.path());
        assert_eq!(run_command(&config, &["init"]).unwrap(), ExitCode::SUCCESS);
        {
            let db = Database::open(&config.database_path).unwrap();
            db.upsert_memory("ses_1", "Title", "summary", None, "rust").unwrap();
        }

        // The configured model does not exist, so success means it was never loaded.
        assert_eq!(run_command(&config, &["get", "ses_1"]).unwrap(), ExitCode::SUCCESS);
        assert_eq!(
            run_command(&config, &["list", "--json"]).unwrap(),
            ExitCode::SUCCESS
        );
        assert!(matches!(
            run_command(&config, &["get", "missing"]),
            Err(Error::NotFound(id)) if id == "missing"
        ));
        assert!(matches!(
            run_command(&config, &["list", "-l", "0"]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_cli_query_parsing() {
        let cli = Cli::parse_from(["amnesia", "query", "lifetimes", "-n", "3", "--full"]);
        match cli.command {
            Commands::Query {
                search,
                limit,
                full,
                init,
            } => {
                assert_eq!(search, "lifetimes");
                assert_eq!(limit, Some(3));
                assert!(full);
                assert!(!init);
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["amnesia", "list", "--json", "--verbose"]);
        assert!(cli.json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_save_parsing() {
        let cli = Cli::parse_from([
            "amnesia",
            "save",
            "--id",
            "ses_1",
            "-t",
            "Title",
            "--tags",
            "rust,cli",
            "--no-export",
        ]);
        match cli.command {
            Commands::Save {
                id,
                title,
                tags,
                no_export,
                transcript_file,
                ..
            } => {
                assert_eq!(id, "ses_1");
                assert_eq!(title, "Title");
                assert_eq!(tags, "rust,cli");
                assert!(no_export);
                assert!(transcript_file.is_none());
            }
            _ => panic!("expected save command"),
        }
    }

    #[test]
    fn test_cli_save_requires_id_and_title() {
        assert!(Cli::try_parse_from(["amnesia", "save", "--id", "ses_1"]).is_err());
        assert!(Cli::try_parse_from(["amnesia", "save", "-t", "Title"]).is_err());
    }

    #[test]
    fn test_cli_transcript_file_conflicts_with_no_export() {
        let result = Cli::try_parse_from([
            "amnesia",
            "save",
            "--id",
            "ses_1",
            "-t",
            "Title",
            "--transcript-file",
            "t.txt",
            "--no-export",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["amnesia"]).is_err());
    }
}
