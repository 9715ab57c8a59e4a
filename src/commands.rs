//! Command handlers for amnesia CLI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use amnesia::errors::Error;
use amnesia::output::*;
use amnesia::sqlite::validate_limit;
use amnesia::transcript::{OpencodeExporter, TranscriptSource};
use amnesia::{
    validate_query, validate_save, Config, Database, Embedder, EmbeddingEngine, MemoryRepository,
};

/// Commands supported by amnesia CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the database and vector index (safe to re-run)
    Init,
    /// Save a memory; the summary is read from --summary-file or stdin
    Save {
        /// Session ID (also used to export the transcript)
        #[arg(long)]
        id: String,

        /// Memory title
        #[arg(short = 't', long)]
        title: String,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,

        /// Read summary from file instead of stdin
        #[arg(long)]
        summary_file: Option<PathBuf>,

        /// Read the full conversation from a file instead of exporting it
        #[arg(long, conflicts_with = "no_export")]
        transcript_file: Option<PathBuf>,

        /// Save without a full conversation
        #[arg(long)]
        no_export: bool,

        /// Initialize database if needed
        #[arg(long)]
        init: bool,
    },
    /// Search memories by meaning
    Query {
        /// Search query
        search: String,

        /// Number of results (default: search_limit from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Show full content
        #[arg(short = 'f', long)]
        full: bool,

        /// Initialize database if needed
        #[arg(long)]
        init: bool,
    },
    /// Show one memory
    Get {
        /// Memory ID
        id: String,
    },
    /// List memories, newest first
    List {
        /// Maximum number of results (default: 10)
        #[arg(short = 'l', long, default_value = "10")]
        limit: usize,
    },
    /// Embed stdin and print the vector as a JSON array
    Embed,
}

/// Execute a CLI command.
pub fn execute(command: &Commands, config: &Config, json: bool) -> Result<ExitCode, Error> {
    match command {
        Commands::Init => handle_init(config, json),
        Commands::Save {
            id,
            title,
            tags,
            summary_file,
            transcript_file,
            no_export,
            init,
        } => {
            let full_content = if *no_export {
                FullContent::None
            } else if let Some(path) = transcript_file {
                FullContent::File(path.as_path())
            } else {
                FullContent::Export
            };
            handle_save(
                config,
                &SaveRequest {
                    id,
                    title,
                    tags,
                    summary_file: summary_file.as_deref(),
                    full_content,
                    init: *init,
                },
                json,
            )
        }
        Commands::Query {
            search,
            limit,
            full,
            init,
        } => handle_query(
            config,
            search,
            limit.unwrap_or(config.search_limit),
            *full,
            *init,
            json,
        ),
        Commands::Get { id } => handle_get(config, id, json),
        Commands::List { limit } => handle_list(config, *limit, json),
        Commands::Embed => handle_embed(config),
    }
}

enum FullContent<'a> {
    None,
    File(&'a Path),
    Export,
}

struct SaveRequest<'a> {
    id: &'a str,
    title: &'a str,
    tags: &'a str,
    summary_file: Option<&'a Path>,
    full_content: FullContent<'a>,
    init: bool,
}

fn initialize_database(config: &Config) -> Result<Database, Error> {
    config.ensure_directories()?;
    Ok(Database::initialize(
        &config.database_path,
        config.embedding_dims,
        &config.embedding_model,
    )?)
}

/// Open the database, creating it first when `init` is set.
fn open_database(config: &Config, init: bool) -> Result<Database, Error> {
    if init {
        initialize_database(config)
    } else {
        Ok(Database::open(&config.database_path)?)
    }
}

/// Load the embedding model. Called only after the database is open.
fn load_engine(config: &Config) -> Result<EmbeddingEngine, Error> {
    config.ensure_directories()?;
    Ok(EmbeddingEngine::new(
        &config.embedding_model,
        config.embedding_dims,
        &config.model_cache,
    )?)
}

fn read_input(path: Option<&Path>) -> Result<String, Error> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    Ok(text.trim().to_string())
}

fn handle_init(config: &Config, json: bool) -> Result<ExitCode, Error> {
    let db = initialize_database(config)?;
    if json {
        print_json(&InitResponse {
            status: "initialized".to_string(),
            path: db.path().display().to_string(),
            dimension: db.vector_dimension(),
            model: db.vector_model()?,
        });
    } else {
        println!("Database initialized: {}", db.path().display());
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_save(config: &Config, request: &SaveRequest<'_>, json: bool) -> Result<ExitCode, Error> {
    let content = read_input(request.summary_file)?;
    if content.is_empty() {
        return Err(Error::Validation("No summary provided".to_string()));
    }
    validate_save(request.id, request.title, &content, request.tags)?;

    let db = open_database(config, request.init)?;

    let full_content = match request.full_content {
        FullContent::None => None,
        FullContent::File(path) => Some(std::fs::read_to_string(path)?),
        FullContent::Export => Some(OpencodeExporter::new().export(request.id)?),
    };

    let mut repo = MemoryRepository::new(db, load_engine(config)?)?;
    repo.save(
        request.id,
        request.title,
        &content,
        full_content.as_deref(),
        request.tags,
    )?;

    if json {
        print_json(&SaveResponse {
            status: "saved".to_string(),
            id: request.id.to_string(),
        });
    } else {
        println!("Memory saved: {}", request.id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_query(
    config: &Config,
    search: &str,
    limit: usize,
    full: bool,
    init: bool,
    json: bool,
) -> Result<ExitCode, Error> {
    validate_query(search, limit)?;

    if init && !config.database_path.exists() {
        initialize_database(config)?;
        if json {
            print_json(&QueryResponse {
                query: search.to_string(),
                count: 0,
                results: Vec::new(),
            });
        } else {
            println!("No memories saved yet.\n");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let db = open_database(config, init)?;
    let mut repo = MemoryRepository::new(db, load_engine(config)?)?;
    let results = repo.search(search, limit, full)?;

    if json {
        print_json(&QueryResponse {
            query: search.to_string(),
            count: results.len(),
            results,
        });
    } else {
        println!("{}", format_query(search, &results));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_get(config: &Config, id: &str, json: bool) -> Result<ExitCode, Error> {
    let db = Database::open(&config.database_path)?;
    let memory = db
        .get_memory(id)?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    if json {
        print_json(&memory);
    } else {
        print!("{}", format_memory(&memory));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_list(config: &Config, limit: usize, json: bool) -> Result<ExitCode, Error> {
    validate_limit(limit)?;
    let db = Database::open(&config.database_path)?;
    let memories = db.list_memories(limit)?;
    if json {
        let items: Vec<ListItem> = memories.into_iter().map(ListItem::from).collect();
        print_json(&ListResponse { memories: items });
    } else {
        for memory in memories {
            println!("{}  {}  {}", memory.created_at, memory.id, memory.title);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_embed(config: &Config) -> Result<ExitCode, Error> {
    let text = read_input(None)?;
    if text.is_empty() {
        return Err(Error::Validation("No text provided via stdin".to_string()));
    }
    let mut engine = load_engine(config)?;
    let embedding = engine.embed(&text)?;
    println!("{}", serde_json::to_string(&embedding)?);
    Ok(ExitCode::SUCCESS)
}
