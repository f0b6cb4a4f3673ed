//! `notestore` command-line entry point.
//!
//! # Responsibility
//! - Expose the notes data source (list/get/create/update/delete/validate)
//!   as subcommands printing JSON to stdout.
//! - Resolve configuration from file, environment and flags.
//!
//! # Invariants
//! - Create/update never write when validation reports issues.
//! - Errors print as one JSON object on stderr with a non-zero exit code.

use clap::{Parser, Subcommand, ValueEnum};
use notestore_core::{
    init_logging, open_note_service, parse_filter, parse_record_id, parse_sort,
    ConfiguredNoteRepository, CoreConfig, FilterCondition, FilterMode, ListQuery, NoteFields,
    NoteService, PageRequest, SortKey, StorageKind,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "notestore", version, about = "Notes store with filter, sort and pagination")]
struct Cli {
    /// JSON config file; `NOTESTORE_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    storage: Option<StorageArg>,

    /// Directory (file storage) or database path (sqlite storage).
    #[arg(long, global = true)]
    data_path: Option<PathBuf>,

    /// Reject malformed filters instead of ignoring them.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StorageArg {
    Memory,
    File,
    Sqlite,
}

impl From<StorageArg> for StorageKind {
    fn from(value: StorageArg) -> Self {
        match value {
            StorageArg::Memory => Self::Memory,
            StorageArg::File => Self::File,
            StorageArg::Sqlite => Self::Sqlite,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List one page of notes.
    List {
        /// `field:operator:value`, e.g. `title:contains:goal`. Repeatable; ANDed.
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<FilterCondition>,
        /// `field[:asc|desc]`. Repeatable; earlier keys win.
        #[arg(long = "sort", value_parser = parse_sort)]
        sorts: Vec<SortKey>,
        /// Zero-based page index.
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Page size; 0 uses the configured default.
        #[arg(long, default_value_t = 0)]
        page_size: usize,
    },
    /// Show one note.
    Get { id: String },
    /// Create a note.
    Create {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Update fields of an existing note.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Delete a note; deleting a missing note succeeds.
    Delete { id: String },
    /// Validate form values without writing.
    Validate {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Print column descriptors.
    Fields,
    /// Print core health and version.
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Ping = cli.command {
        print_json(&json!({
            "ping": notestore_core::ping(),
            "version": notestore_core::core_version(),
        }));
        return ExitCode::SUCCESS;
    }

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => return fail("invalid_config", &message),
    };
    if let Some(log_dir) = config.log_dir.as_ref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let service = match open_note_service(&config) {
        Ok(service) => service,
        Err(err) => return fail(err.code(), &err.to_string()),
    };
    run(&service, cli.command)
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::load(cli.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(storage) = cli.storage {
        config.storage = storage.into();
    }
    if let Some(data_path) = cli.data_path.clone() {
        config.data_path = data_path;
    }
    if cli.strict {
        config.filter_mode = FilterMode::Strict;
    }
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn run(service: &NoteService<ConfiguredNoteRepository>, command: Command) -> ExitCode {
    let outcome = match command {
        Command::List {
            filters,
            sorts,
            page,
            page_size,
        } => {
            let query = ListQuery {
                filter: filters,
                sort: sorts,
                page: PageRequest::new(page, page_size),
            };
            service.get_many(&query).map(|page| json!(page))
        }
        Command::Get { id } => parse_record_id(&id)
            .and_then(|id| service.get_one(id))
            .map(|note| json!(note)),
        Command::Create { title, text } => {
            let fields = NoteFields { title, text };
            let report = service.validate(&fields);
            if !report.is_valid() {
                print_json(&json!(report));
                return ExitCode::from(EXIT_INVALID);
            }
            service.create_one(fields).map(|note| json!(note))
        }
        Command::Update { id, title, text } => {
            let patch = NoteFields { title, text };
            let merged = parse_record_id(&id).and_then(|id| {
                let current = service.get_one(id)?;
                Ok((
                    id,
                    NoteFields {
                        title: patch.title.clone().or(Some(current.title)),
                        text: patch.text.clone().or(Some(current.text)),
                    },
                ))
            });
            match merged {
                Ok((id, merged)) => {
                    let report = service.validate(&merged);
                    if !report.is_valid() {
                        print_json(&json!(report));
                        return ExitCode::from(EXIT_INVALID);
                    }
                    service.update_one(id, patch).map(|note| json!(note))
                }
                Err(err) => Err(err),
            }
        }
        Command::Delete { id } => parse_record_id(&id)
            .and_then(|id| service.delete_one(id).map(|()| id))
            .map(|id| json!({ "deleted": id })),
        Command::Validate { title, text } => Ok(json!(service.validate(&NoteFields { title, text }))),
        Command::Fields => Ok(json!(service.fields())),
        Command::Ping => Ok(json!({ "ping": notestore_core::ping() })),
    };

    match outcome {
        Ok(value) => {
            print_json(&value);
            ExitCode::SUCCESS
        }
        Err(err) => fail(err.code(), &err.to_string()),
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("failed to encode output: {err}"),
    }
}

fn fail(code: &str, message: &str) -> ExitCode {
    let body = json!({ "error": code, "message": message });
    eprintln!("{body}");
    ExitCode::from(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use notestore_core::{FilterOperator, SortDirection};

    #[test]
    fn list_arguments_parse_into_query_parts() {
        let cli = Cli::try_parse_from([
            "notestore",
            "list",
            "--filter",
            "title:contains:goal",
            "--sort",
            "id:desc",
            "--page-size",
            "5",
        ])
        .unwrap();
        match cli.command {
            Command::List {
                filters,
                sorts,
                page,
                page_size,
            } => {
                assert_eq!(filters[0].operator, FilterOperator::Contains);
                assert_eq!(sorts[0].direction, SortDirection::Desc);
                assert_eq!(page, 0);
                assert_eq!(page_size, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_filter_expression_is_a_usage_error() {
        let result = Cli::try_parse_from(["notestore", "list", "--filter", "title"]);
        assert!(result.is_err());
    }
}
