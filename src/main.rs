use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use postrun::collection::{count_requests, load_collection_file, Collection};
use postrun::runner::{self, print_run_report};
use postrun::store::Store;
use postrun::vars::{extract_variables, load_environment_file, VarMap};

/// Advisory wall-clock ceiling for a whole run, enforced here around the
/// engine rather than inside it.
const RUN_CEILING: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(
    name = "postrun",
    version,
    about = "Store and execute Postman-style API collections",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory where collections and environments are stored
    #[arg(long, value_name = "DIR", default_value = "uploads", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and store a collection file
    Add {
        /// Collection JSON file
        file: PathBuf,
    },
    /// List stored collections, newest first
    List,
    /// Show details for a stored collection
    Info {
        /// Collection id
        id: String,
    },
    /// Delete a stored collection
    Remove {
        /// Collection id
        id: String,
    },
    /// Execute every request in a collection
    Run {
        /// Stored collection id or path to a collection file
        collection: String,

        /// Stored environment id or path to an environment file
        #[arg(short, long, value_name = "ID_OR_PATH")]
        env: Option<String>,

        /// Inline variable; when any are given the stored environment is
        /// not consulted
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Extract additional variables from free text (best effort)
        #[arg(long, value_name = "TEXT")]
        vars_text: Option<String>,

        /// Print the full report as JSON instead of the summary view
        #[arg(long)]
        json: bool,
    },
    /// Manage stored environments
    #[command(subcommand)]
    Env(EnvCommands),
}

#[derive(Subcommand, Debug)]
enum EnvCommands {
    /// Validate and store an environment file
    Add {
        /// Environment JSON file
        file: PathBuf,
    },
    /// List stored environments, newest first
    List,
    /// Delete a stored environment
    Remove {
        /// Environment id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = Store::new(&cli.data_dir);

    match cli.command {
        Commands::Add { file } => {
            let stored = store.add_collection(&file)?;
            println!(
                "Stored collection {} ({}, {} requests)",
                stored.name.cyan(),
                stored.id,
                stored.total_requests
            );
        }
        Commands::List => {
            let collections = store.list_collections()?;
            if collections.is_empty() {
                println!("No collections stored");
            }
            for stored in collections {
                println!(
                    "{}  {}  {} requests  {}",
                    stored.id,
                    stored.name.cyan(),
                    stored.total_requests,
                    stored.uploaded_at.dimmed()
                );
            }
        }
        Commands::Info { id } => {
            let stored = store.collection_info(&id)?;
            println!("{} {}", "Name:".bold(), stored.name.cyan());
            if !stored.description.is_empty() {
                println!("{} {}", "Description:".bold(), stored.description);
            }
            println!("{} {}", "Schema:".bold(), stored.schema);
            println!("{} {}", "Requests:".bold(), stored.total_requests);
            println!("{} {}", "Uploaded:".bold(), stored.uploaded_at);
            println!("{} {}", "File:".bold(), stored.filename);
        }
        Commands::Remove { id } => {
            store.remove_collection(&id)?;
            println!("Deleted collection {id}");
        }
        Commands::Run {
            collection,
            env,
            vars,
            vars_text,
            json,
        } => {
            let collection = resolve_collection(&store, &collection)?;
            let resolved_vars = resolve_vars(&store, env.as_deref(), &vars, vars_text.as_deref())?;
            run_collection(&collection, &resolved_vars, json).await?;
        }
        Commands::Env(command) => match command {
            EnvCommands::Add { file } => {
                let stored = store.add_environment(&file)?;
                println!(
                    "Stored environment {} ({}, {} variables)",
                    stored.name.cyan(),
                    stored.id,
                    stored.variables
                );
            }
            EnvCommands::List => {
                let environments = store.list_environments()?;
                if environments.is_empty() {
                    println!("No environments stored");
                }
                for stored in environments {
                    println!(
                        "{}  {}  {} variables  {}",
                        stored.id,
                        stored.name.cyan(),
                        stored.variables,
                        stored.uploaded_at.dimmed()
                    );
                }
            }
            EnvCommands::Remove { id } => {
                store.remove_environment(&id)?;
                println!("Deleted environment {id}");
            }
        },
    }

    Ok(())
}

async fn run_collection(collection: &Collection, vars: &VarMap, json: bool) -> Result<()> {
    let total = count_requests(&collection.items);
    let progress = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total as u64)
    };

    let outcome = tokio::time::timeout(
        RUN_CEILING,
        runner::run_with_observer(collection, vars, |_| progress.inc(1)),
    )
    .await;
    progress.finish_and_clear();

    let report = match outcome {
        Err(_) => bail!(
            "collection run exceeded the {} second ceiling",
            RUN_CEILING.as_secs()
        ),
        Ok(result) => result?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_run_report(collection.info.title(), &report);
    }
    Ok(())
}

/// A numeric argument is a stored-collection id; anything else is a path.
fn resolve_collection(store: &Store, reference: &str) -> Result<Collection> {
    if is_id(reference) {
        store.load_collection(reference)
    } else {
        load_collection_file(Path::new(reference))
    }
}

/// Inline variables win all-or-nothing: the stored environment is consulted
/// only when no inline variable was supplied at all.
fn resolve_vars(
    store: &Store,
    env: Option<&str>,
    pairs: &[String],
    vars_text: Option<&str>,
) -> Result<VarMap> {
    let mut inline = VarMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("invalid --var {pair:?}, expected KEY=VALUE"))?;
        inline.insert(key.to_string(), value.to_string());
    }
    if let Some(text) = vars_text {
        let extracted = extract_variables(text, &inline);
        inline.extend(extracted);
    }
    if !inline.is_empty() {
        return Ok(inline);
    }

    match env {
        Some(reference) if is_id(reference) => store.load_environment(reference),
        Some(reference) => load_environment_file(Path::new(reference)),
        None => Ok(VarMap::new()),
    }
}

fn is_id(reference: &str) -> bool {
    !reference.is_empty() && reference.chars().all(|ch| ch.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn is_id_accepts_only_digit_strings() {
        assert!(is_id("1712000000000"));
        assert!(!is_id("collection.json"));
        assert!(!is_id(""));
    }

    #[test]
    fn inline_vars_suppress_the_stored_environment() {
        let temp = tempdir().unwrap();
        let store = Store::new(temp.path());
        let vars = resolve_vars(
            &store,
            Some("999"),
            &["base=http://inline".to_string()],
            None,
        )
        .unwrap();
        assert_eq!(vars.get("base").map(String::as_str), Some("http://inline"));
    }

    #[test]
    fn stored_environment_is_used_when_no_inline_vars_exist() {
        let temp = tempdir().unwrap();
        let store = Store::new(temp.path());
        let err = resolve_vars(&store, Some("999"), &[], None).unwrap_err();
        assert!(err.to_string().contains("environment 999 not found"));
    }

    #[test]
    fn malformed_var_pairs_are_rejected() {
        let temp = tempdir().unwrap();
        let store = Store::new(temp.path());
        let err = resolve_vars(&store, None, &["no-equals".to_string()], None).unwrap_err();
        assert!(err.to_string().contains("expected KEY=VALUE"));
    }

    #[test]
    fn vars_text_contributes_inline_variables() {
        let temp = tempdir().unwrap();
        let store = Store::new(temp.path());
        let vars = resolve_vars(&store, None, &[], Some("BASE_URL: http://from-text")).unwrap();
        assert_eq!(
            vars.get("BASE_URL").map(String::as_str),
            Some("http://from-text")
        );
    }
}
