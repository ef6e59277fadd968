//! formbind - load, resolve and edit declarative forms from the command line

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use formbind::{EngineConfig, FormEngine, FormService, FormState, JsonStore, ResolutionMode};
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "formbind", version, about = "Resolve declarative forms against JSON data")]
struct Cli {
    /// Store directory (overrides FORMBIND_STORE and the config file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available forms
    List,
    /// Load a form with its data and print the resolved state
    Show {
        form: String,
        /// Record id within the form's data source (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,
    },
    /// Apply edits to a form's data and print the resolved state
    Edit {
        form: String,
        /// Record id within the form's data source (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,
        /// SCHEMA=VALUE; VALUE is read as JSON, falling back to a plain string
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        sets: Vec<(String, Value)>,
        /// Persist the edited data record
        #[arg(long)]
        save: bool,
    },
    /// Print the configuration, saving any changes given as options
    Config {
        /// Default store directory
        #[arg(long)]
        store_dir: Option<PathBuf>,
        /// Resolve computed values until stable, allowing this many passes
        #[arg(long, conflicts_with = "bounded")]
        fixed_point: Option<usize>,
        /// Go back to bounded resolution
        #[arg(long)]
        bounded: bool,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (schema, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SCHEMA=VALUE, got {raw:?}"))?;
    let schema = schema.trim();
    if schema.is_empty() {
        return Err(format!("missing schema in {raw:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((schema.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formbind=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::load()?;

    if let Command::Config {
        store_dir,
        fixed_point,
        bounded,
    } = cli.command
    {
        if apply_config(&mut config, store_dir, fixed_point, bounded) {
            let path = config.save()?;
            eprintln!("saved {}", path.display());
        }
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let store_dir = cli.store.clone().unwrap_or_else(|| config.store_dir());
    let engine = FormEngine::new().with_mode(config.resolution());
    let service = FormService::new(JsonStore::new(store_dir), engine);
    tracing::debug!(
        store = %service.backend().root().display(),
        mode = ?service.engine().mode(),
        "opened store"
    );

    if let Err(err) = run(cli.command, &service).await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
    Ok(())
}

/// Apply `config` options; returns whether anything changed
fn apply_config(
    config: &mut EngineConfig,
    store_dir: Option<PathBuf>,
    fixed_point: Option<usize>,
    bounded: bool,
) -> bool {
    let mut changed = false;
    if let Some(dir) = store_dir {
        config.store_dir = Some(dir);
        changed = true;
    }
    if let Some(max_passes) = fixed_point {
        config.resolution = Some(ResolutionMode::FixedPoint { max_passes });
        changed = true;
    }
    if bounded {
        config.resolution = Some(ResolutionMode::Bounded);
        changed = true;
    }
    changed
}

async fn run(command: Command, service: &FormService<JsonStore>) -> Result<()> {
    match command {
        Command::Config { .. } => bail!("config is handled before the store is opened"),
        Command::List => {
            for form in service.get_forms().await? {
                match form.title {
                    Some(title) => println!("{}\t{}", form.name, title),
                    None => println!("{}", form.name),
                }
            }
        }
        Command::Show { form, ids } => {
            let ids = (!ids.is_empty()).then_some(ids.as_slice());
            let state = service.get_form_and_data(&form, ids).await?;
            print_state(&state)?;
        }
        Command::Edit {
            form,
            ids,
            sets,
            save,
        } => {
            if save && ids.is_empty() {
                bail!("--save needs at least one --id");
            }
            let record_ids = (!ids.is_empty()).then_some(ids.as_slice());
            let mut state = service.get_form_and_data(&form, record_ids).await?;
            for (schema, value) in sets {
                if service
                    .engine()
                    .update_by_schema(&schema, value, &mut state)
                    .is_none()
                {
                    bail!("no component of {form} is bound to {schema}");
                }
            }
            print_state(&state)?;

            if save {
                let Some(source) = state.form.data_source.clone() else {
                    bail!("form {form} has no data source");
                };
                let outcome = service.save_data(&source, &ids, &state.data).await?;
                println!("saved {} bytes to {}", outcome.bytes, outcome.location.display());
            }
        }
    }
    Ok(())
}

fn print_state(state: &FormState) -> Result<()> {
    let title = state.form.title.as_deref().unwrap_or(&state.form.name);
    println!("{title}");

    for (key, component) in state.components() {
        if key.component == 0 {
            let section = &state.form.pages[key.page].sections[key.section];
            println!(
                "-- page {} / {}",
                key.page + 1,
                section.title.as_deref().unwrap_or("section")
            );
        }

        let mut flags = Vec::new();
        if !component.is_visible() {
            flags.push("hidden");
        }
        if !component.is_enabled() {
            flags.push("disabled");
        }
        if component.is_required() {
            flags.push("required");
        }
        if component.value_condition().is_some() {
            flags.push("computed");
        }

        let name = component
            .label
            .as_deref()
            .or(component.schema.as_deref())
            .unwrap_or("?");
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };
        println!(
            "   {name} ({}): {}{flags}",
            component.value_type,
            component.display_value()
        );
    }

    println!("{}", serde_json::to_string_pretty(&state.data)?);
    Ok(())
}
