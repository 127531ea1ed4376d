use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::debug;
use serde_json::Value;

use formgen_core::config::{self, CONFIG_FILE_NAME, FormgenConfig};
use formgen_core::form::EditValue;
use formgen_core::model::CLASS_KEY;
use formgen_core::path::JsonPath;
use formgen_core::{FormSession, LoadOutcome};

#[derive(Parser)]
#[command(name = "formgen", about = "Schema-driven form generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the types a form can be generated for
    Types {
        #[command(flatten)]
        source: Source,
    },

    /// Validate an instance against the loaded models
    Validate {
        #[command(flatten)]
        source: Source,
    },

    /// Render the form for a type as HTML
    Render {
        #[command(flatten)]
        source: Source,

        /// Output file (defaults to the configured output, or stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the form descriptor tree
    Inspect {
        #[command(flatten)]
        source: Source,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Apply PATH=VALUE edits and print the resulting instance
    Edit {
        #[command(flatten)]
        source: Source,

        /// Edits such as `$.title=Hello` or `$.items[0].count=3`
        #[arg(required = true)]
        edits: Vec<String>,
    },

    /// Initialize a new formgen configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Where the models, type and instance come from. Unset values fall back to
/// `.formgen.yaml`.
#[derive(Args)]
struct Source {
    /// Model document (YAML or JSON); repeat for several
    #[arg(short, long = "model")]
    models: Vec<PathBuf>,

    /// Fully-qualified type to edit
    #[arg(short = 't', long = "type")]
    type_name: Option<String>,

    /// JSON instance to start from
    #[arg(short, long)]
    instance: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Types { source } => cmd_types(source),

        Commands::Validate { source } => cmd_validate(source),

        Commands::Render { source, output } => cmd_render(source, output),

        Commands::Inspect { source, format } => cmd_inspect(source, format),

        Commands::Edit { source, edits } => cmd_edit(source, &edits),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "formgen", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<FormgenConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_instance(path: &Path) -> Result<Value> {
    let content = read_file(path)?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Load the models, then select the type and instance named by `source`.
fn open_session(source: Source, cfg: &FormgenConfig) -> Result<FormSession> {
    let models: Vec<PathBuf> = if source.models.is_empty() {
        cfg.models.iter().map(PathBuf::from).collect()
    } else {
        source.models
    };
    if models.is_empty() {
        anyhow::bail!("no models given. Pass --model or list them in {CONFIG_FILE_NAME}.");
    }
    let texts = models
        .iter()
        .map(|path| read_file(path))
        .collect::<Result<Vec<_>>>()?;

    let mut session: FormSession = FormSession::new(cfg.form.clone());
    let outcome = session
        .load_from_texts(&texts)
        .context("failed to load models")?;
    debug!("loaded {} model documents: {outcome:?}", texts.len());

    let instance = source
        .instance
        .or_else(|| cfg.instance.as_ref().map(PathBuf::from))
        .map(|path| read_instance(&path))
        .transpose()?;

    let type_name = source
        .type_name
        .or_else(|| cfg.type_name.clone())
        .or_else(|| {
            instance
                .as_ref()
                .and_then(|i| i.get(CLASS_KEY))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    if let Some(instance) = instance {
        session.set_instance(instance)?;
    }
    if let Some(fqn) = type_name {
        session.select_type(&fqn)?;
    }
    if outcome == LoadOutcome::Applied && session.selected_type().is_none() {
        anyhow::bail!("the models declare no concrete types");
    }
    Ok(session)
}

fn report_warning(session: &FormSession) {
    if let Some(warning) = session.warning() {
        eprintln!("warning: {warning}");
    }
}

fn cmd_types(source: Source) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let session = open_session(source, &cfg)?;
    for decl in session.types() {
        println!("{}", decl.fqn);
    }
    Ok(())
}

fn cmd_validate(source: Source) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    if source.instance.is_none() && cfg.instance.is_none() {
        anyhow::bail!("no instance given. Pass --instance or set `instance` in {CONFIG_FILE_NAME}.");
    }
    let session = open_session(source, &cfg)?;
    let instance = session
        .instance()
        .context("no instance loaded")?;
    match session.generator().validate_instance(instance) {
        None => {
            let class = instance.get(CLASS_KEY).and_then(Value::as_str).unwrap_or("?");
            eprintln!("Valid instance of {class}.");
            Ok(())
        }
        Some(message) => anyhow::bail!(message),
    }
}

fn cmd_render(source: Source, output: Option<PathBuf>) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let session = open_session(source, &cfg)?;
    report_warning(&session);

    let fqn = session.selected_type().context("no type selected")?;
    let instance = session.instance().context("no instance to render")?;
    let html = formgen_html::emit_form(session.generator(), fqn, instance)?;

    match output.or_else(|| cfg.output.as_ref().map(PathBuf::from)) {
        Some(path) => {
            fs::write(&path, html).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("  wrote {}", path.display());
        }
        None => println!("{html}"),
    }
    Ok(())
}

fn cmd_inspect(source: Source, format: InspectFormat) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let session = open_session(source, &cfg)?;
    report_warning(&session);
    let tree = session.tree().context("no form could be built")?;

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(tree)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(tree)?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// Split `PATH=VALUE` at the first `=`.
fn parse_edit(edit: &str) -> Result<(JsonPath, String)> {
    let (path, value) = edit
        .split_once('=')
        .with_context(|| format!("expected PATH=VALUE, got `{edit}`"))?;
    let path: JsonPath = path.trim().parse()?;
    Ok((path, value.to_string()))
}

fn cmd_edit(source: Source, edits: &[String]) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let mut session = open_session(source, &cfg)?;

    for edit in edits {
        let (path, value) = parse_edit(edit)?;
        let action = session
            .tree()
            .and_then(|tree| tree.change_action(&path))
            .cloned()
            .with_context(|| format!("no editable field at {path}"))?;
        session.invoke(&action, Some(EditValue::Text(value)))?;
    }

    let instance = session.instance().context("no instance")?;
    println!("{}", serde_json::to_string_pretty(instance)?);
    report_warning(&session);
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
