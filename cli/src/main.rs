//! `profilesmith` entry point.
//!
//! One-shot front end over the pipeline: list sections, inspect their
//! parameters, and export modified values as a configuration profile.
//! Values are supplied per invocation with repeated `--set` flags; the
//! pipeline itself holds no state between runs beyond its caches.

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;
use clap::Parser;
use clap::Subcommand;
use profilesmith_core::ParameterType;
use profilesmith_core::ParameterValue;
use profilesmith_core::Pipeline;
use profilesmith_core::PipelineConfig;
use profilesmith_core::ProfileMeta;
use profilesmith_core::derive_identifier;
use std::path::PathBuf;

/// Device-configuration profile builder
#[derive(Debug, Parser)]
#[command(name = "profilesmith", version = profilesmith_core::VERSION)]
struct Cli {
    /// Path to a config file (default: the standard config location)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bypass caches and refetch from the upstream source
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available configuration sections
    Sections {
        /// Output as JSON for automation
        #[arg(long)]
        json: bool,
    },

    /// Show the parameters of one section
    Show {
        /// Section identifier or display name
        section: String,

        /// Output as JSON for automation
        #[arg(long)]
        json: bool,
    },

    /// Preview what an export would contain
    Preview {
        /// TOML file of values, one table per section
        #[arg(long, value_name = "PATH")]
        values: Option<PathBuf>,

        /// Value assignment, `section.key=value`; repeatable
        #[arg(long = "set", value_name = "ASSIGNMENT")]
        assignments: Vec<String>,
    },

    /// Export modified values as a configuration-profile document
    Export {
        /// TOML file of values, one table per section
        #[arg(long, value_name = "PATH")]
        values: Option<PathBuf>,

        /// Value assignment, `section.key=value`; repeatable
        #[arg(long = "set", value_name = "ASSIGNMENT")]
        assignments: Vec<String>,

        /// Profile display name
        #[arg(long)]
        name: String,

        /// Reverse-DNS profile identifier
        #[arg(long)]
        identifier: String,

        /// Profile description
        #[arg(long, default_value = "")]
        description: String,

        /// Write the document here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from(path)?,
        None => PipelineConfig::load()?,
    };
    let mut pipeline = Pipeline::new(config);

    match cli.command {
        Command::Sections { json } => {
            pipeline.load_sections(cli.refresh).await?;
            print_sections(&pipeline, json)?;
        }
        Command::Show { section, json } => {
            pipeline.load_sections(cli.refresh).await?;
            print_section(&pipeline, &section, json)?;
        }
        Command::Preview {
            values,
            assignments,
        } => {
            pipeline.load_sections(cli.refresh).await?;
            if let Some(path) = &values {
                apply_values_file(&mut pipeline, path)?;
            }
            apply_assignments(&mut pipeline, &assignments)?;
            let preview = pipeline.preview();
            println!("{}", preview.summary);
            for section in &preview.sections {
                println!("[{}]", section.section_id);
                for entry in &section.entries {
                    println!("  {} = {} ({})", entry.key, entry.value, entry.value_type);
                }
            }
        }
        Command::Export {
            values,
            assignments,
            name,
            identifier,
            description,
            output,
        } => {
            pipeline.load_sections(cli.refresh).await?;
            if let Some(path) = &values {
                apply_values_file(&mut pipeline, path)?;
            }
            apply_assignments(&mut pipeline, &assignments)?;
            let meta = ProfileMeta {
                name,
                identifier,
                description,
            };
            let document = pipeline.export(&meta).map_err(|err| {
                anyhow!(
                    "export rejected:\n{}",
                    err.violations()
                        .iter()
                        .map(|v| format!("  - {v}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            })?;
            match output {
                Some(path) => {
                    std::fs::write(&path, document)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(path = %path.display(), "profile written");
                }
                None => print!("{document}"),
            }
        }
    }
    Ok(())
}

fn print_sections(pipeline: &Pipeline, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(pipeline.sections())?);
        return Ok(());
    }
    for section in pipeline.sections() {
        let marker = if section.synthetic { "*" } else { " " };
        let parent = section
            .parent_identifier
            .as_deref()
            .map(|p| format!(" (under {p})"))
            .unwrap_or_default();
        println!(
            "{marker} {:<24} {}{parent}  [{} parameters]",
            section.identifier,
            section.name,
            section.parameters.len()
        );
    }
    Ok(())
}

fn print_section(pipeline: &Pipeline, name: &str, json: bool) -> anyhow::Result<()> {
    let section = pipeline
        .find_section(name)
        .ok_or_else(|| anyhow!("unknown section '{name}'"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(section)?);
        return Ok(());
    }
    println!("{} ({})", section.name, section.identifier);
    if !section.description.is_empty() {
        println!("{}", section.description);
    }
    for parameter in &section.parameters {
        let required = if parameter.required { " (required)" } else { "" };
        println!("  {:<28} {}{required}", parameter.key, parameter.param_type.as_str());
        if !parameter.enum_values.is_empty() {
            println!("    one of: {}", parameter.enum_values.join(", "));
        }
    }
    Ok(())
}

/// Apply `section.key=value` assignments, coercing each value with the
/// parameter type from the loaded model when the parameter is known.
fn apply_assignments(pipeline: &mut Pipeline, assignments: &[String]) -> anyhow::Result<()> {
    for assignment in assignments {
        let (target, raw_value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("assignment '{assignment}' is not section.key=value"))?;
        let (section, key) = target
            .split_once('.')
            .ok_or_else(|| anyhow!("assignment target '{target}' is not section.key"))?;

        let section_id = derive_identifier(section);
        if pipeline.find_section(section).is_none() {
            bail!("unknown section '{section}'");
        }
        let param_type = pipeline
            .find_section(section)
            .and_then(|s| s.parameters.iter().find(|p| p.key == key))
            .map(|p| p.param_type)
            .unwrap_or(ParameterType::String);
        let value = coerce_value(raw_value, param_type)
            .with_context(|| format!("value for {section_id}.{key}"))?;
        pipeline.set_value(&section_id, key, Some(value));
    }
    Ok(())
}

/// Load a TOML values file: one table per section, one entry per parameter.
/// Native TOML types map directly; strings are coerced with the model's
/// parameter type like a `--set` assignment would be.
fn apply_values_file(pipeline: &mut Pipeline, path: &PathBuf) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading values file {}", path.display()))?;
    let table: toml::Table = text
        .parse()
        .with_context(|| format!("parsing values file {}", path.display()))?;

    for (section, entries) in table {
        let toml::Value::Table(entries) = entries else {
            bail!("values for '{section}' must be a table of parameters");
        };
        let section_id = derive_identifier(&section);
        if pipeline.find_section(&section).is_none() {
            bail!("unknown section '{section}' in {}", path.display());
        }
        for (key, raw) in entries {
            let param_type = pipeline
                .find_section(&section)
                .and_then(|s| s.parameters.iter().find(|p| p.key == key))
                .map(|p| p.param_type)
                .unwrap_or(ParameterType::String);
            let value = toml_to_value(&raw, param_type)
                .with_context(|| format!("value for {section_id}.{key}"))?;
            pipeline.set_value(&section_id, &key, Some(value));
        }
    }
    Ok(())
}

fn toml_to_value(raw: &toml::Value, param_type: ParameterType) -> anyhow::Result<ParameterValue> {
    let value = match raw {
        toml::Value::Boolean(b) => ParameterValue::Bool(*b),
        toml::Value::Integer(i) => ParameterValue::Int(*i),
        toml::Value::Float(f) => ParameterValue::Float(*f),
        toml::Value::String(s) => return coerce_value(s, param_type),
        toml::Value::Datetime(dt) => ParameterValue::Timestamp(
            dt.to_string()
                .parse::<chrono::DateTime<chrono::Utc>>()
                .with_context(|| format!("'{dt}' is not an RFC 3339 timestamp"))?,
        ),
        toml::Value::Array(items) => ParameterValue::TextList(
            items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        toml::Value::Table(entries) => ParameterValue::TextMap(
            entries
                .iter()
                .map(|(k, v)| {
                    let text = match v {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect(),
        ),
    };
    Ok(value)
}

fn coerce_value(raw: &str, param_type: ParameterType) -> anyhow::Result<ParameterValue> {
    let value = match param_type {
        ParameterType::Boolean => ParameterValue::Bool(match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            other => bail!("'{other}' is not a boolean"),
        }),
        ParameterType::Integer => ParameterValue::Int(raw.parse()?),
        ParameterType::Number => ParameterValue::Float(raw.parse()?),
        ParameterType::Array => {
            ParameterValue::TextList(raw.split(',').map(|s| s.trim().to_string()).collect())
        }
        ParameterType::Date => ParameterValue::Timestamp(
            raw.parse::<chrono::DateTime<chrono::Utc>>()
                .with_context(|| format!("'{raw}' is not an RFC 3339 timestamp"))?,
        ),
        ParameterType::Data => ParameterValue::Blob(raw.to_string()),
        _ => ParameterValue::Text(raw.to_string()),
    };
    Ok(value)
}
