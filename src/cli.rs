//! Command-Line Interface
//!
//! One subcommand per assistance operation. Structured inputs are read as
//! JSON from a file or stdin; short free-text operations take their text
//! directly as arguments.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use serde::de::DeserializeOwned;

use crate::actions::AssistContext;
use crate::config::{Config, ConfigLoader, PROJECT_CONFIG_FILE};
use crate::types::{
    BudgetCoachInput, CategorySuggestInput, DuplicatesInput, NlFilterInput, ReportSummaryInput,
};

#[derive(Parser)]
#[command(name = "finassist")]
#[command(version, about = "AI assistance layer for personal finance data")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults to ./finassist.toml)
    #[arg(long, short, env = "FINASSIST_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// User id used for rate-limit bucketing
    #[arg(long, short, default_value = "local")]
    user: String,

    #[arg(long)]
    pub verbose: bool,

    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize report KPIs for a date range
    Summarize {
        #[arg(long, short, help = "JSON input file (stdin when omitted)")]
        input: Option<PathBuf>,
    },

    /// Suggest a category for a transaction note
    Suggest {
        #[arg(help = "Transaction note")]
        note: String,
        #[arg(long, short = 'C', help = "Candidate category (repeatable)")]
        candidate: Vec<String>,
    },

    /// Coach on budget overspends and next-month adjustments
    Coach {
        #[arg(long, short, help = "JSON input file (stdin when omitted)")]
        input: Option<PathBuf>,
    },

    /// Flag probable duplicate transactions
    Duplicates {
        #[arg(long, short, help = "JSON input file (stdin when omitted)")]
        input: Option<PathBuf>,
    },

    /// Parse free text into a structured transaction filter
    Filter {
        #[arg(help = "Natural-language filter text")]
        text: String,
    },

    /// Show the merged configuration
    Config {
        #[arg(long, help = "Print as JSON instead of TOML")]
        json: bool,
    },
}

fn read_json_input<T: DeserializeOwned>(path: Option<&Path>) -> anyhow::Result<T> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", p.display(), e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(config)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;

        if let Commands::Config { json } = &self.command {
            if *json {
                return print_json(&config);
            }
            println!("# merged from defaults, {}, FINASSIST_* env", PROJECT_CONFIG_FILE);
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }

        let ctx = AssistContext::from_config(&config);
        if ctx.provider_name() != config.ai.provider.trim().to_lowercase()
            && !config.ai.provider.trim().is_empty()
        {
            eprintln!(
                "{} provider '{}' unavailable, using '{}'",
                style("⚠").yellow(),
                config.ai.provider,
                ctx.provider_name()
            );
        }

        match self.command {
            Commands::Summarize { input } => {
                let parsed: ReportSummaryInput = read_json_input(input.as_deref())?;
                let summary = ctx.summarize_report(&self.user, parsed).await?;
                println!("{}", summary);
            }
            Commands::Suggest { note, candidate } => {
                let candidates = if candidate.is_empty() {
                    None
                } else {
                    Some(candidate)
                };
                let parsed = CategorySuggestInput { note, candidates };
                let result = ctx.suggest_category(&self.user, parsed).await?;
                println!(
                    "{} {} {}",
                    style("✓").green(),
                    style(&result.category_name).bold(),
                    style(format!("({:.0}% confidence)", result.confidence * 100.0)).dim()
                );
            }
            Commands::Coach { input } => {
                let parsed: BudgetCoachInput = read_json_input(input.as_deref())?;
                let advice = ctx.budget_coach(&self.user, parsed).await?;
                println!("{}", advice);
            }
            Commands::Duplicates { input } => {
                let parsed: DuplicatesInput = read_json_input(input.as_deref())?;
                let result = ctx.find_duplicates(&self.user, parsed).await?;
                if result.ids.is_empty() {
                    println!("{} no duplicates found", style("✓").green());
                } else {
                    println!(
                        "{} {} probable duplicate(s):",
                        style("⚠").yellow(),
                        result.ids.len()
                    );
                    for id in &result.ids {
                        println!("  {}", id);
                    }
                }
            }
            Commands::Filter { text } => {
                let result = ctx.nl_filter(&self.user, NlFilterInput { text }).await?;
                if result.is_empty() {
                    println!("{} no filter recognized", style("ℹ").blue());
                } else {
                    print_json(&result)?;
                }
            }
            Commands::Config { .. } => unreachable!("handled above"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_suggest_parses_candidates() {
        let cli = Cli::try_parse_from([
            "finassist", "suggest", "Uber ride", "-C", "Transport", "-C", "Food",
        ])
        .unwrap();
        match cli.command {
            Commands::Suggest { note, candidate } => {
                assert_eq!(note, "Uber ride");
                assert_eq!(candidate, vec!["Transport", "Food"]);
            }
            _ => panic!("expected suggest"),
        }
    }

    #[test]
    fn test_user_defaults_to_local() {
        let cli = Cli::try_parse_from(["finassist", "filter", "under 100"]).unwrap();
        assert_eq!(cli.user, "local");
    }
}
