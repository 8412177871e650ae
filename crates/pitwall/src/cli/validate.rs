//! validate command: parse, default, validate and resolve an intent file.

use crate::cli::config::DbArgs;
use crate::cli::error::HelpfulError;
use anyhow::{Context, Result};
use pitwall_intent::QueryIntent;
use pitwall_resolve::IntentResolver;
use pitwall_rules::{apply_defaults, IntentValidator};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for the validate command
#[derive(Debug, clap::Args)]
pub struct ValidateArgs {
    /// Intent JSON file ("-" reads stdin)
    pub file: PathBuf,

    /// Stop after validation; do not open the database
    #[arg(long)]
    pub no_resolve: bool,

    /// Print only the final intent JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run(args: ValidateArgs) -> Result<()> {
    let raw = read_input(&args.file)?;
    let intent = parse_intent(&args.file, &raw)?;
    let intent = validated(intent)?;

    let intent = if args.no_resolve {
        intent
    } else {
        let db = args.db.open().await?;
        let resolved = IntentResolver::new(db)
            .resolve(intent)
            .await
            .map_err(|err| HelpfulError::rejected_intent(&err))?;
        IntentValidator::validate_resolved(&resolved)
            .map_err(|err| HelpfulError::rejected_intent(&err))?;
        resolved
    };

    info!(kind = %intent.kind(), season = intent.season(), "Intent accepted");

    let rendered = serde_json::to_string_pretty(&intent)?;
    if args.json {
        println!("{}", rendered);
    } else {
        println!("OK: {} ({})", intent.kind(), intent.season());
        if !args.no_resolve {
            println!("Identities resolved against {}", args.db.path().display());
        }
        println!();
        println!("{}", rendered);
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read intent from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_intent(path: &Path, raw: &str) -> Result<QueryIntent> {
    serde_json::from_str(raw).map_err(|err| HelpfulError::invalid_intent_file(path, &err).into())
}

/// Apply kind defaults and run structural validation.
fn validated(mut intent: QueryIntent) -> Result<QueryIntent> {
    apply_defaults(&mut intent);
    IntentValidator::validate(&intent).map_err(|err| HelpfulError::rejected_intent(&err))?;
    Ok(intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_before_validation() {
        let path = PathBuf::from("intent.json");
        let intent = parse_intent(
            &path,
            r#"{ "kind": "season_driver_vs_driver", "season": 2024,
                 "driver_a_id": "max_verstappen", "driver_b_id": "lando_norris" }"#,
        )
        .unwrap();
        let intent = validated(intent).unwrap();
        assert_eq!(intent.common.metric.as_deref(), Some("season_avg_pace"));
    }

    #[test]
    fn test_fractional_season_is_parse_error() {
        let path = PathBuf::from("intent.json");
        let err = parse_intent(&path, r#"{ "kind": "track_winners", "season": 2024.5 }"#).unwrap_err();
        let helpful = err.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.contains("intent.json"));
    }

    #[test]
    fn test_missing_identity_rejected() {
        let path = PathBuf::from("intent.json");
        let intent = parse_intent(&path, r#"{ "kind": "driver_win_count", "season": 2024 }"#).unwrap();
        let err = validated(intent).unwrap_err();
        let helpful = err.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.starts_with("Intent rejected"));
    }
}
