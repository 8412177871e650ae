//! resolve-driver / resolve-track commands

use crate::cli::config::DbArgs;
use crate::cli::error::HelpfulError;
use anyhow::Result;
use pitwall_resolve::{
    DriverResolveOptions, DriverResolver, ResolutionResult, ResolveError, Resolved, TrackResolver,
};
use serde::Serialize;

/// Arguments for the resolve-driver command
#[derive(Debug, clap::Args)]
pub struct ResolveDriverArgs {
    /// Driver names, codes or ids
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Season used to rank colliding names
    #[arg(long)]
    pub season: Option<i32>,

    /// Canonical id of the other driver in the request (collision tie-break)
    #[arg(long)]
    pub teammate: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Arguments for the resolve-track command
#[derive(Debug, clap::Args)]
pub struct ResolveTrackArgs {
    /// Track names, event names or ids
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Debug, Serialize)]
struct ResolutionLine {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    match_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

impl ResolutionLine {
    fn from_result(input: String, result: &ResolutionResult<Resolved>) -> Self {
        match result {
            Ok(resolved) => Self {
                input,
                canonical_id: Some(resolved.canonical_id.clone()),
                match_mode: Some(resolved.match_mode.as_str()),
                error: None,
            },
            Err(err) => Self {
                input,
                canonical_id: None,
                match_mode: None,
                error: Some(err.code()),
            },
        }
    }
}

pub async fn run_driver(args: ResolveDriverArgs) -> Result<()> {
    let db = args.db.open().await?;
    let resolver = DriverResolver::new(db);

    let options = DriverResolveOptions {
        season: args.season,
        teammate_id: args.teammate.clone(),
    };
    let aliases: Vec<&str> = args.names.iter().map(String::as_str).collect();
    let results = resolver.resolve_many(&aliases, &options).await;

    report("driver", results, args.json)
}

pub async fn run_track(args: ResolveTrackArgs) -> Result<()> {
    let db = args.db.open().await?;
    let resolver = TrackResolver::new(db);

    let aliases: Vec<&str> = args.names.iter().map(String::as_str).collect();
    let results = resolver.resolve_many(&aliases).await;

    report("track", results, args.json)
}

fn report(entity: &str, results: Vec<(String, ResolutionResult<Resolved>)>, json: bool) -> Result<()> {
    let failure = results.iter().find_map(|(input, result)| match result {
        Ok(_) => None,
        Err(ResolveError::UnknownEntity { .. }) => {
            Some(anyhow::Error::new(HelpfulError::unknown_entity(entity, input)))
        }
        Err(err) => Some(anyhow::anyhow!("Failed to resolve '{}': {}", input, err)),
    });
    let lines: Vec<ResolutionLine> = results
        .into_iter()
        .map(|(input, result)| ResolutionLine::from_result(input, &result))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for line in &lines {
            match (&line.canonical_id, line.match_mode, line.error) {
                (Some(id), Some(mode), _) => println!("{} -> {} ({})", line.input, id, mode),
                (_, _, Some(code)) => println!("{} -> <{}>", line.input, code),
                _ => println!("{} -> <unresolved>", line.input),
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_from_success() {
        let line = ResolutionLine::from_result("VER".into(), &Ok(Resolved::literal("max_verstappen")));
        assert_eq!(line.canonical_id.as_deref(), Some("max_verstappen"));
        assert_eq!(line.match_mode, Some("literal"));
        assert!(line.error.is_none());
    }

    #[test]
    fn test_line_from_unknown() {
        let line = ResolutionLine::from_result("Nobody".into(), &Err(ResolveError::unknown("Nobody")));
        assert!(line.canonical_id.is_none());
        assert_eq!(line.error, Some("unknown_entity"));
    }
}
