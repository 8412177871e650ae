//! Configuration paths for Pitwall
//!
//! Everything lives under ~/.pitwall/ unless `PITWALL_HOME` says otherwise;
//! the analytics snapshot can be pointed at with `--db` or `PITWALL_DB`.

use crate::cli::error::HelpfulError;
use anyhow::Result;
use pitwall_db::PitwallDb;
use pitwall_interpret::AdaptiveLoopConfig;
use std::path::PathBuf;

pub use pitwall_logging::{logs_dir, pitwall_home};

/// Default snapshot path: ~/.pitwall/pitwall.db
pub fn default_db_path() -> PathBuf {
    pitwall_home().join("pitwall.db")
}

/// Database selection shared by every command that reads the snapshot.
#[derive(Debug, Clone, clap::Args)]
pub struct DbArgs {
    /// Analytics snapshot to read (opened read-only)
    #[arg(long, env = "PITWALL_DB")]
    pub db: Option<PathBuf>,
}

impl DbArgs {
    pub fn path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }

    /// Open the snapshot read-only.
    pub async fn open(&self) -> Result<PitwallDb> {
        let path = self.path();
        if !path.exists() {
            return Err(HelpfulError::database_not_found(&path).into());
        }
        let db = PitwallDb::open_existing(&path)
            .await
            .map_err(|err| HelpfulError::database_unreadable(&path, &err))?;
        Ok(db)
    }
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Show resolved paths and the default interpretation tunables.
pub fn run(args: ConfigArgs) -> Result<()> {
    let home = pitwall_home();
    let logs = logs_dir();
    let db = args.db.path();
    let tunables = AdaptiveLoopConfig::default();

    if args.json {
        let config = serde_json::json!({
            "home": home.to_string_lossy(),
            "logs": {
                "path": logs.to_string_lossy(),
                "exists": logs.exists(),
            },
            "database": {
                "path": db.to_string_lossy(),
                "exists": db.exists(),
                "from_env": std::env::var_os("PITWALL_DB").is_some(),
            },
            "adaptive_loop": tunables,
        });
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("PITWALL CONFIGURATION");
        println!("=====================");
        println!();
        println!("Home:     {}", home.display());
        println!("Logs:     {}", logs.display());
        println!(
            "Database: {} ({})",
            db.display(),
            if db.exists() { "exists" } else { "not found" }
        );
        println!();
        println!("Adaptive loop");
        println!("  max iterations:         {}", tunables.max_iterations);
        println!("  min shared races:       {}", tunables.coverage.min_shared_races);
        println!("  preferred shared races: {}", tunables.coverage.preferred_shared_races);
        println!("  max fallback years:     {}", tunables.coverage.max_fallback_years);
    }

    Ok(())
}
