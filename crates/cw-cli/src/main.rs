//! CookieWipe CLI
//!
//! CLI tool for editing CookieWipe settings files, checking how domains and
//! cookies are classified, and replaying recorded browser sessions.

mod replay;
mod settings_file;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use cw_core::cookie::CookieClass;
use cw_core::list::ListKind;
use cw_core::presets::TrackerPreset;
use cw_core::url::domain_from_url;
use cw_core::Policy;

#[derive(Parser)]
#[command(name = "cw-cli")]
#[command(about = "CookieWipe settings and policy tools")]
struct Cli {
    /// Settings file (JSON object of storage keys)
    #[arg(short, long, global = true, default_value = "cookiewipe.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write first-run defaults for missing keys
    Init {
        /// Replace the whole file with defaults
        #[arg(long)]
        force: bool,
    },

    /// Edit the whitelist or blacklist
    List {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Show the tab-close decision for a domain or URL
    Check {
        /// Domain or URL
        target: String,
    },

    /// Show the decision for a newly set cookie
    Cookie {
        /// Cookie domain attribute (may start with a dot)
        #[arg(short, long)]
        domain: String,

        /// Cookie name
        #[arg(short, long)]
        name: String,
    },

    /// List tracker presets and whether they are enabled
    Presets,

    /// Replay a recorded session against in-memory stores
    Replay {
        /// Scenario file with `cookies` and `events`
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum ListAction {
    /// Add a pattern
    Add {
        #[arg(value_enum)]
        list: ListArg,
        pattern: String,
    },
    /// Remove a pattern
    Remove {
        #[arg(value_enum)]
        list: ListArg,
        pattern: String,
    },
    /// Print a list
    Show {
        #[arg(value_enum)]
        list: ListArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListArg {
    Whitelist,
    Blacklist,
}

impl From<ListArg> for ListKind {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Whitelist => ListKind::Whitelist,
            ListArg::Blacklist => ListKind::Blacklist,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => cmd_init(&cli.settings, force),
        Commands::List { action } => cmd_list(&cli.settings, action),
        Commands::Check { target } => cmd_check(&cli.settings, &target),
        Commands::Cookie { domain, name } => cmd_cookie(&cli.settings, &domain, &name),
        Commands::Presets => cmd_presets(&cli.settings),
        Commands::Replay { input } => cmd_replay(&cli.settings, &input),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<(), String> {
    let added = settings_file::init(path, force)?;
    if added.is_empty() {
        println!("'{}' already has every setting", path.display());
    } else {
        println!("Wrote {} default settings to '{}': {}", added.len(), path.display(), added.join(", "));
    }
    Ok(())
}

fn cmd_list(path: &Path, action: ListAction) -> Result<(), String> {
    let mut settings = settings_file::load(path)?;

    match action {
        ListAction::Add { list, pattern } => {
            let kind = ListKind::from(list);
            let added = settings.add_pattern(kind, &pattern).map_err(|e| e.to_string())?;
            settings_file::save(path, &settings)?;
            println!("Added '{}' to {}", added, kind.key());
        }
        ListAction::Remove { list, pattern } => {
            let kind = ListKind::from(list);
            settings.list_mut(kind).remove(&pattern).map_err(|e| e.to_string())?;
            settings_file::save(path, &settings)?;
            println!("Removed '{}' from {}", pattern, kind.key());
        }
        ListAction::Show { list } => {
            let kind = ListKind::from(list);
            let patterns = settings.list(kind);
            println!("{} ({} patterns)", kind.key(), patterns.len());
            for pattern in patterns.iter() {
                println!("  {}", pattern);
            }
        }
    }

    Ok(())
}

fn cmd_check(path: &Path, target: &str) -> Result<(), String> {
    let domain = if target.contains("://") {
        domain_from_url(target).ok_or_else(|| format!("No domain in '{}'", target))?
    } else {
        target.trim().trim_end_matches('.').to_ascii_lowercase()
    };

    let settings = settings_file::load(path)?;
    let policy = Policy::new(&settings);
    let decision = policy.decide_domain(&domain);

    println!("Domain:   {}", domain);
    println!("Verdict:  {}", decision.verdict.as_str());
    println!("Reason:   {}", decision.reason.as_str());
    println!("Badge:    {}", policy.badge_color(&domain).code());
    if let Some(pattern) = settings.whitelist.matching_pattern(&domain) {
        println!("Whitelist pattern: {}", pattern);
    }
    if let Some(pattern) = settings.blacklist.matching_pattern(&domain) {
        println!("Blacklist pattern: {}", pattern);
    }
    if let Some(preset) = settings.tracker_presets.matching_preset(&domain) {
        println!("Tracker preset:    {}", preset.key());
    }
    if !settings.enabled {
        println!("Note: extension is disabled, nothing would be deleted");
    }

    Ok(())
}

fn cmd_cookie(path: &Path, domain: &str, name: &str) -> Result<(), String> {
    let settings = settings_file::load(path)?;
    let decision = Policy::new(&settings).decide_cookie(domain, name);
    let class = CookieClass::of(name);

    println!("Cookie:     {} on {}", name, domain);
    println!("Tracking:   {}", class.tracking);
    println!("Preference: {}", class.preference);
    println!("Mode:       {}", settings.cleanup_mode.as_str());
    println!("Verdict:    {}", decision.verdict.as_str());
    println!("Reason:     {}", decision.reason.as_str());

    Ok(())
}

fn cmd_presets(path: &Path) -> Result<(), String> {
    let settings = settings_file::load(path)?;

    for preset in TrackerPreset::ALL {
        let mark = if settings.tracker_presets.is_enabled(preset) { "x" } else { " " };
        println!("[{}] {}", mark, preset.key());
        for pattern in preset.patterns() {
            println!("      {}", pattern);
        }
    }

    Ok(())
}

fn cmd_replay(path: &Path, input: &Path) -> Result<(), String> {
    let scenario = replay::load_scenario(input)?;
    let event_count = scenario.events.len();

    println!("Replaying {} events from '{}'", event_count, input.display());
    let result = replay::run_replay(path, scenario)?;

    println!();
    println!("Cookies blocked: {}", result.stats.total_cookies_blocked);
    println!("Ads blocked:     {}", result.stats.total_ads_blocked);
    println!("Remaining cookies: {}", result.remaining.len());
    for cookie in &result.remaining {
        println!("  {} ({})", cookie.name, cookie.domain);
    }

    Ok(())
}
