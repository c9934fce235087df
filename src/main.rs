//! idbshim - CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idbshim::module::ModuleSystem;
use idbshim::shim::{StaticRegistry, HOOKS};
use idbshim::util::config::{load_config, parse_address};
use idbshim::util::logger::{self, LogLevel};
use idbshim::{NAME, VERSION};

/// Serve IDAPython-style modules from a configured profile
#[derive(Parser, Debug)]
#[command(name = "idbshim")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the hooked module names and the roles behind them
    Hooks,

    /// Install the shim from a profile and import a module through it
    Import {
        /// Profile (TOML) describing segments and providers
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Module to import
        #[arg(value_name = "NAME")]
        name: String,

        /// Current address (decimal or 0x hex); overrides the profile
        #[arg(long, value_name = "ADDR")]
        screen_ea: Option<String>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Hooks => {
            for (name, roles) in HOOKS {
                let roles: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                println!("{:<12} {}", name, roles.join(", "));
            }
        }
        Commands::Import {
            config,
            name,
            screen_ea,
        } => {
            let profile = load_config(&config)
                .with_context(|| format!("Failed to load profile: {}", config.display()))?;

            let level = if args.verbose {
                LogLevel::Debug
            } else {
                profile.log.level()?
            };
            logger::init_with_level(level);

            let screen_ea = match screen_ea {
                Some(text) => Some(parse_address(&text)?),
                None => profile.screen_ea,
            };
            let registry = StaticRegistry::from_config(&profile)?;
            let db = profile.database.to_segment_table();

            let hooks = idbshim::install(&registry, &db, screen_ea)
                .context("Failed to install shim")?;
            if let Some(ea) = hooks.screen_ea() {
                eprintln!("screen ea: {:#x}", ea);
            }

            let module = ModuleSystem::global()
                .import(&name)
                .with_context(|| format!("Failed to import: {}", name))?;
            println!(
                "module {} ({})",
                module.name,
                module.file.as_deref().unwrap_or("<synthetic>")
            );
            for (member, value) in module.members() {
                println!("  {:<24} {:<8} {}", member, value.type_name(), value);
            }
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
