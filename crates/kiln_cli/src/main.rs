//! Kiln CLI — the command-line interface for the Kiln asset pipeline.
//!
//! Provides `kiln init` for project scaffolding and `kiln cook` for running
//! an incremental cook-and-package build over a project's asset tree.

#![warn(missing_docs)]

mod cook;
mod init;
mod scan;

use std::process;

use clap::{Parser, Subcommand};

/// Kiln — an incremental asset cooking and packaging pipeline.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln Asset Pipeline")]
pub struct Cli {
    /// Suppress per-asset output, keeping banners and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a custom `kiln.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Kiln project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes in
        /// the current directory.
        name: Option<String>,
    },
    /// Cook the project's assets and package the output.
    Cook(CookArgs),
}

/// Arguments for the `kiln cook` subcommand.
#[derive(Parser, Debug)]
pub struct CookArgs {
    /// Root asset paths to cook. Defaults to `cook.roots` from `kiln.toml`.
    pub roots: Vec<String>,

    /// Target platforms, overriding `cook.platforms` (e.g. `--platform pc ios`).
    #[arg(short, long = "platform", num_args = 1..)]
    pub platforms: Vec<String>,

    /// Zlib compression level 0-9, overriding `cook.compression`.
    #[arg(long)]
    pub compression: Option<u32>,

    /// Worker thread count, overriding `cook.threads`.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Remove the whole output tree before cooking.
    #[arg(long)]
    pub clean: bool,

    /// Skip cooking; just rebuild the archives from existing output.
    #[arg(long)]
    pub scripts_only: bool,

    /// Write an intermediate preview build instead of final cooked output.
    #[arg(long)]
    pub intermediate: bool,

    /// Directory of scripts packed into `pak0` under `Scripts/`.
    #[arg(long)]
    pub scripts_dir: Option<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress per-asset output.
    pub quiet: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Init { name } => init::run(name),
        Command::Cook(ref args) => cook::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_init_default() {
        let cli = Cli::parse_from(["kiln", "init"]);
        match cli.command {
            Command::Init { name } => assert!(name.is_none()),
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_init_with_name() {
        let cli = Cli::parse_from(["kiln", "init", "mygame"]);
        match cli.command {
            Command::Init { name } => assert_eq!(name.as_deref(), Some("mygame")),
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_cook_default() {
        let cli = Cli::parse_from(["kiln", "cook"]);
        match cli.command {
            Command::Cook(ref args) => {
                assert!(args.roots.is_empty());
                assert!(args.platforms.is_empty());
                assert!(args.compression.is_none());
                assert!(args.threads.is_none());
                assert!(!args.clean);
                assert!(!args.scripts_only);
                assert!(!args.intermediate);
            }
            _ => panic!("expected Cook command"),
        }
    }

    #[test]
    fn parse_cook_with_roots() {
        let cli = Cli::parse_from(["kiln", "cook", "ui/main.mat", "world/e1m1.map"]);
        match cli.command {
            Command::Cook(ref args) => {
                assert_eq!(args.roots, vec!["ui/main.mat", "world/e1m1.map"]);
            }
            _ => panic!("expected Cook command"),
        }
    }

    #[test]
    fn parse_cook_with_platforms() {
        let cli = Cli::parse_from(["kiln", "cook", "--platform", "pc", "ios"]);
        match cli.command {
            Command::Cook(ref args) => {
                assert_eq!(args.platforms, vec!["pc", "ios"]);
            }
            _ => panic!("expected Cook command"),
        }
    }

    #[test]
    fn parse_cook_overrides() {
        let cli = Cli::parse_from([
            "kiln",
            "cook",
            "--compression",
            "9",
            "--threads",
            "4",
            "--clean",
        ]);
        match cli.command {
            Command::Cook(ref args) => {
                assert_eq!(args.compression, Some(9));
                assert_eq!(args.threads, Some(4));
                assert!(args.clean);
            }
            _ => panic!("expected Cook command"),
        }
    }

    #[test]
    fn parse_cook_scripts_only() {
        let cli = Cli::parse_from(["kiln", "cook", "--scripts-only", "--scripts-dir", "scripts"]);
        match cli.command {
            Command::Cook(ref args) => {
                assert!(args.scripts_only);
                assert_eq!(args.scripts_dir.as_deref(), Some("scripts"));
            }
            _ => panic!("expected Cook command"),
        }
    }

    #[test]
    fn parse_cook_intermediate() {
        let cli = Cli::parse_from(["kiln", "cook", "--intermediate"]);
        match cli.command {
            Command::Cook(ref args) => assert!(args.intermediate),
            _ => panic!("expected Cook command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["kiln", "--quiet", "--config", "/path/kiln.toml", "cook"]);
        assert!(cli.quiet);
        assert_eq!(cli.config.as_deref(), Some("/path/kiln.toml"));
    }
}
