//! `kiln cook` — the incremental cook-and-package command.

use std::path::{Path, PathBuf};

use kiln_build::{BuildLog, BuildOptions, BuildSession};
use kiln_common::{TargetMask, TargetPlatform};
use kiln_config::ProjectConfig;
use kiln_cooker::{BuildMode, CookerRegistry};

use crate::scan;
use crate::{CookArgs, GlobalArgs};

/// Runs the `kiln cook` command. Returns the process exit code.
pub fn run(args: &CookArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;

    let targets = if args.platforms.is_empty() {
        config.cook.target_mask()?
    } else {
        resolve_platforms(&args.platforms)?
    };
    let languages = config.cook.language_mask()?;

    let roots = if args.roots.is_empty() {
        config.cook.roots.clone()
    } else {
        args.roots.clone()
    };
    if roots.is_empty() && !args.scripts_only {
        return Err("no roots to cook; pass asset paths or set cook.roots in kiln.toml".into());
    }

    let source_root = project_dir.join(&config.project.source_dir);
    let output_root = project_dir.join(&config.project.output_dir);

    let catalog = scan::scan_source_tree(&source_root)?;
    // Dedicated compilers (texture, material, map) register here as they are
    // ported; everything else falls back to the raw copy cooker.
    let registry = CookerRegistry::new();

    let mut log = BuildLog::stdout();
    log.set_quiet(global.quiet);

    let opts = BuildOptions {
        targets,
        languages,
        compression: args.compression.unwrap_or(config.cook.compression),
        threads: args.threads.unwrap_or(config.cook.threads),
        clean: args.clean,
        scripts_only: args.scripts_only,
        mode: if args.intermediate {
            BuildMode::Intermediate
        } else {
            BuildMode::Cooked
        },
    };

    let mut session = BuildSession::new(output_root, source_root, &catalog, &registry, opts, log);
    if let Some(dir) = &args.scripts_dir {
        session.set_scripts_dir(project_dir.join(dir));
    }

    match session.cook(&roots) {
        Ok(()) => Ok(0),
        Err(err) => {
            eprintln!("cook failed: [{}] {err}", err.code());
            Ok(1)
        }
    }
}

/// Locates the project and loads its configuration. An explicit `--config`
/// path wins; otherwise `kiln.toml` is read from the current directory.
fn load_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, ProjectConfig), Box<dyn std::error::Error>> {
    match &global.config {
        Some(path) => {
            let path = PathBuf::from(path);
            let content = std::fs::read_to_string(&path)?;
            let config = kiln_config::load_config_from_str(&content)?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((dir, config))
        }
        None => {
            let dir = std::env::current_dir()?;
            let config = kiln_config::load_config(&dir)?;
            Ok((dir, config))
        }
    }
}

fn resolve_platforms(names: &[String]) -> Result<TargetMask, Box<dyn std::error::Error>> {
    let mut mask = TargetMask::GENERIC;
    for name in names {
        let platform = TargetPlatform::parse(name)
            .ok_or_else(|| format!("unknown platform '{name}'"))?;
        mask = mask.union(TargetMask::only(platform));
    }
    Ok(mask)
}
