//! `kiln init` — project scaffolding command.
//!
//! Creates a new Kiln project directory with the standard layout: `assets/`,
//! `scripts/`, and a `kiln.toml` config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Runs the `kiln init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes in the current working directory.
/// Returns exit code 0 on success.
pub fn run(name: Option<String>) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                return Err(format!("directory '{}' already exists", n).into());
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my_game");

    eprintln!("  Creating new Kiln project `{project_name}`");

    create_directories(&project_dir)?;
    write_kiln_toml(&project_dir, project_name)?;

    eprintln!("     Created {}", project_dir.join("kiln.toml").display());
    eprintln!("     Created {}", project_dir.join("assets").display());
    eprintln!("     Created {}", project_dir.join("scripts").display());

    Ok(0)
}

/// Creates the standard project directories.
fn create_directories(root: &Path) -> io::Result<()> {
    for dir in &["assets", "scripts"] {
        fs::create_dir_all(root.join(dir))?;
    }
    Ok(())
}

/// Writes the `kiln.toml` configuration file.
fn write_kiln_toml(root: &Path, name: &str) -> io::Result<()> {
    let content = format!(
        r#"[project]
name = "{name}"
version = "0.1.0"
source_dir = "assets"
output_dir = "cooked"

[cook]
# Root asset paths the dependency closure starts from, e.g.
# roots = ["ui/main.mat", "world/e1m1.map"]
roots = []
platforms = ["pc"]
languages = ["en"]
compression = 6
"#
    );
    fs::write(root.join("kiln.toml"), content)
}
