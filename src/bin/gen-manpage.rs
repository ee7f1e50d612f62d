//! Renders man pages from the CLI definition
//!
//! Writes `spitty.1` plus one `spitty-<command>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

fn render(page: clap_mangen::Man, path: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    page.render(&mut buffer)?;
    fs::write(path, buffer)?;
    println!("  {}", path.display());
    Ok(())
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    println!("Writing man pages to {}:", output_dir.display());

    for sub in cmd.get_subcommands() {
        let title = format!("spitty-{}", sub.get_name());
        let page = clap_mangen::Man::new(sub.clone()).title(title.to_uppercase());
        render(page, &output_dir.join(format!("{}.1", title)))?;
    }
    render(clap_mangen::Man::new(cmd.clone()), &output_dir.join("spitty.1"))?;

    Ok(())
}
