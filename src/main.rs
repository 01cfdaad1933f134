// SPDX-License-Identifier: MIT
//
// n-vim: headless driver for the modal editing engine.
//
// Loads a file (or literal text) into a RopeSurface, feeds a key script
// through the engine and prints the resulting buffer:
//
//   args → RopeSurface (+ options) → Vim::feed(keys) → stdout / --output
//
// `:w` inside the script writes the buffer once the script has run,
// either to the path given to `:w` or back to the input file.

mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use n_modal::{Host, Split, Vim};
use n_text::{RopeSurface, TextSurface};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to edit
    path: Option<PathBuf>,

    /// Edit this text instead of a file
    #[arg(long, conflicts_with = "path")]
    text: Option<String>,

    /// Key script in Vim notation, e.g. `d2w` or `ihi<Esc>.`
    #[arg(short, long, default_value = "")]
    keys: String,

    /// Viewport height in lines
    #[arg(long, default_value_t = 24)]
    height: usize,

    /// Display width of a tab
    #[arg(long)]
    tab_width: Option<u32>,

    /// Insert spaces for tabs and indentation
    #[arg(long)]
    expandtab: bool,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print mode and cursor position to stderr after the buffer
    #[arg(long)]
    status: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Collects the host requests a script makes so they can be carried out
/// once the engine is done with the surface.
#[derive(Debug, Default)]
struct Driver {
    writes: Vec<Option<String>>,
    beeps: usize,
}

impl Host for Driver {
    fn write(&mut self, path: Option<&str>) {
        self.writes.push(path.map(str::to_owned));
    }

    fn edit(&mut self, path: Option<&str>) {
        debug!(?path, ":edit ignored by the headless driver");
    }

    fn split(&mut self, split: Split) {
        debug!(%split, "split ignored by the headless driver");
    }

    fn beep(&mut self) {
        self.beeps += 1;
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

fn load(args: &Args) -> Result<String> {
    match (&args.text, &args.path) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) if path.exists() => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        (None, Some(_)) => Ok(String::new()),
        (None, None) => bail!("nothing to edit: pass a file or --text"),
    }
}

fn surface(text: &str, args: &Args) -> RopeSurface {
    let mut surface = RopeSurface::new(text).with_height(args.height.max(1));
    let options = surface.options_mut();
    if let Some(width) = args.tab_width {
        options.set_tab_width(width);
    }
    options.insert_spaces = args.expandtab;
    surface
}

fn save(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "written");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    let text = load(&args)?;
    let mut vim = Vim::with_host(surface(&text, &args), Driver::default());
    vim.feed(&args.keys).context("invalid key script")?;

    let result = vim.surface().text();
    for target in &vim.host().writes {
        match (target, &args.path) {
            (Some(path), _) => save(Path::new(path), &result)?,
            (None, Some(path)) => save(path, &result)?,
            (None, None) => debug!(":w without a file name"),
        }
    }

    match &args.output {
        Some(path) => save(path, &result)?,
        None => print!("{result}"),
    }

    if args.status {
        let surface = vim.surface();
        let cursor = surface.cursor();
        let line = surface.line_of_offset(cursor);
        let column = cursor - surface.line_start_offset(line);
        eprintln!("-- {} -- {}:{} beeps={}", vim.mode(), line + 1, column + 1, vim.host().beeps);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("n-vim").chain(extra.iter().copied()))
    }

    #[test]
    fn literal_text_is_loaded() {
        let args = args(&["--text", "abc\n", "--keys", "x"]);
        assert_eq!(load(&args).unwrap(), "abc\n");
        assert_eq!(args.keys, "x");
    }

    #[test]
    fn nothing_to_edit_is_an_error() {
        assert!(load(&args(&[])).is_err());
    }

    #[test]
    fn options_reach_the_surface() {
        let args = args(&["--text", "", "--tab-width", "4", "--expandtab"]);
        let surface = surface("", &args);
        assert_eq!(surface.options().tab_width, 4);
        assert!(surface.options().insert_spaces);
    }

    #[test]
    fn script_writes_are_collected() {
        let args = args(&["--text", "a b\n"]);
        let mut vim = Vim::with_host(surface("a b\n", &args), Driver::default());
        vim.feed("dw:w out.txt\n").unwrap();
        assert_eq!(vim.surface().text(), "b\n");
        assert_eq!(vim.host().writes, [Some("out.txt".to_owned())]);
    }
}
