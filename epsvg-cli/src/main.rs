//! `epsvg`: run PostScript/EPS programs and write the pages as SVG.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use epsvg_core::filesystem::FileSystem;
use epsvg_core::{Interpreter, Options};
use epsvg_graphics::bbox::BoundingBox;
use epsvg_svg::{RenderOptions, render_with_options};

#[derive(Parser)]
#[command(version, about = "Convert PostScript and EPS programs to SVG")]
struct Cli {
    /// Input file to run
    file: Option<PathBuf>,

    /// Run a PostScript snippet instead of reading a file
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Output directory for SVG files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Page box "llx lly urx ury", overriding %%BoundingBox
    #[arg(long, value_parser = parse_bbox)]
    bbox: Option<BoundingBox>,

    /// Margin around the page box, in points
    #[arg(long, default_value_t = 0.0)]
    margin: f64,

    /// Decimal places in SVG coordinates
    #[arg(long, default_value_t = 4)]
    precision: usize,

    /// Do not record stacks in $error when an error occurs
    #[arg(long)]
    no_record_stacks: bool,

    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let numbers = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in bounding box: {e}"))?;
    match numbers[..] {
        [llx, lly, urx, ury] if llx < urx && lly < ury => {
            Ok(BoundingBox::new(llx, lly, urx, ury))
        }
        [_, _, _, _] => Err("bounding box is empty".to_owned()),
        _ => Err(format!("expected four numbers, got {}", numbers.len())),
    }
}

/// `RUST_LOG` wins; otherwise the verbosity count picks the level.
fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Filesystem for `run` and `file`: names are tried relative to each
/// search directory, then as given.
struct OsFileSystem {
    search_dirs: Vec<PathBuf>,
}

impl FileSystem for OsFileSystem {
    fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        let path = Path::new(name);
        if path.is_absolute() {
            return fs::read(path).ok();
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(path))
            .chain(std::iter::once(path.to_path_buf()))
            .find_map(|candidate| fs::read(candidate).ok())
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (source, job_name) = read_source(&cli);
    let options = Options {
        bounding_box: cli.bbox,
        record_stacks: !cli.no_record_stacks,
        job_name: job_name.clone(),
        ..Options::default()
    };
    let mut interp = Interpreter::with_options(options);

    let mut search_dirs = Vec::new();
    if let Some(parent) = cli.file.as_deref().and_then(Path::parent) {
        search_dirs.push(parent.to_path_buf());
    }
    if let Ok(cwd) = env::current_dir() {
        search_dirs.push(cwd);
    }
    interp.set_filesystem(Box::new(OsFileSystem { search_dirs }));

    let result = interp.run_bytes(&source);
    print_program_output(&interp);
    if let Err(e) = result {
        tracing::error!(error = %e, "interpreter failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }

    let opts = RenderOptions {
        margin: cli.margin,
        precision: cli.precision,
    };
    if let Err(e) = write_output(&interp, &cli.output, &job_name, &opts) {
        eprintln!("Error writing SVG to {}: {e}", cli.output.display());
        process::exit(1);
    }
    if interp.last_error().is_some() {
        process::exit(1);
    }
}

/// Program text and job name: `-e` wins over the input file.
fn read_source(cli: &Cli) -> (Vec<u8>, String) {
    if let Some(ref snippet) = cli.eval {
        return (snippet.clone().into_bytes(), "eval".to_owned());
    }
    let Some(ref file) = cli.file else {
        eprintln!("No input file or snippet specified");
        process::exit(1);
    };
    let job = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_owned();
    match fs::read(file) {
        Ok(bytes) => (bytes, job),
        Err(e) => {
            eprintln!("Error reading {}: {e}", file.display());
            process::exit(1);
        }
    }
}

fn print_program_output(interp: &Interpreter) {
    let _ = io::stdout().write_all(interp.stdout());
    let _ = io::stderr().write_all(interp.stderr());
}

/// Write `job.svg` for a single page, `job.1.svg`, `job.2.svg`, ... for
/// several.
fn write_output(
    interp: &Interpreter,
    dir: &Path,
    job: &str,
    opts: &RenderOptions,
) -> io::Result<()> {
    let pages = interp.pictures();
    fs::create_dir_all(dir)?;
    for (i, picture) in pages.iter().enumerate() {
        let name = if pages.len() == 1 {
            format!("{job}.svg")
        } else {
            format!("{job}.{}.svg", i + 1)
        };
        let path = dir.join(name);
        let doc = render_with_options(picture, opts);
        fs::write(&path, doc.to_string())?;
        tracing::info!(path = %path.display(), objects = picture.objects.len(), "wrote page");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_accepts_spaces_and_commas() {
        let bb = parse_bbox("0 0 100,50").unwrap();
        assert!((bb.max_x - 100.0).abs() < 1e-9);
        assert!((bb.max_y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn bbox_rejects_bad_input() {
        assert!(parse_bbox("1 2 3").is_err());
        assert!(parse_bbox("0 0 x 1").is_err());
        assert!(parse_bbox("10 0 0 10").is_err());
    }
}
