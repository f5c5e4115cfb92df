use std::{
	fs,
	path::{Path, PathBuf},
	sync::Mutex,
};

use blockmark::{Engine, Settings, outline::DirtyRange};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};

const TRACE_FILE_ENV: &str = "BLOCKMARK_TRACE_FILE";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
	/// Settings file. Defaults to $XDG_CONFIG_HOME/blockmark/config.toml
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Normalize touched items, then repair duplicate ids, like a save would
	Normalize(NormalizeArgs),
	/// Rewrite every block id that is used more than once
	Repair(FileArgs),
	/// Make sure the item starting at a line has a system line, and print its id
	Ensure(EnsureArgs),
	/// Print the inclusive line range of the subtree starting at a line
	Range(LineArgs),
	/// Print every list item as JSON
	Items(ItemsArgs),
}

#[derive(Args)]
struct FileArgs {
	file: PathBuf,
	/// Rewrite the file in place instead of printing the result
	#[arg(long, short)]
	write: bool,
}

#[derive(Args)]
struct NormalizeArgs {
	#[clap(flatten)]
	shared: FileArgs,
	/// Touched lines as `START..END` (half-open) or a single `LINE`. Defaults to the whole file
	#[arg(long, short, value_parser = parse_range)]
	lines: Vec<DirtyRange>,
}

#[derive(Args)]
struct EnsureArgs {
	#[clap(flatten)]
	shared: FileArgs,
	/// 0-based start line of the item
	#[arg(long, short)]
	line: usize,
}

#[derive(Args)]
struct LineArgs {
	file: PathBuf,
	/// 0-based start line of the item
	#[arg(long, short)]
	line: usize,
}

#[derive(Args)]
struct ItemsArgs {
	file: PathBuf,
}

fn parse_range(s: &str) -> Result<DirtyRange, String> {
	let parse = |n: &str| n.trim().parse::<usize>().map_err(|e| format!("invalid line number {n:?}: {e}"));
	match s.split_once("..") {
		Some((start, end)) => Ok(DirtyRange::new(parse(start)?, parse(end)?)),
		None => Ok(DirtyRange::line(parse(s)?)),
	}
}

fn main() -> Result<()> {
	color_eyre::install()?;
	init_tracing()?;
	let cli = Cli::parse();

	let settings = match Settings::load(cli.config.as_deref()) {
		Ok(settings) => settings,
		Err(e) => {
			eprintln!("{:?}", miette::Report::new(e));
			std::process::exit(2);
		}
	};
	let engine = Engine::new(settings);

	match cli.command {
		Commands::Normalize(args) => {
			let text = read(&args.shared.file)?;
			let ranges = if args.lines.is_empty() { vec![DirtyRange::whole(text.split('\n').count())] } else { args.lines };
			for range in ranges {
				engine.record_edit(&args.shared.file, range);
			}
			let out = engine.save(&args.shared.file, &text);
			emit(&args.shared, &out)?;
		}
		Commands::Repair(args) => {
			let text = read(&args.file)?;
			let out = engine.repair_duplicate_ids(&text);
			emit(&args, &out)?;
		}
		Commands::Ensure(args) => {
			let text = read(&args.shared.file)?;
			let Some(ensured) = engine.ensure_system_line_for_item(&text, args.line) else {
				bail!("no list item starts at line {} of {}, or its system line would land inside an open fence", args.line, args.shared.file.display());
			};
			if args.shared.write && ensured.text != text {
				write(&args.shared.file, &ensured.text)?;
			}
			println!("{}", ensured.id);
		}
		Commands::Range(args) => {
			let text = read(&args.file)?;
			let (start, end) = engine
				.compute_subtree_range(&text, args.line)
				.ok_or_else(|| eyre!("no list item starts at line {} of {}", args.line, args.file.display()))?;
			println!("{start} {end}");
		}
		Commands::Items(args) => {
			let text = read(&args.file)?;
			let items = engine.list_items(&text);
			println!("{}", serde_json::to_string_pretty(&items)?);
		}
	}

	Ok(())
}

fn read(path: &Path) -> Result<String> {
	fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn write(path: &Path, text: &str) -> Result<()> {
	fs::write(path, text).wrap_err_with(|| format!("failed to write {}", path.display()))
}

fn emit(args: &FileArgs, out: &str) -> Result<()> {
	if args.write {
		write(&args.file, out)
	} else {
		print!("{out}");
		Ok(())
	}
}

fn init_tracing() -> Result<()> {
	use tracing_subscriber::{EnvFilter, fmt, prelude::*};

	match std::env::var_os(TRACE_FILE_ENV) {
		Some(path) => {
			let file = fs::OpenOptions::new()
				.create(true)
				.append(true)
				.open(&path)
				.wrap_err_with(|| format!("failed to open trace file {}", Path::new(&path).display()))?;
			let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockmark=debug"));
			tracing_subscriber::registry().with(filter).with(fmt::layer().json().with_writer(Mutex::new(file))).init();
		}
		None => {
			let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
			tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init();
		}
	}
	Ok(())
}
