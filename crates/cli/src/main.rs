//! `quarry`: drive one search session from the terminal.
//!
//! Each stdin line is one UI event. Plain lines replace the query text;
//! `:go`, `:enter`, `:instant on|off` and `:quit` stand in for the button,
//! the Enter key, the checkbox and closing the connection.

mod backend;
mod command;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use futures::channel::mpsc;
use quarry_session::{ConnectionHandler, FnObserver, SearchStatus, SessionConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::backend::SimulatedBackend;
use crate::command::Command;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(about = "Interactive search session driven from stdin")]
struct Args {
	/// Session configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Start with instant search enabled
	#[arg(short, long)]
	instant: bool,

	/// Simulated backend latency in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 400)]
	latency_ms: u64,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("quarry").join("config.toml"))
}

fn load_config(args: &Args) -> anyhow::Result<SessionConfig> {
	let mut config = match &args.config {
		Some(path) => SessionConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => match default_config_path().filter(|path| path.is_file()) {
			Some(path) => SessionConfig::load(&path).with_context(|| format!("loading {}", path.display()))?,
			None => SessionConfig::default(),
		},
	};
	if args.instant {
		config.instant_search = true;
	}
	Ok(config)
}

/// Writes one output line, logging the failure when `out` is gone.
fn write_line(out: &mut impl Write, line: &str) -> bool {
	match writeln!(out, "{line}").and_then(|()| out.flush()) {
		Ok(()) => true,
		Err(err) => {
			warn!(error = %err, "stdout.write_failed");
			false
		}
	}
}

fn print_line(line: &str) {
	write_line(&mut std::io::stdout().lock(), line);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let config = load_config(&args)?;
	info!(debounce_ms = config.debounce_ms, instant_search = config.instant_search, "starting quarry");

	let handler = ConnectionHandler::new(SimulatedBackend::new(Duration::from_millis(args.latency_ms)), config);

	let (clicks, click_rx) = mpsc::unbounded();
	let (queries, query_rx) = mpsc::unbounded();
	let (toggles, toggle_rx) = mpsc::unbounded();
	let (enters, enter_rx) = mpsc::unbounded();

	let links = FnObserver(|urls: Vec<String>| {
		if urls.is_empty() {
			print_line("links: (none)");
		}
		for url in urls {
			print_line(&format!("links: {url}"));
		}
	});
	let status = FnObserver(|status: SearchStatus| match &status {
		SearchStatus::Searching { sequence, query } => print_line(&format!("status: {status} #{sequence} \"{query}\"")),
		_ => print_line(&format!("status: {status}")),
	});

	let session = handler.on_connection_open(click_rx, query_rx, toggle_rx, enter_rx, links, status)?;

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Some(line) = lines.next_line().await.context("reading stdin")? {
		let sent = match Command::parse(&line) {
			Command::Click => clicks.unbounded_send(()).is_ok(),
			Command::Enter => enters.unbounded_send(()).is_ok(),
			Command::Instant(enabled) => toggles.unbounded_send(enabled).is_ok(),
			Command::Query(text) => queries.unbounded_send(text).is_ok(),
			Command::Quit => break,
			Command::Unknown(command) => {
				warn!(%command, "unknown command");
				true
			}
		};
		if !sent {
			break;
		}
	}

	drop((clicks, queries, toggles, enters));
	session.closed().await;
	info!("session closed");
	Ok(())
}
