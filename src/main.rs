use std::io::{BufRead, BufReader, Write};
use std::process::ExitCode;

use anyhow::{bail, Context as _};
use serde::{Deserialize, Serialize};
use shoot300k::{Progress, SolveConfig};
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Msg {
    Run { config: SolveConfig },
    RunFile { path: String },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum Out {
    Ready,
    Tick { done: usize, total: usize },
    Stats { records: usize, quintets: usize, chunks: usize },
    Done,
    Error { message: String },
}

fn emit(out: &Out) {
    let mut stdout = std::io::stdout().lock();
    if serde_json::to_writer(&mut stdout, out).is_ok() {
        let _ = writeln!(stdout);
        let _ = stdout.flush();
    }
}

fn read_message() -> anyhow::Result<Msg> {
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).context("reading stdin")? == 0 {
            bail!("no message on stdin");
        }
        if !line.trim().is_empty() {
            return serde_json::from_str(&line).context("bad json");
        }
    }
}

fn run() -> anyhow::Result<()> {
    let config = match read_message()? {
        Msg::Run { config } => config,
        Msg::RunFile { path } => {
            SolveConfig::load(&path).with_context(|| format!("loading config {path}"))?
        }
    };

    let solver = shoot300k::prepare(&config).context("preparing inputs")?;
    emit(&Out::Ready);

    let summary = shoot300k::solve_and_write(&solver, &config, |p: Progress| {
        let step = (p.total / 100).max(1);
        if p.done % step == 0 || p.done == p.total {
            emit(&Out::Tick {
                done: p.done,
                total: p.total,
            });
        }
    })
    .context("solving")?;

    emit(&Out::Stats {
        records: summary.records,
        quintets: summary.quintets,
        chunks: summary.chunks(),
    });
    emit(&Out::Done);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(event = "run_failed", error = %format!("{e:#}"));
            emit(&Out::Error {
                message: format!("{e:#}"),
            });
            ExitCode::FAILURE
        }
    }
}
