use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use shoot300k::SolveError;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Msg {
    Check { dir: String },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum Out {
    Valid { total_items: usize, total_chunks: usize },
    Invalid { reason: String },
    Error { message: String },
}

fn reply(stdout: &mut impl Write, out: &Out) -> std::io::Result<()> {
    serde_json::to_writer(&mut *stdout, out)?;
    writeln!(stdout)?;
    stdout.flush()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut line = String::new();
    let mut stdout = std::io::stdout();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let out = match serde_json::from_str(&line) {
            Ok(Msg::Check { dir }) => match shoot300k::output::verify_chunks(Path::new(&dir)) {
                Ok(meta) => {
                    tracing::info!(event = "check_valid", dir = %dir, items = meta.total_items);
                    Out::Valid {
                        total_items: meta.total_items,
                        total_chunks: meta.total_chunks,
                    }
                }
                Err(SolveError::InvalidChunks { reason, .. }) => {
                    tracing::warn!(event = "check_invalid", dir = %dir, reason = %reason);
                    Out::Invalid { reason }
                }
                Err(e) => Out::Error {
                    message: e.to_string(),
                },
            },
            Err(e) => Out::Error {
                message: format!("bad json: {e}"),
            },
        };
        reply(&mut stdout, &out)?;
    }
    Ok(())
}
