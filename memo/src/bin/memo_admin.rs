// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # memo-admin
//!
//! A small operator CLI over a standalone archive: inspect what keys it
//! holds, dump it to a different backend, or clear it. Structured the
//! teacher's way (`clap`'s derive `Parser`/`Subcommand`,
//! `bootstrap/src/cli/parser.rs`), but without that crate's path/numeric
//! validation layer — an admin tool over a local archive file has a much
//! smaller attack surface than a pipeline CLI that accepts arbitrary
//! input/output paths from untrusted callers.

use clap::{Parser, Subcommand};
use memo::archive::{DirectoryArchive, FileBlobArchive, SqliteArchive};
use memo_core::Archive;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "memo-admin")]
#[command(about = concat!("memo archive inspection CLI v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the keys an archive holds
    Inspect {
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Copy every entry from one archive into another
    Dump {
        #[command(flatten)]
        from: BackendArgs,
        /// Destination archive, same `kind:location[#table]` shape as `--backend`
        #[arg(long)]
        to: String,
    },
    /// Discard every entry in an archive
    Clear {
        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[derive(clap::Args, Debug)]
struct BackendArgs {
    /// Archive location, `kind:location[#table]`: `file:/path/to/blob`,
    /// `dir:/path/to/directory`, or `sqlite:/path/to.db#table_name`
    #[arg(long)]
    backend: String,
}

fn open_archive(spec: &str) -> memo_core::Result<Box<dyn Archive>> {
    let (kind, rest) = spec
        .split_once(':')
        .ok_or_else(|| memo_core::MemoError::invariant(format!("malformed backend spec: {spec}")))?;
    match kind {
        "file" => Ok(Box::new(FileBlobArchive::new(PathBuf::from(rest)))),
        "dir" => Ok(Box::new(DirectoryArchive::new(PathBuf::from(rest))?)),
        "sqlite" => {
            let (path, table) = rest
                .split_once('#')
                .ok_or_else(|| memo_core::MemoError::invariant("sqlite backend needs a #table suffix"))?;
            Ok(Box::new(SqliteArchive::open(path, table)?))
        }
        other => Err(memo_core::MemoError::invariant(format!("unknown backend kind: {other}"))),
    }
}

fn run(cli: Cli) -> memo_core::Result<()> {
    match cli.command {
        Command::Inspect { backend } => {
            let archive = open_archive(&backend.backend)?;
            for key in archive.keys()? {
                println!("{key}");
            }
        }
        Command::Dump { from, to } => {
            let source = open_archive(&from.backend)?;
            let dest = open_archive(&to)?;
            for key in source.keys()? {
                if let Some(value) = source.get(&key)? {
                    dest.put(&key, value)?;
                }
            }
        }
        Command::Clear { backend } => {
            open_archive(&backend.backend)?.clear()?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        memo::config::LogLevel::Debug
    } else {
        memo::config::LogLevel::Info
    };
    memo::infrastructure::logging::init_logging(level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("memo-admin: {e}");
            ExitCode::FAILURE
        }
    }
}
