use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for footprint")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy and tests, then a short CPU simulation
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test {
        /// Restrict to one crate, e.g. footprint-transition
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Time metadata encoding and CPU blend passes
    Bench,
    /// Run a short simulation through the CLI
    Smoke {
        /// Backend passed to `footprint-cli simulate`
        #[arg(long, default_value = "cpu")]
        backend: String,
    },
    /// Build rustdoc for the workspace
    Doc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            clippy()?;
            test(None)?;
            smoke("cpu")?;
        }
        Commands::Fmt => cargo("fmt", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => clippy()?,
        Commands::Test { package } => test(package.as_deref())?,
        Commands::Bench => cargo(
            "bench",
            &["bench", "-p", "footprint-transition", "--bench", "bench_blend_pass"],
        )?,
        Commands::Smoke { backend } => smoke(&backend)?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed ({status})");
    }
    Ok(())
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test(package: Option<&str>) -> Result<()> {
    match package {
        Some(package) => cargo("test", &["test", "-p", package]),
        None => cargo("test", &["test", "--workspace"]),
    }
}

fn smoke(backend: &str) -> Result<()> {
    cargo(
        "run",
        &[
            "run",
            "-p",
            "footprint-cli",
            "--",
            "simulate",
            "--synthetic",
            "200",
            "--frames",
            "90",
            "--switch-at",
            "45",
            "--switch-to",
            "ZoneDist1",
            "--backend",
            backend,
        ],
    )
}
