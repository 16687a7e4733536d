//! devhost CLI - process, probe, address and resource helpers for development servers

mod logging;
mod settings;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use devhost_core::application::ResourceExtractor;
use devhost_core::constants::HTTP_STATUS_OK;
use devhost_core::domain::{
    classify_address, AddressFamily, Invocation, ProbeOutcome, ProbeRequest, TlsVerification,
};
use devhost_core::port::{HttpProbe, ProcessError, ProcessRunner, ResourceProvider};
use devhost_core::{AppError, VERSION};
use devhost_infra_system::{
    DirectoryResources, EmbeddedResources, ReqwestHttpProbe, SubprocessRunner,
};

use settings::{ProbeSettings, Settings};

#[derive(Parser)]
#[command(name = "devhost")]
#[command(about = "OS and network helpers for development servers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "DEVHOST_CONFIG_FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command; print its stdout, or its combined output on failure
    Run {
        /// Working directory for the command
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Replace the whole environment with KEY=VALUE (repeatable)
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        env: Vec<(String, String)>,

        /// Program and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },

    /// Send one HTTP(S) request and report whether the service is ready
    Probe {
        #[arg(long, default_value = "localhost")]
        host: String,

        #[arg(short, long)]
        port: u16,

        #[arg(short, long, default_value = "GET")]
        method: String,

        #[arg(long, default_value = "/")]
        path: String,

        /// Client private key (PEM); enables HTTPS together with --cert-file
        #[arg(long, requires = "cert_file")]
        key_file: Option<PathBuf>,

        /// Client certificate (PEM); enables HTTPS together with --key-file
        #[arg(long, requires = "key_file")]
        cert_file: Option<PathBuf>,

        /// Overrides probe.timeout_ms
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Accept any server certificate
        #[arg(long)]
        insecure: bool,

        /// Print a JSON report instead of the raw body
        #[arg(long)]
        json: bool,
    },

    /// Check whether ADDR is an IPv4 or IPv6 literal
    IsIp { addr: String },

    /// Write a bundled resource to DIR/<basename>
    Extract {
        name: String,

        dir: String,

        /// Serve resources from this directory instead of the embedded set
        #[arg(long)]
        assets_dir: Option<String>,
    },

    /// List available resources
    Assets {
        #[arg(long)]
        assets_dir: Option<String>,
    },
}

/// Probe exit codes: 0 ready, 1 non-200 status, 2 nothing listening
const EXIT_PROBE_UNEXPECTED: u8 = 1;
const EXIT_PROBE_PENDING: u8 = 2;

#[derive(Serialize)]
struct ProbeReport {
    url: String,
    status: &'static str,
    code: Option<u16>,
    body: Option<String>,
}

impl ProbeReport {
    fn new(url: String, outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Ready { body } => Self {
                url,
                status: "ready",
                code: Some(HTTP_STATUS_OK),
                body: Some(String::from_utf8_lossy(body).into_owned()),
            },
            ProbeOutcome::Unexpected { code } => Self {
                url,
                status: "unexpected",
                code: Some(*code),
                body: None,
            },
            ProbeOutcome::Pending => Self {
                url,
                status: "pending",
                code: None,
                body: None,
            },
        }
    }
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))?;
    if key.is_empty() {
        return Err(format!("empty variable name in {:?}", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Map a child's exit code onto ours; signals follow the shell's 128+N convention
fn child_exit_code(code: i32) -> u8 {
    match code {
        1..=255 => code as u8,
        c => match c.checked_neg() {
            Some(signal @ 1..=127) => 128 + signal as u8,
            _ => 1,
        },
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn resource_provider(assets_dir: Option<&str>) -> Arc<dyn ResourceProvider> {
    match assets_dir {
        Some(dir) => Arc::new(DirectoryResources::new(expand(dir))),
        None => Arc::new(EmbeddedResources::new()),
    }
}

fn run(
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    argv: Vec<String>,
) -> devhost_core::Result<ExitCode> {
    let mut invocation = Invocation::new(argv);
    if let Some(dir) = cwd {
        invocation = invocation.current_dir(dir);
    }
    if !env.is_empty() {
        invocation = invocation.env_replace(env);
    }

    match SubprocessRunner::new().run(&invocation) {
        Ok(stdout) => {
            std::io::stdout().write_all(&stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ProcessError::Failed { exit_code, output }) => {
            std::io::stderr().write_all(&output)?;
            Ok(ExitCode::from(child_exit_code(exit_code)))
        }
        Err(e) => Err(e.into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn probe(
    settings: &ProbeSettings,
    host: String,
    port: u16,
    method: String,
    path: String,
    tls: Option<(PathBuf, PathBuf)>,
    timeout_ms: Option<u64>,
    insecure: bool,
    json: bool,
) -> devhost_core::Result<ExitCode> {
    let verification = if insecure {
        TlsVerification::AcceptAny
    } else {
        settings.verification
    };

    let mut request = ProbeRequest::new(host, port)
        .method(method)
        .path(path)
        .timeout(Duration::from_millis(timeout_ms.unwrap_or(settings.timeout_ms)))
        .verification(verification);
    if let Some((key_file, cert_file)) = tls {
        request = request.tls(key_file, cert_file);
    }

    let url = request.url();
    let outcome = ReqwestHttpProbe::new().probe(&request)?;

    if json {
        println!("{}", serde_json::to_string(&ProbeReport::new(url, &outcome))?);
    } else {
        match &outcome {
            ProbeOutcome::Ready { body } => std::io::stdout().write_all(body)?,
            ProbeOutcome::Unexpected { code } => {
                eprintln!("{} {} answered HTTP {}", "✗".red(), url, code)
            }
            ProbeOutcome::Pending => {
                eprintln!("{} {} is not listening yet", "○".yellow(), url)
            }
        }
    }

    Ok(match outcome {
        ProbeOutcome::Ready { .. } => ExitCode::SUCCESS,
        ProbeOutcome::Unexpected { .. } => ExitCode::from(EXIT_PROBE_UNEXPECTED),
        ProbeOutcome::Pending => ExitCode::from(EXIT_PROBE_PENDING),
    })
}

fn is_ip(addr: &str) -> ExitCode {
    match classify_address(addr) {
        Some(AddressFamily::V4) => {
            println!("{} ipv4", "true".green());
            ExitCode::SUCCESS
        }
        Some(AddressFamily::V6) => {
            println!("{} ipv6", "true".green());
            ExitCode::SUCCESS
        }
        None => {
            println!("{}", "false".red());
            ExitCode::FAILURE
        }
    }
}

fn extract(name: &str, dir: &str, assets_dir: Option<&str>) -> devhost_core::Result<ExitCode> {
    let extractor = ResourceExtractor::new(resource_provider(assets_dir));
    let path = extractor.extract(name, &expand(dir))?;
    println!("{}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn assets(assets_dir: Option<&str>) -> devhost_core::Result<ExitCode> {
    let extractor = ResourceExtractor::new(resource_provider(assets_dir));
    let names = extractor.available();
    if names.is_empty() {
        return Err(AppError::Validation("no resources available".to_string()));
    }
    for name in names {
        println!("{}", name);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init(&settings.log).context("Failed to initialize logging")?;

    debug!(version = VERSION, "devhost starting");

    let code = match cli.command {
        Commands::Run { cwd, env, argv } => run(cwd, env, argv).context("run failed")?,

        Commands::Probe {
            host,
            port,
            method,
            path,
            key_file,
            cert_file,
            timeout_ms,
            insecure,
            json,
        } => probe(
            &settings.probe,
            host,
            port,
            method,
            path,
            key_file.zip(cert_file),
            timeout_ms,
            insecure,
            json,
        )
        .context("probe failed")?,

        Commands::IsIp { addr } => is_ip(&addr),

        Commands::Extract {
            name,
            dir,
            assets_dir,
        } => extract(&name, &dir, assets_dir.as_deref()).context("extract failed")?,

        Commands::Assets { assets_dir } => {
            assets(assets_dir.as_deref()).context("listing resources failed")?
        }
    };

    Ok(code)
}
