// src/main.rs
mod config;
mod credential;
mod discovery;
mod error;
mod kubeconfig;
mod types;
mod utils;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

use config::{AmbientConfig, KubeConfig};
use credential::{resolve_and_synthesize, IdentitySource};
use discovery::KubectlStore;
use error::Result;
use types::Args;
use utils::logging::{self, LogConfig};

fn run(args: &Args) -> Result<()> {
    let stdin = io::stdin();
    let source = IdentitySource::from_invocation(&args.serviceaccount, &mut stdin.lock())?;
    debug!(source = ?source, "parsed invocation");

    let kubeconfig = KubeConfig::load(args.kubeconfig.as_deref())?;
    let ambient = AmbientConfig::from_kubeconfig(
        &kubeconfig,
        args.context.as_deref(),
        args.namespace.as_deref(),
    )?;
    debug!(
        context = %ambient.cluster.context_name,
        cluster = %ambient.cluster.cluster_name,
        namespace = %ambient.namespace,
        "loaded kubeconfig"
    );

    let store = KubectlStore::new(
        args.kubectl.clone(),
        args
            .kubeconfig
            .as_deref()
            .map(|p| shellexpand::tilde(p).into_owned()),
        Some(ambient.cluster.context_name.clone()),
    );

    let fragment = resolve_and_synthesize(source, &ambient, &store)?;
    let rendered = args.output.render(&fragment)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init(&LogConfig::new(args.debug, args.log_file.as_deref())) {
        eprintln!("Warning: {}", e);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if args.log_file.is_some() {
                error!(error = %e, "failed to build kubeconfig");
            }
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
