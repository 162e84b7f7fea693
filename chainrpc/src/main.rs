//! # Chainrpc CLI Entry Point
//!
//! The console for chainrpc services. It hosts an in-memory World service in process and drives
//! it through the same `RpcHandler` a server would use:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and sets up logging.
//! 2. **Execution**: Builds an [`RpcRequest`] from the path and parameters and hands it to the handler.
//! 3. **Presentation**: Prints the HTTP status and body, or the interface tree for `describe`.
mod cli;
mod formatter;

use chainrpc_core::{JsonFormat, RpcProtocol, RpcRequest};
use clap::Parser;
use cli::{Cli, Commands};
use formatter::{FormattedString, InterfaceTree};
use http::Response;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use world_service::{ContinentName, Human, InMemoryWorld, Sex, World};

fn main() {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Call {
            path,
            post,
            query,
            params,
            pretty,
            sample,
        } => match run_call(path, post, query, params, pretty, sample) {
            Ok(response) => println!("{}", FormattedString::from(response)),
            Err(err) => {
                eprintln!("{}", FormattedString::from(err));
                process::exit(1);
            }
        },
        Commands::Describe { depth } => {
            println!(
                "{}",
                FormattedString::from(InterfaceTree(&world_service::interfaces::WORLD, depth))
            );
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_call(
    path: String,
    post: bool,
    query: Vec<(String, String)>,
    params: Vec<(String, String)>,
    pretty: bool,
    sample: bool,
) -> anyhow::Result<Response<String>> {
    let world = InMemoryWorld::new();
    if sample {
        populate(&world)?;
    }

    let protocol = RpcProtocol::new(JsonFormat::new().pretty(pretty));
    let handler = world_service::handler(Arc::new(world))?.with_protocol(protocol);

    let mut request = if post {
        RpcRequest::post(path)
    } else {
        RpcRequest::get(path)
    };
    for (name, value) in query {
        request = request.with_query(name, value);
    }
    for (name, value) in params {
        request = request.with_post(name, value);
    }

    Ok(handler.respond(&request)?)
}

fn populate(world: &InMemoryWorld) -> anyhow::Result<()> {
    let humans = world.humans()?;
    let sample = [
        ("Ada", Sex::Female, ContinentName::Europe),
        ("Kwame", Sex::Male, ContinentName::Africa),
        ("Mei", Sex::Female, ContinentName::Asia),
        ("Chiron", Sex::Centaur, ContinentName::Europe),
    ];

    for (name, sex, continent) in sample {
        humans.create(Some(Human {
            sex: Some(sex),
            continent: Some(continent),
            ..Human::named(name)
        }))?;
    }
    tracing::debug!(count = sample.len(), "Populated sample humans");
    Ok(())
}
