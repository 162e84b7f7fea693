//! # CLI
//!
//! This module defines the command-line interface of `chainrpc` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring parameters are `name=value`).
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chainrpc", version, about = "Console for chainrpc services")]
pub struct Cli {
    /// Log decoding and dispatching details to stderr (RUST_LOG overrides it)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a request against an in-memory World service
    ///
    /// The path is a chain of method names and path arguments, exactly as a client sends it.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// chainrpc call /humans/all -q limit=10 --sample
    /// chainrpc call /humans/create --post -p 'human={"name":"John"}'
    /// chainrpc call /continents/move/europe --post -p 'to={"lat":1,"lng":2}'
    /// ```
    Call {
        /// Request path (e.g. /humans/find/1)
        #[arg(value_parser = parse_path)]
        path: String,

        /// Send the request as a POST
        #[arg(long)]
        post: bool,

        /// Query parameter, repeatable
        #[arg(short = 'q', long = "query", value_parser = parse_param)]
        query: Vec<(String, String)>,

        /// Form parameter of a POST body, repeatable
        #[arg(short = 'p', long = "param", value_parser = parse_param, requires = "post")]
        params: Vec<(String, String)>,

        /// Indent the JSON result
        #[arg(long)]
        pretty: bool,

        /// Populate the world with a few humans before the call
        #[arg(long)]
        sample: bool,
    },

    /// Describe the World interface tree
    Describe {
        /// How many interface levels to expand below the root
        #[arg(short, long, default_value_t = 3)]
        depth: usize,
    },
}

fn parse_path(value: &str) -> Result<String, String> {
    if value.trim_matches('/').trim().is_empty() {
        return Err("Path must name at least one method".to_string());
    }

    if value.starts_with('/') {
        Ok(value.to_string())
    } else {
        Ok(format!("/{value}"))
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| "Format must be 'name=value'".to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("/humans/find/1").unwrap(), "/humans/find/1");
        assert_eq!(parse_path("humans/all").unwrap(), "/humans/all");
        assert!(parse_path("/").is_err());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("human={\"name\":\"a=b\"}").unwrap(),
            ("human".to_string(), "{\"name\":\"a=b\"}".to_string())
        );
        assert!(parse_param("limit").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_call_arguments() {
        let cli = Cli::try_parse_from([
            "chainrpc", "call", "/humans/all", "-q", "limit=2", "-q", "offset=1", "--pretty",
        ])
        .unwrap();

        match cli.command {
            Commands::Call {
                path,
                post,
                query,
                pretty,
                ..
            } => {
                assert_eq!(path, "/humans/all");
                assert!(!post);
                assert!(pretty);
                assert_eq!(query.len(), 2);
            }
            Commands::Describe { .. } => panic!("Expected a call"),
        }

        assert!(Cli::try_parse_from(["chainrpc", "call", "/humans/create", "-p", "human={}"]).is_err());
    }
}
