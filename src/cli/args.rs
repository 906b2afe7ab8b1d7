//! CLI argument definitions using clap
//!
//! Commands:
//! - aeroquery serve --config <path>
//! - aeroquery query --config <path> <collection> [options]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// AeroQuery - dynamic query and projection over typed collections
#[derive(Parser, Debug)]
#[command(name = "aeroquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./aeroquery.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Execute a single query and print the result envelope
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./aeroquery.json")]
        config: PathBuf,

        /// Collection name (customers, menuItems, orders, orderItems)
        collection: String,

        #[command(flatten)]
        options: QueryOptions,
    },
}

/// Query options, one per wire parameter
#[derive(Args, Debug, Default, Clone)]
pub struct QueryOptions {
    /// Filter expression, e.g. "price ge 5 and category eq 'main'"
    #[arg(long)]
    pub filter: Option<String>,

    /// Comma-separated `property [asc|desc]` list
    #[arg(long)]
    pub orderby: Option<String>,

    /// Comma-separated columns to project
    #[arg(long)]
    pub select: Option<String>,

    /// Comma-separated navigation properties to load
    #[arg(long)]
    pub expand: Option<String>,

    #[arg(long)]
    pub skip: Option<String>,

    #[arg(long)]
    pub top: Option<String>,

    /// Report the pre-pagination total
    #[arg(long)]
    pub count: bool,
}

impl QueryOptions {
    /// Converts the options into wire parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let pairs = [
            ("$filter", &self.filter),
            ("$orderby", &self.orderby),
            ("$select", &self.select),
            ("$expand", &self.expand),
            ("$skip", &self.skip),
            ("$top", &self.top),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                params.push((key.to_string(), value.clone()));
            }
        }
        if self.count {
            params.push(("$count".to_string(), "true".to_string()));
        }
        params
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
