use std::io::{self, Read};

use clap::Parser as ClapParser;

/// Compile a literature search query into a search-engine query DSL
/// document and print it as JSON.
#[derive(ClapParser)]
#[command(name = "inspire-query-parser")]
#[command(about = "Compile SPIRES/Invenio-style literature search queries to a query DSL")]
#[command(version)]
struct Cli {
    /// The query to compile. Reads from stdin if omitted.
    query: Option<String>,

    /// Pretty-print the output.
    #[arg(short, long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let query = match cli.query {
        Some(q) => q,
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("failed to read query from stdin: {e}");
                std::process::exit(1);
            }
            buffer
        }
    };

    let result = inspire_query_parser::parse_query(&query);
    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .expect("serde_json::Value always serializes");
    println!("{json}");
}
