//! Validates every worked example in the config against its operation and
//! prints the tool catalog.

use std::path::PathBuf;

use grc_mcp_server::{
    adapters::config_source::{default_config_path, FileConfigSource},
    app::config_loader::ConfigLoader,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new("grc_mcp_server=warn"))
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var("GRC_MCP_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(default_config_path);

    let config = ConfigLoader::new()
        .load(&FileConfigSource::new(path))
        .map_err(anyhow::Error::new)?;

    let mut failures = 0usize;
    for (tool, examples) in &config.config().examples {
        for (operation, example) in examples {
            match config.validate_parameters(tool, operation, example) {
                Ok(validated) => println!(
                    "valid {}.{}: {}",
                    tool,
                    operation,
                    serde_json::to_string(&validated)?
                ),
                Err(e) => {
                    failures += 1;
                    println!("INVALID {}.{}: {}", tool, operation, e);
                }
            }
        }
    }

    println!("\nAvailable tools:");
    for (name, tool) in &config.config().tools {
        println!("\n{}:", name);
        for (kind, op) in tool.operations() {
            println!("  {}: {}", kind, op.description);
            println!("    parameters: {}", op.parameters.names().join(", "));
        }
    }

    if failures > 0 {
        anyhow::bail!("{} example(s) failed validation", failures);
    }
    Ok(())
}
