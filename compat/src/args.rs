use std::path::PathBuf;

use clap::Parser;

/// Compat command-line client
#[derive(Debug, Parser)]
#[command(name = "compat", about = "Send a prompt to an OpenAI-compatible chat or completion API")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "compat.toml", env = "COMPAT_CONFIG")]
    pub config: PathBuf,

    /// Provider name from the configuration, defaults to the first one
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Vendor model id
    #[arg(short, long)]
    pub model: String,

    /// Use the legacy completions endpoint instead of chat
    #[arg(long)]
    pub completion: bool,

    /// Print the response as it streams in
    #[arg(short, long)]
    pub stream: bool,

    /// System message sent before the prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Prompt text
    pub prompt: String,
}
