#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Write;

use args::Args;
use clap::Parser;
use compat_config::Config;
use compat_llm::types::{FinishReason, InputFormat, Warning};
use compat_llm::{CallOptions, CompatProvider, LanguageModel, Message, StreamPart};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    compat_telemetry::init(config.telemetry.as_ref(), "warn")?;

    let (name, provider_config) = match &args.provider {
        Some(name) => config
            .providers
            .get_key_value(name)
            .ok_or_else(|| anyhow::anyhow!("provider '{name}' is not configured"))?,
        None => config
            .providers
            .first()
            .ok_or_else(|| anyhow::anyhow!("no providers configured"))?,
    };

    let provider = CompatProvider::from_config(name, provider_config)?;
    let model: Box<dyn LanguageModel> = if args.completion {
        Box::new(provider.completion_model(&args.model, (&provider_config.completion).into()))
    } else {
        Box::new(provider.chat_model(&args.model, (&provider_config.chat).into()))
    };

    tracing::info!(
        config_path = %args.config.display(),
        provider = %model.provider(),
        model = %model.model_id(),
        stream = args.stream,
        "sending prompt"
    );

    // Ctrl+C aborts the in-flight call
    let abort = CancellationToken::new();
    let abort_on_signal = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            abort_on_signal.cancel();
        }
    });

    let options = call_options(&args, abort);

    if args.stream {
        stream(model.as_ref(), options).await
    } else {
        generate(model.as_ref(), options).await
    }
}

/// Options for a single call built from the command line
///
/// Without a system message the prompt is sent as-is, so completion models
/// see it verbatim instead of as a transcript.
fn call_options(args: &Args, abort: CancellationToken) -> CallOptions {
    let (input_format, prompt) = match &args.system {
        Some(system) => (
            InputFormat::Messages,
            vec![
                Message::system(system.as_str()),
                Message::user_text(args.prompt.as_str()),
            ],
        ),
        None => (InputFormat::Prompt, vec![Message::user_text(args.prompt.as_str())]),
    };

    CallOptions {
        input_format,
        max_tokens: args.max_tokens,
        temperature: args.temperature,
        abort: Some(abort),
        ..CallOptions::new(prompt)
    }
}

async fn generate(model: &dyn LanguageModel, options: CallOptions) -> anyhow::Result<()> {
    let result = model.do_generate(options).await?;
    log_warnings(&result.warnings);

    let mut stdout = std::io::stdout().lock();
    if let Some(text) = &result.text {
        writeln!(stdout, "{text}")?;
    }
    for call in &result.tool_calls {
        writeln!(stdout, "[tool call {} {}] {}", call.tool_call_id, call.tool_name, call.args)?;
    }

    tracing::info!(
        finish_reason = ?result.finish_reason,
        prompt_tokens = ?result.usage.prompt_tokens,
        completion_tokens = ?result.usage.completion_tokens,
        "generation finished"
    );

    Ok(())
}

async fn stream(model: &dyn LanguageModel, options: CallOptions) -> anyhow::Result<()> {
    let result = model.do_stream(options).await?;
    log_warnings(&result.warnings);

    let mut parts = result.stream;
    let mut stdout = std::io::stdout();
    let mut finish = None;

    while let Some(part) = parts.next().await {
        match part? {
            StreamPart::ResponseMetadata(metadata) => {
                tracing::debug!(id = ?metadata.id, model = ?metadata.model_id, "response started");
            }
            StreamPart::TextDelta { delta } => {
                write!(stdout, "{delta}")?;
                stdout.flush()?;
            }
            StreamPart::ReasoningDelta { delta } => {
                tracing::debug!(%delta, "reasoning");
            }
            StreamPart::ToolCallDelta { .. } => {}
            StreamPart::ToolCall(call) => {
                writeln!(stdout, "\n[tool call {} {}] {}", call.tool_call_id, call.tool_name, call.args)?;
            }
            StreamPart::Error { message } => {
                tracing::error!(%message, "stream error");
            }
            StreamPart::Finish {
                finish_reason, usage, ..
            } => {
                tracing::info!(
                    finish_reason = ?finish_reason,
                    prompt_tokens = ?usage.prompt_tokens,
                    completion_tokens = ?usage.completion_tokens,
                    "stream finished"
                );
                finish = Some(finish_reason);
            }
        }
    }
    writeln!(stdout)?;

    match finish {
        Some(FinishReason::Error) => anyhow::bail!("stream finished with an error"),
        Some(_) => Ok(()),
        None => anyhow::bail!("stream ended before finishing"),
    }
}

fn log_warnings(warnings: &[Warning]) {
    for warning in warnings {
        match warning {
            Warning::UnsupportedSetting { setting, details } => {
                tracing::warn!(%setting, details = ?details, "unsupported setting ignored");
            }
            Warning::UnsupportedTool { tool, details } => {
                tracing::warn!(%tool, details = ?details, "unsupported tool dropped");
            }
            Warning::Other { message } => tracing::warn!(%message, "warning"),
        }
    }
}
