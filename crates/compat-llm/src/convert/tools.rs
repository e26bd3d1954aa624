//! Tool definitions and tool choice to the vendor's function-calling schema

use crate::protocol::chat::{CompatTool, CompatToolChoice, CompatToolChoiceMode};
use crate::types::{Tool, ToolChoice, Warning};

/// Tools ready to attach to a chat request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedTools {
    /// Function tools, absent when none were given
    pub tools: Option<Vec<CompatTool>>,
    /// Tool choice, absent when none was given
    pub tool_choice: Option<CompatToolChoice>,
    /// Tools that were dropped
    pub warnings: Vec<Warning>,
}

/// Translate tools and tool choice
///
/// Provider-defined tools are dropped with a warning. The tool choice is
/// passed through even when every tool was dropped.
pub fn prepare_tools(tools: &[Tool], tool_choice: Option<&ToolChoice>) -> PreparedTools {
    if tools.is_empty() {
        return PreparedTools::default();
    }

    let mut warnings = Vec::new();
    let mut function_tools = Vec::with_capacity(tools.len());
    for tool in tools {
        match tool {
            Tool::Function(function) => function_tools.push(CompatTool::from(function)),
            Tool::ProviderDefined { name, .. } => warnings.push(Warning::UnsupportedTool {
                tool: name.clone(),
                details: None,
            }),
        }
    }

    let tool_choice = tool_choice.map(|choice| match choice {
        ToolChoice::Auto => CompatToolChoice::Mode(CompatToolChoiceMode::Auto),
        ToolChoice::None => CompatToolChoice::Mode(CompatToolChoiceMode::None),
        ToolChoice::Required => CompatToolChoice::Mode(CompatToolChoiceMode::Required),
        ToolChoice::Tool { tool_name } => CompatToolChoice::function(tool_name.clone()),
    });

    PreparedTools {
        tools: (!function_tools.is_empty()).then_some(function_tools),
        tool_choice,
        warnings,
    }
}
