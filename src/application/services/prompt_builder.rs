use std::fmt::Write as _;

use crate::domain::{ContextBlock, KillChainStage, Prompt, Query};

const TASK_INSTRUCTIONS: &str = "Task: Analyze the following query through the 7 steps of the Cyber Kill Chain.\n\
For each of the 7 steps, provide a 1-sentence description of how this threat manifests.\n\
Format your response as:";

/// Deterministic prompt template: context, then instructions, then the query.
///
/// No truncation happens here. Input limits are the reasoning service's
/// business.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, context: &ContextBlock, query: &Query) -> Prompt {
        let mut text = String::with_capacity(
            context.as_str().len() + query.as_str().len() + TASK_INSTRUCTIONS.len() + 256,
        );

        text.push_str("Context: ");
        text.push_str(context.as_str());
        text.push('\n');
        text.push_str(TASK_INSTRUCTIONS);
        text.push('\n');
        for stage in KillChainStage::ALL {
            let _ = writeln!(text, "Step {}: [description]", stage.ordinal());
        }
        text.push_str("Query: ");
        text.push_str(query.as_str());
        text.push('\n');

        Prompt::new(text)
    }
}
