//! Identity and purpose-contract sections: the leading system block.

use promptward_core::{CacheClass, Context, Purpose, SectionId, SectionOutput};

/// Who the model is for this purpose.
pub fn identity(ctx: &Context) -> SectionOutput {
    let role = match ctx.purpose {
        Purpose::IntentExtraction => "the intent scout of a voice assistant",
        Purpose::DimensionExtraction => "the dimension extractor of a voice assistant",
        Purpose::Planning => "the planner of a voice assistant",
        Purpose::Execution => "the executor of a voice assistant",
        Purpose::Verification => "the verifier of a voice assistant",
        Purpose::SafetyClassification => "the safety classifier of a voice assistant",
        Purpose::Summarization => "the summarizer of a voice assistant",
        Purpose::SubtaskDelegation => "the delegation coordinator of a voice assistant",
    };
    let content = format!(
        "[Identity]\nYou are {role}. You are one stage in a governed pipeline: \
         other stages act on your output, so stay within your role and never \
         address the user directly unless your contract says so."
    );
    SectionOutput::included(SectionId::Identity, content, CacheClass::Stable)
}

/// What this call must and must not do.
pub fn purpose_contract(ctx: &Context) -> SectionOutput {
    let rules: &[&str] = match ctx.purpose {
        Purpose::IntentExtraction => &[
            "Interpret what the user wants from the transcript.",
            "Propose at most 3 candidate interpretations, most likely first.",
            "Support every candidate with exact quotes from the transcript.",
            "Do not plan or perform any action.",
        ],
        Purpose::DimensionExtraction => &[
            "Extract the concrete what/who/when/where/how/constraints slots the user stated.",
            "Estimate urgency, emotional load, ambiguity, reversibility and user confidence for this turn only.",
            "Leave a slot out rather than guess it.",
        ],
        Purpose::Planning => &[
            "Produce an ordered plan that satisfies the task.",
            "Only reference tools listed in the Tools section.",
            "Call out irreversible steps as risks.",
        ],
        Purpose::Execution => &[
            "Carry out the task using only the tools listed in the Tools section.",
            "Stop and ask for input when a required detail is missing.",
            "Never claim an action succeeded unless a tool result confirms it.",
        ],
        Purpose::Verification => &[
            "Check the proposed result against the user's request.",
            "Report every discrepancy as an issue.",
            "Answer uncertain when the evidence is insufficient; do not guess pass.",
        ],
        Purpose::SafetyClassification => &[
            "Classify the request for safety only; do not answer it.",
            "Name every category that applies.",
        ],
        Purpose::Summarization => &[
            "Summarize faithfully; add nothing that is not in the source.",
            "Keep the summary short enough to read aloud.",
        ],
        Purpose::SubtaskDelegation => &[
            "Split the task into independent subtasks a worker can complete alone.",
            "Give every subtask explicit inputs and a success criterion.",
        ],
    };
    let mut content = format!("[Contract: {}]\n", ctx.purpose);
    for rule in rules {
        content.push_str("- ");
        content.push_str(rule);
        content.push('\n');
    }
    SectionOutput::included(SectionId::PurposeContract, content.trim_end(), CacheClass::Stable)
}
