//! System prompt assembly for the discrepancy assistant

use std::fmt::Write;

use crate::record::{DiscrepancyRecord, DiscrepancyType};
use crate::tools::tool_name;

const ROLE: &str = "\
You are an assistant for Emergency Shutdown (ESD) system reviews. You compare the \
cause-and-effect logic documented in the design with the logic implemented in the \
control system and explain where they differ.
- A user asks a question in natural language (e.g., \"Which causes trigger valve XV-101 \
and what are the implementation differences?\").
- Answer only from the cataloged findings and the context supplied in the conversation; \
do not invent tags.
- When a question matches a supported test case, invoke the tool of the same name to \
report the discrepancy.";

const RESPONSE_FIELDS: &str = "\
- The answer should provide a structured response with the following fields:
  - description: A brief description of the discrepancy.
  - parameters: An object containing:
    - designCauseTag: The tag of the cause in the design.
    - designCauseDescription: A description of the cause in the design.
    - implementedCauseTags: An array of tags for causes actually required in implementation.
    - implementedCauseDescriptions: An array of descriptions for causes actually required in implementation.
    - effectTags: The tags of the effects in the implementation.
    - effectDescriptions: Descriptions of the effects in the implementation.
    - discrepancyType: The type of discrepancy.
    - notes: Additional notes or context about the discrepancy.";

/// Build the system prompt listing `tool_cases` as the supported test cases
pub fn system_prompt<'a, I>(tool_cases: I) -> String
where
    I: IntoIterator<Item = &'a DiscrepancyRecord>,
{
    let mut prompt = String::from(ROLE);

    prompt.push_str("\n- Supported Test Cases:\n");
    for (i, record) in tool_cases.into_iter().enumerate() {
        let _ = writeln!(
            prompt,
            "  {}. **{}** ({}): {}",
            i + 1,
            tool_name(record),
            record.discrepancy_type(),
            record.description()
        );
    }

    prompt.push_str("- Identify discrepancies between the design and implementation logic, such as:\n");
    for t in DiscrepancyType::ALL {
        let _ = writeln!(prompt, "  - '{}' ({})", t.label(), t.as_str());
    }

    prompt.push_str(RESPONSE_FIELDS);
    prompt.push('\n');
    prompt
}
