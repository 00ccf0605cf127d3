use crate::extract::BoundedDocument;

pub const SYSTEM_PROMPT: &str = "You are a real estate disclosure document analyzer. \
Your responses must be valid JSON objects only, no other text.";

const INSTRUCTIONS: &str = r#"Analyze this real estate disclosure document and extract key information. Return ONLY a JSON object with this exact structure:

1. Return ONLY a JSON object - no other text or formatting
2. Ensure the JSON is properly formatted and valid
3. Include all required fields
4. Be concise but specific in descriptions

Required fields:
- propertyAddress: Extract from document, use "Address not found" if unclear
- issues: Array of problems found
- recommendations: Array of suggested actions
- summary: Brief overview

{
  "propertyAddress": "The complete property address found in the document",
  "issues": [
    {
      "issue": "Description of the issue",
      "severity": "Low" | "Medium" | "High",
      "details": "Additional details about the issue",
      "estimatedCost": "Rough cost estimate range"
    }
  ],
  "recommendations": [
    {
      "action": "Specific action item",
      "priority": "Low" | "Medium" | "High",
      "timeframe": "Suggested timeframe"
    }
  ],
  "summary": "A brief executive summary of the findings"
}

Example:
{
  "propertyAddress": "123 Main St, City, State",
  "issues": [{"issue": "Roof damage", "severity": "High", "details": "Multiple leaks", "estimatedCost": "$5,000-$8,000"}],
  "recommendations": [{"action": "Replace roof", "priority": "High", "timeframe": "Within 1 month"}],
  "summary": "Property requires immediate attention to roof issues"
}

Guidelines:
- Return ONLY the JSON object, no other text
- Severity levels:
  * Low: Cosmetic or minor maintenance issues
  * Medium: Issues requiring attention but not immediate threats
  * High: Safety concerns or major structural issues
- Ensure all JSON fields are properly formatted
- Include specific cost estimates where possible"#;

// User message: instructions, optional truncation notice, then the document
pub fn build_prompt(document: &BoundedDocument<'_>) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + document.text.len() + 256);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\n");

    if document.is_truncated() {
        prompt.push_str(&format!(
            "Note: the document was too long and has been truncated to its first {} of {} characters. \
             Base the analysis on the available text and mention in the summary that it may be incomplete.\n\n",
            document.kept_chars, document.original_chars
        ));
    }

    prompt.push_str("Here's the document content to analyze:\n");
    prompt.push_str(document.text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::truncate_document;

    #[test]
    fn test_complete_document_has_no_notice() {
        let doc = truncate_document("Seller disclosure: roof replaced 2019.", 1_000);
        let prompt = build_prompt(&doc);
        assert!(!prompt.contains("truncated"));
        assert!(prompt.ends_with("Seller disclosure: roof replaced 2019."));
    }

    #[test]
    fn test_truncated_document_discloses_sizes() {
        let text = "line\n".repeat(100);
        let doc = truncate_document(&text, 52);
        let prompt = build_prompt(&doc);
        assert!(prompt.contains("truncated to its first 49 of 500 characters"));
    }
}
