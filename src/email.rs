use std::fmt::Write;

use crate::models::{AnalysisResult, EmailDraft};

const ADDRESS_PLACEHOLDER: &str = "[Property Address]";

const NEXT_STEPS: &str = "SUGGESTED NEXT STEPS
------------------
1. Review the findings detailed above
2. Identify any areas requiring clarification or additional information
3. Schedule a consultation to discuss these findings in detail (I can be available at your convenience)";

const CLOSING: &str = "I want to ensure you have all the information needed to make an informed decision about this property. \
The items above represent our initial analysis, but please don't hesitate to ask for clarification or additional details about any specific points.

Would you like to schedule a brief call to discuss these findings in more detail? \
I'm happy to walk through each item and address any concerns you may have.

Best regards,

[Your Full Name]
[Your Title]
[Company Name]
[License Number]

Contact Information:
📱 [Phone Number]
📧 [Email Address]
🌐 [Company Website]

CONFIDENTIALITY NOTICE: This email and any attachments are intended solely for the named recipient(s) \
and may contain confidential information. If you have received this in error, please notify the sender \
immediately and delete all copies.";

/// Client-facing email summarizing an analysis.
pub fn draft_email(analysis: &AnalysisResult) -> EmailDraft {
    let address = match analysis.property_address.trim() {
        "" => ADDRESS_PLACEHOLDER,
        address => address,
    };

    let issues = analysis
        .issues
        .iter()
        .map(|issue| {
            format!(
                "{} PRIORITY: {}\n• Details: {}\n• Estimated Cost: {}",
                issue.severity.as_str().to_uppercase(),
                issue.issue,
                issue.details,
                issue.estimated_cost
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let recommendations = analysis
        .recommendations
        .iter()
        .map(|rec| {
            format!(
                "{} PRIORITY: {}\n• Timeframe: {}",
                rec.priority.as_str().to_uppercase(),
                rec.action,
                rec.timeframe
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let costs = analysis
        .issues
        .iter()
        .map(|issue| format!("• {}: {}", issue.issue, issue.estimated_cost))
        .collect::<Vec<_>>()
        .join("\n");

    let mut body = String::new();
    // writing to a String cannot fail
    let _ = write!(
        body,
        "Dear [Client Name],

I trust this email finds you well. I've completed a comprehensive analysis of the disclosure package for {address} \
and would like to share our detailed findings with you.

EXECUTIVE SUMMARY
----------------
{summary}

KEY ISSUES IDENTIFIED
-------------------
{issues}

RECOMMENDED ACTIONS
-----------------
{recommendations}

{NEXT_STEPS}

COST SUMMARY
-----------
Based on the identified issues, here's a high-level cost breakdown:
{costs}

{CLOSING}",
        summary = analysis.summary,
    );

    EmailDraft {
        subject: format!("Disclosure Package Analysis Results - {address}"),
        body,
    }
}
