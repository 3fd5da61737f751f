//! Terminal rendering of replies and usage counters

use crate::session::UsageMetrics;
use colored::Colorize;
use regex::{Captures, Regex};

fn replace_with(text: &str, pattern: &str, rewrite: impl Fn(&Captures) -> String) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(text, |caps: &Captures| rewrite(caps)).into_owned(),
        Err(e) => {
            tracing::warn!("Invalid formatting pattern {}: {}", pattern, e);
            text.to_string()
        }
    }
}

/// Render markdown from a model reply for a plain terminal
///
/// Headers become upper-case lines underlined with `=`, emphasis and code
/// become terminal styles, `*` bullets become `•`, numbered items are indented
/// and runs of blank lines are collapsed.
///
/// # Examples
///
/// ```
/// use palaver::commands::format::format_ai_response;
///
/// assert_eq!(format_ai_response("## Plan"), "\nPLAN\n====\n");
/// assert_eq!(format_ai_response("* one"), "  • one");
/// ```
pub fn format_ai_response(text: &str) -> String {
    let text = replace_with(text, r"(?s)```\w*\n(.*?)\n```", |caps| {
        format!("\n{}\n", caps[1].dimmed())
    });
    let text = replace_with(&text, r"`([^`\n]*)`", |caps| caps[1].dimmed().to_string());
    let text = replace_with(&text, r"(?m)^#{1,6}[ \t]+(.+?)[ \t]*$", |caps| {
        let title = &caps[1];
        format!("\n{}\n{}\n", title.to_uppercase(), "=".repeat(title.chars().count()))
    });
    let text = replace_with(&text, r"(?m)^\*[ \t]+(.+)$", |caps| format!("  • {}", &caps[1]));
    let text = replace_with(&text, r"\*\*(.+?)\*\*", |caps| caps[1].bold().to_string());
    let text = replace_with(&text, r"\*([^*\n]+?)\*", |caps| caps[1].italic().to_string());
    let text = replace_with(&text, r"(?m)^\d+\.[ \t]+.+$", |caps| format!("  {}", &caps[0]));
    replace_with(&text, r"\n{3,}", |_| "\n\n".to_string())
}

/// Group the digits of `n` in thousands
fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Render usage counters
///
/// # Examples
///
/// ```
/// use palaver::commands::format::format_metrics;
/// use palaver::session::UsageMetrics;
///
/// let text = format_metrics(&UsageMetrics { token_count: 12345, api_calls: 2, cost_estimate: 0.12345 });
/// assert!(text.contains("Token count: 12,345"));
/// assert!(text.contains("Cost estimate: $0.123450"));
/// ```
pub fn format_metrics(metrics: &UsageMetrics) -> String {
    format!(
        "\nUsage Metrics:\n  Token count: {}\n  API calls: {}\n  Cost estimate: ${:.6}",
        with_thousands(metrics.token_count),
        metrics.api_calls,
        metrics.cost_estimate
    )
}

/// Print usage counters to stdout
pub fn display_metrics(metrics: &UsageMetrics) {
    println!("{}", format_metrics(metrics));
}
