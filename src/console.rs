// file: src/console.rs
// description: plain-text rendering of query results for the interactive console
// reference: internal module structure

use crate::evaluation::EvaluationRecord;
use crate::models::QueryResponse;
use std::fmt::Write;

pub const PROMPT: &str = "Enter your query (or type 'exit' to quit): ";
pub const EXIT_COMMAND: &str = "exit";

pub fn separator() -> String {
    "#".repeat(100)
}

pub fn render_matches(article_keys: &[String]) -> String {
    let mut out = String::from("\nTop similar articles:\n");
    for key in article_keys {
        let _ = writeln!(out, "{}", key);
    }
    out
}

pub fn render_source(response: &QueryResponse) -> String {
    let mut out = format!("\n{}\n\nSource Article:::\n", separator());
    match response.top_source() {
        Some(source) => {
            let _ = writeln!(
                out,
                "Title: {}",
                source.node.article_number().unwrap_or("unknown")
            );
            let _ = writeln!(
                out,
                "Summary: {}",
                source.node.article_summary().unwrap_or("unknown")
            );
        }
        None => out.push_str("No source nodes were retrieved\n"),
    }
    out
}

pub fn render_answer(response: &QueryResponse) -> String {
    format!("\n{}\n\nResponse: {}\n", separator(), response)
}

pub fn render_evaluation(record: &EvaluationRecord) -> String {
    let mut out = format!("\n{}\n\nEvaluation:::\n", separator());
    for feedback in &record.feedback {
        let _ = writeln!(out, "{} {}", feedback.name, feedback.result);
    }
    out
}

/// Top source followed by the answer.
pub fn render_response(response: &QueryResponse) -> String {
    let mut out = render_source(response);
    out.push_str(&render_answer(response));
    out
}
