// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Prompt construction for the generative narrative path.

use std::fmt::Write as _;

use crate::{analyzers::Dimension, metrics::AnalysisMetrics, snapshot::RepositoryInfo};

/// Short observations about the weakest and strongest dimensions.
///
/// Findings are emitted in a fixed order: code quality, documentation,
/// testing, security, CI/CD and containerization. The middle band of each
/// scored dimension produces no finding.
pub fn key_findings(metrics: &AnalysisMetrics,) -> Vec<String,>
{
    let mut findings = Vec::new();

    if metrics.code_quality_score < 12 {
        findings.push("Code quality needs significant improvement".to_owned(),);
    } else if metrics.code_quality_score >= 16 {
        findings.push("Excellent code quality and consistency".to_owned(),);
    }

    if metrics.documentation_score < 9 {
        findings.push("Documentation is insufficient".to_owned(),);
    } else if metrics.documentation_score >= 12 {
        findings.push("Well-documented codebase".to_owned(),);
    }

    if metrics.testing_score < 6 {
        findings.push("Testing coverage is inadequate".to_owned(),);
    } else if metrics.testing_score >= 10 {
        findings.push("Strong testing practices".to_owned(),);
    }

    if !metrics.security_issues.is_empty() {
        findings.push(format!("{} security concerns detected", metrics.security_issues.len()),);
    }

    findings.push(
        if metrics.has_cicd { "CI/CD pipeline configured" } else { "No CI/CD automation detected" }.to_owned(),
    );
    findings.push(if metrics.has_dockerfile { "Project is containerized" } else { "Not containerized" }.to_owned(),);

    findings
}

fn bullet_list(findings: &[String],) -> String
{
    findings.iter().map(|finding| format!("- {finding}"),).collect::<Vec<_,>>().join("\n",)
}

fn join_or(values: &[String], fallback: &str,) -> String
{
    if values.is_empty() { fallback.to_owned() } else { values.join(", ",) }
}

fn languages_line(metrics: &AnalysisMetrics,) -> String
{
    let languages: Vec<String,> =
        metrics.languages.iter().map(|(name, percentage,)| format!("{name} {percentage}%"),).collect();
    join_or(&languages, "Unknown",)
}

/// Builds the prompt asking for a two to three sentence summary.
pub fn summary_prompt(info: &RepositoryInfo, metrics: &AnalysisMetrics,) -> String
{
    let mut prompt = String::from("You are an expert code reviewer analyzing a GitHub repository.\n\n",);

    let _ = writeln!(prompt, "Repository: {}", info.full_name);
    let _ = writeln!(prompt, "Description: {}", info.description.as_deref().unwrap_or("No description"));
    let _ = writeln!(prompt, "Primary Language: {}", info.language.as_deref().unwrap_or("Unknown"));
    let _ = writeln!(prompt, "Stars: {}\n", info.stars);

    prompt.push_str("Analysis Metrics:\n",);
    let _ = writeln!(prompt, "- Overall Score: {}/100", metrics.total_score);
    for dimension in Dimension::ALL {
        let _ = writeln!(prompt, "- {}: {}/{}", dimension.label(), metrics.score(dimension), dimension.max_score());
    }

    prompt.push_str("\nRepository Statistics:\n",);
    let _ = writeln!(prompt, "- Total Files: {}", metrics.total_files);
    let _ = writeln!(prompt, "- Languages: {}", languages_line(metrics));
    let _ = writeln!(prompt, "- Frameworks: {}", join_or(&metrics.frameworks, "None detected"));
    let _ = writeln!(prompt, "- Test Files: {}", metrics.test_files);
    let _ = writeln!(prompt, "- Commits: {}", metrics.commit_count);
    let _ = writeln!(prompt, "- Branches: {}", metrics.branch_count);
    let _ = writeln!(prompt, "- Contributors: {}\n", metrics.contributor_count);

    let _ = writeln!(prompt, "Key Findings:\n{}\n", bullet_list(&key_findings(metrics)));

    prompt.push_str(
        "Task: Generate a professional, honest, 2-3 sentence summary of this repository's quality. Be specific \
         about strengths and weaknesses. Do not include score or rating in the summary.\n\nWrite ONLY the summary \
         text, nothing else.",
    );
    prompt
}

/// Builds the prompt asking for a JSON roadmap of five to seven steps.
pub fn roadmap_prompt(info: &RepositoryInfo, metrics: &AnalysisMetrics, summary: &str,) -> String
{
    let mut prompt =
        String::from("You are an expert coding mentor creating a personalized improvement roadmap.\n\n",);

    let _ = writeln!(prompt, "Repository: {}", info.full_name);
    let _ = writeln!(prompt, "Summary: {summary}\n");
    let _ = writeln!(prompt, "Current Analysis:\n{}\n", bullet_list(&key_findings(metrics)));

    prompt.push_str(
        r#"Task: Generate 5-7 prioritized, actionable improvement steps. Each step should be specific and implementable.

Return ONLY a valid JSON array with this exact structure:
[
  {
    "priority": "high|medium|low",
    "title": "Brief title (3-7 words)",
    "description": "Specific, actionable description (1-2 sentences)",
    "estimatedTime": "X-Y hours/days"
  }
]

Focus on the biggest gaps first. Be practical and specific. Include steps for improving the weakest dimensions.

Return ONLY the JSON array, no markdown formatting, no code blocks, no explanation."#,
    );
    prompt
}
