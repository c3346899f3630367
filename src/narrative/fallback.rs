// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Template narrative used when no generator is configured or it fails.

use super::{MAX_ROADMAP_ITEMS, Priority, RoadmapItem};
use crate::metrics::AnalysisMetrics;

/// Deterministic two-part summary keyed on the composite score.
///
/// Scores of 75 and above read as excellent, 50 and above as solid, and
/// anything lower as needing significant work.
pub fn summary(metrics: &AnalysisMetrics,) -> String
{
    let mut strengths = Vec::new();
    if metrics.code_quality_score >= 15 {
        strengths.push("clean code structure",);
    }
    if metrics.documentation_score >= 12 {
        strengths.push("comprehensive documentation",);
    }
    if metrics.testing_score >= 10 {
        strengths.push("strong test coverage",);
    }
    if metrics.security_score >= 8 {
        strengths.push("good security practices",);
    }
    if metrics.has_cicd {
        strengths.push("automated CI/CD",);
    }

    let mut weaknesses = Vec::new();
    if metrics.testing_score < 6 {
        weaknesses.push("insufficient testing",);
    }
    if metrics.documentation_score < 9 {
        weaknesses.push("poor documentation",);
    }
    if metrics.security_score < 6 {
        weaknesses.push("security concerns",);
    }
    if !metrics.has_cicd {
        weaknesses.push("no CI/CD automation",);
    }

    let leading = |items: &[&str], count: usize, separator: &str| items[..items.len().min(count,)].join(separator,);

    match metrics.total_score {
        75.. => {
            let praise =
                if strengths.is_empty() { "strong fundamentals".to_owned() } else { leading(&strengths, 2, " and ",) };
            let tail = match weaknesses.first() {
                Some(weakness,) => format!("Minor improvements needed in {weakness}."),
                None => "Maintains high standards across all dimensions.".to_owned(),
            };
            format!("Excellent repository with {praise}. {tail}")
        }
        50.. => {
            let praise =
                if strengths.is_empty() { "decent structure".to_owned() } else { leading(&strengths, 2, " and ",) };
            let concern = if weaknesses.is_empty() {
                "some areas need improvement".to_owned()
            } else {
                format!("{} need attention", leading(&weaknesses, 2, " and "))
            };
            format!("Solid foundation with {praise}. However, {concern}.")
        }
        _ => {
            let mut text = String::from("Repository shows potential but needs significant improvement. ",);
            if !weaknesses.is_empty() {
                text.push_str(&format!("Critical issues: {}. ", leading(&weaknesses, 3, ", ")),);
            }
            text.push_str("Focus on establishing best practices across all dimensions.",);
            text
        }
    }
}

/// Rule-based roadmap: one item per weak area, in fixed priority order.
pub fn roadmap(metrics: &AnalysisMetrics,) -> Vec<RoadmapItem,>
{
    let rules: [(bool, Priority, &str, &str, &str,); 7] = [
        (
            metrics.testing_score < 8,
            Priority::High,
            "Implement Unit Testing",
            "Add comprehensive unit tests to increase code reliability and coverage. Aim for at least 70% test \
             coverage.",
            "4-8 hours",
        ),
        (
            metrics.documentation_score < 10,
            Priority::High,
            "Enhance Documentation",
            "Create or improve README with clear installation instructions, usage examples, and API documentation.",
            "2-4 hours",
        ),
        (
            !metrics.has_cicd,
            Priority::Medium,
            "Set Up CI/CD Pipeline",
            "Configure GitHub Actions or similar CI/CD tool for automated testing and deployment.",
            "3-5 hours",
        ),
        (
            metrics.security_score < 7,
            Priority::High,
            "Address Security Issues",
            "Review and fix security vulnerabilities, add .env to .gitignore, and implement security best practices.",
            "2-3 hours",
        ),
        (
            metrics.code_quality_score < 14,
            Priority::Medium,
            "Improve Code Quality",
            "Refactor complex functions, add linting rules, and follow language-specific best practices.",
            "6-10 hours",
        ),
        (
            !metrics.has_dockerfile,
            Priority::Low,
            "Containerize Application",
            "Create Dockerfile and docker-compose.yml for consistent development and deployment environments.",
            "2-4 hours",
        ),
        (
            metrics.git_practices_score < 8,
            Priority::Medium,
            "Improve Git Workflow",
            "Use meaningful commit messages, create feature branches, and leverage pull requests for code review.",
            "Ongoing",
        ),
    ];

    rules
        .into_iter()
        .filter(|(triggered, ..)| *triggered,)
        .map(|(_, priority, title, description, estimated_time,)| RoadmapItem {
            priority,
            title: title.to_owned(),
            description: description.to_owned(),
            estimated_time: estimated_time.to_owned(),
        },)
        .take(MAX_ROADMAP_ITEMS,)
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn weak() -> AnalysisMetrics
    {
        AnalysisMetrics {
            total_score: 27,
            testing_score: 3,
            documentation_score: 5,
            security_score: 4,
            code_quality_score: 10,
            git_practices_score: 5,
            ..AnalysisMetrics::default()
        }
    }

    #[test]
    fn every_rule_fires_in_priority_order()
    {
        let titles: Vec<String,> = roadmap(&weak(),).into_iter().map(|item| item.title,).collect();
        assert_eq!(
            titles,
            vec![
                "Implement Unit Testing",
                "Enhance Documentation",
                "Set Up CI/CD Pipeline",
                "Address Security Issues",
                "Improve Code Quality",
                "Containerize Application",
                "Improve Git Workflow",
            ]
        );
        let items = roadmap(&weak(),);
        assert_eq!(items[0].priority, Priority::High);
        assert_eq!(items[5].priority, Priority::Low);
        assert_eq!(items[6].estimated_time, "Ongoing");
    }

    #[test]
    fn strong_repository_gets_an_empty_roadmap()
    {
        let metrics = AnalysisMetrics {
            testing_score: 12,
            documentation_score: 15,
            has_cicd: true,
            security_score: 10,
            code_quality_score: 20,
            has_dockerfile: true,
            git_practices_score: 12,
            ..AnalysisMetrics::default()
        };
        assert!(roadmap(&metrics).is_empty());
    }

    #[test]
    fn low_score_summary_lists_three_critical_issues()
    {
        assert_eq!(
            summary(&weak(),),
            "Repository shows potential but needs significant improvement. Critical issues: insufficient testing, \
             poor documentation, security concerns. Focus on establishing best practices across all dimensions."
        );
    }

    #[test]
    fn middle_score_summary_pairs_strengths_and_weaknesses()
    {
        let metrics = AnalysisMetrics {
            total_score: 60,
            code_quality_score: 16,
            documentation_score: 13,
            testing_score: 4,
            security_score: 9,
            has_cicd: true,
            ..AnalysisMetrics::default()
        };
        assert_eq!(
            summary(&metrics,),
            "Solid foundation with clean code structure and comprehensive documentation. However, insufficient \
             testing need attention."
        );
    }

    #[test]
    fn high_score_summary_without_weaknesses()
    {
        let metrics = AnalysisMetrics {
            total_score: 90,
            testing_score: 11,
            documentation_score: 12,
            security_score: 6,
            has_cicd: true,
            ..AnalysisMetrics::default()
        };
        assert_eq!(
            summary(&metrics,),
            "Excellent repository with comprehensive documentation and strong test coverage. Maintains high \
             standards across all dimensions."
        );
    }
}
