// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Grade badge generation for completed analyses.
//!
//! Every completed analysis can be materialized as an SVG badge coloured by
//! its tier plus a JSON manifest describing the grade. File names are derived
//! from the repository, `<owner>-<repo>.svg` and `<owner>-<repo>.json`, so
//! regenerating a badge for a newer analysis overwrites the previous one.

use std::{
    borrow::Cow,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf}
};

use serde::Serialize;

use crate::{
    error::{self, Error},
    score::{Badge, CompositeScore, Rating},
    store::AnalysisRecord
};

/// Paths of the artifacts written for one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeAssets {
    /// Rendered SVG badge.
    pub svg_path:      PathBuf,
    /// JSON manifest describing the badge.
    pub manifest_path: PathBuf
}

/// Writes the badge and manifest for a completed analysis into `output_dir`.
///
/// The directory hierarchy is created when missing.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the analysis has not completed,
/// [`Error::BadgeIo`] when directories or files cannot be written and
/// [`Error::Serialize`] if the manifest cannot be encoded.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use repograde::{badge::generate_badge_assets, store::{AnalysisStore, SqliteStore}};
///
/// # fn main() -> Result<(), repograde::Error> {
/// let store = SqliteStore::open(Path::new("repograde.db"))?;
/// let record = store.history(1, 0)?.remove(0);
/// let assets = generate_badge_assets(&record, Path::new("badges"))?;
/// println!("SVG: {}", assets.svg_path.display());
/// # Ok(())
/// # }
/// ```
pub fn generate_badge_assets(record: &AnalysisRecord, output_dir: &Path) -> Result<BadgeAssets, Error> {
    let score = record.composite().ok_or_else(|| {
        Error::validation(format!(
            "analysis {} is {} and has no score to render",
            record.id, record.status
        ))
    })?;

    fs::create_dir_all(output_dir).map_err(|source| error::badge_io_error(output_dir, source))?;

    let slug = badge_slug(record);
    let svg_path = output_dir.join(format!("{slug}.svg"));
    let manifest_path = output_dir.join(format!("{slug}.json"));

    write_svg(&svg_path, record, &score)?;
    write_manifest(&manifest_path, record, &score, &svg_path)?;

    Ok(BadgeAssets {
        svg_path,
        manifest_path
    })
}

fn badge_slug(record: &AnalysisRecord) -> String {
    let raw = format!("{}-{}", record.owner, record.name);
    raw.chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '-' | '_' | '.') {
                character.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

fn write_svg(path: &Path, record: &AnalysisRecord, score: &CompositeScore) -> Result<(), Error> {
    let contents = build_svg_content(record, score);
    let file = File::create(path).map_err(|source| error::badge_io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .map_err(|source| error::badge_io_error(path, source))?;
    writer
        .flush()
        .map_err(|source| error::badge_io_error(path, source))
}

fn write_manifest(
    path: &Path,
    record: &AnalysisRecord,
    score: &CompositeScore,
    svg_path: &Path
) -> Result<(), Error> {
    let manifest = BadgeManifest {
        analysis_id:  &record.id,
        repository:   format!("{}/{}", record.owner, record.name),
        repo_url:     &record.repo_url,
        score:        score.total,
        rating:       score.rating,
        badge:        score.badge,
        analyzed_at:  record.completed_at.map(|at| at.to_rfc3339()),
        svg_artifact: svg_path.to_string_lossy().into_owned()
    };

    let file = File::create(path).map_err(|source| error::badge_io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest)?;
    writer
        .write_all(b"\n")
        .map_err(|source| error::badge_io_error(path, source))?;
    writer
        .flush()
        .map_err(|source| error::badge_io_error(path, source))
}

fn build_svg_content(record: &AnalysisRecord, score: &CompositeScore) -> String {
    use std::fmt::Write as _;

    let mut buffer = String::with_capacity(512);
    let background = badge_background(score.badge);
    let repository = format!("{}/{}", record.owner, record.name);
    let escaped_repository = escape_xml(&repository);
    let headline = format!("{} / 100", score.total);
    let tier = format!("{} · {}", score.rating, score.badge);

    let _ = writeln!(
        buffer,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"{escaped_repository}: {headline}\" width=\"360\" height=\"120\" viewBox=\"0 0 360 120\">",
    );
    let _ = writeln!(
        buffer,
        "  <defs>\n    <linearGradient id=\"repograde-badge\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\">\n      <stop offset=\"0%\" stop-color=\"{}\" stop-opacity=\"0.92\"/>\n      <stop offset=\"100%\" stop-color=\"{}\" stop-opacity=\"1\"/>\n    </linearGradient>\n  </defs>",
        background.primary, background.secondary,
    );
    buffer.push_str("  <rect x=\"6\" y=\"6\" width=\"348\" height=\"108\" rx=\"14\" fill=\"url(#repograde-badge)\"/>");
    let _ = writeln!(
        buffer,
        "\n  <text x=\"180\" y=\"42\" text-anchor=\"middle\" font-family=\"'Segoe UI', 'SF Pro Display', sans-serif\" font-size=\"16\" fill=\"#ffffff\">{escaped_repository}</text>",
    );
    let _ = writeln!(
        buffer,
        "  <text x=\"180\" y=\"76\" text-anchor=\"middle\" font-family=\"'Segoe UI', 'SF Pro Display', sans-serif\" font-size=\"28\" font-weight=\"600\" fill=\"#ffffff\">{headline}</text>",
    );
    let _ = writeln!(
        buffer,
        "  <text x=\"180\" y=\"100\" text-anchor=\"middle\" font-family=\"'Segoe UI', 'SF Pro Display', sans-serif\" font-size=\"13\" fill=\"{}\">{tier}</text>",
        background.caption,
    );
    buffer.push_str("</svg>\n");

    buffer
}

fn escape_xml(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .any(|character| matches!(character, '&' | '<' | '>' | '\"' | '\''))
    {
        let mut escaped = String::with_capacity(value.len() + 8);
        for character in value.chars() {
            match character {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '\"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                other => escaped.push(other)
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(value)
    }
}

struct BadgeGradient {
    primary:   &'static str,
    secondary: &'static str,
    caption:   &'static str
}

fn badge_background(badge: Badge) -> BadgeGradient {
    match badge {
        Badge::Gold => BadgeGradient {
            primary:   "#b8860b",
            secondary: "#e3b341",
            caption:   "#fff8e1"
        },
        Badge::Silver => BadgeGradient {
            primary:   "#57606a",
            secondary: "#8c959f",
            caption:   "#f6f8fa"
        },
        Badge::Bronze => BadgeGradient {
            primary:   "#8a4b08",
            secondary: "#bc6c25",
            caption:   "#fdebd3"
        }
    }
}

#[derive(Serialize)]
struct BadgeManifest<'a> {
    analysis_id:  &'a str,
    repository:   String,
    repo_url:     &'a str,
    score:        u32,
    rating:       Rating,
    badge:        Badge,
    #[serde(skip_serializing_if = "Option::is_none")]
    analyzed_at:  Option<String>,
    svg_artifact: String
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;
    use crate::{repo_id::RepoId, store::Completion};

    fn completed(total: u32) -> AnalysisRecord {
        let repo = RepoId::parse("octocat/Hello-World").expect("valid id");
        let mut record = AnalysisRecord::pending(&repo, "https://github.com/octocat/Hello-World");
        record
            .complete(&Completion {
                score:   CompositeScore::from_total(total),
                summary: "Solid foundation.".to_owned(),
                roadmap: Vec::new()
            })
            .expect("pending record completes");
        record
    }

    #[test]
    fn writes_svg_and_manifest_for_completed_analysis() {
        let record = completed(82);
        let directory = tempdir().expect("failed to create temp dir");
        let output_dir = directory.path().join("badges");

        let assets = generate_badge_assets(&record, &output_dir).expect("badge generation succeeds");

        assert_eq!(assets.svg_path, output_dir.join("octocat-hello-world.svg"));
        let svg = fs::read_to_string(&assets.svg_path).expect("svg is readable");
        assert!(svg.contains("octocat/Hello-World"));
        assert!(svg.contains("82 / 100"));
        assert!(svg.contains("Advanced · Gold"));
        assert!(svg.contains("#e3b341"));

        let manifest = fs::read_to_string(&assets.manifest_path).expect("manifest is readable");
        let value: Value = serde_json::from_str(&manifest).expect("manifest is valid JSON");
        assert_eq!(value["repository"], "octocat/Hello-World");
        assert_eq!(value["score"], 82);
        assert_eq!(value["rating"], "Advanced");
        assert_eq!(value["badge"], "Gold");
        assert!(value["analyzed_at"].as_str().is_some());
    }

    #[test]
    fn pending_analysis_has_nothing_to_render() {
        let repo = RepoId::parse("octocat/demo").expect("valid id");
        let record = AnalysisRecord::pending(&repo, "octocat/demo");
        let directory = tempdir().expect("failed to create temp dir");

        let error = generate_badge_assets(&record, directory.path()).expect_err("pending record");
        assert!(matches!(error, Error::Validation { .. }));
        assert!(fs::read_dir(directory.path()).expect("readable dir").next().is_none());
    }

    #[test]
    fn directory_errors_carry_the_path() {
        let record = completed(30);
        let directory = tempdir().expect("failed to create temp dir");
        let file_path = directory.path().join("blocked");
        File::create(&file_path).expect("failed to create placeholder file");

        match generate_badge_assets(&record, &file_path).expect_err("expected io failure") {
            Error::BadgeIo {
                path, ..
            } => assert_eq!(path, file_path),
            other => panic!("unexpected error variant: {other:?}")
        }
    }

    #[test]
    fn tiers_have_distinct_gradients() {
        let gold = badge_background(Badge::Gold).primary;
        let silver = badge_background(Badge::Silver).primary;
        let bronze = badge_background(Badge::Bronze).primary;
        assert_ne!(gold, silver);
        assert_ne!(silver, bronze);
        assert_ne!(gold, bronze);
    }

    #[test]
    fn svg_escapes_repository_names() {
        let mut record = completed(55);
        record.owner = "R&D".to_owned();
        let score = record.composite().expect("completed record has a score");
        let svg = build_svg_content(&record, &score);
        assert!(svg.contains("R&amp;D/Hello-World"));
        assert!(svg.contains("Intermediate · Silver"));
    }

    #[test]
    fn slug_is_lowercase_and_path_safe() {
        let mut record = completed(10);
        record.owner = "Some Org".to_owned();
        assert_eq!(badge_slug(&record), "some-org-hello-world");
    }

    #[test]
    fn escape_xml_borrows_clean_input() {
        assert!(matches!(escape_xml("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_xml("&<>\"'"), "&amp;&lt;&gt;&quot;&apos;");
    }
}
