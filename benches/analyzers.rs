// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use repograde::{
    analyzers::{Analyzer, AnalyzerRegistry, DocumentationAnalyzer, SecurityAnalyzer, TestingAnalyzer},
    score::aggregate,
    snapshot::{BranchInfo, CommitInfo, FileEntry, PullRequestStats, Readme, RepoSnapshot},
};

const EXTENSIONS: [&str; 6] = ["rs", "ts", "py", "go", "java", "md"];

fn synthetic_snapshot(file_count: usize,) -> RepoSnapshot
{
    let mut files: Vec<FileEntry,> = (0..file_count)
        .map(|i| {
            let extension = EXTENSIONS[i % EXTENSIONS.len()];
            let directory = match i % 4 {
                0 => "src",
                1 => "src/core",
                2 => "tests",
                _ => "docs",
            };
            FileEntry::blob(format!("{directory}/module_{i}.{extension}"), 512 + (i as u64 % 40) * 1_024,)
        },)
        .collect();
    files.extend(
        ["README.md", "LICENSE", ".gitignore", "Cargo.toml", "Dockerfile", ".github/workflows/ci.yml"]
            .into_iter()
            .map(|path| FileEntry::blob(path, 800,),),
    );

    let commits = (0..200)
        .map(|i| CommitInfo {
            message: if i % 3 == 0 { format!("feat: change {i}") } else { format!("update {i}") },
            author:  Some("octocat".to_owned(),),
            date:    None,
        },)
        .collect();

    RepoSnapshot {
        files,
        readme: Some(Readme {
            content: "# Bench\n\n## Installation\n\n## Usage\n\n## License\n".repeat(20,),
            size:    1_200,
        },),
        commits: Some(commits,),
        branches: vec![BranchInfo {
            name: "main".to_owned(), protected: true,
        }],
        pull_requests: Some(PullRequestStats {
            total: 30, open: 4, closed: 26, merged: 22,
        },),
        ..RepoSnapshot::default()
    }
}

fn benchmark_full_battery(c: &mut Criterion,)
{
    let registry = AnalyzerRegistry::standard();
    let mut group = c.benchmark_group("analyzer_battery",);

    for file_count in [100, 1_000] {
        let snapshot = synthetic_snapshot(file_count,);
        group.bench_with_input(BenchmarkId::from_parameter(file_count,), &snapshot, |b, snapshot| {
            b.iter(|| {
                let results = registry.run(black_box(snapshot,),);
                black_box(aggregate(&results,),)
            },)
        },);
    }

    group.finish();
}

fn benchmark_heaviest_analyzers(c: &mut Criterion,)
{
    let snapshot = synthetic_snapshot(1_000,);

    c.bench_function("testing_analyzer_1000_files", |b| {
        b.iter(|| TestingAnalyzer.analyze(black_box(&snapshot,),),)
    },);

    c.bench_function("documentation_analyzer", |b| {
        b.iter(|| DocumentationAnalyzer.analyze(black_box(&snapshot,),),)
    },);

    c.bench_function("security_analyzer_1000_files", |b| {
        b.iter(|| SecurityAnalyzer.analyze(black_box(&snapshot,),),)
    },);
}

criterion_group!(benches, benchmark_full_battery, benchmark_heaviest_analyzers);
criterion_main!(benches);
