// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Static lookup tables shared by the analyzers.
//!
//! Matching semantics are defined by the consumers; most tables are matched
//! as substrings of repository paths.

/// Extensions counted as source code.
pub const CODE_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".ts", ".tsx", ".py", ".java", ".cpp", ".c", ".cs", ".rb", ".go", ".rs", ".php",
    ".swift", ".kt",
];

/// CI platform name and the path fragments that reveal it.
pub const CICD_PLATFORMS: &[(&str, &[&str],)] = &[
    ("GitHub Actions", &[".github/workflows", ".github/actions",],),
    ("GitLab CI", &[".gitlab-ci.yml",],),
    ("Travis CI", &[".travis.yml",],),
    ("CircleCI", &[".circleci/config.yml",],),
    ("Jenkins", &["Jenkinsfile",],),
    ("Azure Pipelines", &["azure-pipelines.yml",],),
    ("Bitbucket Pipelines", &["bitbucket-pipelines.yml",],),
];

/// Path fragments identifying a Dockerfile.
pub const DOCKERFILE_PATTERNS: &[&str] = &["Dockerfile", "dockerfile", ".dockerfile",];

/// Root-level compose file names.
pub const COMPOSE_FILES: &[&str] =
    &["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml",];

/// Path fragments of files that should never be committed.
pub const SENSITIVE_FILES: &[&str] =
    &[".env", "credentials.json", "secrets.yml", "private_key.pem", "id_rsa",];

/// Section names recognized in README headers.
pub const README_SECTIONS: &[&str] = &[
    "Installation",
    "Usage",
    "Features",
    "Documentation",
    "Contributing",
    "License",
    "Tests",
    "API",
    "Examples",
    "Requirements",
    "Setup",
    "Getting Started",
];

/// Configuration files rewarded by the structure analyzer.
pub const CONFIG_FILES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "webpack.config.js",
    "vite.config.js",
    ".eslintrc",
    ".prettierrc",
    "babel.config.js",
    "jest.config.js",
    "requirements.txt",
    "setup.py",
    "pom.xml",
    "build.gradle",
    "Makefile",
    ".gitignore",
    ".editorconfig",
];

/// Directory families that indicate separation of concerns.
pub const CONCERN_DIRECTORIES: &[(&str, &[&str],)] = &[
    ("components", &["components/",],),
    ("controllers", &["controllers/",],),
    ("models", &["models/",],),
    ("views", &["views/",],),
    ("services", &["services/",],),
    ("utils", &["utils/", "helpers/",],),
    ("routes", &["routes/", "api/",],),
    ("config", &["config/",],),
    ("assets", &["assets/", "static/",],),
];

/// Root manifest file name and the package manager it implies.
pub const PACKAGE_MANAGERS: &[(&str, &str,)] = &[
    ("package.json", "npm",),
    ("requirements.txt", "pip",),
    ("pom.xml", "maven",),
    ("build.gradle", "gradle",),
    ("Cargo.toml", "cargo",),
    ("go.mod", "go modules",),
];

/// Build-tool config fragment and the framework it implies.
///
/// Only consulted when a `package.json` is present.
pub const FRAMEWORK_CONFIGS: &[(&str, &str,)] = &[("next.config", "Next.js",), ("vite.config", "Vite",),];

/// Testing tool name and the lowercase path token that reveals it.
pub const TESTING_TOOLS: &[(&str, &str,)] = &[
    ("Mocha", "mocha",),
    ("Cypress", "cypress",),
    ("Playwright", "playwright",),
    ("Testing Library", "@testing-library",),
    ("PyTest", "pytest",),
    ("unittest", "unittest",),
    ("JUnit", "junit",),
    ("TestNG", "testng",),
    ("Mockito", "mockito",),
    ("NUnit", "nunit",),
    ("xUnit", "xunit",),
];

/// Directory fragments that mark a dedicated test directory.
pub const TEST_DIRECTORIES: &[&str] = &["/test/", "/tests/", "/__tests__/",];
