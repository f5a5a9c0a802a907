//! Path catalog for template sync
//!
//! The catalog lists project-relative files and directories that are
//! eligible for sync against the upstream template. The built-in lists are
//! defaults only: `--paths` replaces the catalog for a single run.

use crate::utils::normalize_rel_path;

/// Paths conventionally holding CMS/admin code and project configuration
pub const DEFAULT_SYNC_PATHS: &[&str] = &[
    // Config & meta
    ".github",
    ".vscode",
    ".eslintrc.json",
    "eslint.config.mjs",
    "tsconfig.json",
    "next.config.js",
    "next.config.mjs",
    "tailwind.config.js",
    "tailwind.config.ts",
    "postcss.config.js",
    "postcss.config.mjs",
    "components.json",
    "middleware.ts",
    ".env.example",
    "scripts",
    "package.json",
    "prisma",
    // Admin/app code
    "src/app/admin",
    "src/app/api",
    "src/components/admin",
    "src/components/ui",
    "src/lib",
    "src/hooks",
    "src/types",
    "src/middleware.ts",
];

/// Critical configuration files that always survive smart filtering
pub const ALWAYS_CHECK_PATHS: &[&str] = &[
    "package.json",
    "prisma/schema.prisma",
    "next.config.js",
    "next.config.mjs",
    "tsconfig.json",
    "middleware.ts",
    "src/middleware.ts",
    ".env.example",
];

/// Source directory swept for empty directories after cleanup
pub const SWEEP_ROOT: &str = "src";

/// Candidate paths for an upgrade run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCatalog {
    /// Files and directories eligible for sync
    pub paths: Vec<String>,
    /// Entries retained by smart filtering even without detected changes
    pub always_check: Vec<String>,
}

impl Default for PathCatalog {
    fn default() -> Self {
        Self {
            paths: DEFAULT_SYNC_PATHS.iter().map(|p| p.to_string()).collect(),
            always_check: ALWAYS_CHECK_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PathCatalog {
    /// Catalog with custom paths and the default always-check list
    ///
    /// Entries are normalized, empty entries dropped and duplicates removed
    /// while keeping the caller's order.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for p in paths {
            let p = normalize_rel_path(p.as_ref());
            if !p.is_empty() && !normalized.contains(&p) {
                normalized.push(p);
            }
        }

        Self {
            paths: normalized,
            ..Self::default()
        }
    }

    /// Whether a candidate is, or contains, an always-check entry
    pub fn is_always_check(&self, candidate: &str) -> bool {
        let prefix = format!("{}/", candidate);
        self.always_check
            .iter()
            .any(|entry| entry == candidate || entry.starts_with(&prefix))
    }
}
