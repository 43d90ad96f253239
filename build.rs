use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Only the crate's own sources are linted.
const SCANNED_DIRECTORIES: [&str; 2] = ["src", "tests"];

// One source-hygiene rule: the line pattern, how a hit is described, and an
// optional filter that rejects false positives on a matched line.
struct LintRule {
    label: &'static str,
    pattern: &'static str,
    advice: &'static str,
    accept: fn(&str) -> bool,
}

// A custom "Sink" for the grep searcher. It collects all matching lines
// from a single file to build one error message per file and rule.
struct ViolationCollector<'r> {
    rule: &'r LintRule,
    violations: Vec<String>,
    file_path: PathBuf,
}

impl<'r> ViolationCollector<'r> {
    fn new(rule: &'r LintRule, file_path: &Path) -> Self {
        Self {
            rule,
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
        }
    }

    fn check_and_get_error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            self.rule.label,
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!("\n⚠️ {}\n", self.rule.advice));
        Some(error_msg)
    }
}

impl Sink for ViolationCollector<'_> {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if (self.rule.accept)(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }

        // Keep searching the rest of the file.
        Ok(true)
    }
}

fn is_word_byte(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'_')
}

fn contains_underscore_ident(text: &str) -> bool {
    let bytes = text.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b'_' {
            let prev_ok = i == 0 || !is_word_byte(bytes[i - 1]);
            let next_ok = i + 1 < bytes.len() && is_word_byte(bytes[i + 1]);
            if prev_ok && next_ok {
                return true;
            }
        }
    }
    false
}

// Even-indexed pieces of a split on '"' lie outside string literals.
fn outside_strings(line_text: &str) -> impl Iterator<Item = &str> {
    line_text.split('"').step_by(2)
}

fn is_pure_comment(line_text: &str) -> bool {
    line_text.trim_start().starts_with("//")
}

fn code_has_underscore_ident(line_text: &str) -> bool {
    !is_pure_comment(line_text) && outside_strings(line_text).any(contains_underscore_ident)
}

fn code_contains(line_text: &str, needle: &str) -> bool {
    !is_pure_comment(line_text) && outside_strings(line_text).any(|part| part.contains(needle))
}

fn any_line(line_text: &str) -> bool {
    !is_pure_comment(line_text)
}

fn debug_assert_in_code(line_text: &str) -> bool {
    code_contains(line_text, "debug_assert")
}

fn lint_rules() -> Vec<LintRule> {
    vec![
        LintRule {
            label: "underscore-prefixed variables",
            pattern: r"\b(_[a-zA-Z0-9_]+)\b",
            advice: "Underscore-prefixed names are not allowed. Use the variable or remove it.",
            accept: code_has_underscore_ident,
        },
        LintRule {
            label: "discarded `let _ = value;` bindings",
            pattern: r"let\s+_\s*=\s*[A-Za-z_][A-Za-z0-9_]*\s*;",
            advice: "Do not silence unused values with `let _ =`. Use them or delete them.",
            accept: any_line,
        },
        LintRule {
            label: "#[allow(dead_code)] attributes",
            pattern: r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
            advice: "Dead code must be removed, not allowed.",
            accept: any_line,
        },
        LintRule {
            label: "#[ignore] test attributes",
            pattern: r"#\s*\[\s*ignore\b",
            advice: "Tests must not be ignored. Fix or delete them.",
            accept: any_line,
        },
        LintRule {
            label: "debug_assert! invocations",
            pattern: r"\bdebug_assert(_eq|_ne)?!",
            advice: "Use a checked error path instead of debug-only assertions.",
            accept: debug_assert_in_code,
        },
    ]
}

fn rust_sources() -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in SCANNED_DIRECTORIES {
        if !Path::new(dir).exists() {
            continue;
        }
        println!("cargo:rerun-if-changed={dir}");
        for entry in WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        {
            files.push(entry.into_path());
        }
    }
    files
}

fn scan(rule: &LintRule, files: &[PathBuf]) -> Vec<String> {
    let mut all_violations = Vec::new();
    let matcher = match RegexMatcher::new_line_matcher(rule.pattern) {
        Ok(matcher) => matcher,
        Err(e) => {
            all_violations.push(format!("Error creating regex matcher for {}: {}", rule.label, e));
            return all_violations;
        }
    };
    let mut searcher = Searcher::new();
    for path in files {
        let mut collector = ViolationCollector::new(rule, path);
        if searcher.search_path(&matcher, path, &mut collector).is_err() {
            continue;
        }
        if let Some(error_message) = collector.check_and_get_error_message() {
            all_violations.push(error_message);
        }
    }
    all_violations
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if std::env::var("DOCS_RS").is_ok() {
        return;
    }

    let files = rust_sources();
    let mut all_violations = Vec::new();
    for rule in &lint_rules() {
        all_violations.extend(scan(rule, &files));
    }

    if !all_violations.is_empty() {
        eprintln!("\n❌ VALIDATION ERRORS");
        eprintln!("====================");

        let violation_count = all_violations.len();
        for violation in all_violations {
            eprintln!("{violation}");
            eprintln!("--------------------");
        }

        eprintln!(
            "\n⚠️ Found {} total code quality violations. Fix all issues before committing.",
            violation_count
        );
        std::process::exit(1);
    }
}
