//! Checks asset sizes under `public/` and `assets/` and alt text on feelings
//! items against `ops/policy.json`. Exits 1 when anything is over budget.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use contrastive_goat::lint::{LintPolicy, check_alts, lint_tree};

const POLICY_PATH: &str = "ops/policy.json";
const FEELINGS_PATH: &str = "data/feelings_items.json";
const ROOTS: &[&str] = &["public", "assets"];

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let policy = match LintPolicy::load(Path::new(POLICY_PATH)) {
        Ok(policy) => policy.assets,
        Err(err) => {
            tracing::error!(%err, "cannot load lint policy");
            return ExitCode::from(2);
        }
    };

    let mut violations = Vec::new();
    for root in ROOTS {
        let root = Path::new(root);
        if !root.exists() {
            continue;
        }
        match lint_tree(&policy, root) {
            Ok(found) => violations.extend(found),
            Err(err) => {
                tracing::error!(%err, "walk failed");
                return ExitCode::from(2);
            }
        }
    }
    if let Ok(text) = fs::read_to_string(FEELINGS_PATH) {
        violations.extend(check_alts(&policy, &text));
    }

    if violations.is_empty() {
        println!("Content lint passed.");
        ExitCode::SUCCESS
    } else {
        eprintln!("Content Lint Violations:");
        for v in &violations {
            eprintln!(" - {v}");
        }
        ExitCode::FAILURE
    }
}
