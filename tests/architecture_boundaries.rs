use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

fn violations(dir: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join(dir);
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for needle in forbidden {
            if content.contains(needle) {
                violations.push(format!(
                    "{} imports forbidden dependency `{}`",
                    rel(&file),
                    needle
                ));
            }
        }
    }
    violations
}

#[test]
fn plot_module_is_pure() {
    let violations = violations(
        "src/plot",
        &["ratatui", "crossterm", "sysinfo", "crate::ui", "crate::system"],
    );

    assert!(
        violations.is_empty(),
        "Plot layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn session_store_does_not_touch_the_terminal_or_probe() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/session.rs");
    let content = fs::read_to_string(&root).unwrap_or_default();
    let violations: Vec<&str> = ["ratatui", "crossterm", "sysinfo", "crate::sampler"]
        .into_iter()
        .filter(|needle| content.contains(needle))
        .collect();

    assert!(
        violations.is_empty(),
        "src/session.rs imports forbidden dependencies: {violations:?}"
    );
}

#[test]
fn sampler_only_reaches_processes_through_the_probe() {
    let violations = violations("src/sampler", &["sysinfo", "ratatui", "crate::ui"]);

    assert!(
        violations.is_empty(),
        "Sampler layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn sysinfo_is_scoped_to_system_module() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        if !content.contains("sysinfo::") {
            continue;
        }

        let rel_path = rel(&file);
        if !rel_path.starts_with("src/system/") {
            violations.push(format!(
                "{} uses `sysinfo` outside the system boundary",
                rel_path
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Unexpected sysinfo usage:\n{}",
        violations.join("\n")
    );
}
