// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, output targets, the boundary clock, and man page rendering
// role: utilities/helpers
// inputs: Paths and --out strings; optional date override; clap CommandFactory
// outputs: Canonicalized paths, resolved output targets, today's date, man page text
// side_effects: ensure_parent creates directories
// invariants:
// - effective_today is the only place the system clock is read
// - "-" always means stdout; a trailing "/" or an existing directory means "write a conventional file name inside"
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::CommandFactory;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

/// Returns the effective "today" given an optional override.
///
/// Centralizes clock access so nothing below the CLI calls `Local::now()`.
pub fn effective_today(override_today: Option<NaiveDate>) -> NaiveDate {
  override_today.unwrap_or_else(|| Local::now().date_naive())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutTarget {
  Stdout,
  File(PathBuf),
}

/// Resolve `--out` into a concrete target, naming the file when `out` is directory-like.
pub fn resolve_out_target(out: &str, file_name: &str) -> OutTarget {
  if out == "-" {
    return OutTarget::Stdout;
  }

  let out_path = Path::new(out);
  let is_dir_like = out.ends_with('/') || out.ends_with(std::path::MAIN_SEPARATOR) || out_path.is_dir();

  if is_dir_like {
    OutTarget::File(out_path.join(file_name))
  } else {
    OutTarget::File(out_path.to_path_buf())
  }
}

pub fn ensure_parent(path: &Path) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  Ok(())
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
