// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one export run: load dataset, optional advisor enrichment, compile, write CSV
// role: processing/orchestrator
// inputs: EffectiveConfig, boundary "today", an Advisor implementation
// outputs: CSV on stdout, or a file on disk (path printed to stdout)
// side_effects: Reads the dataset file; writes the export file; advisor network calls when enabled
// invariants:
// - The advisor runs before compile and only fills risk notes and missing segment summaries
// - Advisor fallbacks never replace the static risk label
// errors: Propagates IO and parse errors with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cli::EffectiveConfig;
use crate::enrichment::advisor::{Advisor, RiskAnalysis};
use crate::fields::{catalog, MeetingField, ReportDetailField, SupportField, TimesheetField};
use crate::model::{Dataset, GoalStatus};
use crate::params::{build_compile_request, export_file_name};
use crate::period::{Granularity, PeriodError};
use crate::render::{compile, CompileRequest, ExportMode};
use crate::util::{self, OutTarget};

pub fn load_dataset(path: &Path) -> Result<Dataset> {
  let bytes = std::fs::read(path).with_context(|| format!("reading dataset {}", path.display()))?;
  let data: Dataset =
    serde_json::from_slice(&bytes).with_context(|| format!("parsing dataset {}", path.display()))?;

  debug!(
    goals = data.goals.len(),
    support_projects = data.support_projects.len(),
    daily_reports = data.daily_reports.len(),
    "loaded dataset"
  );

  Ok(data)
}

/// Fill advisor-provided risk notes and missing daily-report summaries.
///
/// Summaries are only requested for report-detail exports, and only for reports inside the export window.
pub fn apply_advisor(
  req: &mut CompileRequest,
  data: &mut Dataset,
  advisor: &dyn Advisor,
  ai_risk: bool,
  ai_summaries: bool,
) -> Result<(), PeriodError> {
  if ai_risk {
    let fallback = RiskAnalysis::fallback();
    let filter = req.goal_filter.clone();
    for goal in data.goals.iter().filter(|g| g.status != GoalStatus::Stable && filter.matches(g)) {
      let analysis = advisor.analyze_goal_risk(goal);
      if analysis != fallback && !analysis.explanation.is_empty() {
        req.risk_notes.insert(goal.id.clone(), analysis.explanation);
      }
    }
    debug!(notes = req.risk_notes.len(), "advisor risk notes collected");
  }

  if ai_summaries && req.mode == ExportMode::ReportDetail {
    let window = req.report_window()?;
    let mut filled = 0usize;
    let segments = data
      .daily_reports
      .iter_mut()
      .filter(|r| window.contains(r.date))
      .flat_map(|r| r.segments.iter_mut());
    for segment in segments {
      if segment.summary.as_deref().is_some_and(|s| !s.is_empty()) || segment.content.trim().is_empty() {
        continue;
      }
      let summary = advisor.summarize_daily(&segment.content);
      if !summary.is_empty() {
        segment.summary = Some(summary);
        filled += 1;
      }
    }
    debug!(filled, window = %window, "advisor summaries filled");
  }

  Ok(())
}

/// JSON listing of the selectable fields for `mode` (support fields included for meetings).
pub fn list_fields_json(mode: ExportMode, granularity: Granularity) -> Result<String> {
  let listing = match mode {
    ExportMode::Meeting => serde_json::json!({
      "fields": catalog::<MeetingField>(granularity),
      "supportFields": catalog::<SupportField>(granularity),
    }),
    ExportMode::Timesheet => serde_json::json!({ "fields": catalog::<TimesheetField>(granularity) }),
    ExportMode::ReportDetail => serde_json::json!({ "fields": catalog::<ReportDetailField>(granularity) }),
  };

  Ok(serde_json::to_string_pretty(&listing)?)
}

/// Run one export; returns the written file path when not writing to stdout.
pub fn run(cfg: &EffectiveConfig, today: NaiveDate, advisor: &dyn Advisor) -> Result<Option<PathBuf>> {
  if cfg.list_fields {
    println!("{}", list_fields_json(cfg.mode, cfg.granularity)?);
    return Ok(None);
  }

  let data_path = cfg.data.as_deref().context("--data <dataset.json> is required")?;
  let mut data = load_dataset(Path::new(data_path))?;
  let mut req = build_compile_request(cfg, today)?;

  apply_advisor(&mut req, &mut data, advisor, cfg.ai_risk, cfg.ai_summaries)?;

  let doc = compile(&req, &data)?;
  let csv = doc.to_csv().context("rendering export csv")?;

  let range = req.report_window()?;
  let file_name = export_file_name(&cfg.prefix, cfg.mode, cfg.granularity, today, range);

  match util::resolve_out_target(&cfg.out, &file_name) {
    OutTarget::Stdout => {
      let stdout = std::io::stdout();
      let mut lock = stdout.lock();
      lock.write_all(csv.as_bytes()).context("writing export to stdout")?;
      lock.flush()?;
      Ok(None)
    }
    OutTarget::File(path) => {
      util::ensure_parent(&path)?;
      std::fs::write(&path, csv.as_bytes()).with_context(|| format!("writing {}", path.display()))?;
      info!(path = %path.display(), bytes = csv.len(), "wrote export");
      println!("{}", path.display());
      Ok(Some(path))
    }
  }
}
