// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Library surface: period math, bucketing, rollups, estimation, field catalogs, export compilation
// role: crate/root
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod bucket;
pub mod cli;
pub mod enrichment;
pub mod export;
pub mod ext;
pub mod fields;
pub mod model;
pub mod params;
pub mod period;
pub mod render;
pub mod summary;
pub mod util;
