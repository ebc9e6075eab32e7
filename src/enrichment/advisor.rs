// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: AI advisory seam (goal risk analysis, daily-report one-line summaries) with HTTP, env-stub and null backends
// role: enrichment/advisor
// inputs: Goal records and daily-report text; env GEMINI_API_KEY, OKR_ADVISOR_MODEL, OKR_TEST_ADVISOR_*
// outputs: RiskAnalysis values and summary strings
// side_effects: Network calls to the Gemini REST endpoint when a key is configured
// invariants:
// - Never panic and never surface an error; every failure yields the fixed fallback value
// - Responses are accepted only when they validate against the declared JSON schema
// - Env-stub backend wins over HTTP when any OKR_TEST_ADVISOR_* variable is set
// errors: Logged at warn and swallowed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ext::serde_json::JsonFetch;
use crate::model::Goal;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const FALLBACK_EXPLANATION: &str = "暂时无法分析。";

const ENV_RISK_JSON: &str = "OKR_TEST_ADVISOR_RISK_JSON";
const ENV_RISKS_JSON: &str = "OKR_TEST_ADVISOR_RISKS_JSON";
const ENV_SUMMARY: &str = "OKR_TEST_ADVISOR_SUMMARY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
  #[default]
  #[serde(rename = "低")]
  Low,
  #[serde(rename = "中")]
  Medium,
  #[serde(rename = "高")]
  High,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
  pub level: RiskLevel,
  pub explanation: String,
  pub affected_goals: Vec<String>,
  pub suggested_actions: Vec<String>,
}

impl RiskAnalysis {
  /// Value used whenever the advisory service cannot answer.
  pub fn fallback() -> Self {
    Self { explanation: FALLBACK_EXPLANATION.to_string(), ..Self::default() }
  }
}

static RISK_SCHEMA: Lazy<Option<jsonschema::Validator>> = Lazy::new(|| {
  let schema = serde_json::json!({
    "type": "object",
    "properties": {
      "level": { "type": "string", "enum": ["低", "中", "高"] },
      "explanation": { "type": "string" },
      "affectedGoals": { "type": "array", "items": { "type": "string" } },
      "suggestedActions": { "type": "array", "items": { "type": "string" } }
    },
    "required": ["level", "explanation", "affectedGoals", "suggestedActions"]
  });
  jsonschema::validator_for(&schema).ok()
});

static SUMMARY_SCHEMA: Lazy<Option<jsonschema::Validator>> = Lazy::new(|| {
  let schema = serde_json::json!({ "type": "string", "minLength": 1 });
  jsonschema::validator_for(&schema).ok()
});

fn conforms(schema: &Lazy<Option<jsonschema::Validator>>, value: &Value) -> bool {
  Lazy::force(schema).as_ref().is_some_and(|v| v.is_valid(value))
}

/// Black-box advisory service.
///
/// Backends implement the raw calls; the provided methods validate and apply fallbacks.
pub trait Advisor {
  fn risk_json(&self, goal: &Goal) -> Option<Value>;
  fn summary_text(&self, content: &str) -> Option<String>;

  fn analyze_goal_risk(&self, goal: &Goal) -> RiskAnalysis {
    let Some(raw) = self.risk_json(goal) else {
      debug!(goal = %goal.id, "advisor returned no risk analysis; using fallback");
      return RiskAnalysis::fallback();
    };

    if !conforms(&RISK_SCHEMA, &raw) {
      warn!(goal = %goal.id, "advisor risk analysis failed schema validation; using fallback");
      return RiskAnalysis::fallback();
    }

    serde_json::from_value(raw).unwrap_or_else(|_| RiskAnalysis::fallback())
  }

  fn summarize_daily(&self, content: &str) -> String {
    let Some(raw) = self.summary_text(content) else {
      return String::new();
    };

    let text = raw.trim().trim_matches(|c: char| c == '"' || c == '“' || c == '”').trim().to_string();
    if !conforms(&SUMMARY_SCHEMA, &Value::String(text.clone())) {
      warn!("advisor summary was empty or invalid; using fallback");
      return String::new();
    }

    text
  }
}

fn risk_prompt(goal: &Goal) -> String {
  let actions = goal.action_items.iter().map(|a| a.text.as_str()).collect::<Vec<_>>().join("；");
  format!(
    "作为目标管理专家，请评估以下目标的执行风险。\n目标名称：{}\n当前进度：{}%\n健康状态：{}\n关键行动项：{}\n\
请使用中文返回 JSON 对象，字段为 level（低/中/高）、explanation、affectedGoals（字符串数组）、suggestedActions（字符串数组）。",
    goal.name,
    goal.progress,
    goal.status.label(),
    actions
  )
}

fn summary_prompt(content: &str) -> String {
  format!(
    "请根据以下日报内容生成一句 15 字以内的总结，只概括当日核心进展，不含明日计划。\n日报内容：\n{content}\n\
直接返回总结文本，不要附加解释或引号。"
  )
}

struct GeminiAdvisor {
  api_key: String,
  model: String,
  base_url: String,
  agent: ureq::Agent,
}

impl GeminiAdvisor {
  fn new(api_key: String, model: String) -> Self {
    Self::with_base_url(api_key, model, "https://generativelanguage.googleapis.com/v1beta".to_string())
  }

  fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
    let agent = ureq::AgentBuilder::new().timeout(Duration::from_secs(30)).build();
    Self { api_key, model, base_url, agent }
  }

  /// Request URL; the key travels in a header so transport errors never carry it.
  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }

  fn generate(&self, prompt: &str, json_response: bool) -> Option<String> {
    let url = self.endpoint();
    let mut body = serde_json::json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
    if json_response {
      body["generationConfig"] = serde_json::json!({ "responseMimeType": "application/json" });
    }

    let resp = self
      .agent
      .post(&url)
      .set("Content-Type", "application/json")
      .set("x-goog-api-key", &self.api_key)
      .send_json(body);

    match resp {
      Ok(r) => {
        let v = r.into_json::<Value>().ok()?;
        v.fetch("candidates.0.content.parts.0.text").to::<String>()
      }
      Err(e) => {
        warn!(model = %self.model, error = %e, "advisor request failed");
        None
      }
    }
  }
}

impl Advisor for GeminiAdvisor {
  fn risk_json(&self, goal: &Goal) -> Option<Value> {
    let text = self.generate(&risk_prompt(goal), true)?;
    serde_json::from_str::<Value>(&text).ok()
  }

  fn summary_text(&self, content: &str) -> Option<String> {
    self.generate(&summary_prompt(content), false)
  }
}

/// Canned responses from environment variables.
struct EnvAdvisor;

impl Advisor for EnvAdvisor {
  fn risk_json(&self, goal: &Goal) -> Option<Value> {
    if let Ok(map_s) = std::env::var(ENV_RISKS_JSON) {
      if let Ok(map_v) = serde_json::from_str::<Value>(&map_s) {
        if let Some(v) = map_v.get(&goal.id) {
          return Some(v.clone());
        }
      }
    }

    std::env::var(ENV_RISK_JSON).ok().and_then(|s| serde_json::from_str::<Value>(&s).ok())
  }

  fn summary_text(&self, _content: &str) -> Option<String> {
    std::env::var(ENV_SUMMARY).ok()
  }
}

struct NullAdvisor;

impl Advisor for NullAdvisor {
  fn risk_json(&self, _goal: &Goal) -> Option<Value> {
    None
  }

  fn summary_text(&self, _content: &str) -> Option<String> {
    None
  }
}

// Memoizes raw responses for the lifetime of one export run.
struct CachedAdvisor {
  inner: Box<dyn Advisor>,
  risks: RefCell<HashMap<String, Option<Value>>>,
  summaries: RefCell<HashMap<String, Option<String>>>,
}

impl CachedAdvisor {
  fn new(inner: Box<dyn Advisor>) -> Self {
    Self { inner, risks: RefCell::new(HashMap::new()), summaries: RefCell::new(HashMap::new()) }
  }
}

impl Advisor for CachedAdvisor {
  fn risk_json(&self, goal: &Goal) -> Option<Value> {
    if let Some(v) = self.risks.borrow().get(&goal.id).cloned() {
      return v;
    }
    let v = self.inner.risk_json(goal);
    self.risks.borrow_mut().insert(goal.id.clone(), v.clone());

    v
  }

  fn summary_text(&self, content: &str) -> Option<String> {
    if let Some(v) = self.summaries.borrow().get(content).cloned() {
      return v;
    }
    let v = self.inner.summary_text(content);
    self.summaries.borrow_mut().insert(content.to_string(), v.clone());

    v
  }
}

fn env_wants_stub() -> bool {
  [ENV_RISK_JSON, ENV_RISKS_JSON, ENV_SUMMARY].iter().any(|k| std::env::var(k).is_ok())
}

fn api_key() -> Option<String> {
  std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty())
}

fn model_name() -> String {
  std::env::var("OKR_ADVISOR_MODEL").ok().filter(|m| !m.trim().is_empty()).unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

/// Env stub when any test variable is set, else HTTP when a key is configured, else null.
pub fn make_default_advisor() -> Box<dyn Advisor> {
  let inner: Box<dyn Advisor> = if env_wants_stub() {
    debug!("advisor: env stub");
    Box::new(EnvAdvisor)
  } else if let Some(key) = api_key() {
    debug!(model = %model_name(), "advisor: gemini");
    Box::new(GeminiAdvisor::new(key, model_name()))
  } else {
    debug!("advisor: none configured");
    Box::new(NullAdvisor)
  };

  Box::new(CachedAdvisor::new(inner))
}

pub fn make_null_advisor() -> Box<dyn Advisor> {
  Box::new(NullAdvisor)
}

#[cfg(any(test, feature = "testutil"))]
pub fn make_env_advisor() -> Box<dyn Advisor> {
  Box::new(CachedAdvisor::new(Box::new(EnvAdvisor)))
}

#[cfg(any(test, feature = "testutil"))]
pub fn make_gemini_advisor(api_key: String, model: String, base_url: String) -> Box<dyn Advisor> {
  Box::new(GeminiAdvisor::with_base_url(api_key, model, base_url))
}
