// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dedup::DEFAULT_STATE_PATH;
use crate::ingest::build_query;
use crate::ingest::providers::twitter::DEFAULT_API_BASE;
use crate::relevance::FilterConfig;

pub const ENV_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const ENV_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_STATE_PATH: &str = "POSTED_JOBS_FILE";
pub const ENV_KEYWORDS_PATH: &str = "BOT_CONFIG_PATH";
pub const ENV_MAX_RESULTS: &str = "MAX_RESULTS";
pub const ENV_NOTIFY_DELAY_MS: &str = "NOTIFY_DELAY_MS";
pub const ENV_API_BASE: &str = "TWITTER_API_BASE";

pub const DEFAULT_MAX_RESULTS: u32 = 100;
pub const DEFAULT_NOTIFY_DELAY_MS: u64 = 1_000;

/// What to search for and how to filter it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeywordConfig {
    pub search_keywords: Vec<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub max_results: Option<u32>,
}

impl KeywordConfig {
    pub fn filter(&self) -> FilterConfig {
        FilterConfig {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }

    // Only the search terms are tidied; filter keywords are matched as written.
    fn cleaned(self) -> Self {
        Self {
            search_keywords: clean_list(self.search_keywords),
            ..self
        }
    }
}

impl Default for KeywordConfig {
    /// Nigerian / remote job-hunting lists the bot shipped with.
    fn default() -> Self {
        Self {
            search_keywords: to_strings(DEFAULT_SEARCH_KEYWORDS),
            include: to_strings(DEFAULT_INCLUDE),
            exclude: to_strings(DEFAULT_EXCLUDE),
            max_results: None,
        }
    }
}

/// Everything a run needs, resolved from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bearer_token: String,
    pub webhook_url: String,
    pub state_path: PathBuf,
    pub api_base: String,
    pub keywords: KeywordConfig,
    pub max_results: u32,
    pub notify_delay: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let bearer_token = required_env(ENV_BEARER_TOKEN)?;
        let webhook_url = required_env(ENV_WEBHOOK_URL)?;
        let keywords = load_keywords_default()?;
        // Fail at startup rather than on the first search call.
        build_query(&keywords.search_keywords).context("validating search_keywords")?;

        let max_results = match parse_env::<u32>(ENV_MAX_RESULTS)? {
            Some(v) => v,
            None => keywords.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        };
        let delay_ms = parse_env::<u64>(ENV_NOTIFY_DELAY_MS)?.unwrap_or(DEFAULT_NOTIFY_DELAY_MS);

        Ok(Self {
            bearer_token,
            webhook_url,
            state_path: std::env::var(ENV_STATE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_PATH)),
            api_base: std::env::var(ENV_API_BASE).unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            keywords,
            max_results,
            notify_delay: Duration::from_millis(delay_ms),
        })
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(anyhow!("{name} is not set")),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{name}={raw:?}: {e}")),
        Err(_) => Ok(None),
    }
}

/// Load keyword lists from an explicit path. TOML or JSON.
pub fn load_keywords_from(path: &Path) -> Result<KeywordConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading keyword config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_keywords(&content, ext.as_str())
        .with_context(|| format!("parsing keyword config {}", path.display()))
}

/// Load keyword lists using env var + fallbacks:
/// 1) $BOT_CONFIG_PATH
/// 2) config/bot.toml
/// 3) config/bot.json
/// 4) built-in defaults
pub fn load_keywords_default() -> Result<KeywordConfig> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            bail!("{ENV_KEYWORDS_PATH} points to non-existent path {}", pb.display());
        }
        return load_keywords_from(&pb);
    }
    for candidate in ["config/bot.toml", "config/bot.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_keywords_from(&p);
        }
    }
    tracing::info!(target: "config", "no keyword config file, using built-in lists");
    Ok(KeywordConfig::default())
}

fn parse_keywords(s: &str, hint_ext: &str) -> Result<KeywordConfig> {
    let parsed: KeywordConfig = match hint_ext {
        "toml" => toml::from_str(s)?,
        "json" => serde_json::from_str(s)?,
        _ => match toml::from_str(s) {
            Ok(v) => v,
            Err(_) => serde_json::from_str(s).map_err(|_| anyhow!("unsupported keyword config format"))?,
        },
    };
    Ok(parsed.cleaned())
}

// Trim, drop blanks and exact duplicates; order is kept (it is the query order).
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}

fn to_strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

// X recent search caps the combined query at 512 chars, so keep this list broad.
const DEFAULT_SEARCH_KEYWORDS: &[&str] = &[
    "#NigeriaJobs",
    "#TechJobsNigeria",
    "#LagosJobs",
    "#RemoteJobs",
    "#hiring",
    "#JobOpening",
    "#FintechJobs",
    "#DataScience",
    "#DevOps",
    "#ProductManager",
    "#UIUX",
    "#SalesJobs",
    "#Marketing",
    "#HealthcareJobs",
];

const DEFAULT_INCLUDE: &[&str] = &[
    // Tech & digital
    "AI", "ML", "machine learning", "artificial intelligence",
    "animation", "animator", "3D artist", "motion graphics",
    "cyber security", "security analyst", "penetration tester", "InfoSec",
    "game developer", "game designer", "unity", "unreal",
    "data scientist", "data analyst", "data engineer",
    "cloud", "AWS", "Azure", "GCP", "DevOps",
    "data visualization", "business intelligence", "BI",
    "product manager", "product management", "PM",
    "UI designer", "UX designer", "product designer",
    "DevOps engineer", "SRE", "infrastructure",
    "software developer", "software engineer", "programmer",
    "frontend", "backend", "full stack", "fullstack",
    "QA", "quality assurance", "test engineer", "SDET",
    "blockchain", "web3", "smart contract", "solidity",
    "IoT", "embedded systems", "firmware",
    "robotics", "automation engineer",
    // Business & sales
    "sales", "business development", "account manager",
    "customer service", "customer support", "client relations",
    "hospitality", "hotel", "tourism", "travel",
    "marketing", "digital marketing", "content marketing",
    "social media", "brand manager", "advertising",
    "NGO", "non profit", "nonprofit", "development sector",
    // Finance & accounting
    "banking", "finance", "financial analyst", "fintech",
    "accounting", "accountant", "auditor", "tax",
    "audit", "internal audit", "external audit",
    // Industry-specific
    "agriculture", "agribusiness", "farming", "agritech",
    "retail", "FMCG", "consumer goods",
    "logistics", "supply chain", "procurement", "operations",
    "climate", "sustainability", "ESG", "renewable energy",
    "policy", "public sector", "government", "civil service",
    "healthcare", "medical", "nursing", "pharmacy", "doctor",
    "care", "caregiver", "health worker",
    "education", "teacher", "instructor", "training",
    "EdTech", "learning",
    "construction", "civil engineer",
    "project manager", "site engineer",
    "manufacturing", "industrial", "production", "factory",
    "mining", "oil and gas", "petroleum", "geologist",
    "renewable", "solar", "wind energy", "clean energy",
    "real estate", "property", "facility management",
    // General
    "hiring", "job opening", "vacancy", "we are hiring",
    "nigeria", "lagos", "abuja", "port harcourt",
    "remote", "hybrid", "full-time", "permanent",
];

const DEFAULT_EXCLUDE: &[&str] = &["internship", "volunteer", "unpaid", "commission only"];
