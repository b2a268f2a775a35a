use std::sync::{Arc, LazyLock};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use tracing::error;

use crate::ai::{
    TextGenerator,
    prompts::{organization_prompt, skills_prompt},
};

use super::types::UNKNOWN_ORGANIZATION;

static ORGANIZATION_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s,]").expect("organization pattern is valid"));

// Anything from the first of these characters on is explanation, not a skill name.
static SKILL_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*:\-\d\n]").expect("skill pattern is valid"));

const MIN_SKILL_CHARS: usize = 4;

#[async_trait]
pub trait OrganizationInferrer: Send + Sync {
    /// Cleaned organization name; may be empty when the model gave nothing usable.
    async fn infer_organization(&self, text: &str) -> Result<String>;
}

#[async_trait]
pub trait SkillsInferrer: Send + Sync {
    async fn infer_skills(&self, text: &str) -> Result<Vec<String>>;
}

/// Field inference backed by a generative-language model.
#[derive(Clone)]
pub struct LlmFieldExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl LlmFieldExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl OrganizationInferrer for LlmFieldExtractor {
    async fn infer_organization(&self, text: &str) -> Result<String> {
        let raw = self.generator.generate(&organization_prompt(text)).await?;
        Ok(clean_organization(&raw))
    }
}

#[async_trait]
impl SkillsInferrer for LlmFieldExtractor {
    async fn infer_skills(&self, text: &str) -> Result<Vec<String>> {
        let raw = self.generator.generate(&skills_prompt(text)).await?;
        Ok(clean_skills(&raw))
    }
}

/// Keeps word characters, whitespace and commas.
pub fn clean_organization(raw: &str) -> String {
    ORGANIZATION_NOISE
        .replace_all(raw.trim(), "")
        .trim()
        .to_string()
}

pub fn clean_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|candidate| {
            let kept = match SKILL_NOISE.find(candidate) {
                Some(noise) => &candidate[..noise.start()],
                None => candidate,
            };
            let kept = kept.trim();
            (kept.chars().count() >= MIN_SKILL_CHARS).then(|| kept.to_string())
        })
        .collect()
}

/// Organization name, or `"Unknown"` when inference fails or comes back empty.
pub async fn organization_or_default(inferrer: &dyn OrganizationInferrer, text: &str) -> String {
    match inferrer.infer_organization(text).await {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => UNKNOWN_ORGANIZATION.to_string(),
        Err(err) => {
            error!(error = %format!("{err:#}"), "organization extraction failed");
            UNKNOWN_ORGANIZATION.to_string()
        }
    }
}

/// Inferred skills, or an empty list when inference fails.
pub async fn skills_or_default(inferrer: &dyn SkillsInferrer, text: &str) -> Vec<String> {
    match inferrer.infer_skills(text).await {
        Ok(skills) => skills,
        Err(err) => {
            error!(error = %format!("{err:#}"), "skills extraction failed");
            Vec::new()
        }
    }
}
