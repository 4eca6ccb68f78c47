//! Model pricing
//!
//! Rates are USD per 1000 tokens, split into prompt and completion. Model
//! names are matched case-insensitively: an exact match first, then a prefix
//! match in either direction trying longer table keys first, then the
//! default rate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prompt and completion price per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl ModelRate {
    pub const fn new(prompt_per_1k: f64, completion_per_1k: f64) -> Self {
        Self {
            prompt_per_1k,
            completion_per_1k,
        }
    }

    /// Both prices finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.prompt_per_1k, self.completion_per_1k]
            .iter()
            .all(|p| p.is_finite() && *p >= 0.0)
    }

    /// Cost of one call at this rate
    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1000.0) * self.prompt_per_1k
            + (completion_tokens as f64 / 1000.0) * self.completion_per_1k
    }
}

/// Built-in rates.
const BUILTIN_RATES: &[(&str, ModelRate)] = &[
    ("gpt-4", ModelRate::new(0.03, 0.06)),
    ("gpt-4-32k", ModelRate::new(0.06, 0.12)),
    ("gpt-4-turbo", ModelRate::new(0.01, 0.03)),
    ("gpt-4o", ModelRate::new(0.005, 0.015)),
    ("gpt-4o-mini", ModelRate::new(0.00015, 0.0006)),
    ("gpt-3.5-turbo", ModelRate::new(0.0015, 0.002)),
];

/// Rate used when no table entry matches.
pub const DEFAULT_RATE: ModelRate = ModelRate::new(0.002, 0.002);

/// Model name to rate lookup.
#[derive(Debug, Clone)]
pub struct PricingTable {
    rates: BTreeMap<String, ModelRate>,
    default_rate: ModelRate,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            rates: BUILTIN_RATES
                .iter()
                .map(|(model, rate)| (model.to_string(), *rate))
                .collect(),
            default_rate: DEFAULT_RATE,
        }
    }
}

impl PricingTable {
    /// A table with no model entries, only a default rate
    pub fn empty(default_rate: ModelRate) -> Self {
        Self {
            rates: BTreeMap::new(),
            default_rate,
        }
    }

    /// Add or replace the rate for `model`
    pub fn insert(&mut self, model: &str, rate: ModelRate) {
        self.rates.insert(model.trim().to_lowercase(), rate);
    }

    pub fn set_default_rate(&mut self, rate: ModelRate) {
        self.default_rate = rate;
    }

    pub fn default_rate(&self) -> ModelRate {
        self.default_rate
    }

    /// Table entry for `model`, if any matches
    pub fn lookup(&self, model: &str) -> Option<(&str, ModelRate)> {
        let model = model.trim().to_lowercase();
        if model.is_empty() {
            return None;
        }
        if let Some((key, rate)) = self.rates.get_key_value(&model) {
            return Some((key.as_str(), *rate));
        }

        let mut keys: Vec<(&String, &ModelRate)> = self.rates.iter().collect();
        keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        keys.into_iter()
            .find(|(key, _)| model.starts_with(key.as_str()) || key.starts_with(model.as_str()))
            .map(|(key, rate)| (key.as_str(), *rate))
    }

    /// Rate for `model`, falling back to the default
    pub fn rate_for(&self, model: &str) -> ModelRate {
        self.lookup(model)
            .map(|(_, rate)| rate)
            .unwrap_or(self.default_rate)
    }

    /// USD cost of one call
    pub fn calculate_cost(&self, model: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        self.rate_for(model).cost(prompt_tokens, completion_tokens)
    }
}

/// USD cost of one call at the built-in rates
pub fn calculate_ai_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
    PricingTable::default().calculate_cost(model, prompt_tokens, completion_tokens)
}
