// ABOUTME: Per-turn result accumulator for the message-processing pipeline
// ABOUTME: Collects reply text, side messages, action log, and usage metrics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Result Accumulator
//!
//! [`ProcessMessageResultBuilder`] is a mutable builder owned solely by the
//! in-flight request's call stack; it is never shared across requests and
//! needs no synchronization. The built [`ProcessMessageResult`] is immutable
//! once returned. Usage metrics are appended the moment each external call
//! returns so that partial spend survives a failed turn.

use super::actions::{Stage1Output, Stage2Output};
use crate::llm::UsageMetric;
use serde::{Deserialize, Serialize};

/// Debug intermediates: the raw outputs of the two LLM stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intermediates {
    /// Stage-1 extraction output, if that stage ran
    pub stage1_output: Option<Stage1Output>,
    /// Stage-2 narration output, if that stage ran
    pub stage2_output: Option<Stage2Output>,
}

/// Total estimated cost in one currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostTotal {
    /// Summed cost
    pub value: f64,
    /// ISO currency code
    pub currency: String,
}

/// The per-turn output of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessMessageResult {
    /// True when the turn failed and `message` is the fixed apology
    pub is_error: bool,
    /// Final reply text
    pub message: String,
    /// Extra messages delivered alongside the reply (e.g. progress updates)
    pub additional_messages: Vec<String>,
    /// Raw stage outputs for debugging
    pub intermediates: Intermediates,
    /// Human-readable log of actions taken this turn
    pub actions_taken: Vec<String>,
    /// One usage record per external LLM call made this turn
    pub usage_metrics: Vec<UsageMetric>,
}

impl ProcessMessageResult {
    /// Aggregate the usage metrics' cost estimates by currency
    #[must_use]
    pub fn total_cost_by_currency(&self) -> Vec<CostTotal> {
        let mut totals: Vec<CostTotal> = Vec::new();
        for metric in &self.usage_metrics {
            match totals
                .iter_mut()
                .find(|t| t.currency == metric.cost.currency)
            {
                Some(total) => total.value += metric.cost.total,
                None => totals.push(CostTotal {
                    value: metric.cost.total,
                    currency: metric.cost.currency.clone(),
                }),
            }
        }
        totals
    }
}

/// Mutable accumulator for one turn
#[derive(Debug)]
pub struct ProcessMessageResultBuilder {
    result: ProcessMessageResult,
}

impl Default for ProcessMessageResultBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMessageResultBuilder {
    /// Start an empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self {
            result: ProcessMessageResult {
                is_error: false,
                message: String::new(),
                additional_messages: Vec::new(),
                intermediates: Intermediates::default(),
                actions_taken: Vec::new(),
                usage_metrics: Vec::new(),
            },
        }
    }

    /// Mark the turn as failed
    pub fn set_is_error(&mut self, is_error: bool) -> &mut Self {
        self.result.is_error = is_error;
        self
    }

    /// Set the final reply text
    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.result.message = message.into();
        self
    }

    /// Append a side message shown alongside the reply
    pub fn add_additional_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.result.additional_messages.push(message.into());
        self
    }

    /// Record the stage-1 output intermediate
    pub fn set_stage1_output(&mut self, output: Stage1Output) -> &mut Self {
        self.result.intermediates.stage1_output = Some(output);
        self
    }

    /// Record the stage-2 output intermediate
    pub fn set_stage2_output(&mut self, output: Stage2Output) -> &mut Self {
        self.result.intermediates.stage2_output = Some(output);
        self
    }

    /// Append to the human-readable action log
    pub fn add_action_taken(&mut self, action: impl Into<String>) -> &mut Self {
        self.result.actions_taken.push(action.into());
        self
    }

    /// Append a usage record for an external call
    pub fn add_usage_metric(&mut self, metric: UsageMetric) -> &mut Self {
        self.result.usage_metrics.push(metric);
        self
    }

    /// Current action log, for feeding stage-2 narration
    #[must_use]
    pub fn actions_taken(&self) -> &[String] {
        &self.result.actions_taken
    }

    /// Finish the turn; the result is immutable from here on
    #[must_use]
    pub fn build(self) -> ProcessMessageResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CostEstimate, TokenUsage};

    fn metric(title: &str, currency: &str, total: f64) -> UsageMetric {
        UsageMetric {
            title: title.to_owned(),
            provider: "openai".to_owned(),
            tokens: TokenUsage::default(),
            cost: CostEstimate {
                currency: currency.to_owned(),
                input: 0.0,
                output: 0.0,
                total,
            },
        }
    }

    #[test]
    fn test_builder_accumulates_in_order() {
        let mut builder = ProcessMessageResultBuilder::new();
        builder.add_action_taken("first");
        builder.add_action_taken("second");
        builder.set_message("done");
        let result = builder.build();
        assert_eq!(result.actions_taken, vec!["first", "second"]);
        assert_eq!(result.message, "done");
        assert!(!result.is_error);
    }

    #[test]
    fn test_cost_totals_grouped_by_currency() {
        let mut builder = ProcessMessageResultBuilder::new();
        builder.add_usage_metric(metric("Stage 1 Usage", "USD", 0.002));
        builder.add_usage_metric(metric("Stage 2 Usage", "USD", 0.001));
        builder.add_usage_metric(metric("Other", "EUR", 0.005));
        let totals = builder.build().total_cost_by_currency();
        assert_eq!(totals.len(), 2);
        let usd = totals.iter().find(|t| t.currency == "USD").unwrap();
        assert!((usd.value - 0.003).abs() < 1e-12);
    }
}
