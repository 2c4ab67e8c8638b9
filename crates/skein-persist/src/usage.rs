//! Pure reducers over message records.
//!
//! Soft-deleted records never contribute to any rollup.

use crate::models::{ContextSize, ThreadMessageRecord, ThreadUsage};

/// Model id handed to the pricing calculator when the caller gave none
pub const UNKNOWN_MODEL_ID: &str = "unknown";

/// Prices a completed model call.
pub trait PricingCalculator: Send + Sync {
    fn calculate_cost(&self, model_id: &str, input_tokens: u64, output_tokens: u64) -> f64;
}

impl<F> PricingCalculator for F
where
    F: Fn(&str, u64, u64) -> f64 + Send + Sync,
{
    fn calculate_cost(&self, model_id: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        self(model_id, input_tokens, output_tokens)
    }
}

/// Sums tokens, duration and cost over the non-deleted records.
pub fn aggregate_thread_usage(records: &[ThreadMessageRecord]) -> ThreadUsage {
    records
        .iter()
        .filter(|record| !record.is_deleted())
        .fold(ThreadUsage::default(), |acc, record| ThreadUsage {
            input_tokens: acc.input_tokens.saturating_add(record.usage.input_tokens),
            output_tokens: acc.output_tokens.saturating_add(record.usage.output_tokens),
            total_duration_ms: acc
                .total_duration_ms
                .saturating_add(record.usage.total_duration_ms),
            total_cost_usd: acc.total_cost_usd + record.usage.total_cost_usd,
        })
}

/// Token footprint of the non-deleted records.
pub fn aggregate_context_size(records: &[ThreadMessageRecord]) -> ContextSize {
    records
        .iter()
        .filter(|record| !record.is_deleted())
        .fold(ContextSize::default(), |acc, record| ContextSize {
            total_input_tokens: acc.total_input_tokens.saturating_add(record.usage.input_tokens),
            total_output_tokens: acc
                .total_output_tokens
                .saturating_add(record.usage.output_tokens),
        })
}

/// Explicit cost wins, then the calculator, then zero.
pub fn resolve_message_cost(
    explicit_cost: Option<f64>,
    model_id: Option<&str>,
    input_tokens: u64,
    output_tokens: u64,
    calculator: Option<&dyn PricingCalculator>,
) -> f64 {
    if let Some(cost) = explicit_cost {
        return cost;
    }

    match calculator {
        Some(calculator) => calculator.calculate_cost(
            model_id.unwrap_or(UNKNOWN_MODEL_ID),
            input_tokens,
            output_tokens,
        ),
        None => 0.0,
    }
}
