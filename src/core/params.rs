//! Sampling parameters and the slider metadata that bounds them.
//!
//! [`SamplingSettings`] is the live widget state; a fresh
//! [`GenerationParameters`] is derived from it for every request.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    MaxTokens,
    Temperature,
    TopP,
    TopK,
    FrequencyPenalty,
}

/// Bounds and granularity of one slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::MaxTokens,
        Parameter::Temperature,
        Parameter::TopP,
        Parameter::TopK,
        Parameter::FrequencyPenalty,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Parameter::MaxTokens => "Output Length",
            Parameter::Temperature => "Temperature",
            Parameter::TopP => "Top-P",
            Parameter::TopK => "Top-K",
            Parameter::FrequencyPenalty => "Frequency Penalty",
        }
    }

    pub fn spec(self) -> SliderSpec {
        match self {
            Parameter::MaxTokens => SliderSpec {
                min: 100.0,
                max: 4096.0,
                step: 32.0,
                default: 512.0,
            },
            Parameter::Temperature => SliderSpec {
                min: 0.0,
                max: 1.0,
                step: 0.05,
                default: 0.7,
            },
            Parameter::TopP => SliderSpec {
                min: 0.0,
                max: 1.0,
                step: 0.05,
                default: 0.7,
            },
            Parameter::TopK => SliderSpec {
                min: 1.0,
                max: 100.0,
                step: 1.0,
                default: 50.0,
            },
            Parameter::FrequencyPenalty => SliderSpec {
                min: -2.0,
                max: 2.0,
                step: 0.1,
                default: 0.0,
            },
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Parameter::MaxTokens | Parameter::TopK)
    }
}

/// A parameter value outside its slider range.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterError {
    pub parameter: Parameter,
    pub value: f64,
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = self.parameter.spec();
        write!(
            f,
            "{} must be between {} and {} (got {})",
            self.parameter.label(),
            spec.min,
            spec.max,
            self.value
        )
    }
}

impl std::error::Error for ParameterError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub frequency_penalty: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            max_tokens: Parameter::MaxTokens.spec().default as u32,
            temperature: Parameter::Temperature.spec().default,
            top_p: Parameter::TopP.spec().default,
            top_k: Parameter::TopK.spec().default as u32,
            frequency_penalty: Parameter::FrequencyPenalty.spec().default,
        }
    }
}

// Keeps stepped floats like 0.7 + 0.05 printable as 0.75.
fn tidy(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

impl SamplingSettings {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::MaxTokens => self.max_tokens as f64,
            Parameter::Temperature => self.temperature,
            Parameter::TopP => self.top_p,
            Parameter::TopK => self.top_k as f64,
            Parameter::FrequencyPenalty => self.frequency_penalty,
        }
    }

    /// Store `value`, clamped into the slider range.
    pub fn set(&mut self, parameter: Parameter, value: f64) {
        let spec = parameter.spec();
        let value = if value.is_nan() { spec.default } else { value };
        let clamped = tidy(value.clamp(spec.min, spec.max));
        match parameter {
            Parameter::MaxTokens => self.max_tokens = clamped.round() as u32,
            Parameter::Temperature => self.temperature = clamped,
            Parameter::TopP => self.top_p = clamped,
            Parameter::TopK => self.top_k = clamped.round() as u32,
            Parameter::FrequencyPenalty => self.frequency_penalty = clamped,
        }
    }

    /// Move a slider by `steps` increments, snapping to the step grid.
    pub fn adjust(&mut self, parameter: Parameter, steps: i32) {
        let spec = parameter.spec();
        let raw = self.get(parameter) + spec.step * steps as f64;
        let snapped = (raw / spec.step).round() * spec.step;
        self.set(parameter, snapped);
    }

    pub fn reset(&mut self, parameter: Parameter) {
        self.set(parameter, parameter.spec().default);
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        for parameter in Parameter::ALL {
            let spec = parameter.spec();
            let value = self.get(parameter);
            if !(spec.min..=spec.max).contains(&value) {
                return Err(ParameterError { parameter, value });
            }
        }
        Ok(())
    }

    /// Copy of `self` with every value forced into range.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        for parameter in Parameter::ALL {
            out.set(parameter, self.get(parameter));
        }
        out
    }

    pub fn display_value(&self, parameter: Parameter) -> String {
        if parameter.is_integer() {
            format!("{}", self.get(parameter) as i64)
        } else {
            format!("{:.2}", self.get(parameter))
        }
    }

    /// Slider position in `0.0..=1.0`.
    pub fn fraction(&self, parameter: Parameter) -> f64 {
        let spec = parameter.spec();
        ((self.get(parameter) - spec.min) / (spec.max - spec.min)).clamp(0.0, 1.0)
    }
}

/// Immutable parameter set for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub frequency_penalty: f64,
}

impl GenerationParameters {
    pub fn from_settings(model: impl Into<String>, settings: &SamplingSettings) -> Self {
        Self {
            model: model.into(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            frequency_penalty: settings.frequency_penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn defaults_match_slider_specs() {
        let settings = SamplingSettings::default();
        assert_eq!(settings.max_tokens, 512);
        assert!(approx(settings.temperature, 0.7));
        assert!(approx(settings.top_p, 0.7));
        assert_eq!(settings.top_k, 50);
        assert!(approx(settings.frequency_penalty, 0.0));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn adjust_steps_and_clamps_at_bounds() {
        let mut settings = SamplingSettings::default();
        settings.adjust(Parameter::Temperature, 1);
        assert!(approx(settings.temperature, 0.75));
        assert_eq!(settings.display_value(Parameter::Temperature), "0.75");

        settings.adjust(Parameter::Temperature, 100);
        assert!(approx(settings.temperature, 1.0));

        settings.adjust(Parameter::TopK, -1000);
        assert_eq!(settings.top_k, 1);

        settings.adjust(Parameter::MaxTokens, 1);
        assert_eq!(settings.max_tokens, 544);
        settings.adjust(Parameter::MaxTokens, -1000);
        assert_eq!(settings.max_tokens, 100);
    }

    #[test]
    fn frequency_penalty_accepts_negative_values() {
        let mut settings = SamplingSettings::default();
        settings.adjust(Parameter::FrequencyPenalty, -3);
        assert!(approx(settings.frequency_penalty, -0.3));
        settings.adjust(Parameter::FrequencyPenalty, -100);
        assert!(approx(settings.frequency_penalty, -2.0));
    }

    #[test]
    fn validate_reports_out_of_range_values() {
        let settings = SamplingSettings {
            top_p: 1.5,
            ..SamplingSettings::default()
        };
        let err = settings.validate().expect_err("top_p out of range");
        assert_eq!(err.parameter, Parameter::TopP);
        assert!(err.to_string().contains("Top-P"));

        let fixed = settings.clamped();
        assert!(approx(fixed.top_p, 1.0));
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn generation_parameters_reflect_current_settings() {
        let mut settings = SamplingSettings::default();
        settings.set(Parameter::TopK, 10.0);
        let params = GenerationParameters::from_settings("model-x", &settings);
        assert_eq!(params.model, "model-x");
        assert_eq!(params.top_k, 10);
        assert_eq!(params.max_tokens, 512);
    }
}
