//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::cli::{SamplingArgs, API_KEY_ENV_VAR};
use crate::core::app::{App, AppInitConfig, SubmitRejection};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::params::{Parameter, ParameterError, SamplingSettings};

/// Apply CLI overrides on top of `settings`. Out-of-range values are
/// rejected rather than clamped.
pub fn apply_sampling_overrides(
    settings: &mut SamplingSettings,
    overrides: &SamplingArgs,
) -> Result<(), ParameterError> {
    let requested = [
        (Parameter::MaxTokens, overrides.max_tokens.map(f64::from)),
        (Parameter::Temperature, overrides.temperature),
        (Parameter::TopP, overrides.top_p),
        (Parameter::TopK, overrides.top_k.map(f64::from)),
        (Parameter::FrequencyPenalty, overrides.frequency_penalty),
    ];

    for (parameter, value) in requested {
        let Some(value) = value else {
            continue;
        };
        let spec = parameter.spec();
        if !(spec.min..=spec.max).contains(&value) {
            return Err(ParameterError { parameter, value });
        }
        settings.set(parameter, value);
    }
    Ok(())
}

pub async fn run_say(
    init: AppInitConfig,
    prompt: Vec<String>,
    preset: Option<String>,
    sampling: SamplingArgs,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: multiplyr say <prompt>".into());
    }

    let api_key = init.api_key.clone().unwrap_or_default();
    let mut app = App::new(init)?;
    app.session.set_api_key(&api_key);
    apply_sampling_overrides(&mut app.session.settings, &sampling)?;
    if let Some(preset) = preset {
        app.session.presets.set_active(&preset)?;
    }

    let params = match app.conversation().submit(prompt) {
        Ok(params) => params,
        Err(SubmitRejection::MissingApiKey) => {
            return Err(format!("No API key: set {API_KEY_ENV_VAR} to use 'say'.").into());
        }
        Err(rejection) => return Err(format!("Prompt not sent: {rejection:?}").into()),
    };

    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(params);

    let mut stdout = io::stdout();
    while let Some((message, stream_id)) = rx.recv().await {
        match message {
            StreamMessage::Chunk(content) => {
                app.conversation().append_fragment(stream_id, &content);
                write!(stdout, "{content}")?;
                stdout.flush()?;
            }
            StreamMessage::Error(err) => {
                writeln!(stdout)?;
                app.conversation().fail(stream_id, err.clone());
                return Err(err.into());
            }
            StreamMessage::End => {
                app.conversation().complete(stream_id);
                writeln!(stdout)?;
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_values() {
        let mut settings = SamplingSettings::default();
        let overrides = SamplingArgs {
            temperature: Some(0.2),
            top_k: Some(10),
            ..SamplingArgs::default()
        };
        apply_sampling_overrides(&mut settings, &overrides).expect("valid overrides");
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.top_k, 10);
        assert_eq!(settings.max_tokens, 512);
        assert_eq!(settings.top_p, 0.7);
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let mut settings = SamplingSettings::default();
        let overrides = SamplingArgs {
            max_tokens: Some(8000),
            ..SamplingArgs::default()
        };
        let err = apply_sampling_overrides(&mut settings, &overrides).expect_err("rejected");
        assert_eq!(err.parameter, Parameter::MaxTokens);
        assert_eq!(settings.max_tokens, 512);
    }

    #[test]
    fn negative_frequency_penalty_is_accepted() {
        let mut settings = SamplingSettings::default();
        let overrides = SamplingArgs {
            frequency_penalty: Some(-2.0),
            ..SamplingArgs::default()
        };
        apply_sampling_overrides(&mut settings, &overrides).expect("in range");
        assert_eq!(settings.frequency_penalty, -2.0);
    }
}
