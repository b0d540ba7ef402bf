//! Interactive first-run setup wizard (`emocare setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{
    ApiKeysFileConfig, EmoCareConfigFile, LlmFileConfig, ServerFileConfig, VoiceFileConfig,
    config_file_path, load_config_file, write_config_file,
};
use crate::config::{LlmConfig, VoiceConfig};

const MODELS: &[&str] = &[
    "llama-3.3-70b-versatile",
    "llama-3.1-8b-instant",
    "openai/gpt-oss-120b",
];

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("EmoCare Setup\n");

    // Load existing config if present
    let existing = load_config_file();
    let config_path =
        config_file_path().unwrap_or_else(|| PathBuf::from("~/.config/emocare/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Groq key
    let groq = prompt_key("Groq API key (GROQ_API_KEY)", existing.api_keys.groq.as_deref())?;

    // 2. Model
    let current_model = existing
        .llm
        .model
        .clone()
        .unwrap_or_else(|| LlmConfig::default().model);
    let mut model_labels: Vec<&str> = MODELS.to_vec();
    if !MODELS.contains(&current_model.as_str()) {
        model_labels.push(&current_model);
    }
    let default_model = model_labels
        .iter()
        .position(|&m| m == current_model)
        .unwrap_or(0);

    let model_idx = Select::new()
        .with_prompt("Select a chat model")
        .items(&model_labels)
        .default(default_model)
        .interact()?;
    let model = model_labels[model_idx].to_string();

    let stream = Confirm::new()
        .with_prompt("Stream replies from the model?")
        .default(existing.llm.stream.unwrap_or(false))
        .interact()?;

    // 3. Voice (optional)
    let enable_voice = Confirm::new()
        .with_prompt("Enable voice (ElevenLabs STT/TTS)?")
        .default(existing.voice.enabled.unwrap_or(true))
        .interact()?;

    let (voice, elevenlabs) = if enable_voice {
        let key = prompt_key(
            "ElevenLabs API key (ELEVENLABS_API_KEY)",
            existing.api_keys.elevenlabs.as_deref(),
        )?;

        let defaults = VoiceConfig::default();
        let tts_voice: String = Input::new()
            .with_prompt("TTS voice id")
            .default(existing.voice.tts_voice.clone().unwrap_or(defaults.tts_voice))
            .interact_text()?;

        let voice = VoiceFileConfig {
            enabled: Some(true),
            tts_voice: Some(tts_voice),
            ..existing.voice
        };
        (voice, key)
    } else {
        let voice = VoiceFileConfig {
            enabled: Some(false),
            ..existing.voice
        };
        (voice, existing.api_keys.elevenlabs)
    };

    // 4. Port
    let port: u16 = Input::new()
        .with_prompt("API server port")
        .default(existing.server.port.unwrap_or(18_800))
        .interact_text()?;

    // 5. Build and write config
    let config_file = EmoCareConfigFile {
        llm: LlmFileConfig {
            model: Some(model),
            stream: Some(stream),
            ..existing.llm
        },
        voice,
        api_keys: ApiKeysFileConfig { groq, elevenlabs },
        server: ServerFileConfig {
            port: Some(port),
            ..existing.server
        },
        policy: existing.policy,
    };

    write_config_file(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());
    println!("\nSetup complete! Run `emocare serve -v` or `emocare chat` to start.");

    Ok(())
}

/// Ask for a secret, keeping the current value when left blank
fn prompt_key(label: &str, current: Option<&str>) -> anyhow::Result<Option<String>> {
    let prompt = match current.map(mask) {
        Some(masked) => format!("{label} (current: {masked}, leave blank to keep)"),
        None => label.to_string(),
    };

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok(if input.is_empty() {
        current.map(str::to_string)
    } else {
        Some(input.to_string())
    })
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}
