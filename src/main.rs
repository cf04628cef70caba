//! LingoLink terminal front-end.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Record one clip — Enter stops early, the clip ceiling stops otherwise.
//! 4. Relay the clip to the translation service.
//! 5. Render the result: recognized text, translation, and (when the service
//!    synthesized speech) the resolved audio location.
//!
//! Every failure kind renders its own status line; none exits the process
//! with an unstructured fault.

use lingolink::capture::{CaptureSession, MicrophoneBackend};
use lingolink::config::AppConfig;
use lingolink::relay::{HttpRelayClient, Relay};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("LingoLink client starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Capture
    let mut session = CaptureSession::new(MicrophoneBackend::new())
        .with_max_clip(config.capture.max_clip());
    session.set_target_lang(config.target_lang);

    println!(
        "Listening (up to {} s, translating to {}) — press Enter to stop.",
        config.capture.max_clip_secs,
        config.target_lang.label()
    );

    // Enter on stdin plays the popup's stop button.
    let (stop_tx, stop_rx) = mpsc::channel(1);
    std::thread::Builder::new()
        .name("stdin-stop".into())
        .spawn(move || {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_ok() {
                let _ = stop_tx.blocking_send(());
            }
        })
        .expect("failed to spawn stdin thread");

    let payload = match session.record(stop_rx).await {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Recording failed: {e}");
            std::process::exit(1);
        }
    };

    println!("Processing {} byte clip...", payload.bytes().len());

    // 4. Relay
    let client = HttpRelayClient::from_config(&config.relay);
    match client.send(payload).await {
        Ok(translation) => {
            println!("Detected:   {}", translation.detected_display());
            println!("Translated: {}", translation.translated_text);
            if let Some(audio_url) = translation.resolve_audio_url(client.base_url()) {
                println!("Spoken:     {audio_url}");
            }
            println!("Done.");
        }
        Err(e) => {
            // Each RelayError kind carries its own message, so the status
            // line stays distinguishable per failure kind.
            eprintln!("Could not process the clip: {e}");
            std::process::exit(1);
        }
    }
}
