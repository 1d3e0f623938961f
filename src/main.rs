// src/main.rs
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use eframe::egui;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gesture_remote::app::{FatalSlot, GestureRemoteApp};
use gesture_remote::config::{AppConfig, SpotifyCredentials};
use gesture_remote::landmarker::{self, MediaPipeBridge};
use gesture_remote::sink::CommandDispatcher;
use gesture_remote::spotify::SpotifyClient;
use gesture_remote::video::{self, CameraSource};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    match video::list_cameras() {
        Ok(cameras) => {
            for (index, name) in &cameras {
                info!(%index, %name, "camera available");
            }
        }
        Err(e) => warn!(error = %e, "failed to query cameras"),
    }

    let dispatcher = build_dispatcher();

    landmarker::ensure_model(&config.landmarker.model_path)
        .context("failed to fetch the hand landmarker model")?;
    let landmarker = MediaPipeBridge::spawn(&config.landmarker)
        .context("failed to start the hand landmarker")?;
    let camera = CameraSource::open(&config.camera)?;

    print_controls();

    let fatal: FatalSlot = Rc::new(RefCell::new(None));
    let app_fatal = fatal.clone();
    let process_every = config.process_every;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 800.0])
            .with_min_inner_size([640.0, 540.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Gesture Remote",
        options,
        Box::new(move |cc| {
            Box::new(GestureRemoteApp::new(
                cc,
                camera,
                Box::new(landmarker),
                dispatcher,
                process_every,
                app_fatal,
            ))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window error: {}", e))?;

    let failure = fatal.borrow_mut().take();
    match failure {
        Some(e) => Err(e),
        None => {
            info!("exiting");
            Ok(())
        }
    }
}

/// Spotify when credentials are configured, display-only otherwise.
fn build_dispatcher() -> CommandDispatcher {
    let credentials = match SpotifyCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!(error = %e, "Spotify control disabled, running display-only");
            return CommandDispatcher::display_only();
        }
    };

    match SpotifyClient::new(credentials) {
        Ok(client) => {
            info!("Spotify control enabled");
            CommandDispatcher::new(Box::new(client))
        }
        Err(e) => {
            warn!(error = %e, "could not create Spotify client, running display-only");
            CommandDispatcher::display_only()
        }
    }
}

fn print_controls() {
    println!("controls:");
    println!("  Swipe left:  previous track");
    println!("  Swipe right: next track");
    println!("  Two hands (4+ fingers + pinch): scrub track");
    println!("  1 finger:  play/pause");
    println!("  2 fingers: volume up");
    println!("  3 fingers: volume down");
    println!("  Press 'q' to quit\n");
}
