// src/app.rs
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Context as _;
use eframe::egui;
use image::RgbImage;
use tracing::{error, info, warn};

use crate::arbiter::{ArbiterState, FrameInput, FrameReport, Phase};
use crate::command::Command;
use crate::geometry::{FrameObservation, FrameSize};
use crate::landmarker::HandLandmarker;
use crate::sink::{CommandDispatcher, DispatchStatus, PlaybackState};
use crate::ui::{self, Theme};
use crate::video::CameraSource;

/// Consecutive unreadable camera frames tolerated before giving up.
const MAX_CAMERA_FAILURES: u32 = 30;

/// Error that ended the session, read back by `main` after the window closes.
pub type FatalSlot = Rc<RefCell<Option<anyhow::Error>>>;

/// Exponentially smoothed frames-per-second.
#[derive(Debug, Default)]
pub struct FpsCounter {
    last: Option<Instant>,
    fps: f32,
}

impl FpsCounter {
    const SMOOTHING: f32 = 0.9;

    pub fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last {
            let dt = now.saturating_duration_since(last).as_secs_f32();
            if dt > 0.0 {
                let instant = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    instant
                } else {
                    self.fps * Self::SMOOTHING + instant * (1.0 - Self::SMOOTHING)
                };
            }
        }
        self.last = Some(now);
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// Whether the estimator runs on this frame.
pub fn is_processing_frame(frame_index: u64, process_every: u32) -> bool {
    frame_index % process_every.max(1) as u64 == 0
}

pub struct GestureRemoteApp {
    camera: CameraSource,
    landmarker: Box<dyn HandLandmarker>,
    arbiter: ArbiterState,
    dispatcher: CommandDispatcher,
    process_every: u32,

    frame_index: u64,
    frame_size: FrameSize,
    camera_failures: u32,
    last_observation: FrameObservation,
    last_report: FrameReport,
    now_playing: Option<PlaybackState>,
    last_command: Option<(Command, DispatchStatus)>,

    texture: Option<egui::TextureHandle>,
    fps: FpsCounter,
    theme: Theme,
    fatal: FatalSlot,
}

impl GestureRemoteApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        camera: CameraSource,
        landmarker: Box<dyn HandLandmarker>,
        dispatcher: CommandDispatcher,
        process_every: u32,
        fatal: FatalSlot,
    ) -> Self {
        cc.egui_ctx.set_visuals(ui::create_visuals());

        Self {
            camera,
            landmarker,
            arbiter: ArbiterState::new(),
            dispatcher,
            process_every,
            frame_index: 0,
            frame_size: FrameSize::new(640, 480),
            camera_failures: 0,
            last_observation: FrameObservation::empty(),
            last_report: FrameReport::idle(),
            now_playing: None,
            last_command: None,
            texture: None,
            fps: FpsCounter::default(),
            theme: Theme::default(),
            fatal,
        }
    }

    /// One camera frame through detection, arbitration and dispatch.
    fn process_frame(&mut self, ctx: &egui::Context) -> anyhow::Result<()> {
        let now = Instant::now();

        let frame = match self.camera.read_frame() {
            Ok(frame) => {
                self.camera_failures = 0;
                frame.into_rgb8()
            }
            Err(e) => {
                self.camera_failures += 1;
                if self.camera_failures >= MAX_CAMERA_FAILURES {
                    return Err(e.context("camera stopped delivering frames"));
                }
                warn!(error = %e, failures = self.camera_failures, "dropped camera frame");
                return Ok(());
            }
        };

        self.frame_index += 1;
        self.frame_size = FrameSize::new(frame.width(), frame.height());

        let fresh = is_processing_frame(self.frame_index, self.process_every) && self.detect(&frame)?;

        self.now_playing = self.dispatcher.playback(now).cloned();
        let report = self.arbiter.step(
            FrameInput {
                observation: fresh.then_some(&self.last_observation),
                frame: self.frame_size,
                playback: self.now_playing.as_ref(),
            },
            now,
        );

        if let Some(command) = report.command {
            let status = self.dispatcher.dispatch(command);
            self.last_command = Some((command, status));
        }
        self.last_report = report;

        self.fps.tick(now);
        self.upload_texture(ctx, &frame);
        Ok(())
    }

    /// Runs the estimator; `Ok(false)` when this frame yielded no observation.
    fn detect(&mut self, frame: &RgbImage) -> anyhow::Result<bool> {
        match self.landmarker.detect(frame) {
            Ok(observation) => {
                self.last_observation = observation;
                Ok(true)
            }
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "hand detection failed for frame");
                Ok(false)
            }
            Err(e) => Err(e).context("hand landmarker failed"),
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context, frame: &RgbImage) {
        let image = egui::ColorImage::from_rgb(
            [frame.width() as usize, frame.height() as usize],
            frame.as_raw(),
        );
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("camera", image, egui::TextureOptions::LINEAR));
            }
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Gesture Remote");
                ui.separator();

                let phase = self.last_report.phase;
                let color = match phase {
                    Phase::ScrubActive => self.theme.scrubbing,
                    Phase::GestureActive => self.theme.gesture,
                    Phase::Idle | Phase::Blocked => self.theme.muted,
                };
                ui.colored_label(color, phase.as_str());

                if !self.dispatcher.is_enabled() {
                    ui.separator();
                    ui.colored_label(self.theme.muted, "display only (no Spotify credentials)");
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label("press q to quit");
                    if let Some((command, status)) = self.last_command {
                        let color = match status {
                            DispatchStatus::Sent => self.theme.gesture,
                            DispatchStatus::Failed => self.theme.scrubbing,
                            DispatchStatus::Suppressed => self.theme.muted,
                        };
                        ui.separator();
                        ui.colored_label(color, format!("last: {}", command));
                    }
                });
            });
            ui.add_space(6.0);
        });
    }

    fn render_video_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(texture) = self.texture.as_ref() else {
                ui.centered_and_justified(|ui| {
                    ui.label("Waiting for camera...");
                });
                return;
            };

            let size = ui::fit_frame(ui.available_size(), self.frame_size);
            let response = ui.centered_and_justified(|ui| ui.image((texture.id(), size))).inner;
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            for hand in self.last_observation.hands() {
                ui::draw_hand(&painter, rect, self.frame_size, hand, &self.theme);
            }
            ui::draw_swipe_zone(&painter, rect, self.frame_size, &self.theme);
            ui::draw_status(&painter, rect, &self.last_report, self.fps.fps(), &self.theme);
            if let Some(state) = self.now_playing.as_ref() {
                ui::draw_now_playing(&painter, rect, state, &self.theme);
            }
        });
    }
}

impl eframe::App for GestureRemoteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Q)) {
            info!("quit requested");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        if let Err(e) = self.process_frame(ctx) {
            error!("stopping: {:#}", e);
            *self.fatal.borrow_mut() = Some(e);
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        self.render_header(ctx);
        self.render_video_panel(ctx);

        ctx.request_repaint();
    }
}
