// src/lib.rs
//! Webcam hand gestures turned into music playback commands.
//!
//! Each camera frame flows through [`landmarker`] (hand landmarks),
//! [`geometry`] (pixel features per hand) and [`arbiter`], which decides on at
//! most one [`command::Command`] per frame. [`sink`] hands that command to a
//! playback backend such as [`spotify`].

pub mod app;
pub mod arbiter;
pub mod command;
pub mod config;
pub mod error;
pub mod geometry;
pub mod landmarker;
pub mod mode;
pub mod sink;
pub mod spotify;
pub mod stability;
pub mod swipe;
pub mod ui;
pub mod video;
