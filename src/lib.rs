//! Clipdeck - audio extraction, merging, trimming and splitting
//!
//! Drives ffmpeg and ffprobe from the command line. No media is decoded or
//! encoded in-process.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod probe;
pub mod queue;
pub mod timecode;
pub mod workflow;
