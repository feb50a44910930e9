//! Studio concierge - a scripted chat assistant for a voice-over studio
//!
//! The conversation is a pure state machine over a fixed step graph. A
//! single runtime task applies events, persists the session and drives
//! the typewriter animation on whatever surface embeds the widget.

pub mod briefing;
pub mod calculator;
pub mod config;
pub mod contact;
pub mod conversation;
pub mod graph;
pub mod persistence;
pub mod render;
pub mod runtime;
pub mod terminal;
