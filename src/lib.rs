//! Emora - Phase-Orchestrated Emotion Chatbot Engine
//!
//! This crate implements the dialogue orchestration core of a multi-phase
//! conversational agent that guides young users through exploring, labeling,
//! and working with their emotions. Each turn's behavior is driven by an
//! external LLM completion service behind the [`ports::CompletionPort`]
//! abstraction; phase transitions are decided by per-phase summarizers that
//! classify the recent dialogue into typed decision records.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
