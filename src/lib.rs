//! TalentBot: scripted candidate screening conversation.

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod screening;
