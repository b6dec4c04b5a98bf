//! Output formatting for command results.
//!
//! Every command result is rendered either as human readable text or as JSON.
//! The [`Formattable`] trait is implemented for anything that is both [`Display`] and [`Serialize`].
use std::fmt::Display;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Format of the output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Trait for types that can be formatted as text or JSON.
pub trait Formattable {
    fn format(&self, format: Format) -> Result<String>;
}

/// Text uses [`Display`], JSON uses [`Serialize`].
impl<T> Formattable for T
where
    T: Display + Serialize,
{
    fn format(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Text => self.to_string(),
            Format::Json => serde_json::to_string(self).context("serializing to json")?,
        })
    }
}
