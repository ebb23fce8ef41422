// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for loading sources and configuration.
//!
//! Problems inside journal text are never errors: they are reported as
//! [`Diagnostic`](crate::Diagnostic)s by the validator.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain the text of a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No file exists at the requested path
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read as UTF-8 text
    #[error("failed to read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
}

impl LoadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound(path) => path,
            Self::Unreadable { path, .. } => path,
        }
    }
}

/// Failure to load a configuration file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// The configuration is not valid TOML or has mistyped values
    #[error("invalid config: {0}")]
    Parse(String),
}
