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

//! Configuration bundle.
//!
//! Every option has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```
//! use hledger_lint::{AlignmentMode, Config};
//!
//! let config = Config::from_toml_str(
//!     "alignment = \"both\"\n[validations]\nordered_dates = false\n",
//! )
//! .unwrap();
//! assert_eq!(config.alignment, AlignmentMode::Both);
//! assert!(!config.validations.ordered_dates);
//! assert!(config.validations.accounts);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of structural slots in a posting line.
pub const SLOT_COUNT: usize = 9;

/// Which column targets the formatter aligns posting lines to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    /// Only the configured global columns.
    Global,
    /// Only the widest posting of each transaction.
    #[default]
    Transaction,
    /// Per-transaction widths floored by the global columns.
    Both,
}

/// Where a commodity declaration is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommodityScope {
    /// Only to amounts written in the declaring document.
    #[default]
    Document,
    /// To every document of the journal; the last declaration wins.
    Journal,
}

/// Toggles for the optional validation rules.
///
/// `payees`, `tags`, `recent_assertions` and `unique_leaf_names` are accepted
/// but have no rules behind them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Validations {
    pub commodities: bool,
    pub accounts: bool,
    pub ordered_dates: bool,
    pub payees: bool,
    pub tags: bool,
    pub recent_assertions: bool,
    pub unique_leaf_names: bool,
}

impl Default for Validations {
    fn default() -> Self {
        Self {
            commodities: true,
            accounts: true,
            ordered_dates: true,
            payees: true,
            tags: true,
            recent_assertions: true,
            unique_leaf_names: true,
        }
    }
}

impl Validations {
    /// All optional rules disabled; structural errors are still reported.
    pub fn none() -> Self {
        Self {
            commodities: false,
            accounts: false,
            ordered_dates: false,
            payees: false,
            tags: false,
            recent_assertions: false,
            unique_leaf_names: false,
        }
    }
}

/// Options recognised by the model builder, validator and formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Re-render numerals with their commodity's grouping and precision.
    pub format_amounts: bool,
    /// Place the minus sign before the leading commodity symbol.
    pub negatives_in_front_of_commodities: bool,
    /// Realign posting lines.
    pub format_transactions: bool,
    /// Collapse runs of blank lines.
    pub format_white_space: bool,
    pub alignment: AlignmentMode,
    /// Column targets used by the `global` and `both` alignment modes.
    pub global_alignments: [usize; SLOT_COUNT],
    pub commodity_scope: CommodityScope,
    pub validations: Validations,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format_amounts: false,
            negatives_in_front_of_commodities: true,
            format_transactions: true,
            format_white_space: true,
            alignment: AlignmentMode::Transaction,
            global_alignments: [0; SLOT_COUNT],
            commodity_scope: CommodityScope::Document,
            validations: Validations::default(),
        }
    }
}

impl Config {
    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] - The file could not be read.
    /// - [`ConfigError::Parse`] - The contents are not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.message().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validations.commodities);
        assert!(config.validations.unique_leaf_names);
        assert_eq!(config.commodity_scope, CommodityScope::Document);
    }

    #[test]
    fn reads_camel_case_keys() {
        let config = Config::from_toml_str(
            "formatAmounts = true\n\
             negativesInFrontOfCommodities = false\n\
             alignment = \"global\"\n\
             globalAlignments = [40, 43, 46, 49, 52, 55, 58, 61, 64]\n\
             commodityScope = \"journal\"\n",
        )
        .unwrap();
        assert!(config.format_amounts);
        assert!(!config.negatives_in_front_of_commodities);
        assert_eq!(config.alignment, AlignmentMode::Global);
        assert_eq!(config.global_alignments[0], 40);
        assert_eq!(config.global_alignments[8], 64);
        assert_eq!(config.commodity_scope, CommodityScope::Journal);
    }

    #[test]
    fn rejects_wrong_alignment_count() {
        let result = Config::from_toml_str("globalAlignments = [1, 2, 3]\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
