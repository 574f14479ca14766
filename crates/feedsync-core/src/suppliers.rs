use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierConfig {
    pub name: String,
    /// Percentage added on top of the supplier cost price, e.g. `35` for 35%.
    pub markup_pct: Decimal,
    /// Retail prices are rounded up to a multiple of this value when set.
    #[serde(default)]
    pub round_to: Option<Decimal>,
    /// Already-extracted feed rows as a JSON array.
    #[serde(default)]
    pub feed_path: Option<PathBuf>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SupplierConfig {
    /// Generate the supplier identifier used on review-queue rows.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// URL-safe slug: lowercase ASCII alphanumerics joined by single dashes.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
pub struct SuppliersFile {
    pub suppliers: Vec<SupplierConfig>,
}

impl SuppliersFile {
    /// Case-insensitive lookup by name or slug.
    #[must_use]
    pub fn find(&self, name_or_slug: &str) -> Option<&SupplierConfig> {
        let wanted = name_or_slug.to_lowercase();
        self.suppliers
            .iter()
            .find(|s| s.name.to_lowercase() == wanted || s.slug() == wanted)
    }
}

/// Load and validate the suppliers configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_suppliers(path: &Path) -> Result<SuppliersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SuppliersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_suppliers(&content)
}

/// Parse and validate suppliers YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_suppliers(content: &str) -> Result<SuppliersFile, ConfigError> {
    let suppliers_file: SuppliersFile = serde_yaml::from_str(content)?;
    validate_suppliers(&suppliers_file)?;
    Ok(suppliers_file)
}

fn validate_suppliers(suppliers_file: &SuppliersFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for supplier in &suppliers_file.suppliers {
        if supplier.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "supplier name must be non-empty".to_string(),
            ));
        }

        if supplier.markup_pct < Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "supplier '{}' has negative markup {}",
                supplier.name, supplier.markup_pct
            )));
        }

        if let Some(round_to) = supplier.round_to {
            if round_to <= Decimal::ZERO {
                return Err(ConfigError::Validation(format!(
                    "supplier '{}' has non-positive round_to {round_to}",
                    supplier.name
                )));
            }
        }

        let lower_name = supplier.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate supplier name: '{}'",
                supplier.name
            )));
        }

        let slug = supplier.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate supplier slug: '{}' (from supplier '{}')",
                slug, supplier.name
            )));
        }
    }

    Ok(())
}
