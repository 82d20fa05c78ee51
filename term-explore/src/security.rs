//! Identifier escaping for the SQL the heuristics generate.
//!
//! Column names come straight from user spreadsheets, so they may contain
//! spaces, accents or quotes. They are always quoted, never interpolated raw.

use crate::error::{ExploreError, Result};

/// Maximum accepted identifier length in bytes.
const MAX_IDENTIFIER_LEN: usize = 256;

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and escapes a SQL identifier such as a column name.
    ///
    /// # Examples
    /// ```rust
    /// use term_explore::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("Vendas").unwrap(), "\"Vendas\"");
    /// assert_eq!(
    ///     SqlSecurity::escape_identifier("Preço \"Unitário\"").unwrap(),
    ///     "\"Preço \"\"Unitário\"\"\""
    /// );
    /// assert!(SqlSecurity::escape_identifier("").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;

        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Validates a SQL identifier without escaping it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(ExploreError::Security(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LEN {
            return Err(ExploreError::Security(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LEN} bytes)"
            )));
        }

        if identifier.contains('\0') {
            return Err(ExploreError::Security(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(
            SqlSecurity::escape_identifier("Categoria_Produto").unwrap(),
            "\"Categoria_Produto\""
        );
        assert_eq!(
            SqlSecurity::escape_identifier("Data da Venda").unwrap(),
            "\"Data da Venda\""
        );
        assert_eq!(
            SqlSecurity::escape_identifier("a\"b").unwrap(),
            "\"a\"\"b\""
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(SqlSecurity::escape_identifier("   ").is_err());
        assert!(SqlSecurity::escape_identifier("a\0b").is_err());
        assert!(SqlSecurity::escape_identifier(&"x".repeat(300)).is_err());
    }
}
