//! Reading the holdings document.
//!
//! The document is a JSON array or a CSV file whose headers match the
//! camelCase field names (`stockName,exchangeCode,sector,quantity,purchasePrice`).
//! Row order is preserved.

use std::io::Read;
use std::path::Path;

use log::debug;

use super::holdings_model::Holding;
use crate::errors::{Error, Result};

/// Load holdings from `path`, picking the parser by file extension.
pub fn load_holdings(path: &Path) -> Result<Vec<Holding>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let io_error = |source| Error::Io {
        path: path.display().to_string(),
        source,
    };

    let holdings = match extension.as_str() {
        "json" => parse_holdings_json(&std::fs::read_to_string(path).map_err(io_error)?)?,
        "csv" => parse_holdings_csv(std::fs::File::open(path).map_err(io_error)?)?,
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    };

    debug!("Loaded {} holdings from {}", holdings.len(), path.display());
    Ok(holdings)
}

pub fn parse_holdings_json(input: &str) -> Result<Vec<Holding>> {
    let holdings: Vec<Holding> = serde_json::from_str(input)?;
    validate_holdings(holdings)
}

pub fn parse_holdings_csv<R: Read>(reader: R) -> Result<Vec<Holding>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let holdings = rdr
        .deserialize::<Holding>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    validate_holdings(holdings)
}

/// Quantities and purchase prices must not be negative.
pub fn validate_holdings(holdings: Vec<Holding>) -> Result<Vec<Holding>> {
    for (index, holding) in holdings.iter().enumerate() {
        if holding.quantity.is_sign_negative() && !holding.quantity.is_zero() {
            return Err(Error::Validation(format!(
                "row {} ({}): negative quantity",
                index + 1,
                holding.exchange_code
            )));
        }
        if holding.purchase_price.is_sign_negative() && !holding.purchase_price.is_zero() {
            return Err(Error::Validation(format!(
                "row {} ({}): negative purchase price",
                index + 1,
                holding.exchange_code
            )));
        }
    }
    Ok(holdings)
}
