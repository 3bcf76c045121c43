use serde::Deserialize;
use tickerboard_core::Holding;

/// Body of `POST /holdings/valuate`: either a bare array or `{ "holdings": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum ValuateRequest {
    List(Vec<Holding>),
    Wrapped { holdings: Vec<Holding> },
}

impl ValuateRequest {
    pub fn into_holdings(self) -> Vec<Holding> {
        match self {
            ValuateRequest::List(holdings) | ValuateRequest::Wrapped { holdings } => holdings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_body_shapes() {
        let item = r#"{"stockName":"Apple","exchangeCode":"AAPL","quantity":1,"purchasePrice":100}"#;

        let bare: ValuateRequest = serde_json::from_str(&format!("[{}]", item)).unwrap();
        assert_eq!(bare.into_holdings().len(), 1);

        let wrapped: ValuateRequest =
            serde_json::from_str(&format!(r#"{{"holdings":[{}]}}"#, item)).unwrap();
        let holdings = wrapped.into_holdings();
        assert_eq!(holdings[0].exchange_code, "AAPL");
        assert!(holdings[0].sector.is_empty());
    }
}
