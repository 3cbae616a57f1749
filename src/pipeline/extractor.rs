//! Volatility extractor
//!
//! Inverts Black-Scholes per contract. Failures never escape: a contract the
//! solver cannot price comes back with `implied_vol: None`.

use rayon::prelude::*;

use crate::core::{Contract, PricedContract, SurfacePoint};
use crate::models::black_scholes;

/// Implied volatility for one contract, `None` if the inversion fails
pub fn extract_vol(contract: &Contract, spot: f64, rate: f64) -> Option<f64> {
    match black_scholes::implied_volatility(
        contract.ask,
        spot,
        contract.strike,
        rate,
        contract.time_to_maturity_years,
        contract.option_type,
    ) {
        Ok(iv) => Some(iv),
        Err(e) => {
            tracing::trace!(
                "No implied vol for {}{} {} ask {}: {}",
                contract.option_type.code(),
                contract.strike,
                contract.expiry,
                contract.ask,
                e
            );
            None
        }
    }
}

/// Price every contract in parallel; output order matches input order
pub fn price_contracts(contracts: Vec<Contract>, spot: f64, rate: f64) -> Vec<PricedContract> {
    contracts
        .into_par_iter()
        .map(|contract| {
            let iv = extract_vol(&contract, spot, rate);
            PricedContract::new(contract, iv)
        })
        .collect()
}

/// Surface samples from contracts with a defined volatility
pub fn surface_points(priced: &[PricedContract]) -> Vec<SurfacePoint> {
    priced
        .iter()
        .filter_map(|p| {
            p.implied_vol.map(|vol| {
                SurfacePoint::new(p.contract.time_to_maturity_weeks, p.contract.strike, vol)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionType;
    use chrono::NaiveDate;

    fn contract(strike: f64, ask: f64, days: i64, option_type: OptionType) -> Contract {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        Contract::new(strike, ask, today + chrono::Duration::days(days), today, option_type)
    }

    #[test]
    fn test_extract_vol_reprices() {
        let c = contract(100.0, 5.0, 73, OptionType::Call);
        let iv = extract_vol(&c, 100.0, 0.05).unwrap();
        assert!(iv > 0.0);

        let repriced = black_scholes::price(
            100.0,
            100.0,
            0.05,
            iv,
            c.time_to_maturity_years,
            OptionType::Call,
        );
        assert!((repriced - 5.0).abs() < black_scholes::REPRICE_TOLERANCE);
    }

    #[test]
    fn test_failures_become_undefined() {
        // Ask below intrinsic for a deep ITM call
        let c = contract(50.0, 1.0, 30, OptionType::Call);
        assert_eq!(extract_vol(&c, 100.0, 0.05), None);

        // Zero ask
        let c = contract(100.0, 0.0, 30, OptionType::Put);
        assert_eq!(extract_vol(&c, 100.0, 0.05), None);
    }

    #[test]
    fn test_price_contracts_keeps_order() {
        let contracts: Vec<Contract> = (0..40)
            .map(|i| {
                let strike = 80.0 + i as f64;
                let ask = black_scholes::price(100.0, strike, 0.05, 0.3, 0.25, OptionType::Put);
                contract(strike, ask, 91, OptionType::Put)
            })
            .chain(std::iter::once(contract(90.0, 0.0, 91, OptionType::Call)))
            .collect();

        let priced = price_contracts(contracts.clone(), 100.0, 0.05);

        assert_eq!(priced.len(), contracts.len());
        for (p, c) in priced.iter().zip(contracts.iter()) {
            assert_eq!(&p.contract, c);
        }
        assert!(!priced[40].is_defined());

        let points = surface_points(&priced);
        assert_eq!(points.len(), priced.iter().filter(|p| p.is_defined()).count());
        assert!((points[0].time - 13.0).abs() < 1e-12);
        assert_eq!(points[0].strike, 80.0);
    }
}
