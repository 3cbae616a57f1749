//! Black-Scholes Model
//!
//! Provides:
//! - European option pricing
//! - Vega
//! - Implied volatility solver (Newton-Raphson with bisection fallback)
//!
//! Market asks are converted to implied volatilities here. No dividend
//! yield is modelled; the forward is `S·e^{rT}`.

use std::f64::consts::{PI, SQRT_2};
use statrs::function::erf::erfc;
use crate::core::{OptionType, SurfaceError, SurfaceResult};

/// Absolute price tolerance at which the solver stops iterating
pub const PRICE_TOLERANCE: f64 = 1e-8;

/// Largest repricing error accepted for a returned volatility
pub const REPRICE_TOLERANCE: f64 = 1e-6;

/// Volatility search bracket
pub const MIN_VOL: f64 = 1e-6;
pub const MAX_VOL: f64 = 10.0;

const MAX_NEWTON_ITER: usize = 100;
const MAX_BISECTION_ITER: usize = 200;

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, vol, time) - vol * time.sqrt()
}

/// Black-Scholes European option price
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> f64 {
    if time <= 0.0 {
        return option_type.intrinsic(spot, strike);
    }

    let df = (-rate * time).exp();

    if vol <= 0.0 {
        // Zero vol = intrinsic value of the forward, discounted
        let forward = spot / df;
        return df * option_type.intrinsic(forward, strike);
    }

    let d1 = d1(spot, strike, rate, vol, time);
    let d2 = d2(spot, strike, rate, vol, time);

    match option_type {
        OptionType::Call => spot * norm_cdf(d1) - strike * df * norm_cdf(d2),
        OptionType::Put => strike * df * norm_cdf(-d2) - spot * norm_cdf(-d1),
    }
}

/// Vega (price sensitivity to a unit change in vol, same for calls and puts)
pub fn vega(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    if time <= 0.0 || vol <= 0.0 {
        return 0.0;
    }
    spot * norm_pdf(d1(spot, strike, rate, vol, time)) * time.sqrt()
}

/// No-arbitrage price band (lower, upper) for a European option
pub fn arbitrage_bounds(
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
    option_type: OptionType,
) -> (f64, f64) {
    let discounted_strike = strike * (-rate * time).exp();

    match option_type {
        OptionType::Call => ((spot - discounted_strike).max(0.0), spot),
        OptionType::Put => ((discounted_strike - spot).max(0.0), discounted_strike),
    }
}

/// Implied volatility solver using Newton-Raphson with bisection fallback
///
/// The price must sit strictly inside [`arbitrage_bounds`]; anything else has
/// no positive finite solution and is rejected.
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
    option_type: OptionType,
) -> SurfaceResult<f64> {
    // Sanity checks
    if !(market_price.is_finite() && spot.is_finite() && strike.is_finite()) {
        return Err(SurfaceError::numerical("Non-finite input"));
    }
    if !rate.is_finite() || rate < 0.0 {
        return Err(SurfaceError::numerical("Negative or non-finite rate"));
    }
    if market_price <= 0.0 {
        return Err(SurfaceError::numerical("Non-positive option price"));
    }
    if !time.is_finite() || time <= 0.0 {
        return Err(SurfaceError::numerical("Non-positive time to expiry"));
    }
    if spot <= 0.0 || strike <= 0.0 {
        return Err(SurfaceError::numerical("Non-positive spot or strike"));
    }

    let (lower, upper) = arbitrage_bounds(spot, strike, rate, time, option_type);
    if market_price <= lower {
        return Err(SurfaceError::numerical("Price at or below intrinsic value"));
    }
    if market_price >= upper {
        return Err(SurfaceError::numerical("Price at or above arbitrage upper bound"));
    }

    // Initial guess using Brenner-Subrahmanyam approximation
    let mut vol = (market_price / (0.4 * spot * time.sqrt())).clamp(0.01, 3.0);

    for _ in 0..MAX_NEWTON_ITER {
        let diff = price(spot, strike, rate, vol, time, option_type) - market_price;

        if diff.abs() < PRICE_TOLERANCE {
            return Ok(vol);
        }

        let vega = vega(spot, strike, rate, vol, time);
        if vega.abs() < 1e-12 {
            break; // Vega too small, switch to bisection
        }

        let new_vol = vol - diff / vega;
        if !new_vol.is_finite() || new_vol <= MIN_VOL || new_vol > MAX_VOL {
            break; // Out of bounds, switch to bisection
        }

        vol = new_vol;
    }

    bisection_iv(market_price, spot, strike, rate, time, option_type)
}

/// Bisection method for IV (slower but more robust)
fn bisection_iv(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
    option_type: OptionType,
) -> SurfaceResult<f64> {
    let mut low = MIN_VOL;
    let mut high = MAX_VOL;

    if price(spot, strike, rate, high, time, option_type) < market_price {
        return Err(SurfaceError::numerical("Implied vol above search bracket"));
    }
    if price(spot, strike, rate, low, time, option_type) > market_price {
        return Err(SurfaceError::numerical("Implied vol below search bracket"));
    }

    let mut mid = 0.5 * (low + high);
    let mut diff = f64::INFINITY;

    for _ in 0..MAX_BISECTION_ITER {
        mid = 0.5 * (low + high);
        diff = price(spot, strike, rate, mid, time, option_type) - market_price;

        if diff.abs() < PRICE_TOLERANCE {
            return Ok(mid);
        }

        if diff > 0.0 {
            high = mid;
        } else {
            low = mid;
        }

        if high - low < f64::EPSILON * mid {
            break;
        }
    }

    if diff.abs() < REPRICE_TOLERANCE {
        Ok(mid)
    } else {
        Err(SurfaceError::numerical("IV solver did not converge"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-10);
        assert!((norm_cdf(1.96) - 0.975).abs() < 0.001);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 0.001);
    }

    #[test]
    fn test_bs_price() {
        // ATM call, 20% vol, 1 year, 5% rate
        let call_price = price(100.0, 100.0, 0.05, 0.20, 1.0, OptionType::Call);

        // Should be around 10.45 for these parameters
        assert!((call_price - 10.4506).abs() < 0.001);

        // Put-call parity check
        let put_price = price(100.0, 100.0, 0.05, 0.20, 1.0, OptionType::Put);
        let parity = call_price - put_price - (100.0 - 100.0 * (-0.05_f64).exp());
        assert!(parity.abs() < 1e-10);
    }

    #[test]
    fn test_vega_positive() {
        assert!(vega(100.0, 100.0, 0.05, 0.2, 1.0) > 0.0);
        assert_eq!(vega(100.0, 100.0, 0.05, 0.2, 0.0), 0.0);
    }

    #[test]
    fn test_implied_vol() {
        let (spot, strike, rate, vol, time) = (100.0, 100.0, 0.05, 0.25, 0.5);

        let market_price = price(spot, strike, rate, vol, time, OptionType::Call);
        let iv = implied_volatility(market_price, spot, strike, rate, time, OptionType::Call).unwrap();

        assert!((iv - vol).abs() < 0.0001);
    }

    #[test]
    fn test_iv_otm() {
        // OTM put
        let (spot, strike, rate, vol, time) = (100.0, 90.0, 0.05, 0.30, 0.25);

        let market_price = price(spot, strike, rate, vol, time, OptionType::Put);
        let iv = implied_volatility(market_price, spot, strike, rate, time, OptionType::Put).unwrap();

        assert!((iv - vol).abs() < 0.001);
    }

    #[test]
    fn test_iv_reprices_ask() {
        // Short-dated ATM call from the reference scenario
        let iv = implied_volatility(5.0, 100.0, 100.0, 0.05, 0.1, OptionType::Call).unwrap();
        assert!(iv > 0.0);

        let repriced = price(100.0, 100.0, 0.05, iv, 0.1, OptionType::Call);
        assert!((repriced - 5.0).abs() < REPRICE_TOLERANCE);
    }

    #[test]
    fn test_iv_reprices_across_strikes() {
        let spot = 250.0;
        let rate = 0.03;
        for &(strike, time, option_type) in &[
            (200.0, 0.05, OptionType::Put),
            (240.0, 0.5, OptionType::Call),
            (300.0, 1.5, OptionType::Call),
            (320.0, 2.0, OptionType::Put),
        ] {
            let ask = price(spot, strike, rate, 0.45, time, option_type);
            let iv = implied_volatility(ask, spot, strike, rate, time, option_type).unwrap();
            let repriced = price(spot, strike, rate, iv, time, option_type);
            assert!((repriced - ask).abs() < REPRICE_TOLERANCE, "strike {}", strike);
        }
    }

    #[test]
    fn test_iv_high_vol_uses_bisection() {
        let ask = price(100.0, 100.0, 0.0, 6.0, 0.25, OptionType::Call);
        let iv = implied_volatility(ask, 100.0, 100.0, 0.0, 0.25, OptionType::Call).unwrap();
        assert!((iv - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_iv_rejects_out_of_bounds_prices() {
        // Deep ITM call priced below intrinsic
        assert!(implied_volatility(5.0, 100.0, 80.0, 0.05, 0.5, OptionType::Call).is_err());
        // Call worth more than the stock
        assert!(implied_volatility(101.0, 100.0, 80.0, 0.05, 0.5, OptionType::Call).is_err());
        // Put worth more than the discounted strike
        assert!(implied_volatility(99.0, 100.0, 100.0, 0.05, 0.5, OptionType::Put).is_err());
        // Zero ask
        assert!(implied_volatility(0.0, 100.0, 100.0, 0.05, 0.5, OptionType::Call).is_err());
        // Expired
        assert!(implied_volatility(1.0, 100.0, 100.0, 0.05, 0.0, OptionType::Call).is_err());
        // Negative rate
        assert!(implied_volatility(1.0, 100.0, 100.0, -0.01, 0.5, OptionType::Call).is_err());
    }

    #[test]
    fn test_arbitrage_bounds() {
        let (lo, hi) = arbitrage_bounds(100.0, 90.0, 0.0, 1.0, OptionType::Call);
        assert!((lo - 10.0).abs() < 1e-12);
        assert!((hi - 100.0).abs() < 1e-12);

        let (lo, hi) = arbitrage_bounds(100.0, 90.0, 0.0, 1.0, OptionType::Put);
        assert_eq!(lo, 0.0);
        assert!((hi - 90.0).abs() < 1e-12);
    }
}
