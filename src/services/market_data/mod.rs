pub mod fx_rates;
pub mod openfigi;
