use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SipInputs {
    pub monthly_investment: f64,
    pub annual_return_percent: f64,
    pub years: u32,
    pub tax_rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipResult {
    pub total_investment: f64,
    pub future_value: f64,
    pub returns: f64,
    pub tax_amount: f64,
    pub final_amount: f64,
    /// Month-end value after each contribution has compounded, rounded to whole units.
    pub monthly_values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwpInputs {
    pub initial_investment: f64,
    pub annual_return_percent: f64,
    pub years: u32,
    pub monthly_withdrawal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpResult {
    pub total_withdrawals: f64,
    pub final_balance: f64,
    pub returns: f64,
    /// Index 0 is the starting balance; every later point is floored at zero.
    pub monthly_values: Vec<f64>,
}
