use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Currency {
    Inr,
    Usd,
    Gbp,
    Eur,
    Jpy,
    Aud,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Jpy => "JPY",
            Currency::Aud => "AUD",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Inr => "\u{20b9}",
            Currency::Usd => "$",
            Currency::Gbp => "\u{a3}",
            Currency::Eur => "\u{20ac}",
            Currency::Jpy => "\u{a5}",
            Currency::Aud => "A$",
        }
    }

    pub fn from_code(code: &str) -> Option<Currency> {
        let code = code.trim();
        [
            Currency::Inr,
            Currency::Usd,
            Currency::Gbp,
            Currency::Eur,
            Currency::Jpy,
            Currency::Aud,
        ]
        .into_iter()
        .find(|currency| currency.code().eq_ignore_ascii_case(code))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Country {
    pub name: &'static str,
    pub code: &'static str,
    pub currency: Currency,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ReferencePoint {
    pub percentile: u32,
    pub income: f64,
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub country: &'static Country,
    pub annual_income: f64,
    pub display_currency: Currency,
    pub simulated_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub reference_data: Vec<ReferencePoint>,
    pub user_percentile: u32,
    pub user_income: f64,
}
