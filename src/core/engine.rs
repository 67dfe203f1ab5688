use super::types::{ComparisonResult, Country, Currency, ReferencePoint};

pub static REFERENCE_BRACKETS: [ReferencePoint; 6] = [
    ReferencePoint {
        percentile: 10,
        income: 10_000.0,
    },
    ReferencePoint {
        percentile: 25,
        income: 25_000.0,
    },
    ReferencePoint {
        percentile: 50,
        income: 50_000.0,
    },
    ReferencePoint {
        percentile: 75,
        income: 75_000.0,
    },
    ReferencePoint {
        percentile: 90,
        income: 100_000.0,
    },
    ReferencePoint {
        percentile: 99,
        income: 200_000.0,
    },
];

pub static COUNTRIES: [Country; 6] = [
    Country {
        name: "INDIA",
        code: "IND",
        currency: Currency::Inr,
    },
    Country {
        name: "United States",
        code: "US",
        currency: Currency::Usd,
    },
    Country {
        name: "United Kingdom",
        code: "UK",
        currency: Currency::Gbp,
    },
    Country {
        name: "Germany",
        code: "DE",
        currency: Currency::Eur,
    },
    Country {
        name: "Japan",
        code: "JP",
        currency: Currency::Jpy,
    },
    Country {
        name: "Australia",
        code: "AU",
        currency: Currency::Aud,
    },
];

pub fn find_country(code: &str) -> Option<&'static Country> {
    COUNTRIES
        .iter()
        .find(|country| country.code.eq_ignore_ascii_case(code.trim()))
}

pub fn run_comparison(reference: &[ReferencePoint], user_income: f64) -> ComparisonResult {
    let user_percentile = match reference
        .iter()
        .position(|point| user_income <= point.income)
    {
        Some(index) => (index as u32) * 10 + 10,
        // No bracket at or above the income: the earner sits above the
        // whole table and ranks at the top.
        None => 100,
    };

    ComparisonResult {
        reference_data: reference.to_vec(),
        user_percentile,
        user_income,
    }
}

pub fn top_percent(user_percentile: u32) -> u32 {
    100 - user_percentile.min(100)
}

pub fn format_currency(value: f64, currency: Currency) -> String {
    let negative = value < 0.0;
    let whole_units = value.abs().round() as u64;
    let grouped = group_thousands(whole_units);
    if negative {
        format!("-{}{grouped}", currency.symbol())
    } else {
        format!("{}{grouped}", currency.symbol())
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (offset, digit) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
