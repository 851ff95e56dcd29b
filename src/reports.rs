//! Aggregations behind the dashboard views. Every function is pure over a
//! slice of the combined view; non-spending categories are excluded wherever
//! income or spend is totalled.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;

use crate::models::{CombinedTransaction, INVESTMENTS_CATEGORY};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub years: Vec<i32>,
    pub account: Option<String>,
    pub category: Option<String>,
}

impl Selection {
    pub fn years(years: &[i32]) -> Self {
        Self {
            years: years.to_vec(),
            ..Self::default()
        }
    }

    pub fn matches(&self, t: &CombinedTransaction) -> bool {
        (self.years.is_empty() || self.years.contains(&t.year))
            && self.account.as_ref().map_or(true, |a| &t.account == a)
            && self.category.as_ref().map_or(true, |c| &t.category == c)
    }
}

pub fn filter<'a>(
    transactions: &'a [CombinedTransaction],
    selection: &Selection,
) -> Vec<&'a CombinedTransaction> {
    transactions.iter().filter(|t| selection.matches(t)).collect()
}

/// Distinct years present, most recent first.
pub fn available_years(transactions: &[CombinedTransaction]) -> Vec<i32> {
    let years: BTreeSet<i32> = transactions.iter().map(|t| t.year).collect();
    years.into_iter().rev().collect()
}

/// Months spanned from the earliest to the latest transaction, inclusive.
/// Never less than one.
pub fn months_spanned(transactions: &[&CombinedTransaction]) -> u32 {
    let first = transactions.iter().map(|t| t.date).min();
    let last = transactions.iter().map(|t| t.date).max();
    match (first, last) {
        (Some(a), Some(b)) => {
            let months = (b.year() - a.year()) * 12 + b.month() as i32 - a.month() as i32 + 1;
            months.max(1) as u32
        }
        _ => 1,
    }
}

fn spending<'a>(
    transactions: &[&'a CombinedTransaction],
    non_spending: &[String],
) -> Vec<&'a CombinedTransaction> {
    transactions
        .iter()
        .copied()
        .filter(|t| !non_spending.contains(&t.category))
        .collect()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub income: f64,
    /// Negative sum of outflows.
    pub expenses: f64,
    pub net: f64,
    pub count: usize,
}

pub fn summary(transactions: &[&CombinedTransaction], non_spending: &[String]) -> Summary {
    let real = spending(transactions, non_spending);
    let income: f64 = real.iter().filter(|t| t.amount > 0.0).map(|t| t.amount).sum();
    let expenses: f64 = real.iter().filter(|t| t.amount < 0.0).map(|t| t.amount).sum();
    Summary {
        income,
        expenses,
        net: income + expenses,
        count: real.len(),
    }
}

// ---------------------------------------------------------------------------
// Category totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    /// Absolute amount.
    pub total: f64,
    pub monthly_average: f64,
    pub count: usize,
}

fn totals_by<F>(
    transactions: &[&CombinedTransaction],
    months: u32,
    key: F,
) -> Vec<CategoryTotal>
where
    F: Fn(&CombinedTransaction) -> &str,
{
    let mut grouped: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for &t in transactions {
        let entry = grouped.entry(key(t)).or_default();
        entry.0 += t.amount.abs();
        entry.1 += 1;
    }
    let mut items: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(name, (total, count))| CategoryTotal {
            name: name.to_string(),
            total,
            monthly_average: total / months as f64,
            count,
        })
        .collect();
    items.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    items
}

/// Spend per category (outflows only), largest first.
pub fn category_totals(
    transactions: &[&CombinedTransaction],
    non_spending: &[String],
) -> Vec<CategoryTotal> {
    let months = months_spanned(transactions);
    let outflows: Vec<&CombinedTransaction> = spending(transactions, non_spending)
        .into_iter()
        .filter(|t| t.amount < 0.0)
        .collect();
    totals_by(&outflows, months, |t| t.category.as_str())
}

/// Count and absolute sum per cluster label, largest first.
pub fn cluster_totals(transactions: &[&CombinedTransaction]) -> Vec<CategoryTotal> {
    let months = months_spanned(transactions);
    totals_by(transactions, months, |t| t.cluster_label.as_str())
}

// ---------------------------------------------------------------------------
// Monthly cashflow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthFlow {
    pub month: String,
    pub income: f64,
    /// Absolute amount.
    pub expenses: f64,
    pub net: f64,
}

pub fn monthly_cashflow(
    transactions: &[&CombinedTransaction],
    non_spending: &[String],
) -> Vec<MonthFlow> {
    let mut grouped: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for t in spending(transactions, non_spending) {
        let entry = grouped.entry(t.month_key()).or_default();
        if t.amount > 0.0 {
            entry.0 += t.amount;
        } else if t.amount < 0.0 {
            entry.1 += t.amount.abs();
        }
    }
    grouped
        .into_iter()
        .map(|(month, (income, expenses))| MonthFlow {
            month,
            income,
            expenses,
            net: income - expenses,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Year comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    pub category: String,
    pub first: f64,
    pub second: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearComparison {
    pub first_year: i32,
    pub second_year: i32,
    pub first: Summary,
    pub second: Summary,
    /// Spend per category in both years, largest first-year spend first.
    pub categories: Vec<YearRow>,
}

pub fn year_comparison(
    transactions: &[&CombinedTransaction],
    non_spending: &[String],
    first_year: i32,
    second_year: i32,
) -> YearComparison {
    let in_year = |year: i32| {
        transactions
            .iter()
            .copied()
            .filter(|t| t.year == year)
            .collect::<Vec<_>>()
    };
    let first_txns = in_year(first_year);
    let second_txns = in_year(second_year);

    let mut spend: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for t in spending(&first_txns, non_spending) {
        if t.amount < 0.0 {
            spend.entry(t.category.clone()).or_default().0 += t.amount.abs();
        }
    }
    for t in spending(&second_txns, non_spending) {
        if t.amount < 0.0 {
            spend.entry(t.category.clone()).or_default().1 += t.amount.abs();
        }
    }
    let mut categories: Vec<YearRow> = spend
        .into_iter()
        .map(|(category, (first, second))| YearRow {
            category,
            first,
            second,
            delta: first - second,
        })
        .collect();
    categories.sort_by(|a, b| b.first.total_cmp(&a.first).then_with(|| a.category.cmp(&b.category)));

    YearComparison {
        first_year,
        second_year,
        first: summary(&first_txns, non_spending),
        second: summary(&second_txns, non_spending),
        categories,
    }
}

// ---------------------------------------------------------------------------
// Typical month
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TypicalMonth {
    pub months: u32,
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
    pub income_by_category: Vec<CategoryTotal>,
    pub expenses_by_category: Vec<CategoryTotal>,
}

pub fn typical_month(
    transactions: &[&CombinedTransaction],
    non_spending: &[String],
) -> TypicalMonth {
    let months = months_spanned(transactions);
    let real = spending(transactions, non_spending);
    let inflows: Vec<&CombinedTransaction> = real.iter().copied().filter(|t| t.amount > 0.0).collect();
    let outflows: Vec<&CombinedTransaction> = real.iter().copied().filter(|t| t.amount < 0.0).collect();
    let totals = summary(transactions, non_spending);
    let income = totals.income / months as f64;
    let expenses = totals.expenses.abs() / months as f64;
    TypicalMonth {
        months,
        income,
        expenses,
        savings: income - expenses,
        income_by_category: totals_by(&inflows, months, |t| t.category.as_str()),
        expenses_by_category: totals_by(&outflows, months, |t| t.category.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

/// Months averaged for the recent and previous trend windows.
pub const TREND_WINDOW: usize = 3;
/// Change in percent beyond which a category counts as rising or falling.
pub const TREND_THRESHOLD_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > TREND_THRESHOLD_PCT {
            Self::Rising
        } else if change_pct < -TREND_THRESHOLD_PCT {
            Self::Falling
        } else {
            Self::Stable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

/// Spend per category for every month that has any spend, zero-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySpend {
    pub months: Vec<String>,
    /// Category -> one value per entry of `months`.
    pub series: BTreeMap<String, Vec<f64>>,
}

pub fn monthly_category_spend(
    transactions: &[&CombinedTransaction],
    non_spending: &[String],
) -> MonthlySpend {
    let outflows: Vec<&CombinedTransaction> = spending(transactions, non_spending)
        .into_iter()
        .filter(|t| t.amount < 0.0)
        .collect();
    let months: Vec<String> = outflows
        .iter()
        .map(|t| t.month_key())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for t in outflows {
        let Ok(slot) = months.binary_search(&t.month_key()) else {
            continue;
        };
        let values = series
            .entry(t.category.clone())
            .or_insert_with(|| vec![0.0; months.len()]);
        values[slot] += t.amount.abs();
    }
    MonthlySpend { months, series }
}

/// Trailing mean over up to `window` values, so early entries average fewer.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTrend {
    pub name: String,
    /// Absolute spend over the whole selection.
    pub total: f64,
    pub monthly_average: f64,
    /// Mean of the last three months.
    pub recent: f64,
    /// Mean of the three months before those, or of the first three months
    /// when fewer than six are available.
    pub previous: f64,
    pub change_pct: f64,
    pub direction: TrendDirection,
}

/// Per-category spending trend, largest total first. Categories with fewer
/// than two months of data are left out. With `rolling`, the monthly series
/// is smoothed by a three-month trailing mean first.
pub fn category_trends(
    transactions: &[&CombinedTransaction],
    non_spending: &[String],
    rolling: bool,
) -> Vec<CategoryTrend> {
    let spend = monthly_category_spend(transactions, non_spending);
    if spend.months.len() < 2 {
        return Vec::new();
    }

    let mut trends: Vec<CategoryTrend> = spend
        .series
        .into_iter()
        .map(|(name, raw)| {
            let total: f64 = raw.iter().sum();
            let values = if rolling {
                rolling_mean(&raw, TREND_WINDOW)
            } else {
                raw
            };
            let n = values.len();
            let recent = mean(&values[n.saturating_sub(TREND_WINDOW)..]);
            let previous = if n >= 2 * TREND_WINDOW {
                mean(&values[n - 2 * TREND_WINDOW..n - TREND_WINDOW])
            } else {
                mean(&values[..n.min(TREND_WINDOW)])
            };
            let change_pct = if previous > 0.0 {
                (recent - previous) / previous * 100.0
            } else {
                0.0
            };
            CategoryTrend {
                name,
                total,
                monthly_average: mean(&values),
                recent,
                previous,
                change_pct,
                direction: TrendDirection::from_change(change_pct),
            }
        })
        .collect();
    trends.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    trends
}

// ---------------------------------------------------------------------------
// Investments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentMonth {
    pub month: String,
    pub buys: f64,
    pub sells: f64,
    pub net_invested: f64,
}

/// Buys (outflows) and sells (inflows) of the investment category per month.
pub fn investments(transactions: &[&CombinedTransaction]) -> Vec<InvestmentMonth> {
    let mut grouped: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.category == INVESTMENTS_CATEGORY) {
        let entry = grouped.entry(t.month_key()).or_default();
        if t.amount < 0.0 {
            entry.0 += t.amount.abs();
        } else {
            entry.1 += t.amount;
        }
    }
    grouped
        .into_iter()
        .map(|(month, (buys, sells))| InvestmentMonth {
            month,
            buys,
            sells,
            net_invested: buys - sells,
        })
        .collect()
}
