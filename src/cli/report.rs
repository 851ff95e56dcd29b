use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::{money, signed_money};
use crate::models::CombinedTransaction;
use crate::reports::{self, Selection};

use super::Workspace;

fn amount_cell(val: f64) -> Cell {
    Cell::new(money(val)).set_alignment(CellAlignment::Right)
}

/// Load the view and hand the selected rows plus non-spending categories to `f`.
fn with_selection<F>(ws: &Workspace, years: &[i32], f: F) -> Result<()>
where
    F: FnOnce(&[&CombinedTransaction], &[String]),
{
    with_filter(ws, &Selection::years(years), f)
}

fn with_filter<F>(ws: &Workspace, selection: &Selection, f: F) -> Result<()>
where
    F: FnOnce(&[&CombinedTransaction], &[String]),
{
    let (store, view) = ws.view()?;
    let selected = reports::filter(&view.transactions, selection);
    if selected.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }
    f(&selected, &store.non_spending_categories());
    Ok(())
}

pub fn summary(ws: &Workspace, years: &[i32]) -> Result<()> {
    with_selection(ws, years, |txns, non_spending| {
        let s = reports::summary(txns, non_spending);
        let mut table = Table::new();
        table.set_header(vec!["", "Amount"]);
        table.add_row(vec![Cell::new("Income".green().bold()), amount_cell(s.income)]);
        table.add_row(vec![Cell::new("Expenses".red().bold()), amount_cell(s.expenses.abs())]);
        table.add_row(vec![
            Cell::new("Net".bold()),
            Cell::new(signed_money(s.net)).set_alignment(CellAlignment::Right),
        ]);
        println!("Summary ({} transactions)\n{table}", s.count);
    })
}

pub fn categories(ws: &Workspace, years: &[i32]) -> Result<()> {
    with_selection(ws, years, |txns, non_spending| {
        let totals = reports::category_totals(txns, non_spending);
        let months = reports::months_spanned(txns);
        let mut table = Table::new();
        table.set_header(vec!["Category", "Total", "Per month", "Count"]);
        for item in &totals {
            table.add_row(vec![
                Cell::new(&item.name),
                amount_cell(item.total),
                amount_cell(item.monthly_average),
                Cell::new(item.count),
            ]);
        }
        println!("Spending by category ({months} months)\n{table}");
    })
}

pub fn cashflow(ws: &Workspace, years: &[i32]) -> Result<()> {
    with_selection(ws, years, |txns, non_spending| {
        let flows = reports::monthly_cashflow(txns, non_spending);
        let mut table = Table::new();
        table.set_header(vec!["Month", "Income", "Expenses", "Net"]);
        for flow in &flows {
            table.add_row(vec![
                Cell::new(&flow.month),
                amount_cell(flow.income),
                amount_cell(flow.expenses),
                Cell::new(signed_money(flow.net)).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("Monthly cash flow\n{table}");
    })
}

pub fn compare(ws: &Workspace, first: i32, second: i32) -> Result<()> {
    with_selection(ws, &[first, second], |txns, non_spending| {
        let cmp = reports::year_comparison(txns, non_spending, first, second);
        let mut table = Table::new();
        table.set_header(vec![
            "Category".to_string(),
            first.to_string(),
            second.to_string(),
            "Difference".to_string(),
        ]);
        for row in &cmp.categories {
            table.add_row(vec![
                Cell::new(&row.category),
                amount_cell(row.first),
                amount_cell(row.second),
                amount_cell(row.delta),
            ]);
        }
        table.add_row(vec![
            Cell::new("Income".green().bold()),
            amount_cell(cmp.first.income),
            amount_cell(cmp.second.income),
            amount_cell(cmp.first.income - cmp.second.income),
        ]);
        table.add_row(vec![
            Cell::new("Expenses".red().bold()),
            amount_cell(cmp.first.expenses.abs()),
            amount_cell(cmp.second.expenses.abs()),
            amount_cell(cmp.first.expenses.abs() - cmp.second.expenses.abs()),
        ]);
        println!("{first} vs {second}\n{table}");
    })
}

pub fn typical(ws: &Workspace, years: &[i32]) -> Result<()> {
    with_selection(ws, years, |txns, non_spending| {
        let tm = reports::typical_month(txns, non_spending);
        let mut table = Table::new();
        table.set_header(vec!["Category", "Per month"]);
        table.add_row(vec![Cell::new("INCOME".green().bold()), Cell::new("")]);
        for item in &tm.income_by_category {
            table.add_row(vec![Cell::new(format!("  {}", item.name)), amount_cell(item.monthly_average)]);
        }
        table.add_row(vec![Cell::new("EXPENSES".red().bold()), Cell::new("")]);
        for item in &tm.expenses_by_category {
            table.add_row(vec![Cell::new(format!("  {}", item.name)), amount_cell(item.monthly_average)]);
        }
        table.add_row(vec![Cell::new("Income".bold()), amount_cell(tm.income)]);
        table.add_row(vec![Cell::new("Expenses".bold()), amount_cell(tm.expenses)]);
        table.add_row(vec![
            Cell::new("Savings".bold()),
            Cell::new(signed_money(tm.savings)).set_alignment(CellAlignment::Right),
        ]);
        println!("Typical month (over {} months)\n{table}", tm.months);
    })
}

pub fn clusters(
    ws: &Workspace,
    years: &[i32],
    category: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let title = match &category {
        Some(c) => format!("Top clusters in {c}"),
        None => "Clusters".to_string(),
    };
    let selection = Selection {
        years: years.to_vec(),
        category: category.clone(),
        ..Selection::default()
    };
    with_filter(ws, &selection, |txns, non_spending| {
        let outflows: Vec<&CombinedTransaction>;
        let rows = if category.is_some() {
            outflows = txns
                .iter()
                .copied()
                .filter(|t| t.amount < 0.0 && !non_spending.contains(&t.category))
                .collect();
            &outflows[..]
        } else {
            txns
        };
        let mut totals = reports::cluster_totals(rows);
        if let Some(max) = limit {
            totals.truncate(max);
        }
        let mut table = Table::new();
        table.set_header(vec!["Cluster", "Count", "Total", "Average"]);
        for item in &totals {
            table.add_row(vec![
                Cell::new(&item.name),
                Cell::new(item.count),
                amount_cell(item.total),
                amount_cell(item.total / item.count.max(1) as f64),
            ]);
        }
        println!("{title}\n{table}");
    })
}

pub fn trends(
    ws: &Workspace,
    years: &[i32],
    rolling: bool,
    top: Option<usize>,
    monthly: bool,
) -> Result<()> {
    with_selection(ws, years, |txns, non_spending| {
        let mut trends = reports::category_trends(txns, non_spending, rolling);
        if trends.is_empty() {
            println!("Not enough months of spending for a trend.");
            return;
        }
        if let Some(max) = top {
            trends.truncate(max);
        }

        if monthly {
            let spend = reports::monthly_category_spend(txns, non_spending);
            let mut header = vec!["Month".to_string()];
            header.extend(trends.iter().map(|t| t.name.clone()));
            let mut table = Table::new();
            table.set_header(header);
            let series: Vec<Vec<f64>> = trends
                .iter()
                .map(|t| {
                    let raw = spend.series.get(&t.name).cloned().unwrap_or_default();
                    if rolling {
                        reports::rolling_mean(&raw, reports::TREND_WINDOW)
                    } else {
                        raw
                    }
                })
                .collect();
            for (i, month) in spend.months.iter().enumerate() {
                let mut row = vec![Cell::new(month)];
                row.extend(series.iter().map(|s| amount_cell(s.get(i).copied().unwrap_or(0.0))));
                table.add_row(row);
            }
            println!("Monthly spending\n{table}");
        }

        let mut table = Table::new();
        table.set_header(vec![
            "Category", "Total", "Per month", "Last 3 mo.", "Previous 3 mo.", "Change", "Trend",
        ]);
        for t in &trends {
            let direction = match t.direction {
                reports::TrendDirection::Rising => t.direction.label().red(),
                reports::TrendDirection::Falling => t.direction.label().green(),
                reports::TrendDirection::Stable => t.direction.label().normal(),
            };
            table.add_row(vec![
                Cell::new(&t.name),
                amount_cell(t.total),
                amount_cell(t.monthly_average),
                amount_cell(t.recent),
                amount_cell(t.previous),
                Cell::new(format!("{:+.1}%", t.change_pct)).set_alignment(CellAlignment::Right),
                Cell::new(direction),
            ]);
        }
        let title = if rolling {
            "Spending trends (3-month rolling mean)"
        } else {
            "Spending trends"
        };
        println!("{title}\n{table}");
    })
}

pub fn investments(ws: &Workspace, years: &[i32]) -> Result<()> {
    with_selection(ws, years, |txns, _| {
        let months = reports::investments(txns);
        if months.is_empty() {
            println!("No investment transactions.");
            return;
        }
        let mut table = Table::new();
        table.set_header(vec!["Month", "Bought", "Sold", "Net invested"]);
        let mut total = 0.0;
        for m in &months {
            total += m.net_invested;
            table.add_row(vec![
                Cell::new(&m.month),
                amount_cell(m.buys),
                amount_cell(m.sells),
                amount_cell(m.net_invested),
            ]);
        }
        println!("Investments\n{table}");
        println!("Total invested: {}", money(total).as_str().bold());
    })
}
