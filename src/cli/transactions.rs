use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::{signed_money, truncate};
use crate::reports::Selection;

use super::Workspace;

pub fn run(
    ws: &Workspace,
    years: &[i32],
    account: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let (_, view) = ws.view()?;
    let selection = Selection {
        years: years.to_vec(),
        account,
        category,
    };

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Account", "Description", "Category", "Amount"]);
    let mut shown = 0usize;
    let mut matched = 0usize;
    for (index, t) in view.transactions.iter().enumerate() {
        if !selection.matches(t) {
            continue;
        }
        matched += 1;
        if limit.is_some_and(|max| shown >= max) {
            continue;
        }
        let category = if t.overridden {
            format!("{} *", t.category)
        } else {
            t.category.clone()
        };
        table.add_row(vec![
            Cell::new(index),
            Cell::new(t.date.format("%d.%m.%Y")),
            Cell::new(truncate(&t.account, 24)),
            Cell::new(truncate(&t.description, 48)),
            Cell::new(category),
            Cell::new(signed_money(t.amount)).set_alignment(CellAlignment::Right),
        ]);
        shown += 1;
    }

    if matched == 0 {
        println!("No transactions found.");
        return Ok(());
    }
    println!("{table}");
    println!("{shown} of {matched} transactions (* = manual override)");
    Ok(())
}
