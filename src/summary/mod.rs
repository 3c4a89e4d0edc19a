//! Summary module
//!
//! Totals a user's expenses per calendar month and breaks them down by category.

mod charts;
mod core;
mod summary_page;

pub use core::{
    MonthlyCategoryTotal, YearMonth, available_months, monthly_by_category, monthly_total,
};
pub use summary_page::get_summary_page;
