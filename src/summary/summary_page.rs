//! The summary page: a month's total spending and its breakdown by category.

use std::{
    cmp::Reverse,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Key;
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error, SessionState,
    db::lock_connection,
    endpoints,
    html::{
        CATEGORY_BADGE_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link,
    },
    money::format_currency,
    navigation::NavBar,
    summary::{
        MonthlyCategoryTotal, YearMonth, available_months,
        charts::{category_chart, chart_container, chart_script},
        monthly_by_category, monthly_total,
    },
    timezone::local_today,
};

/// The state needed for the summary page.
#[derive(Debug, Clone)]
pub struct SummaryPageState {
    /// The key used to read the session cookie.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<SummaryPageState> for Key {
    fn from_ref(state: &SummaryPageState) -> Self {
        state.cookie_key.clone()
    }
}

/// The query parameters for the summary page.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// The month to summarise as "YYYY-MM". Defaults to the current month.
    pub month: Option<String>,
}

struct SummaryViewModel<'a> {
    username: Option<&'a str>,
    month: YearMonth,
    months: Vec<YearMonth>,
    total: Decimal,
    breakdown: Vec<MonthlyCategoryTotal>,
}

/// Render the summary for the month in the query, or the current month if none is given.
///
/// # Errors
/// Returns [Error::InvalidMonth] if the month is not "YYYY-MM".
pub async fn get_summary_page(
    State(state): State<SummaryPageState>,
    session: SessionState,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, Error> {
    session.user_id()?;

    let month = match query.month.as_deref().map(str::trim) {
        None | Some("") => YearMonth::from_date(local_today(&state.local_timezone)?),
        Some(month) => month.parse()?,
    };

    let connection = lock_connection(&state.db_connection)?;

    let total = monthly_total(&session, month, &connection)
        .inspect_err(|error| tracing::error!("Could not get total for {month}: {error}"))?;
    let breakdown = monthly_by_category(&session, month, &connection)
        .inspect_err(|error| tracing::error!("Could not get breakdown for {month}: {error}"))?;
    let mut months = available_months(&session, &connection)
        .inspect_err(|error| tracing::error!("Could not get available months: {error}"))?;

    if !months.contains(&month) {
        months.push(month);
        months.sort_by_key(|choice| Reverse((choice.year(), choice.month() as u8)));
    }

    let view_model = SummaryViewModel {
        username: session.username(),
        month,
        months,
        total,
        breakdown,
    };

    Ok(summary_view(view_model).into_response())
}

fn summary_view(view_model: SummaryViewModel<'_>) -> Markup {
    let nav_bar = NavBar::new(endpoints::SUMMARY_VIEW, view_model.username).into_html();
    let month = view_model.month;
    let month_url = |month: YearMonth| format!("{}?month={month}", endpoints::SUMMARY_VIEW);

    let mut head_elements = vec![];
    if !view_model.breakdown.is_empty() {
        let options = category_chart(&month.label(), &view_model.breakdown).to_string();
        head_elements.push(HeadElement::ScriptLink(
            "/static/echarts.6.0.0.min.js".to_owned(),
        ));
        head_elements.push(chart_script(&options));
    }

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Summary for " (month.label()) }

                    form method="get" action=(endpoints::SUMMARY_VIEW) class="flex gap-2 items-center"
                    {
                        a href=(month_url(month.previous())) class=(LINK_STYLE) { "Previous" }

                        label for="month" class="sr-only" { "Month" }
                        select
                            name="month"
                            id="month"
                            class=(FORM_TEXT_INPUT_STYLE)
                            onchange="this.form.submit()"
                        {
                            @for choice in &view_model.months {
                                option value=(choice) selected[*choice == month] { (choice.label()) }
                            }
                        }

                        @if month.next().year() <= 9999 {
                            a href=(month_url(month.next())) class=(LINK_STYLE) { "Next" }
                        }
                    }
                }

                p class="text-lg"
                {
                    "Total spent: "
                    span id="month-total" class="font-semibold tabular-nums"
                    {
                        (format_currency(view_model.total))
                    }
                }

                @if view_model.breakdown.is_empty() {
                    p
                    {
                        "No expenses in " (month.label()) ". "
                        (link(endpoints::NEW_EXPENSE_VIEW, "Add an expense"))
                    }
                } @else {
                    (chart_container())
                    (breakdown_table(&view_model.breakdown))
                }
            }
        }
    );

    base("Summary", &head_elements, &content)
}

fn breakdown_table(breakdown: &[MonthlyCategoryTotal]) -> Markup {
    html!(
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table id="breakdown" class="w-full text-sm text-left rtl:text-right
                text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Total" }
                    }
                }

                tbody
                {
                    @for row in breakdown {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                span class=(CATEGORY_BADGE_STYLE) { (row.category) }
                            }
                            td class={ (TABLE_CELL_STYLE) " text-right tabular-nums" }
                            {
                                (format_currency(row.total))
                            }
                        }
                    }
                }
            }
        }
    )
}
