//! The bar chart of a month's spending per category.
//!
//! The chart is generated as JSON configuration for the ECharts library and
//! rendered with an HTML container and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::bar::Bar,
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::prelude::ToPrimitive;

use crate::{html::HeadElement, summary::MonthlyCategoryTotal};

/// The HTML element ID of the chart container.
pub(super) const CATEGORY_CHART_ID: &str = "category-chart";

/// Renders the HTML container for the category chart.
pub(super) fn chart_container() -> Markup {
    html!(
        section id="charts" class="w-full mx-auto mb-4"
        {
            div
                id=(CATEGORY_CHART_ID)
                class="min-h-[380px] rounded dark:bg-gray-100"
            {}
        }
    )
}

/// Generates JavaScript that initializes the chart with `options` once the page has loaded.
///
/// The chart follows the browser's dark mode setting and resizes with the window.
pub(super) fn chart_script(options: &str) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chartDom = document.getElementById("{CATEGORY_CHART_ID}");
            const chart = echarts.init(chartDom);
            const option = {options};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }});"#
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

/// A bar per category, in the order given.
pub(super) fn category_chart(month_label: &str, totals: &[MonthlyCategoryTotal]) -> Chart {
    let labels = totals
        .iter()
        .map(|row| row.category.clone())
        .collect::<Vec<_>>();
    let values = totals
        .iter()
        .map(|row| row.total.to_f64().unwrap_or_default())
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Spending by category")
                .subtext(month_label),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Spent").data(values))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}
