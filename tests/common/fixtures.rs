use quire::{Band, Group, ReportDefinition, SubReport};
use serde_json::{Value, json};

/// Orders of two regions with three rows each.
pub fn two_regions() -> Value {
    json!({
        "orders": [
            {"Region": "North", "Customer": "a", "Amount": 10},
            {"Region": "North", "Customer": "b", "Amount": 20},
            {"Region": "North", "Customer": "b", "Amount": 30},
            {"Region": "South", "Customer": "c", "Amount": 1},
            {"Region": "South", "Customer": "c", "Amount": 2},
            {"Region": "South", "Customer": "d", "Amount": 3}
        ],
        "lines": [
            {"Order": 1, "Sku": "x"},
            {"Order": 1, "Sku": "y"}
        ]
    })
}

/// `rows` orders spread over regions of `per_region` rows.
pub fn generated_orders(rows: usize, per_region: usize) -> Value {
    let orders: Vec<Value> = (0..rows)
        .map(|i| {
            json!({
                "Region": format!("R{}", i / per_region.max(1)),
                "Customer": format!("C{}", i % 3),
                "Amount": i
            })
        })
        .collect();
    json!({ "orders": orders })
}

pub fn by_region() -> ReportDefinition {
    ReportDefinition::new("sales", "orders")
        .with_report_header(Band::named("title").with_height(40.0))
        .with_group(
            Group::relational("region", ["Region"])
                .with_header(Band::named("region-header").with_height(20.0))
                .with_footer(Band::named("region-footer").with_height(20.0)),
        )
        .with_item_band(Band::named("order").with_height(12.0))
        .with_report_footer(Band::named("summary").with_height(30.0))
}

pub fn by_region_and_customer() -> ReportDefinition {
    by_region().with_group(Group::relational("customer", ["Customer"]))
}

pub fn region_pivot() -> ReportDefinition {
    ReportDefinition::new("pivot", "sales")
        .with_group(Group::relational("all", Vec::<String>::new()))
        .with_group(Group::crosstab_rows("region", "Region"))
        .with_group(Group::crosstab_columns("year", "Year"))
}

pub fn pivot_data() -> Value {
    json!({
        "sales": [
            {"Region": "North", "Year": 2023, "Amount": 1},
            {"Region": "North", "Year": 2024, "Amount": 2},
            {"Region": "South", "Year": 2023, "Amount": 3},
            {"Region": "South", "Year": 2024, "Amount": 4}
        ]
    })
}

/// Orders with a line-items sub-report in the item band.
pub fn orders_with_lines() -> ReportDefinition {
    let lines = ReportDefinition::new("lines", "lines").with_item_band(Band::named("line").with_height(10.0));
    ReportDefinition::new("orders", "orders")
        .with_item_band(
            Band::named("order")
                .with_height(12.0)
                .with_subreport(SubReport::new(lines).with_parameter("Customer", "customer")),
        )
}
