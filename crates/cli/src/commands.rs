use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::json;

use tillbook_infra::{
    CategoryDirectory, InvoiceReconciler, JsonFileStore, ProductCatalog, SalesReports, Settings,
};
use tillbook_invoicing::{Customer, LineItemRequest};
use tillbook_reporting::SalesPeriod;

use crate::args::{
    CategoryCommands, InvoiceArgs, InvoiceCommands, ProductCommands, ReportCommands,
};

type Store = Arc<JsonFileStore>;

/// Services wired over one open document file.
pub struct CliContext {
    catalog: ProductCatalog<Store>,
    categories: CategoryDirectory<Store>,
    invoices: InvoiceReconciler<Store>,
    reports: SalesReports<Store>,
}

impl CliContext {
    pub fn open(settings: &Settings) -> Result<Self> {
        let store = Arc::new(
            JsonFileStore::open(&settings.data_file)
                .with_context(|| format!("failed to open {}", settings.data_file.display()))?,
        );
        Ok(Self {
            catalog: ProductCatalog::new(store.clone()),
            categories: CategoryDirectory::new(store.clone()),
            invoices: InvoiceReconciler::new(store.clone(), settings.policy)
                .with_number_retries(settings.number_retries),
            reports: SalesReports::new(store),
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn handle_category_command(context: &CliContext, command: CategoryCommands) -> Result<()> {
    match command {
        CategoryCommands::Add { name } => print_json(&context.categories.add(&name)?),
        CategoryCommands::List => print_json(&context.categories.list()?),
        CategoryCommands::Rename { id, name } => {
            print_json(&context.categories.rename(id, &name)?)
        }
        CategoryCommands::Delete { id } => print_json(&context.categories.delete(id)?),
    }
}

pub fn handle_product_command(context: &CliContext, command: ProductCommands) -> Result<()> {
    let catalog = &context.catalog;
    match command {
        ProductCommands::Add(fields) => print_json(&catalog.add_product(fields.into())?),
        ProductCommands::List => print_json(&json!({
            "count": catalog.count()?,
            "products": catalog.list()?,
        })),
        ProductCommands::Search { query } => print_json(&catalog.search(&query)?),
        ProductCommands::Update { id, fields } => {
            print_json(&catalog.update_product(id, fields.into())?)
        }
        ProductCommands::Restock { name, amount } => {
            print_json(&catalog.restock(&name, amount)?)
        }
        ProductCommands::Delete { id } => print_json(&catalog.delete_product(id)?),
    }
}

/// Turn `--item` values into requests. Items given without a price sell at
/// the current catalog price.
fn line_requests(context: &CliContext, args: &InvoiceArgs) -> Result<Vec<LineItemRequest>> {
    args.items
        .iter()
        .map(|item| -> Result<LineItemRequest> {
            let unit_price = match item.unit_price {
                Some(price) => price,
                None => context
                    .catalog
                    .find_by_name(&item.product_name)?
                    .map(|p| p.price())
                    .unwrap_or_default(),
            };
            Ok(LineItemRequest::new(
                item.product_name.as_str(),
                item.quantity,
                unit_price,
            ))
        })
        .collect()
}

pub fn handle_invoice_command(context: &CliContext, command: InvoiceCommands) -> Result<()> {
    let invoices = &context.invoices;
    match command {
        InvoiceCommands::Create(args) => {
            let items = line_requests(context, &args)?;
            let customer = Customer::new(args.customer, args.contact);
            print_json(&invoices.create(&items, customer, args.paid)?)
        }
        InvoiceCommands::Update { id, invoice } => {
            let items = line_requests(context, &invoice)?;
            let customer = Customer::new(invoice.customer, invoice.contact);
            print_json(&invoices.update(id, &items, customer, invoice.paid)?)
        }
        InvoiceCommands::Delete { id } => print_json(&invoices.delete(id)?),
        InvoiceCommands::List { customer } => match customer {
            Some(fragment) => print_json(&invoices.search_by_customer(&fragment)?),
            None => print_json(&invoices.list()?),
        },
        InvoiceCommands::Show { id } => print_json(&invoices.get(id)?),
    }
}

pub fn handle_report_command(context: &CliContext, command: ReportCommands) -> Result<()> {
    let reports = &context.reports;
    let now = Utc::now();
    let period = match command {
        ReportCommands::Summary => {
            return print_json(&json!({
                "total_sales": reports.total_sales()?,
                "today": reports.summary(&SalesPeriod::today(now))?,
                "this_month": reports.summary(&SalesPeriod::current_month(now))?,
            }));
        }
        ReportCommands::Day { date } => match date {
            Some(date) => SalesPeriod::Day { date },
            None => SalesPeriod::today(now),
        },
        ReportCommands::Month { year, month } => {
            SalesPeriod::month(year.unwrap_or(now.year()), month.unwrap_or(now.month()))?
        }
        ReportCommands::Months { year, start, end } => SalesPeriod::month_range(year, start, end)?,
        ReportCommands::Range { start, end } => SalesPeriod::date_range(start, end)?,
    };
    print_json(&reports.report(&period)?)
}
