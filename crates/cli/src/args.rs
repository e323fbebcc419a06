use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use tillbook_catalog::NewProduct;
use tillbook_core::{CategoryId, InvoiceId, ProductId};
use tillbook_observability::LogFormat;

#[derive(Parser)]
#[command(name = "tillbook", about = "Point-of-sale back office: catalog, invoices, sales reports", version)]
pub struct Cli {
    #[arg(long, global = true, help = "JSON document holding the shop data (overrides TILLBOOK_DATA_FILE)")]
    pub data_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Log output: json or pretty (overrides TILLBOOK_LOG_FORMAT)")]
    pub log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    Category(CategoryCommands),
    #[command(subcommand)]
    Product(ProductCommands),
    #[command(subcommand)]
    Invoice(InvoiceCommands),
    #[command(subcommand)]
    Report(ReportCommands),
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    Add {
        name: String,
    },
    List,
    Rename {
        id: CategoryId,
        name: String,
    },
    Delete {
        id: CategoryId,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    Add(ProductArgs),
    List,
    /// Case-insensitive search on product names.
    Search {
        query: String,
    },
    /// Replace every editable field of a product.
    Update {
        id: ProductId,
        #[command(flatten)]
        fields: ProductArgs,
    },
    Restock {
        name: String,
        amount: i64,
    },
    Delete {
        id: ProductId,
    },
}

#[derive(Args)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub company: String,
    #[arg(long)]
    pub category: String,
    #[arg(long, default_value_t = 0)]
    pub quantity: i64,
    #[arg(long, help = "Sale price in the smallest currency unit")]
    pub price: u64,
    #[arg(long, help = "Cost price in the smallest currency unit")]
    pub actual_price: u64,
}

impl From<ProductArgs> for NewProduct {
    fn from(args: ProductArgs) -> Self {
        NewProduct {
            name: args.name,
            company: args.company,
            category: args.category,
            quantity: args.quantity,
            price: args.price,
            actual_price: args.actual_price,
        }
    }
}

#[derive(Subcommand)]
pub enum InvoiceCommands {
    Create(InvoiceArgs),
    Update {
        id: InvoiceId,
        #[command(flatten)]
        invoice: InvoiceArgs,
    },
    Delete {
        id: InvoiceId,
    },
    List {
        #[arg(long, help = "Only invoices whose customer name contains this text")]
        customer: Option<String>,
    },
    Show {
        id: InvoiceId,
    },
}

#[derive(Args)]
pub struct InvoiceArgs {
    #[arg(
        long = "item",
        required = true,
        help = "Line item as NAME:QTY or NAME:QTY:UNIT_PRICE (repeatable); price defaults to the catalog price"
    )]
    pub items: Vec<ItemArg>,
    #[arg(long, default_value = "")]
    pub customer: String,
    #[arg(long, default_value = "")]
    pub contact: String,
    #[arg(long, default_value_t = 0)]
    pub paid: u64,
}

/// One `--item` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemArg {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Option<u64>,
}

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let (name, quantity, price) = match parts.as_slice() {
            [name, quantity] => (*name, *quantity, None),
            [name, quantity, price] => (*name, *quantity, Some(*price)),
            _ => return Err(format!("expected NAME:QTY[:UNIT_PRICE], got {s:?}")),
        };
        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("bad quantity in {s:?}: {e}"))?;
        let unit_price = price
            .map(|p| p.trim().parse::<u64>())
            .transpose()
            .map_err(|e| format!("bad unit price in {s:?}: {e}"))?;
        Ok(Self {
            product_name: name.trim().to_string(),
            quantity,
            unit_price,
        })
    }
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// All-time total plus today's and this month's figures.
    Summary,
    /// One UTC calendar day (today when omitted).
    Day {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// One month (the current month when omitted).
    Month {
        #[arg(long, requires = "month")]
        year: Option<i32>,
        #[arg(long, requires = "year")]
        month: Option<u32>,
    },
    /// Months START..=END of one year.
    Months {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
    },
    /// Calendar days START..=END.
    Range {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}
