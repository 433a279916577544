//! Sales Dataset Schema
//! Raw CSV column names, their display names, and the payment translation table.

use polars::prelude::*;

/// Column names as they appear in the CSV header.
pub mod raw {
    pub const INVOICE_ID: &str = "Invoice ID";
    pub const BRANCH: &str = "Branch";
    pub const CITY: &str = "City";
    pub const CUSTOMER_TYPE: &str = "Customer type";
    pub const GENDER: &str = "Gender";
    pub const PRODUCT_LINE: &str = "Product line";
    pub const UNIT_PRICE: &str = "Unit price";
    pub const QUANTITY: &str = "Quantity";
    pub const TAX: &str = "Tax 5%";
    pub const TOTAL: &str = "Total";
    pub const DATE: &str = "Date";
    pub const TIME: &str = "Time";
    pub const PAYMENT: &str = "Payment";
    pub const COGS: &str = "cogs";
    pub const GROSS_MARGIN: &str = "gross margin percentage";
    pub const GROSS_INCOME: &str = "gross income";
    pub const RATING: &str = "Rating";
    /// Derived during load, never read from the file.
    pub const MONTH: &str = "Month";
}

/// Column names of the loaded table.
pub mod display {
    pub const INVOICE_ID: &str = "ID da Fatura";
    pub const BRANCH: &str = "Filial";
    pub const CITY: &str = "Cidade";
    pub const CUSTOMER_TYPE: &str = "Tipo de Cliente";
    pub const GENDER: &str = "Gênero";
    pub const PRODUCT_LINE: &str = "Linha de Produto";
    pub const UNIT_PRICE: &str = "Preço Unitário";
    pub const QUANTITY: &str = "Quantidade";
    pub const TAX: &str = "Imposto 5%";
    pub const TOTAL: &str = "Total";
    pub const DATE: &str = "Data";
    pub const TIME: &str = "Hora";
    pub const PAYMENT: &str = "Pagamento";
    pub const COGS: &str = "CMV";
    pub const GROSS_MARGIN: &str = "Margem Bruta %";
    pub const GROSS_INCOME: &str = "Lucro Bruto";
    pub const RATING: &str = "Avaliação";
    pub const MONTH: &str = "Mês";
}

/// Raw -> display column mapping, in file order, followed by the derived month.
pub const COLUMN_RENAMES: [(&str, &str); 18] = [
    (raw::INVOICE_ID, display::INVOICE_ID),
    (raw::BRANCH, display::BRANCH),
    (raw::CITY, display::CITY),
    (raw::CUSTOMER_TYPE, display::CUSTOMER_TYPE),
    (raw::GENDER, display::GENDER),
    (raw::PRODUCT_LINE, display::PRODUCT_LINE),
    (raw::UNIT_PRICE, display::UNIT_PRICE),
    (raw::QUANTITY, display::QUANTITY),
    (raw::TAX, display::TAX),
    (raw::TOTAL, display::TOTAL),
    (raw::DATE, display::DATE),
    (raw::TIME, display::TIME),
    (raw::PAYMENT, display::PAYMENT),
    (raw::COGS, display::COGS),
    (raw::GROSS_MARGIN, display::GROSS_MARGIN),
    (raw::GROSS_INCOME, display::GROSS_INCOME),
    (raw::RATING, display::RATING),
    (raw::MONTH, display::MONTH),
];

/// Known payment methods and their display labels.
pub const PAYMENT_LABELS: [(&str, &str); 3] = [
    ("Ewallet", "Carteira Digital"),
    ("Credit card", "Cartão de Crédito"),
    ("Cash", "Dinheiro"),
];

/// Translate a raw payment method. Unknown values are returned unchanged.
pub fn translate_payment(value: &str) -> &str {
    PAYMENT_LABELS
        .iter()
        .find(|(raw, _)| *raw == value)
        .map(|(_, label)| *label)
        .unwrap_or(value)
}

/// Dtypes the CSV reader must produce for each raw column.
///
/// The date is read as text and parsed separately so that the configured
/// layout is applied strictly.
pub fn raw_schema() -> Schema {
    let columns = [
        (raw::INVOICE_ID, DataType::String),
        (raw::BRANCH, DataType::String),
        (raw::CITY, DataType::String),
        (raw::CUSTOMER_TYPE, DataType::String),
        (raw::GENDER, DataType::String),
        (raw::PRODUCT_LINE, DataType::String),
        (raw::UNIT_PRICE, DataType::Float64),
        (raw::QUANTITY, DataType::Int64),
        (raw::TAX, DataType::Float64),
        (raw::TOTAL, DataType::Float64),
        (raw::DATE, DataType::String),
        (raw::TIME, DataType::String),
        (raw::PAYMENT, DataType::String),
        (raw::COGS, DataType::Float64),
        (raw::GROSS_MARGIN, DataType::Float64),
        (raw::GROSS_INCOME, DataType::Float64),
        (raw::RATING, DataType::Float64),
    ];

    let mut schema = Schema::with_capacity(columns.len());
    for (name, dtype) in columns {
        schema.with_column(name.into(), dtype);
    }
    schema
}
