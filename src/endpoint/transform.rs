//! Response -> row transforms for the built-in endpoints
//!
//! Each transform reads the product-specific part of a response body. Fields
//! that are missing or of the wrong type become empty cells.

use serde_json::Value;

use super::{Data, DataItem};

/// Separator for cells that hold several values (identity). Addresses and
/// names contain commas, so values are kept one per line.
pub const MULTI_VALUE_SEPARATOR: &str = "\n";

/// Separator for short inline lists such as product names
const LIST_SEPARATOR: &str = ", ";

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Money amounts with two decimals, blank when absent
fn amount(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_f64)
        .map(|v| format!("{:.2}", v))
        .unwrap_or_default()
}

/// Available balance, falling back to current
fn balance(account: &Value) -> String {
    let balances = account.get("balances");
    let available = balances.and_then(|b| b.get("available")).filter(|v| !v.is_null());
    let current = balances.and_then(|b| b.get("current"));
    amount(available.or(current))
}

fn row<const N: usize>(fields: [(&str, String); N]) -> DataItem {
    fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn find_account<'a>(accounts: &'a [Value], account_id: &str) -> Option<&'a Value> {
    accounts
        .iter()
        .find(|a| a.get("account_id").and_then(Value::as_str) == Some(account_id))
}

/// `/auth/get/`: ACH numbers joined with their account
pub fn auth(body: &Value) -> Data {
    let accounts = array(body, "accounts");
    let ach = body.get("numbers").map(|n| array(n, "ach")).unwrap_or(&[]);

    ach.iter()
        .map(|numbers| {
            let account_id = text(numbers, "account_id");
            let account = find_account(accounts, &account_id);
            row([
                ("name", account.map(|a| text(a, "name")).unwrap_or_default()),
                ("balance", account.map(balance).unwrap_or_default()),
                ("account", text(numbers, "account")),
                ("routing", text(numbers, "routing")),
            ])
        })
        .collect()
}

/// `/transactions/sync/`: most recent transactions
pub fn transactions(body: &Value) -> Data {
    array(body, "latest_transactions")
        .iter()
        .map(|t| {
            row([
                ("name", text(t, "name")),
                ("amount", amount(t.get("amount"))),
                ("date", text(t, "date")),
            ])
        })
        .collect()
}

fn join_data(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| text(v, "data"))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(MULTI_VALUE_SEPARATOR)
}

fn format_address(address: &Value) -> String {
    let Some(data) = address.get("data") else {
        return String::new();
    };
    let street = text(data, "street");
    let city = text(data, "city");
    let region = text(data, "region");
    let postal = text(data, "postal_code");
    if [&street, &city, &region, &postal].iter().all(|s| s.is_empty()) {
        return String::new();
    }
    format!("{} {}, {} {}", street, city, region, postal).trim().to_string()
}

/// `/identity/get/`: first listed owner of every account
pub fn identity(body: &Value) -> Data {
    array(body, "identity")
        .iter()
        .filter_map(|account| array(account, "owners").first())
        .map(|owner| {
            let names = array(owner, "names")
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_SEPARATOR);
            let addresses = array(owner, "addresses")
                .iter()
                .map(format_address)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_SEPARATOR);
            row([
                ("names", names),
                ("emails", join_data(array(owner, "emails"))),
                ("phoneNumbers", join_data(array(owner, "phone_numbers"))),
                ("addresses", addresses),
            ])
        })
        .collect()
}

/// `/accounts/balance/get/`
pub fn balance_accounts(body: &Value) -> Data {
    array(body, "accounts")
        .iter()
        .map(|a| {
            row([
                ("name", text(a, "name")),
                ("balance", balance(a)),
                ("subtype", text(a, "subtype")),
                ("mask", text(a, "mask")),
            ])
        })
        .collect()
}

fn product_list(item: Option<&Value>, key: &str) -> String {
    item.map(|i| {
        array(i, key)
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    })
    .unwrap_or_default()
}

/// `/item/get/`: a single row describing the linked item
pub fn item(body: &Value) -> Data {
    let item = body.get("item");
    let institution = body.get("institution");
    if item.is_none() && institution.is_none() {
        return Vec::new();
    }

    vec![row([
        ("name", institution.map(|i| text(i, "name")).unwrap_or_default()),
        ("billedProducts", product_list(item, "billed_products")),
        ("availableProducts", product_list(item, "available_products")),
        ("id", institution.map(|i| text(i, "institution_id")).unwrap_or_default()),
    ])]
}

/// `/asset_report/get/`: every account of every report item
pub fn assets(body: &Value) -> Data {
    let report = body.get("json").and_then(|j| j.get("report").or(Some(j)));
    let items = report.map(|r| array(r, "items")).unwrap_or(&[]);

    items
        .iter()
        .flat_map(|item| array(item, "accounts"))
        .map(|account| {
            row([
                ("account", text(account, "name")),
                ("balance", balance(account)),
                ("transactions", array(account, "transactions").len().to_string()),
                ("daysAvailable", text(account, "days_available")),
            ])
        })
        .collect()
}
