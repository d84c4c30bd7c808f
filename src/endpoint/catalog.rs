//! Built-in endpoint descriptors for the quickstart demo products

use super::{transform, Category, EndpointDescriptor, Transform};

fn descriptor(
    endpoint: &str,
    name: &str,
    schema: &str,
    description: &str,
    categories: &[(&str, &str)],
    transform: Transform,
) -> EndpointDescriptor {
    EndpointDescriptor {
        endpoint: endpoint.to_string(),
        name: Some(name.to_string()),
        categories: categories
            .iter()
            .map(|(title, field)| Category::new(title, field))
            .collect(),
        schema: schema.to_string(),
        description: description.to_string(),
        transform,
    }
}

/// All demo endpoints, in display order
pub fn builtin() -> Vec<EndpointDescriptor> {
    vec![
        descriptor(
            "auth",
            "Auth",
            "/auth/get/",
            "Retrieve account and routing numbers for checking and savings accounts.",
            &[
                ("Name", "name"),
                ("Balance", "balance"),
                ("Account #", "account"),
                ("Routing #", "routing"),
            ],
            transform::auth,
        ),
        descriptor(
            "transactions",
            "Transactions",
            "/transactions/sync/",
            "Retrieve transactions or incremental updates for credit and depository accounts.",
            &[("Name", "name"), ("Amount", "amount"), ("Date", "date")],
            transform::transactions,
        ),
        descriptor(
            "identity",
            "Identity",
            "/identity/get/",
            "Retrieve names, emails, phone numbers and addresses held by the bank.",
            &[
                ("Names", "names"),
                ("Emails", "emails"),
                ("Phone Numbers", "phoneNumbers"),
                ("Addresses", "addresses"),
            ],
            transform::identity,
        ),
        descriptor(
            "balance",
            "Balance",
            "/accounts/balance/get/",
            "Check balances in real time to prevent non-sufficient funds fees.",
            &[("Name", "name"), ("Balance", "balance"), ("Subtype", "subtype"), ("Mask", "mask")],
            transform::balance_accounts,
        ),
        descriptor(
            "item",
            "Item",
            "/item/get/",
            "Retrieve information about the linked item, including available and billed products.",
            &[
                ("Institution Name", "name"),
                ("Billed Products", "billedProducts"),
                ("Available Products", "availableProducts"),
                ("Institution ID", "id"),
            ],
            transform::item,
        ),
        descriptor(
            "assets",
            "Assets",
            "/asset_report/get/",
            "Create and retrieve an asset report, including a downloadable PDF copy.",
            &[
                ("Account", "account"),
                ("Balance", "balance"),
                ("# Transactions", "transactions"),
                ("Days Available", "daysAvailable"),
            ],
            transform::assets,
        ),
    ]
}

/// Catalog entries restricted to `wanted`, keeping catalog order.
/// An empty filter keeps everything; unknown names are logged and skipped.
pub fn select(wanted: &[String]) -> Vec<EndpointDescriptor> {
    let all = builtin();
    if wanted.is_empty() {
        return all;
    }

    for name in wanted {
        if !all.iter().any(|d| &d.endpoint == name) {
            tracing::warn!("Unknown endpoint in config: {}", name);
        }
    }

    all.into_iter()
        .filter(|d| wanted.iter().any(|w| w == &d.endpoint))
        .collect()
}

/// Look up one endpoint by path segment
pub fn find(endpoint: &str) -> Option<EndpointDescriptor> {
    builtin().into_iter().find(|d| d.endpoint == endpoint)
}
