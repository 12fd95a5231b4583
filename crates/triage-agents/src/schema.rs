//! Target schemas for JSON payloads
//!
//! Each schema lists canonical field names, the value shape expected, and
//! the source keys accepted as aliases. Keys are compared after removing
//! everything but letters and digits and lowercasing, so `orderId`,
//! `order_id` and `Order-ID` are the same key.

use serde_json::{Map, Value};
use triage_domain::Intent;

/// Shape a canonical field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string
    Text,
    /// JSON number
    Number,
    /// String or number
    Identifier,
    /// JSON array
    List,
    /// String or object
    TextOrObject,
}

impl FieldType {
    /// Whether `value` has this shape
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Identifier => value.is_string() || value.is_number(),
            FieldType::List => value.is_array(),
            FieldType::TextOrObject => value.is_string() || value.is_object(),
        }
    }

    /// Name used in anomaly reports
    pub fn describe(&self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Number => "number",
            FieldType::Identifier => "string or number",
            FieldType::List => "array",
            FieldType::TextOrObject => "string or object",
        }
    }
}

/// JSON type name of a value, for anomaly reports
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One canonical field
#[derive(Debug, Clone, Copy)]
pub struct SchemaField {
    /// Canonical name written to `fields`
    pub name: &'static str,
    /// Expected shape
    pub field_type: FieldType,
    /// Whether absence is reported
    pub required: bool,
    /// Accepted source keys, already normalized
    pub aliases: &'static [&'static str],
}

impl SchemaField {
    const fn required(name: &'static str, field_type: FieldType, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            field_type,
            required: true,
            aliases,
        }
    }

    const fn optional(name: &'static str, field_type: FieldType, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            field_type,
            required: false,
            aliases,
        }
    }

    /// Whether a normalized source key maps to this field
    pub fn matches(&self, normalized_key: &str) -> bool {
        normalize_key(self.name) == normalized_key || self.aliases.contains(&normalized_key)
    }
}

/// A named set of canonical fields
#[derive(Debug)]
pub struct TargetSchema {
    /// Schema name for chain details
    pub name: &'static str,
    /// Canonical fields; empty for the pass-through generic schema
    pub fields: &'static [SchemaField],
}

/// Purchase orders
pub static ORDER: TargetSchema = TargetSchema {
    name: "order",
    fields: &[
        SchemaField::required(
            "order_id",
            FieldType::Identifier,
            &["id", "ordernumber", "orderno", "ponumber", "po", "purchaseorder", "rfqnumber"],
        ),
        SchemaField::required(
            "customer",
            FieldType::TextOrObject,
            &["customername", "client", "buyer", "purchaser", "vendor"],
        ),
        SchemaField::required(
            "items",
            FieldType::List,
            &["products", "lineitems", "orderitems", "lines"],
        ),
        SchemaField::optional(
            "total_amount",
            FieldType::Number,
            &["total", "amount", "grandtotal", "ordertotal"],
        ),
        SchemaField::optional("currency", FieldType::Text, &["currencycode"]),
        SchemaField::optional(
            "order_date",
            FieldType::Text,
            &["date", "datesubmitted", "createdat", "orderedat"],
        ),
        SchemaField::optional(
            "delivery",
            FieldType::TextOrObject,
            &["deliveryrequirements", "shipping", "shippingaddress", "shipto"],
        ),
        SchemaField::optional(
            "notes",
            FieldType::Text,
            &["additionalnotes", "comments", "remarks"],
        ),
    ],
};

/// Stock records
pub static INVENTORY: TargetSchema = TargetSchema {
    name: "inventory",
    fields: &[
        SchemaField::required(
            "sku",
            FieldType::Identifier,
            &["itemid", "productid", "partnumber", "itemcode"],
        ),
        SchemaField::required(
            "quantity",
            FieldType::Number,
            &["qty", "onhand", "stock", "quantityonhand", "stocklevel"],
        ),
        SchemaField::optional("location", FieldType::Text, &["warehouse", "site", "bin"]),
        SchemaField::optional(
            "description",
            FieldType::Text,
            &["productname", "itemname", "title"],
        ),
        SchemaField::optional("unit_price", FieldType::Number, &["price", "cost", "unitcost"]),
        SchemaField::optional(
            "reorder_level",
            FieldType::Number,
            &["reorderpoint", "minstock", "minimumstock"],
        ),
    ],
};

/// Customer records
pub static CUSTOMER: TargetSchema = TargetSchema {
    name: "customer",
    fields: &[
        SchemaField::required(
            "customer_id",
            FieldType::Identifier,
            &["clientid", "accountid", "accountnumber"],
        ),
        SchemaField::required(
            "name",
            FieldType::Text,
            &["customername", "fullname", "clientname"],
        ),
        SchemaField::optional("email", FieldType::Text, &["emailaddress", "mail"]),
        SchemaField::optional("phone", FieldType::Text, &["phonenumber", "telephone", "mobile"]),
        SchemaField::optional(
            "address",
            FieldType::TextOrObject,
            &["billingaddress", "postaladdress"],
        ),
        SchemaField::optional(
            "company",
            FieldType::Text,
            &["organization", "organisation", "companyname"],
        ),
    ],
};

/// Pass-through schema: every key is kept as-is and nothing is required
pub static GENERIC: TargetSchema = TargetSchema {
    name: "generic",
    fields: &[],
};

/// Candidates for inference, in tie-break order
static INFERABLE: [&TargetSchema; 3] = [&ORDER, &INVENTORY, &CUSTOMER];

impl TargetSchema {
    /// Schema selected by intent, if the intent determines one
    pub fn for_intent(intent: Intent) -> Option<&'static TargetSchema> {
        match intent {
            Intent::Order | Intent::Rfq => Some(&ORDER),
            Intent::Inventory => Some(&INVENTORY),
            _ => None,
        }
    }

    /// Pick the schema matching the most payload keys; generic when none match
    pub fn infer(payload: &Map<String, Value>) -> &'static TargetSchema {
        let keys: Vec<String> = payload.keys().map(|k| normalize_key(k)).collect();

        let mut best: (&'static TargetSchema, usize) = (&GENERIC, 0);
        for schema in INFERABLE.iter().copied() {
            let hits = schema
                .fields
                .iter()
                .filter(|f| keys.iter().any(|k| f.matches(k)))
                .count();
            if hits > best.1 {
                best = (schema, hits);
            }
        }
        best.0
    }

    /// Whether this is the pass-through schema
    pub fn is_generic(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Letters and digits only, lowercased
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
