//! Billing-provider events as the reconciler sees them.
//!
//! Only the fields the reconciler reads are extracted: the subscription
//! status, its first line item's price id and the customer id (plus the
//! client reference on checkout sessions).

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventParseError {
    #[error("missing field `{0}` in event object")]
    MissingField(&'static str),
}

/// Snapshot of a provider subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    /// Price id of the first line item, if any.
    pub price_id: Option<String>,
}

impl SubscriptionSnapshot {
    pub fn from_object(object: &Value) -> Result<Self, EventParseError> {
        let id = str_field(object, "id").ok_or(EventParseError::MissingField("id"))?;
        let customer_id =
            id_of(&object["customer"]).ok_or(EventParseError::MissingField("customer"))?;
        let status = str_field(object, "status").ok_or(EventParseError::MissingField("status"))?;
        let price_id = object["items"]["data"]
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| id_of(&item["price"]));

        Ok(Self {
            id,
            customer_id,
            status,
            price_id,
        })
    }
}

/// Snapshot of a completed checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSnapshot {
    pub id: String,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    /// Echo of the reference we attached when creating the session (our user id).
    pub client_reference_id: Option<String>,
}

impl CheckoutSnapshot {
    pub fn from_object(object: &Value) -> Result<Self, EventParseError> {
        Ok(Self {
            id: str_field(object, "id").ok_or(EventParseError::MissingField("id"))?,
            customer_id: id_of(&object["customer"]),
            subscription_id: id_of(&object["subscription"]),
            client_reference_id: str_field(object, "client_reference_id")
                .filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSnapshot {
    pub id: String,
    pub customer_id: String,
}

impl InvoiceSnapshot {
    pub fn from_object(object: &Value) -> Result<Self, EventParseError> {
        Ok(Self {
            id: str_field(object, "id").ok_or(EventParseError::MissingField("id"))?,
            customer_id: id_of(&object["customer"])
                .ok_or(EventParseError::MissingField("customer"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    SubscriptionChanged(SubscriptionSnapshot),
    SubscriptionDeleted(SubscriptionSnapshot),
    CheckoutCompleted(CheckoutSnapshot),
    InvoicePaid(InvoiceSnapshot),
    InvoicePaymentFailed(InvoiceSnapshot),
    Unrecognized(String),
}

impl BillingEvent {
    /// Classify an event by its type and extract the payload it needs.
    pub fn parse(event_type: &str, object: &Value) -> Result<Self, EventParseError> {
        let event = match event_type {
            "customer.subscription.created" | "customer.subscription.updated" => {
                BillingEvent::SubscriptionChanged(SubscriptionSnapshot::from_object(object)?)
            }
            "customer.subscription.deleted" => {
                BillingEvent::SubscriptionDeleted(SubscriptionSnapshot::from_object(object)?)
            }
            "checkout.session.completed" => {
                BillingEvent::CheckoutCompleted(CheckoutSnapshot::from_object(object)?)
            }
            // invoice.payment_succeeded is the older name of invoice.paid
            "invoice.paid" | "invoice.payment_succeeded" => {
                BillingEvent::InvoicePaid(InvoiceSnapshot::from_object(object)?)
            }
            "invoice.payment_failed" => {
                BillingEvent::InvoicePaymentFailed(InvoiceSnapshot::from_object(object)?)
            }
            other => BillingEvent::Unrecognized(other.to_string()),
        };
        Ok(event)
    }
}

fn str_field(object: &Value, field: &str) -> Option<String> {
    object[field].as_str().map(str::to_string)
}

/// Stripe references are either a bare id or an expanded object with an `id`.
fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Object(map) => map
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subscription_object() -> Value {
        json!({
            "id": "sub_123",
            "customer": "cus_123",
            "status": "active",
            "items": { "data": [ { "id": "si_1", "price": { "id": "price_pro_m" } } ] }
        })
    }

    #[test]
    fn test_parses_subscription_updated() {
        let event = BillingEvent::parse("customer.subscription.updated", &subscription_object())
            .unwrap();
        assert_eq!(
            event,
            BillingEvent::SubscriptionChanged(SubscriptionSnapshot {
                id: "sub_123".into(),
                customer_id: "cus_123".into(),
                status: "active".into(),
                price_id: Some("price_pro_m".into()),
            })
        );
    }

    #[test]
    fn test_expanded_customer_object() {
        let mut object = subscription_object();
        object["customer"] = json!({ "id": "cus_expanded", "email": "a@b.c" });
        let snapshot = SubscriptionSnapshot::from_object(&object).unwrap();
        assert_eq!(snapshot.customer_id, "cus_expanded");
    }

    #[test]
    fn test_subscription_without_items_has_no_price() {
        let mut object = subscription_object();
        object["items"] = json!({ "data": [] });
        let snapshot = SubscriptionSnapshot::from_object(&object).unwrap();
        assert_eq!(snapshot.price_id, None);
    }

    #[test]
    fn test_subscription_without_customer_is_an_error() {
        let mut object = subscription_object();
        object["customer"] = Value::Null;
        assert_eq!(
            BillingEvent::parse("customer.subscription.created", &object),
            Err(EventParseError::MissingField("customer"))
        );
    }

    #[test]
    fn test_checkout_without_reference() {
        let object = json!({ "id": "cs_1", "customer": "cus_1", "subscription": "sub_1" });
        let BillingEvent::CheckoutCompleted(session) =
            BillingEvent::parse("checkout.session.completed", &object).unwrap()
        else {
            panic!("expected checkout event");
        };
        assert_eq!(session.client_reference_id, None);
        assert_eq!(session.subscription_id.as_deref(), Some("sub_1"));
    }

    #[test]
    fn test_both_invoice_paid_names() {
        let object = json!({ "id": "in_1", "customer": "cus_1" });
        for name in ["invoice.paid", "invoice.payment_succeeded"] {
            assert!(matches!(
                BillingEvent::parse(name, &object).unwrap(),
                BillingEvent::InvoicePaid(_)
            ));
        }
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        let event = BillingEvent::parse("charge.refunded", &json!({})).unwrap();
        assert_eq!(event, BillingEvent::Unrecognized("charge.refunded".into()));
    }
}
