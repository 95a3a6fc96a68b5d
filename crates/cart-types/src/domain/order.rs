use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Cancelled,
    Completed,
}

/// Customer contact fields collected by the checkout form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl CustomerInfo {
    /// First required field that is blank, in form order. Checkout
    /// short-circuits on it with a field-specific message.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("zip_code", &self.zip_code),
        ];
        required
            .iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
    }
}

/// One snapshot line copied from the cart at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// The order-creation payload. Built once per checkout; the client holds no
/// mutable reference to the order afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDraft {
    pub customer: CustomerInfo,
    pub website_slug: String,
    pub website_name: String,
    pub items: Vec<OrderLine>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderReceipt {
    pub id: String,
    pub status: OrderStatus,
}
