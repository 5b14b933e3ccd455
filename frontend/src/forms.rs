//! Editable fields of each entity, with advisory checks that mirror the
//! backend's rules. The backend stays authoritative.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use crate::models::{ActiveStatus, OrderStatus, UserRole};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn finite(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new("not_finite"));
    }
    Ok(())
}

/// HTML forms send empty inputs as `""`.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[validate(custom(function = "not_blank", message = "Product name must not be empty"))]
    pub name_product: String,
    #[validate(
        custom(function = "finite", message = "Price must be a number"),
        range(exclusive_min = 0.0, message = "Price must be greater than 0")
    )]
    pub price_product: f64,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub brand_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category_id: Option<String>,
}

impl ProductDraft {
    /// Builds the draft from multipart text fields; unparsable numbers are
    /// left for validation to reject.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let text = |name: &str| fields.get(name).map(|v| v.trim().to_string());
        let optional = |name: &str| text(name).filter(|v| !v.is_empty());
        Self {
            name_product: text("nameProduct").unwrap_or_default(),
            price_product: text("priceProduct")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|price| price.is_finite())
                .unwrap_or(0.0),
            quantity: text("quantity")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(-1),
            description: optional("description"),
            brand_id: optional("brandId"),
            category_id: optional("categoryId"),
        }
    }

    /// Text parts of a multipart request.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("nameProduct", self.name_product.clone()),
            ("priceProduct", self.price_product.to_string()),
            ("quantity", self.quantity.to_string()),
        ];
        if let Some(description) = &self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(brand_id) = &self.brand_id {
            fields.push(("brandId", brand_id.clone()));
        }
        if let Some(category_id) = &self.category_id {
            fields.push(("categoryId", category_id.clone()));
        }
        fields
    }
}

/// Brands and categories only carry a name.
#[derive(Serialize, Deserialize, Validate, Debug, Clone, Default, PartialEq)]
pub struct NameDraft {
    #[validate(custom(function = "not_blank", message = "Name must not be empty"))]
    pub name: String,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDraft {
    #[validate(custom(function = "not_blank", message = "Code must not be empty"))]
    pub code: String,
    #[validate(range(min = 1, max = 100, message = "Discount must be between 1 and 100"))]
    pub discount: u32,
    #[validate(length(min = 1, message = "Expiry date is required"))]
    pub expiry_date: String,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    #[validate(custom(function = "not_blank", message = "Name must not be empty"))]
    pub name: String,
    #[validate(email(message = "Email is not valid"))]
    pub email: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub address: Option<String>,
    pub role: UserRole,
    pub status: ActiveStatus,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, Default, PartialEq)]
pub struct NewsDraft {
    #[validate(custom(function = "not_blank", message = "Title must not be empty"))]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "Content must not be empty"))]
    pub content: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Image must be a URL"))]
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OrderStatusForm {
    pub status: OrderStatus,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, Default, PartialEq)]
pub struct ReplyForm {
    #[validate(custom(function = "not_blank", message = "Reply must not be empty"))]
    pub content: String,
    /// Set when the review already has a reply, which is then patched.
    #[serde(default, skip_serializing)]
    pub existing: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct VoucherStatusForm {
    pub status: ActiveStatus,
}

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct LoginForm {
    #[validate(email(message = "Email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[validate(custom(function = "not_blank", message = "Name must not be empty"))]
    pub name: String,
    #[validate(email(message = "Email is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,
}

/// Delete confirmation posted by the confirm page.
#[derive(Deserialize, Debug, Default)]
pub struct ConfirmForm {
    pub confirm: Option<String>,
}

/// Advisory check: the error message lists every failed rule.
pub fn check<T: Validate>(form: &T) -> Result<(), ApiError> {
    form.validate().map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: f64, quantity: i64) -> ProductDraft {
        ProductDraft {
            name_product: name.to_string(),
            price_product: price,
            quantity,
            description: None,
            brand_id: None,
            category_id: None,
        }
    }

    #[test]
    fn product_rules_mirror_the_backend() {
        assert!(check(&product("Shoe", 10.0, 0)).is_ok());

        let err = check(&product("  ", 10.0, 1)).unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation("Product name must not be empty".to_string())
        );
        assert!(check(&product("Shoe", 0.0, 1)).is_err());
        assert!(check(&product("Shoe", 5.0, -1)).is_err());
    }

    #[test]
    fn product_fields_parse_and_drop_empty_optionals() {
        let fields: HashMap<String, String> = [
            ("nameProduct", " Shoe "),
            ("priceProduct", "12.5"),
            ("quantity", "3"),
            ("brandId", ""),
            ("categoryId", "c1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let draft = ProductDraft::from_fields(&fields);
        assert_eq!(draft.name_product, "Shoe");
        assert_eq!(draft.price_product, 12.5);
        assert_eq!(draft.quantity, 3);
        assert_eq!(draft.brand_id, None);
        assert_eq!(draft.category_id.as_deref(), Some("c1"));
        assert!(
            draft
                .text_fields()
                .iter()
                .any(|(k, v)| *k == "categoryId" && v == "c1")
        );
    }

    #[test]
    fn non_finite_prices_are_rejected() {
        for price in ["NaN", "inf", "-infinity"] {
            let fields: HashMap<String, String> =
                [("nameProduct", "Shoe"), ("priceProduct", price), ("quantity", "1")]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
            let draft = ProductDraft::from_fields(&fields);
            assert!(draft.price_product.is_finite(), "{price}");
            assert!(check(&draft).is_err(), "{price}");
        }

        assert!(check(&product("Shoe", f64::NAN, 1)).is_err());
        assert!(check(&product("Shoe", f64::INFINITY, 1)).is_err());
    }

    #[test]
    fn garbage_quantity_fails_validation() {
        let fields: HashMap<String, String> = [("nameProduct", "Shoe"), ("priceProduct", "1"), ("quantity", "x")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(check(&ProductDraft::from_fields(&fields)).is_err());
    }

    #[test]
    fn voucher_discount_is_a_percentage() {
        let voucher = VoucherDraft {
            code: "SALE".to_string(),
            discount: 0,
            expiry_date: "2025-01-01".to_string(),
        };
        assert!(check(&voucher).is_err());
        assert!(
            check(&VoucherDraft {
                discount: 15,
                ..voucher
            })
            .is_ok()
        );
    }

    #[test]
    fn empty_form_inputs_become_none() {
        let draft: NewsDraft =
            serde_json::from_str(r#"{"title":"Hi","content":"Body","image":""}"#).unwrap();
        assert_eq!(draft.image, None);
        assert!(check(&draft).is_ok());
    }
}
