use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use validator::Validate;

use crate::envelope;
use crate::error::ApiResult;
use crate::forms::{NameDraft, NewsDraft, ProductDraft, UserDraft, VoucherDraft};
use crate::handlers::client::ApiClient;
use crate::models::{Brand, Category, Listing, News, Order, Product, Review, User, Voucher};
use crate::pagination::PAGE_SIZE;
use crate::session::RequestContext;

pub const NO_QUERY: [(&str, &str); 0] = [];

/// A table column: JSON key of the serialized row and its header.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

const fn col(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

/// A backend collection the dashboard lists.
pub trait Resource: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Path of the list endpoint, relative to the API base.
    const PATH: &'static str;
    /// Key of the item array inside the `data` envelope.
    const KEY: &'static str;
    /// Prefix for `PATCH`/`DELETE /<prefix>/:id`.
    const MUTATION_PATH: &'static str = Self::PATH;
    const TITLE: &'static str;
    const COLUMNS: &'static [Column];

    fn id(&self) -> &str;

    /// Row handed to the table template, keyed by [`Column::key`].
    fn row(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A resource the dashboard can create or edit through a form.
pub trait Editable: Resource {
    type Draft: Serialize
        + DeserializeOwned
        + Validate
        + Clone
        + Default
        + PartialEq
        + Send
        + Sync
        + 'static;

    const CREATABLE: bool = true;

    fn draft(&self) -> Self::Draft;
}

pub async fn fetch_page<R: Resource>(
    api: &ApiClient,
    ctx: &RequestContext,
    page: u32,
) -> ApiResult<Listing<R>> {
    let body = api
        .get(ctx, R::PATH, &[("page", page.max(1)), ("limit", PAGE_SIZE)])
        .await?;
    envelope::normalize(R::KEY, body)
}

/// Unpaginated lookup (brands, categories).
pub async fn fetch_all<R: Resource>(api: &ApiClient, ctx: &RequestContext) -> ApiResult<Listing<R>> {
    let body = api.get(ctx, R::PATH, &NO_QUERY).await?;
    envelope::normalize(R::KEY, body)
}

pub async fn create<R: Editable>(
    api: &ApiClient,
    ctx: &RequestContext,
    draft: &R::Draft,
) -> ApiResult<()> {
    api.send_json(ctx, Method::POST, R::PATH, draft).await?;
    log::info!("Created {} entry", R::KEY);
    Ok(())
}

pub async fn update<R: Editable>(
    api: &ApiClient,
    ctx: &RequestContext,
    id: &str,
    draft: &R::Draft,
) -> ApiResult<()> {
    let path = ApiClient::item_path(R::MUTATION_PATH, id);
    api.send_json(ctx, Method::PATCH, &path, draft).await?;
    log::info!("Updated {} {}", R::KEY, id);
    Ok(())
}

pub async fn delete<R: Resource>(api: &ApiClient, ctx: &RequestContext, id: &str) -> ApiResult<()> {
    let path = ApiClient::item_path(R::MUTATION_PATH, id);
    api.delete(ctx, &path).await?;
    log::info!("Deleted {} {}", R::KEY, id);
    Ok(())
}

impl Resource for Product {
    const PATH: &'static str = "products";
    const KEY: &'static str = "products";
    const TITLE: &'static str = "Products";
    const COLUMNS: &'static [Column] = &[
        col("nameProduct", "Name"),
        col("priceProduct", "Price"),
        col("quantity", "Quantity"),
        col("brandName", "Brand"),
        col("categoryName", "Category"),
        col("soldCount", "Sold"),
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Product {
    type Draft = ProductDraft;

    fn draft(&self) -> ProductDraft {
        ProductDraft {
            name_product: self.name_product.clone(),
            price_product: self.price_product,
            quantity: self.quantity,
            description: self.description.clone(),
            brand_id: self.brand_id.clone(),
            category_id: self.category_id.clone(),
        }
    }
}

impl Resource for Category {
    const PATH: &'static str = "categories";
    const KEY: &'static str = "categories";
    const TITLE: &'static str = "Categories";
    const COLUMNS: &'static [Column] = &[col("name", "Name")];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Category {
    type Draft = NameDraft;

    fn draft(&self) -> NameDraft {
        NameDraft {
            name: self.name.clone(),
        }
    }
}

impl Resource for Brand {
    const PATH: &'static str = "brands";
    const KEY: &'static str = "brands";
    const TITLE: &'static str = "Brands";
    const COLUMNS: &'static [Column] = &[col("name", "Name")];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Brand {
    type Draft = NameDraft;

    fn draft(&self) -> NameDraft {
        NameDraft {
            name: self.name.clone(),
        }
    }
}

impl Resource for Order {
    const PATH: &'static str = "orders";
    const KEY: &'static str = "orders";
    const TITLE: &'static str = "Orders";
    const COLUMNS: &'static [Column] = &[
        col("_id", "ID"),
        col("userName", "Customer"),
        col("totalAmount", "Total"),
        col("date", "Date"),
        col("status", "Status"),
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for User {
    const PATH: &'static str = "users";
    const KEY: &'static str = "users";
    const MUTATION_PATH: &'static str = "admin/users";
    const TITLE: &'static str = "Users";
    const COLUMNS: &'static [Column] = &[
        col("name", "Name"),
        col("email", "Email"),
        col("phoneNumber", "Phone"),
        col("address", "Address"),
        col("role", "Role"),
        col("status", "Status"),
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for User {
    type Draft = UserDraft;

    // Accounts are created by sign-up, never from the admin table.
    const CREATABLE: bool = false;

    fn draft(&self) -> UserDraft {
        UserDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
            role: self.role,
            status: self.status,
        }
    }
}

impl Resource for Review {
    const PATH: &'static str = "reviews";
    const KEY: &'static str = "reviews";
    const MUTATION_PATH: &'static str = "product-reviews";
    const TITLE: &'static str = "Reviews";
    const COLUMNS: &'static [Column] = &[
        col("productName", "Product"),
        col("userName", "User"),
        col("rating", "Rating"),
        col("comment", "Comment"),
        col("createdAt", "Created"),
        col("reply", "Admin reply"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn row(&self) -> Value {
        json!({
            "_id": self.id,
            "productName": self.id_product.as_ref().map(|p| p.name_product.as_str()).unwrap_or("N/A"),
            "userName": self.id_user.as_ref().map(|u| u.name.as_str()).unwrap_or("N/A"),
            "rating": self.rating,
            "comment": self.comment,
            "createdAt": self.created_at,
            "reply": self.admin_reply.as_ref().map(|r| r.content.as_str()),
        })
    }
}

impl Resource for Voucher {
    const PATH: &'static str = "vouchers";
    const KEY: &'static str = "vouchers";
    const TITLE: &'static str = "Vouchers";
    const COLUMNS: &'static [Column] = &[
        col("code", "Code"),
        col("discount", "Discount (%)"),
        col("expiryDate", "Expires"),
        col("status", "Status"),
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for Voucher {
    type Draft = VoucherDraft;

    fn draft(&self) -> VoucherDraft {
        VoucherDraft {
            code: self.code.clone(),
            discount: self.discount,
            // Date inputs only take the `YYYY-MM-DD` part.
            expiry_date: self
                .expiry_date
                .split('T')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl Resource for News {
    const PATH: &'static str = "news";
    const KEY: &'static str = "news";
    const TITLE: &'static str = "News";
    const COLUMNS: &'static [Column] = &[
        col("title", "Title"),
        col("content", "Content"),
        col("image", "Image"),
        col("createdAt", "Created"),
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Editable for News {
    type Draft = NewsDraft;

    fn draft(&self) -> NewsDraft {
        NewsDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            image: self.image.clone(),
        }
    }
}
