//! Keeps the dashboard's view of each collection in step with the backend.

pub mod cache;
pub mod draft;
pub mod reconcile;
pub mod view;

use crate::handlers::resource::Resource;
use crate::models::{Brand, Category, News, Order, Product, Review, User, Voucher};
use cache::CollectionCache;

/// One fetch cache per resource, shared by all workers. Entries are keyed by
/// the token they were fetched with.
pub struct Caches {
    pub products: CollectionCache<Product>,
    pub categories: CollectionCache<Category>,
    pub brands: CollectionCache<Brand>,
    pub orders: CollectionCache<Order>,
    pub users: CollectionCache<User>,
    pub reviews: CollectionCache<Review>,
    pub vouchers: CollectionCache<Voucher>,
    pub news: CollectionCache<News>,
}

impl Default for Caches {
    fn default() -> Self {
        Self {
            products: CollectionCache::new(Product::PATH),
            categories: CollectionCache::new(Category::PATH),
            brands: CollectionCache::new(Brand::PATH),
            orders: CollectionCache::new(Order::PATH),
            users: CollectionCache::new(User::PATH),
            reviews: CollectionCache::new(Review::PATH),
            vouchers: CollectionCache::new(Voucher::PATH),
            news: CollectionCache::new(News::PATH),
        }
    }
}

impl Caches {
    /// Cache of `R`, for generic routes.
    pub fn of<R>(&self) -> &CollectionCache<R>
    where
        Self: HasCache<R>,
    {
        HasCache::<R>::cache(self)
    }

    /// Drops everything fetched with `token`; called on sign-out.
    pub fn forget_owner(&self, token: &str) {
        self.products.forget_owner(token);
        self.categories.forget_owner(token);
        self.brands.forget_owner(token);
        self.orders.forget_owner(token);
        self.users.forget_owner(token);
        self.reviews.forget_owner(token);
        self.vouchers.forget_owner(token);
        self.news.forget_owner(token);
    }
}

pub trait HasCache<R> {
    fn cache(&self) -> &CollectionCache<R>;
}

macro_rules! has_cache {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl HasCache<$ty> for Caches {
                fn cache(&self) -> &CollectionCache<$ty> {
                    &self.$field
                }
            }
        )*
    };
}

has_cache! {
    Product => products,
    Category => categories,
    Brand => brands,
    Order => orders,
    User => users,
    Review => reviews,
    Voucher => vouchers,
    News => news,
}
