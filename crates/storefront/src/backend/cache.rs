//! Cache types for catalog responses.

use nightcap_core::{BusinessId, CategoryId, ItemId};

use super::types::{Business, Category, Item};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Businesses,
    Categories(BusinessId),
    Items {
        business_id: BusinessId,
        category_id: CategoryId,
    },
    Item(ItemId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Businesses(Vec<Business>),
    Categories(Vec<Category>),
    Items(Vec<Item>),
    Item(Box<Item>),
}
