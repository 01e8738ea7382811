//! Shopping cart.
//!
//! A plain list of lines with a stock-ceiling guard. The cart lives in the
//! visitor's session under [`keys::CART`] and is re-serialized in full after
//! every mutation (see [`mutate`]).
//!
//! Totals computed here are for display only. The backend prices the order
//! again at checkout and its numbers are the ones the customer pays.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use nightcap_core::{BusinessId, ItemId, ModifierId, ModifierPricing, Price};

use crate::backend::Item;
use crate::persistence::{self, PersistenceError, keys};

/// A modifier chosen for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedModifier {
    pub id: ModifierId,
    pub name: String,
    pub price: Price,
    pub pricing: ModifierPricing,
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub item_id: ItemId,
    pub business_id: BusinessId,
    pub name: String,
    pub image_url: Option<String>,
    /// Base unit price before modifiers.
    pub price: Price,
    /// Stock ceiling; `cart_quantity` never exceeds it.
    pub stock: u32,
    pub modifiers: Vec<SelectedModifier>,
    pub cart_quantity: u32,
}

impl CartItem {
    /// Snapshot a catalog item for the cart. The quantity starts at zero and is
    /// set by [`Cart::add_item`].
    #[must_use]
    pub fn from_item(item: &Item, modifiers: Vec<SelectedModifier>) -> Self {
        Self {
            item_id: item.id,
            business_id: item.business_id,
            name: item.name.clone(),
            image_url: item.image_url.clone(),
            price: item.price,
            stock: item.stock,
            modifiers,
            cart_quantity: 0,
        }
    }

    /// Unit price after modifiers.
    ///
    /// The last `REPLACE` modifier (if any) sets the base; every `ADD` modifier
    /// is added on top.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        let base = self
            .modifiers
            .iter()
            .rev()
            .find(|m| m.pricing == ModifierPricing::Replace)
            .map_or(self.price, |m| m.price);

        self.modifiers
            .iter()
            .filter(|m| m.pricing == ModifierPricing::Add)
            .fold(base, |acc, m| acc + m.price)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.cart_quantity)
    }
}

/// What [`Cart::add_item`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    /// New line inserted.
    Inserted,
    /// Existing line incremented.
    Incremented,
    /// Nothing changed: the request would exceed the stock ceiling.
    StockLimit,
    /// Nothing changed: the item is out of stock or the quantity was zero.
    Rejected,
    /// Nothing changed: the item is already in the cart with other modifiers.
    ModifiersDiffer,
}

/// Modifier IDs in a comparable order.
fn modifier_ids(modifiers: &[SelectedModifier]) -> Vec<ModifierId> {
    let mut ids: Vec<ModifierId> = modifiers.iter().map(|m| m.id).collect();
    ids.sort_unstable();
    ids
}

/// What [`Cart::update_quantity`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "quantity")]
pub enum UpdateOutcome {
    /// Quantity set as requested.
    Set(u32),
    /// Quantity clamped to the stock ceiling.
    Clamped(u32),
    /// Line removed because the quantity was zero or less.
    Removed,
    /// No line for this item.
    NotInCart,
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for `item_id`, if present.
    #[must_use]
    pub fn get(&self, item_id: ItemId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.item_id == item_id)
    }

    /// Add `quantity` units of `item`.
    ///
    /// If the item is already in the cart with the same modifiers, its stock
    /// ceiling is refreshed from `item` and the line is incremented, unless
    /// that would pass the ceiling, in which case nothing changes. A different
    /// modifier choice for a line already in the cart is refused. Otherwise a new line is inserted, unless
    /// the item is out of stock or `quantity` exceeds the stock. The incoming
    /// `cart_quantity` is ignored.
    pub fn add_item(&mut self, item: CartItem, quantity: u32) -> AddOutcome {
        if quantity == 0 {
            return AddOutcome::Rejected;
        }

        if let Some(line) = self.items.iter_mut().find(|l| l.item_id == item.item_id) {
            if modifier_ids(&line.modifiers) != modifier_ids(&item.modifiers) {
                return AddOutcome::ModifiersDiffer;
            }
            line.stock = item.stock;
            return match line.cart_quantity.checked_add(quantity) {
                Some(next) if next <= line.stock => {
                    line.cart_quantity = next;
                    AddOutcome::Incremented
                }
                _ => AddOutcome::StockLimit,
            };
        }

        if item.stock == 0 {
            return AddOutcome::Rejected;
        }
        if quantity > item.stock {
            return AddOutcome::StockLimit;
        }

        self.items.push(CartItem {
            cart_quantity: quantity,
            ..item
        });
        AddOutcome::Inserted
    }

    /// Set the quantity of a line.
    ///
    /// Zero or less removes the line. Anything above the stock ceiling is
    /// clamped to it.
    pub fn update_quantity(&mut self, item_id: ItemId, quantity: i64) -> UpdateOutcome {
        let Some(index) = self.items.iter().position(|l| l.item_id == item_id) else {
            return UpdateOutcome::NotInCart;
        };

        if quantity <= 0 {
            self.items.remove(index);
            return UpdateOutcome::Removed;
        }

        let Some(line) = self.items.get_mut(index) else {
            return UpdateOutcome::NotInCart;
        };

        match u32::try_from(quantity) {
            Ok(q) if q <= line.stock => {
                line.cart_quantity = q;
                UpdateOutcome::Set(q)
            }
            _ => {
                line.cart_quantity = line.stock;
                UpdateOutcome::Clamped(line.stock)
            }
        }
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, item_id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|l| l.item_id != item_id);
        self.items.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of units.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|l| l.cart_quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Lines that belong to a business other than `business_id`.
    pub fn foreign_items(&self, business_id: BusinessId) -> impl Iterator<Item = &CartItem> {
        self.items
            .iter()
            .filter(move |l| l.business_id != business_id)
    }
}

// =============================================================================
// Modifier selection
// =============================================================================

/// Errors from validating a modifier selection against an item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModifierSelectionError {
    #[error("modifier {0} does not belong to this item")]
    Unknown(ModifierId),
    #[error("'{group}' needs between {min} and {max} choices (got {got})")]
    GroupCount {
        group: String,
        min: u32,
        max: u32,
        got: u32,
    },
}

/// Resolve modifier IDs against an item's modifier groups.
///
/// Duplicates are ignored. Each group's selection count must fall within its
/// `min_select..=max_select`.
///
/// # Errors
///
/// Returns an error for IDs that are not offered by the item and for groups
/// whose selection count is out of range.
pub fn select_modifiers(
    item: &Item,
    ids: &[ModifierId],
) -> Result<Vec<SelectedModifier>, ModifierSelectionError> {
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    if let Some(unknown) = unique.iter().find(|id| {
        !item
            .modifier_groups
            .iter()
            .flat_map(|g| &g.options)
            .any(|o| o.id == **id)
    }) {
        return Err(ModifierSelectionError::Unknown(*unknown));
    }

    let mut selected = Vec::with_capacity(unique.len());
    for group in &item.modifier_groups {
        let chosen: Vec<_> = group
            .options
            .iter()
            .filter(|o| unique.contains(&o.id))
            .collect();

        let got = u32::try_from(chosen.len()).unwrap_or(u32::MAX);
        if got < group.min_select || got > group.max_select {
            return Err(ModifierSelectionError::GroupCount {
                group: group.name.clone(),
                min: group.min_select,
                max: group.max_select,
                got,
            });
        }

        selected.extend(chosen.into_iter().map(|o| SelectedModifier {
            id: o.id,
            name: o.name.clone(),
            price: o.price,
            pricing: o.pricing,
        }));
    }

    Ok(selected)
}

// =============================================================================
// Session persistence
// =============================================================================

/// Load the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load(session: &Session) -> Result<Cart, PersistenceError> {
    persistence::load_or_default(session, keys::CART).await
}

/// Overwrite the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), PersistenceError> {
    persistence::save(session, keys::CART, cart).await
}

/// Load the cart, apply `f`, and write the whole cart back.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn mutate<R>(
    session: &Session,
    f: impl FnOnce(&mut Cart) -> R + Send,
) -> Result<(Cart, R), PersistenceError> {
    let mut cart = load(session).await?;
    let result = f(&mut cart);
    save(session, &cart).await?;
    Ok((cart, result))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::{ModifierGroup, ModifierOption};
    use crate::persistence::testing;
    use nightcap_core::CategoryId;

    pub(crate) fn line(id: i64, price_minor: i64, stock: u32) -> CartItem {
        CartItem {
            item_id: ItemId::new(id),
            business_id: BusinessId::new(1),
            name: format!("Item {id}"),
            image_url: None,
            price: Price::from_minor(price_minor),
            stock,
            modifiers: Vec::new(),
            cart_quantity: 0,
        }
    }

    fn modifier(id: i64, price_minor: i64, pricing: ModifierPricing) -> SelectedModifier {
        SelectedModifier {
            id: ModifierId::new(id),
            name: format!("Modifier {id}"),
            price: Price::from_minor(price_minor),
            pricing,
        }
    }

    fn naive_total(cart: &Cart) -> Price {
        cart.items()
            .iter()
            .map(|l| l.unit_price() * l.cart_quantity)
            .sum()
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let mut cart = Cart::default();
        assert_eq!(cart.add_item(line(1, 5000, 5), 1), AddOutcome::Inserted);
        assert_eq!(cart.add_item(line(1, 5000, 5), 2), AddOutcome::Incremented);
        assert_eq!(cart.get(ItemId::new(1)).unwrap().cart_quantity, 3);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_add_never_passes_stock_ceiling() {
        let mut cart = Cart::default();
        cart.add_item(line(1, 1000, 2), 1);
        cart.add_item(line(1, 1000, 2), 1);
        assert_eq!(cart.add_item(line(1, 1000, 2), 1), AddOutcome::StockLimit);
        assert_eq!(cart.add_item(line(1, 1000, 2), 5), AddOutcome::StockLimit);
        assert_eq!(cart.get(ItemId::new(1)).unwrap().cart_quantity, 2);
    }

    #[test]
    fn test_add_refreshes_stock_ceiling() {
        let mut cart = Cart::default();
        cart.add_item(line(1, 1000, 3), 3);
        // Stock dropped since the line was added
        assert_eq!(cart.add_item(line(1, 1000, 2), 1), AddOutcome::StockLimit);
        assert_eq!(cart.get(ItemId::new(1)).unwrap().stock, 2);
    }

    #[test]
    fn test_add_refuses_other_modifier_choice() {
        let mut cart = Cart::default();
        let mut with_tonic = line(1, 10_000, 5);
        with_tonic.modifiers = vec![
            modifier(1, 14_000, ModifierPricing::Replace),
            modifier(3, 950, ModifierPricing::Add),
        ];
        cart.add_item(with_tonic.clone(), 1);

        let mut plain = line(1, 10_000, 5);
        plain.modifiers = vec![modifier(1, 14_000, ModifierPricing::Replace)];
        assert_eq!(cart.add_item(plain, 1), AddOutcome::ModifiersDiffer);
        assert_eq!(cart.get(ItemId::new(1)).unwrap().cart_quantity, 1);

        // Same choice in another order still matches
        with_tonic.modifiers.reverse();
        assert_eq!(cart.add_item(with_tonic, 1), AddOutcome::Incremented);
    }

    #[test]
    fn test_add_refuses_out_of_stock_and_zero() {
        let mut cart = Cart::default();
        assert_eq!(cart.add_item(line(1, 1000, 0), 1), AddOutcome::Rejected);
        assert_eq!(cart.add_item(line(2, 1000, 4), 0), AddOutcome::Rejected);
        assert_eq!(cart.add_item(line(3, 1000, 4), 5), AddOutcome::StockLimit);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_zero_or_negative_removes() {
        let mut cart = Cart::default();
        cart.add_item(line(1, 1000, 5), 2);
        cart.add_item(line(2, 1000, 5), 2);

        assert_eq!(cart.update_quantity(ItemId::new(1), 0), UpdateOutcome::Removed);
        assert_eq!(cart.update_quantity(ItemId::new(2), -3), UpdateOutcome::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_clamps_to_stock() {
        let mut cart = Cart::default();
        cart.add_item(line(1, 1000, 4), 1);

        assert_eq!(cart.update_quantity(ItemId::new(1), 3), UpdateOutcome::Set(3));
        assert_eq!(cart.update_quantity(ItemId::new(1), 40), UpdateOutcome::Clamped(4));
        assert_eq!(
            cart.update_quantity(ItemId::new(1), i64::MAX),
            UpdateOutcome::Clamped(4)
        );
        assert_eq!(cart.get(ItemId::new(1)).unwrap().cart_quantity, 4);
    }

    #[test]
    fn test_update_unknown_item_is_noop() {
        let mut cart = Cart::default();
        cart.add_item(line(1, 1000, 4), 1);
        assert_eq!(cart.update_quantity(ItemId::new(9), 2), UpdateOutcome::NotInCart);
        assert_eq!(cart.update_quantity(ItemId::new(9), 0), UpdateOutcome::NotInCart);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::default();
        cart.add_item(line(1, 1000, 4), 1);
        cart.add_item(line(2, 1000, 4), 1);

        assert!(cart.remove_item(ItemId::new(1)));
        assert!(!cart.remove_item(ItemId::new(1)));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_total_price_holds_after_every_mutation() {
        let mut cart = Cart::default();
        let steps: Vec<Box<dyn Fn(&mut Cart)>> = vec![
            Box::new(|c| {
                c.add_item(line(1, 1990, 6), 2);
            }),
            Box::new(|c| {
                c.add_item(line(2, 7450, 1), 1);
            }),
            Box::new(|c| {
                c.add_item(line(2, 7450, 1), 1);
            }),
            Box::new(|c| {
                c.update_quantity(ItemId::new(1), 9);
            }),
            Box::new(|c| {
                c.add_item(line(3, 500, 10), 4);
            }),
            Box::new(|c| {
                c.remove_item(ItemId::new(2));
            }),
            Box::new(|c| {
                c.update_quantity(ItemId::new(3), 0);
            }),
        ];

        for step in steps {
            step(&mut cart);
            assert_eq!(cart.total_price(), naive_total(&cart));
        }
        // 6 × 19.90 after the clamp
        assert_eq!(cart.total_price(), Price::from_minor(11_940));
        assert_eq!(cart.total_items(), 6);
    }

    #[test]
    fn test_unit_price_with_modifiers() {
        let mut item = line(1, 10_000, 5);
        assert_eq!(item.unit_price(), Price::from_minor(10_000));

        item.modifiers = vec![
            modifier(1, 500, ModifierPricing::Add),
            modifier(2, 14_000, ModifierPricing::Replace),
            modifier(3, 250, ModifierPricing::Add),
        ];
        // REPLACE sets the base to 140.00, then ADDs apply
        assert_eq!(item.unit_price(), Price::from_minor(14_750));

        item.cart_quantity = 2;
        assert_eq!(item.line_total(), Price::from_minor(29_500));
    }

    #[test]
    fn test_foreign_items() {
        let mut cart = Cart::default();
        cart.add_item(line(1, 1000, 5), 1);
        let mut other = line(2, 1000, 5);
        other.business_id = BusinessId::new(2);
        cart.add_item(other, 1);

        let foreign: Vec<_> = cart.foreign_items(BusinessId::new(1)).collect();
        assert_eq!(foreign.len(), 1);
        assert_eq!(foreign[0].item_id, ItemId::new(2));
    }

    fn catalog_item() -> Item {
        Item {
            id: ItemId::new(10),
            business_id: BusinessId::new(1),
            category_id: CategoryId::new(3),
            name: "Gin".to_string(),
            description: None,
            image_url: None,
            price: Price::from_minor(12_000),
            stock: 8,
            modifier_groups: vec![
                ModifierGroup {
                    name: "Size".to_string(),
                    min_select: 1,
                    max_select: 1,
                    options: vec![
                        ModifierOption {
                            id: ModifierId::new(1),
                            name: "700ml".to_string(),
                            price: Price::from_minor(12_000),
                            pricing: ModifierPricing::Replace,
                        },
                        ModifierOption {
                            id: ModifierId::new(2),
                            name: "1L".to_string(),
                            price: Price::from_minor(16_000),
                            pricing: ModifierPricing::Replace,
                        },
                    ],
                },
                ModifierGroup {
                    name: "Extras".to_string(),
                    min_select: 0,
                    max_select: 2,
                    options: vec![ModifierOption {
                        id: ModifierId::new(3),
                        name: "Tonic".to_string(),
                        price: Price::from_minor(900),
                        pricing: ModifierPricing::Add,
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_select_modifiers_valid() {
        let item = catalog_item();
        let selected =
            select_modifiers(&item, &[ModifierId::new(3), ModifierId::new(2), ModifierId::new(3)])
                .unwrap();
        let ids: Vec<_> = selected.iter().map(|m| m.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 3]);

        let line = CartItem::from_item(&item, selected);
        assert_eq!(line.unit_price(), Price::from_minor(16_900));
    }

    #[test]
    fn test_select_modifiers_unknown() {
        let item = catalog_item();
        assert_eq!(
            select_modifiers(&item, &[ModifierId::new(1), ModifierId::new(99)]),
            Err(ModifierSelectionError::Unknown(ModifierId::new(99)))
        );
    }

    #[test]
    fn test_select_modifiers_group_bounds() {
        let item = catalog_item();
        assert!(matches!(
            select_modifiers(&item, &[]),
            Err(ModifierSelectionError::GroupCount { got: 0, .. })
        ));
        assert!(matches!(
            select_modifiers(&item, &[ModifierId::new(1), ModifierId::new(2)]),
            Err(ModifierSelectionError::GroupCount { got: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_mutate_persists_full_cart() {
        let session = testing::session();

        let (_, outcome) = mutate(&session, |c| c.add_item(line(1, 1000, 3), 2))
            .await
            .unwrap();
        assert_eq!(outcome, AddOutcome::Inserted);

        let stored = load(&session).await.unwrap();
        assert_eq!(stored.total_items(), 2);

        mutate(&session, Cart::clear).await.unwrap();
        let stored: Option<Cart> = persistence::load(&session, keys::CART).await.unwrap();
        assert_eq!(stored, Some(Cart::default()));
    }
}
