//! Items

use rust_decimal::Decimal;

use crate::products::{Product, ProductId};

/// A cart line item being evaluated against a cart rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    product: Product,
    qty: Decimal,
    parent: Option<ProductId>,
    children: Vec<CartLineItem>,
    discount_amount: Decimal,
}

impl CartLineItem {
    /// Creates a new top-level item with no discount applied yet.
    pub fn new(product: Product, qty: Decimal) -> Self {
        Self {
            product,
            qty,
            parent: None,
            children: Vec::new(),
            discount_amount: Decimal::ZERO,
        }
    }

    /// Mark this item as a component of the given parent.
    #[must_use]
    pub fn with_parent(mut self, parent: ProductId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attach a child item (configurable option or bundle component).
    #[must_use]
    pub fn with_child(mut self, child: CartLineItem) -> Self {
        self.children.push(child.with_parent(self.product.id));
        self
    }

    /// Returns the item's own product
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Returns the quantity
    pub fn qty(&self) -> Decimal {
        self.qty
    }

    /// Returns the parent product, if this is a child item
    pub fn parent(&self) -> Option<ProductId> {
        self.parent
    }

    /// Returns the child items
    pub fn children(&self) -> &[CartLineItem] {
        &self.children
    }

    /// Child items are never evaluated directly; their parent stands in for them.
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    /// The product whose prices decide exclusion: the first child's when the
    /// item has children, otherwise the item's own.
    pub fn pricing_subject(&self) -> &Product {
        self.children
            .first()
            .map_or(&self.product, |child| &child.product)
    }

    /// Total discount currently applied to the row.
    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    /// Overwrite the discount applied to the row.
    pub fn set_discount_amount(&mut self, amount: Decimal) {
        self.discount_amount = amount;
    }
}
