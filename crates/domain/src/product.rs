use std::fmt::{Display, Formatter};

use kasira_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Creates a product identifier from a storage key.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying storage key.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Selling price in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Creates a validated positive price.
    pub fn new(value: i64) -> AppResult<Self> {
        if value <= 0 {
            return Err(AppError::Validation(format!(
                "price must be greater than zero, got {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub fn amount(&self) -> i64 {
        self.0
    }
}

/// Sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: NonEmptyString,
    sku: NonEmptyString,
    price: Price,
}

impl Product {
    /// Creates a validated product.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        sku: impl Into<String>,
        price: Price,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            sku: NonEmptyString::new(sku.into().trim().to_uppercase())?,
            price,
        })
    }

    /// Returns the product identifier.
    #[must_use]
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Returns the product name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the stock keeping unit.
    #[must_use]
    pub fn sku(&self) -> &str {
        self.sku.as_str()
    }

    /// Returns the current selling price.
    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Returns a copy carrying a new price.
    #[must_use]
    pub fn with_price(mut self, price: Price) -> Self {
        self.price = price;
        self
    }

    /// Returns a copy with replaced descriptive attributes.
    pub fn with_details(self, name: impl Into<String>, sku: impl Into<String>) -> AppResult<Self> {
        Self::new(self.id, name, sku, self.price)
    }

    /// Returns the audited attribute set.
    #[must_use]
    pub fn audit_snapshot(&self) -> Value {
        json!({
            "name": self.name(),
            "sku": self.sku(),
            "price": self.price.amount(),
        })
    }
}
