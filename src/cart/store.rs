//! Cart Store

use std::sync::Arc;

use tracing::warn;

use crate::{
    cart::Cart,
    storage::{LocalStorage, StorageError},
};

/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "abs_cart";

/// Durable home of the local cart.
///
/// Loading never fails: a missing, unreadable or corrupt payload yields an
/// empty cart.
#[derive(Debug, Clone)]
pub struct CartStore {
    storage: Arc<dyn LocalStorage>,
}

impl CartStore {
    /// Keep the cart in `storage`.
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Load the persisted cart.
    pub fn load(&self) -> Cart {
        let raw = match self.storage.get_item(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(error) => {
                warn!(%error, "failed to read stored cart, starting empty");

                return Cart::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|error| {
            warn!(%error, "stored cart is corrupt, starting empty");

            Cart::new()
        })
    }

    /// Persist `cart`, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write fails.
    pub fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        let raw = serde_json::to_string(cart).map_err(StorageError::Encode)?;

        self.storage.set_item(CART_KEY, &raw)
    }

    /// Forget the stored cart. Clearing an empty store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the removal fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(CART_KEY)
    }

    /// Load, apply `f`, and save the result.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the save fails; the stored cart is then
    /// unchanged.
    pub fn update<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> Result<(Cart, R), StorageError> {
        let mut cart = self.load();
        let result = f(&mut cart);

        self.save(&cart)?;

        Ok((cart, result))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        products::Product,
        storage::{FileStorage, MemoryStorage},
    };

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();

        for (code, price) in [("P1001", 125_50), ("P1002", 40_00), ("P1001", 125_50)] {
            cart.add_item(&Product {
                code: code.to_string(),
                name: format!("Item {code}"),
                description: None,
                unit_price: Decimal::new(price, 2),
                unit_weight: Decimal::new(1_200, 3),
            });
        }

        cart
    }

    #[test]
    fn load_without_saved_cart_is_empty() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));

        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() -> TestResult {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));
        let cart = sample_cart();

        store.save(&cart)?;

        assert_eq!(store.load(), cart);

        Ok(())
    }

    #[test]
    fn save_is_visible_to_a_fresh_file_store() -> TestResult {
        let dir = tempfile::tempdir()?;
        let cart = sample_cart();

        CartStore::new(Arc::new(FileStorage::new(dir.path()))).save(&cart)?;

        let reopened = CartStore::new(Arc::new(FileStorage::new(dir.path())));

        assert_eq!(reopened.load(), cart);

        Ok(())
    }

    #[test]
    fn corrupt_payload_loads_as_empty() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(CART_KEY, "{not json")?;

        assert!(CartStore::new(storage).load().is_empty());

        Ok(())
    }

    #[test]
    fn invariant_violating_payload_loads_as_empty() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(
            CART_KEY,
            r#"[{"code":"P1","name":"A","price_per_unit":1,"weight_per_unit":0,"quantity":0}]"#,
        )?;

        assert!(CartStore::new(storage).load().is_empty());

        Ok(())
    }

    #[test]
    fn loads_carts_written_with_numeric_prices() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(
            CART_KEY,
            r#"[{"code":"P1","name":"Milk","price_per_unit":32.5,"weight_per_unit":0.5,"quantity":2}]"#,
        )?;

        let cart = CartStore::new(storage).load();

        assert_eq!(cart.totals().total, Decimal::new(65, 0));

        Ok(())
    }

    #[test]
    fn clear_is_idempotent() -> TestResult {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));
        store.save(&sample_cart())?;

        store.clear()?;
        store.clear()?;

        assert!(store.load().is_empty());

        Ok(())
    }

    #[test]
    fn update_persists_mutation() -> TestResult {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));
        store.save(&sample_cart())?;

        let (cart, changed) = store.update(|cart| cart.set_quantity("P1002", 0))?;

        assert!(changed);
        assert_eq!(cart.len(), 1);
        assert_eq!(store.load(), cart);

        Ok(())
    }
}
