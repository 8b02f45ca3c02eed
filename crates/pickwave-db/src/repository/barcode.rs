//! # Barcode Lookup
//!
//! Resolves one scanned string against products, locations and packages.
//!
//! The workflow asks a [`BarcodeResolver`] synchronously, so the lookup runs
//! first and its result is handed over as a [`ScannedBarcode`].
//!
//! ```text
//! "A-001-BOX" ──► products.barcode / product_barcodes ──► Product 1
//!             ──► locations.barcode / locations.name  ──► (none)
//!             ──► packages.name                       ──► (none)
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use pickwave_core::validation::normalize_barcode;
use pickwave_core::{BarcodeResolver, Location, Package, Product};

use crate::error::DbResult;
use crate::repository::rows::{LocationRow, PackageRow, ProductRow};

/// Everything a single scanned string refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedBarcode {
    barcode: String,
    product: Option<Product>,
    location: Option<Location>,
    package: Option<Package>,
}

impl ScannedBarcode {
    /// The normalized barcode, empty if the scan was rejected.
    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn package(&self) -> Option<&Package> {
        self.package.as_ref()
    }

    /// Returns true if the barcode matched nothing.
    pub fn is_unresolved(&self) -> bool {
        self.product.is_none() && self.location.is_none() && self.package.is_none()
    }

    fn answers(&self, barcode: &str) -> bool {
        !self.barcode.is_empty() && normalize_barcode(barcode) == Some(self.barcode.as_str())
    }
}

impl BarcodeResolver for ScannedBarcode {
    fn resolve_product(&self, barcode: &str) -> Option<Product> {
        self.product.clone().filter(|_| self.answers(barcode))
    }

    fn resolve_location(&self, barcode: &str) -> Option<Location> {
        self.location.clone().filter(|_| self.answers(barcode))
    }

    fn resolve_package(&self, barcode: &str) -> Option<Package> {
        self.package.clone().filter(|_| self.answers(barcode))
    }
}

/// Looks up `raw` as typed or scanned.
///
/// Empty or oversized input resolves to nothing without touching the
/// database.
pub async fn lookup(conn: &mut SqliteConnection, raw: &str) -> DbResult<ScannedBarcode> {
    let Some(barcode) = normalize_barcode(raw) else {
        return Ok(ScannedBarcode::default());
    };

    let product = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, barcode FROM products WHERE barcode = ?1
        UNION
        SELECT p.id, p.name, p.barcode FROM products p
        JOIN product_barcodes pb ON pb.product_id = p.id
        WHERE pb.barcode = ?1
        LIMIT 1
        "#,
    )
    .bind(barcode)
    .fetch_optional(&mut *conn)
    .await?;

    let product = match product {
        Some(row) => {
            let mut products = vec![Product::from(row)];
            attach_alternate_barcodes(&mut *conn, &mut products).await?;
            products.pop()
        }
        None => None,
    };

    let location = sqlx::query_as::<_, LocationRow>(
        r#"
        SELECT id, name, barcode, parent_path, picking_sequence
        FROM locations
        WHERE barcode = ?1 OR name = ?1
        ORDER BY barcode = ?1 DESC, id
        LIMIT 1
        "#,
    )
    .bind(barcode)
    .fetch_optional(&mut *conn)
    .await?
    .map(Location::from);

    let package = sqlx::query_as::<_, PackageRow>("SELECT id, name FROM packages WHERE name = ?1")
        .bind(barcode)
        .fetch_optional(&mut *conn)
        .await?
        .map(Package::from);

    let scanned = ScannedBarcode {
        barcode: barcode.to_string(),
        product,
        location,
        package,
    };
    debug!(
        barcode,
        product = scanned.product.is_some(),
        location = scanned.location.is_some(),
        package = scanned.package.is_some(),
        "Barcode looked up"
    );
    Ok(scanned)
}

/// Fills `alternate_barcodes` for each product.
pub(crate) async fn attach_alternate_barcodes(
    conn: &mut SqliteConnection,
    products: &mut [Product],
) -> DbResult<()> {
    for product in products.iter_mut() {
        product.alternate_barcodes = sqlx::query_scalar(
            "SELECT barcode FROM product_barcodes WHERE product_id = ?1 ORDER BY barcode",
        )
        .bind(product.id)
        .fetch_all(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, PACKAGE, PRODUCT, SHELF};

    #[tokio::test]
    async fn test_lookup_product_by_primary_and_alternate() {
        let db = testing::warehouse_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let primary = lookup(&mut conn, "A-001").await.unwrap();
        assert_eq!(primary.product().map(|p| p.id), Some(PRODUCT));

        let alternate = lookup(&mut conn, "  A-001-BOX ").await.unwrap();
        let product = alternate.product().unwrap();
        assert_eq!(product.id, PRODUCT);
        assert_eq!(product.alternate_barcodes, vec!["A-001-BOX".to_string()]);
        assert!(alternate.location().is_none());
    }

    #[tokio::test]
    async fn test_lookup_location_by_barcode_or_name() {
        let db = testing::warehouse_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let by_barcode = lookup(&mut conn, "LOC-A").await.unwrap();
        assert_eq!(by_barcode.location().map(|l| l.id), Some(SHELF));

        let by_name = lookup(&mut conn, "STOCK/A-01").await.unwrap();
        assert_eq!(by_name.location().map(|l| l.id), Some(SHELF));
    }

    #[tokio::test]
    async fn test_lookup_package_and_resolver() {
        let db = testing::warehouse_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let scanned = lookup(&mut conn, "PACK-0001").await.unwrap();
        assert_eq!(scanned.package().map(|p| p.id), Some(PACKAGE));
        assert_eq!(scanned.resolve_package("PACK-0001").map(|p| p.id), Some(PACKAGE));
        assert!(scanned.resolve_package("PACK-0002").is_none());
        assert!(scanned.resolve_location("PACK-0001").is_none());
    }

    #[tokio::test]
    async fn test_unknown_or_blank_barcode_is_unresolved() {
        let db = testing::warehouse_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(lookup(&mut conn, "NOPE").await.unwrap().is_unresolved());

        let blank = lookup(&mut conn, "   ").await.unwrap();
        assert!(blank.is_unresolved());
        assert!(blank.resolve_product("").is_none());
    }
}
