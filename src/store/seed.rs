use crate::models::NewProduct;

use super::{Database, ProductStore};

// Demo catalog: (supplier, contact, [(name, category, price_cents, stock, image seed)])
const DEMO_CATALOG: &[(&str, &str, &[(&str, &str, i64, i64, &str)])] = &[
    (
        "Hortícola Andaluza",
        "horticola@example.com",
        &[
            ("Lechuga romana", "verdura", 120, 50, "lettuce1"),
            ("Tomate rama", "verdura", 200, 40, "tomato1"),
            ("Zanahoria bolsa 1kg", "verdura", 150, 60, "carrot1"),
        ],
    ),
    (
        "Lácteos del Norte",
        "lacteos@example.com",
        &[
            ("Leche entera 1L", "lacteo", 90, 100, "milk1"),
            ("Yogur natural 4x125g", "lacteo", 250, 80, "yogurt1"),
            ("Queso fresco 300g", "lacteo", 320, 35, "cheese1"),
        ],
    ),
    (
        "Carnes Premium",
        "carnes@example.com",
        &[
            ("Pollo entero", "carne", 650, 20, "chicken1"),
            ("Filete ternera 500g", "carne", 1200, 15, "beef1"),
            ("Chorizo artesano 300g", "carne", 450, 25, "chorizo1"),
        ],
    ),
];

pub(super) async fn seed_demo(db: &Database) -> Result<bool, sqlx::Error> {
    let products = ProductStore::new(db.pool().clone());

    if products.count().await? > 0 {
        tracing::debug!("Catalog already populated, skipping demo seed");
        return Ok(false);
    }

    for (supplier_name, contact, items) in DEMO_CATALOG {
        let supplier = products.create_supplier(supplier_name, Some(*contact)).await?;

        for (name, category, price_cents, stock, image_seed) in items.iter() {
            products
                .create(NewProduct {
                    name: name.to_string(),
                    category: Some(category.to_string()),
                    price_cents: *price_cents,
                    stock: *stock,
                    supplier_id: Some(supplier.id),
                    image_url: Some(format!("https://picsum.photos/seed/{image_seed}/800/600")),
                })
                .await?;
        }
    }

    tracing::info!("Seeded demo catalog");
    Ok(true)
}
