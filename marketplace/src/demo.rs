//! Demo catalog seeded with `--demo`

use rust_decimal::Decimal;
use shared::Coordinate;

use crate::core::{ProductDraft, VendorDraft};
use crate::error::MarketResult;

fn product(name: &str, price_paise: i64, description: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        price: Some(Decimal::new(price_paise, 2)),
        description: Some(description.to_string()),
        image: None,
    }
}

/// A handful of stalls around Mysore's Devaraja market
pub fn demo_vendors() -> MarketResult<Vec<(VendorDraft, Vec<ProductDraft>)>> {
    Ok(vec![
        (
            VendorDraft {
                name: "Guru Sweets".to_string(),
                category: "sweets".to_string(),
                location: Some(Coordinate::new(12.307, 76.652)?),
                active: true,
                meta: Some("Since 1930".to_string()),
                phone: None,
            },
            vec![
                product("Mysore Pak", 12050, "Ghee-rich gram flour fudge, 250 g"),
                product("Dharwad Peda", 9000, "Caramelised milk sweet, 250 g"),
            ],
        ),
        (
            VendorDraft {
                name: "Mylari Dosa".to_string(),
                category: "food".to_string(),
                location: Some(Coordinate::new(12.3105, 76.6497)?),
                active: true,
                meta: None,
                phone: None,
            },
            vec![
                product("Benne Dosa", 6000, "Butter dosa with chutney"),
                product("Filter Coffee", 2500, "Small tumbler"),
            ],
        ),
        (
            VendorDraft {
                name: "Devaraja Flowers".to_string(),
                category: "flowers".to_string(),
                location: Some(Coordinate::new(12.3112, 76.6525)?),
                active: true,
                meta: Some(String::new()),
                phone: None,
            },
            vec![product("Jasmine String", 3000, "One metre")],
        ),
        (
            VendorDraft {
                name: "Chamundi Hill Fruits".to_string(),
                category: "produce".to_string(),
                location: Some(Coordinate::new(12.2724, 76.6702)?),
                active: false,
                meta: None,
                phone: None,
            },
            vec![product("Nanjangud Banana", 8000, "One dozen")],
        ),
    ])
}
