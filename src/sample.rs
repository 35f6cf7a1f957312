// =============================================================================
// SAMPLE DATA
// =============================================================================
// Built-in records served by the listing routes when no upstream is
// configured or the upstream call fails.
// =============================================================================

use crate::models::StockItem;

fn record(num: &str, product: &str, oe: &str, brand: &str, model: &str, price: &str, image: &str) -> StockItem {
    let images: Vec<String> = if image.is_empty() { Vec::new() } else { vec![image.to_string()] };
    StockItem {
        num: num.to_string(),
        product: product.to_string(),
        oe: oe.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        year: String::new(),
        image: image.to_string(),
        price: price.to_string(),
        images,
    }
}

/// The three fallback records, in display order.
pub fn sample_items() -> Vec<StockItem> {
    vec![
        record(
            "JS0260",
            "Oil filter",
            "15208-65F0A",
            "Nissan",
            "N16",
            "9.5",
            "https://placehold.co/400x300?text=JS0260",
        ),
        record(
            "JS0412",
            "Front brake pad set",
            "04465-33471",
            "Toyota",
            "ACV40",
            "35",
            "",
        ),
        record(
            "JS0738",
            "Air filter",
            "17801-0H050",
            "Toyota",
            "ACV40",
            "18",
            "https://placehold.co/400x300?text=JS0738",
        ),
    ]
}
