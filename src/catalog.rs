// =============================================================================
// CATALOG MODULE
// =============================================================================
// Filtering, sorting and pagination over records that were already fetched.
//
// Everything here works on one page (or the few pages of a multi-page
// search) held in memory. Matches beyond what was fetched are invisible, and
// the last-page flag is a guess. Both are accepted limitations of an
// upstream that reports no totals.
// =============================================================================

use std::cmp::Ordering;

use crate::models::{FilterCriteria, PageInfo, SortMode, StockItem};

// =============================================================================
// ENGINE ENTRY POINT
// =============================================================================

/// Filters then sorts `items`. Input order is kept for `SortMode::Default`.
pub fn apply(items: Vec<StockItem>, criteria: &FilterCriteria, sort: SortMode) -> Vec<StockItem> {
    let mut kept: Vec<StockItem> = items
        .into_iter()
        .filter(|item| matches(item, criteria))
        .collect();
    sort_items(&mut kept, sort);
    kept
}

// =============================================================================
// FILTERS
// =============================================================================

/// True when `item` passes every filter set in `criteria`.
pub fn matches(item: &StockItem, criteria: &FilterCriteria) -> bool {
    equals_ci(&item.brand, criteria.brand.as_deref())
        && equals_ci(&item.model, criteria.model.as_deref())
        && equals_ci(&item.year, criteria.year.as_deref())
        && equals_ci(&item.num, criteria.num.as_deref())
        && keyword_matches(item, criteria.q.as_deref())
        && (!criteria.has_pic || item.has_image())
        && price_in_range(item, criteria)
}

fn equals_ci(value: &str, wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => value.to_lowercase() == wanted.to_lowercase(),
        None => true,
    }
}

fn keyword_matches(item: &StockItem, q: Option<&str>) -> bool {
    let Some(q) = q else {
        return true;
    };
    let needle = q.to_lowercase();
    [&item.product, &item.num, &item.oe]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// With either bound set, records without a usable price never match.
fn price_in_range(item: &StockItem, criteria: &FilterCriteria) -> bool {
    if !criteria.has_price_bounds() {
        return true;
    }
    let Some(price) = item.price_value() else {
        return false;
    };
    criteria.min_price.map_or(true, |min| price >= min)
        && criteria.max_price.map_or(true, |max| price <= max)
}

// =============================================================================
// SORTING
// =============================================================================

/// Stable in-place sort. Unparseable prices count as +infinity.
pub fn sort_items(items: &mut [StockItem], sort: SortMode) {
    match sort {
        SortMode::Default => {}
        SortMode::PriceAsc => items.sort_by(|a, b| sort_price(a).total_cmp(&sort_price(b))),
        SortMode::PriceDesc => items.sort_by(|a, b| sort_price(b).total_cmp(&sort_price(a))),
        SortMode::NameAsc => items.sort_by(|a, b| compare_names(&a.product, &b.product)),
    }
}

fn sort_price(item: &StockItem) -> f64 {
    item.price_value().unwrap_or(f64::INFINITY)
}

/// Case-folded comparison with the raw text as tie-break, so distinct names
/// never compare equal.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// =============================================================================
// PAGINATION
// =============================================================================

/// A page shorter than requested is taken to be the last one. A full page
/// is never flagged, even when nothing follows it.
pub fn is_last_page(returned: usize, size: u32) -> bool {
    returned < size as usize
}

pub fn page_info(page: Option<u32>, size: u32, returned: usize, pages_fetched: u32) -> PageInfo {
    PageInfo {
        page,
        size,
        returned,
        pages_fetched,
        is_last_page_approx: is_last_page(returned, size),
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn item(num: &str, product: &str, price: &str) -> StockItem {
        StockItem {
            num: num.into(),
            product: product.into(),
            price: price.into(),
            ..Default::default()
        }
    }

    fn nums(items: &[StockItem]) -> Vec<&str> {
        items.iter().map(|item| item.num.as_str()).collect()
    }

    fn catalog() -> Vec<StockItem> {
        vec![
            StockItem {
                brand: "toyota".into(),
                oe: "04465-33471".into(),
                image: "pad.jpg".into(),
                ..item("P1", "Brake pad", "35")
            },
            StockItem {
                brand: "TOYOTA".into(),
                oe: "90915-YZZE1".into(),
                ..item("F1", "Oil filter", "8.5")
            },
            StockItem {
                brand: "Nissan".into(),
                oe: "15208-65F0A".into(),
                image: "filter.jpg".into(),
                ..item("F2", "Oil filter", "bad")
            },
            StockItem {
                brand: "Toyota".into(),
                oe: "48510-09M30".into(),
                image: "strut.jpg".into(),
                ..item("S1", "Front strut", "120")
            },
        ]
    }

    #[test]
    fn price_asc_puts_unparseable_last() {
        let input = vec![item("A", "a", "100"), item("B", "b", "bad"), item("C", "c", "50")];
        let sorted = apply(input, &FilterCriteria::default(), SortMode::PriceAsc);
        assert_eq!(nums(&sorted), ["C", "A", "B"]);
    }

    #[test]
    fn price_desc_puts_unparseable_first() {
        let input = vec![item("A", "a", "100"), item("B", "b", ""), item("C", "c", "50")];
        let sorted = apply(input, &FilterCriteria::default(), SortMode::PriceDesc);
        assert_eq!(nums(&sorted), ["B", "A", "C"]);
    }

    #[test]
    fn price_sort_is_stable_for_ties() {
        let input = vec![
            item("A", "a", "10"),
            item("B", "b", "x"),
            item("C", "c", "10"),
            item("D", "d", "y"),
        ];
        let sorted = apply(input, &FilterCriteria::default(), SortMode::PriceAsc);
        assert_eq!(nums(&sorted), ["A", "C", "B", "D"]);
    }

    #[test]
    fn default_sort_is_identity() {
        let input = catalog();
        let expected = nums(&input).into_iter().map(String::from).collect::<Vec<_>>();
        let sorted = apply(input, &FilterCriteria::default(), SortMode::Default);
        assert_eq!(nums(&sorted), expected);
    }

    #[test]
    fn name_sort_ignores_case_and_is_total() {
        let input = vec![
            item("1", "brake pad", ""),
            item("2", "Axle", ""),
            item("3", "Brake pad", ""),
            item("4", "axle", ""),
        ];
        let sorted = apply(input, &FilterCriteria::default(), SortMode::NameAsc);
        assert_eq!(nums(&sorted), ["2", "4", "3", "1"]);
        assert_eq!(compare_names("Axle", "axle"), Ordering::Less);
        assert_eq!(compare_names("axle", "axle"), Ordering::Equal);
    }

    #[test]
    fn brand_filter_ignores_case() {
        let criteria = FilterCriteria { brand: Some("Toyota".into()), ..Default::default() };
        let kept = apply(catalog(), &criteria, SortMode::Default);
        assert_eq!(nums(&kept), ["P1", "F1", "S1"]);
    }

    #[test]
    fn keyword_searches_name_num_and_oe() {
        let by_name = FilterCriteria { q: Some("FILTER".into()), ..Default::default() };
        assert_eq!(nums(&apply(catalog(), &by_name, SortMode::Default)), ["F1", "F2"]);

        let by_oe = FilterCriteria { q: Some("65f0".into()), ..Default::default() };
        assert_eq!(nums(&apply(catalog(), &by_oe, SortMode::Default)), ["F2"]);

        let by_num = FilterCriteria { q: Some("s1".into()), ..Default::default() };
        assert_eq!(nums(&apply(catalog(), &by_num, SortMode::Default)), ["S1"]);
    }

    #[test]
    fn price_bounds_exclude_unparseable() {
        let criteria = FilterCriteria { min_price: Some(0.0), ..Default::default() };
        assert_eq!(nums(&apply(catalog(), &criteria, SortMode::Default)), ["P1", "F1", "S1"]);

        let criteria = FilterCriteria {
            min_price: Some(10.0),
            max_price: Some(120.0),
            ..Default::default()
        };
        assert_eq!(nums(&apply(catalog(), &criteria, SortMode::Default)), ["P1", "S1"]);
    }

    #[test]
    fn year_filter_never_matches_real_records() {
        let criteria = FilterCriteria { year: Some("2015".into()), ..Default::default() };
        assert!(apply(catalog(), &criteria, SortMode::Default).is_empty());
    }

    #[test]
    fn filters_are_conjunctive() {
        let brand = FilterCriteria { brand: Some("toyota".into()), ..Default::default() };
        let q = FilterCriteria { q: Some("r".into()), ..Default::default() };
        let pic = FilterCriteria { has_pic: true, ..Default::default() };
        let price = FilterCriteria { max_price: Some(100.0), ..Default::default() };
        let all = FilterCriteria {
            brand: brand.brand.clone(),
            q: q.q.clone(),
            has_pic: true,
            max_price: price.max_price,
            ..Default::default()
        };

        let combined = nums(&apply(catalog(), &all, SortMode::Default))
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let expected: Vec<String> = catalog()
            .iter()
            .filter(|item| {
                [&brand, &q, &pic, &price]
                    .iter()
                    .all(|criteria| matches(item, criteria))
            })
            .map(|item| item.num.clone())
            .collect();

        assert_eq!(combined, expected);
        assert_eq!(combined, ["P1"]);
    }

    #[test]
    fn short_page_is_last_full_page_is_not() {
        assert!(is_last_page(19, 20));
        assert!(is_last_page(0, 20));
        assert!(!is_last_page(20, 20));

        let info = page_info(Some(2), 20, 20, 1);
        assert!(!info.is_last_page_approx);
    }
}
