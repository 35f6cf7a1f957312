// =============================================================================
// NAVIGATION MODULE
// =============================================================================
// Prev/next links for the detail page, computed from positions inside the
// page the listing was rendered from. There is no cross-page navigation.
// =============================================================================

use crate::models::StockItem;

/// Position of the current item and its neighbours within a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailNav<'a> {
    pub index: usize,
    pub item: &'a StockItem,
    pub prev: Option<(usize, &'a StockItem)>,
    pub next: Option<(usize, &'a StockItem)>,
}

/// Finds `key` in `items`.
///
/// A caller-supplied `hint` is trusted only when it is in range and the
/// item at that position has the right key; otherwise the page is scanned
/// and the first match is used.
pub fn locate<'a>(items: &'a [StockItem], key: &str, hint: Option<usize>) -> Option<DetailNav<'a>> {
    let index = hint
        .filter(|&index| items.get(index).is_some_and(|item| item.num == key))
        .or_else(|| items.iter().position(|item| item.num == key))?;

    let neighbour = |position: usize| items.get(position).map(|item| (position, item));

    Some(DetailNav {
        index,
        item: &items[index],
        prev: index.checked_sub(1).and_then(neighbour),
        next: neighbour(index + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Vec<StockItem> {
        ["X", "Y", "Z"]
            .iter()
            .map(|num| StockItem {
                num: num.to_string(),
                product: format!("part {num}"),
                ..Default::default()
            })
            .collect()
    }

    fn nums<'a>(nav: &DetailNav<'a>) -> (Option<&'a str>, &'a str, Option<&'a str>) {
        (
            nav.prev.map(|(_, item)| item.num.as_str()),
            nav.item.num.as_str(),
            nav.next.map(|(_, item)| item.num.as_str()),
        )
    }

    #[test]
    fn valid_hint_is_used() {
        let items = page();
        let nav = locate(&items, "Y", Some(1)).expect("found");
        assert_eq!(nav.index, 1);
        assert_eq!(nums(&nav), (Some("X"), "Y", Some("Z")));
    }

    #[test]
    fn stale_hint_falls_back_to_scan() {
        let items = page();
        let nav = locate(&items, "Y", Some(2)).expect("found");
        assert_eq!(nav.index, 1);
        assert_eq!(nums(&nav), (Some("X"), "Y", Some("Z")));

        let nav = locate(&items, "Z", Some(1)).expect("found");
        assert_eq!(nav.index, 2);
        assert_eq!(nums(&nav), (Some("Y"), "Z", None));
    }

    #[test]
    fn out_of_range_hint_falls_back_to_scan() {
        let items = page();
        let nav = locate(&items, "X", Some(99)).expect("found");
        assert_eq!(nav.index, 0);
        assert_eq!(nums(&nav), (None, "X", Some("Y")));
    }

    #[test]
    fn missing_key_is_none() {
        let items = page();
        assert!(locate(&items, "Q", Some(0)).is_none());
        assert!(locate(&[], "X", None).is_none());
    }
}
