// =============================================================================
// RENDER MODULE
// =============================================================================
// Server-side HTML for the listing and detail pages.
//
// Markup is assembled with `format!`/`push_str`; every value coming from the
// upstream or the query string goes through `escape_html` first. The small
// inline script handles copy-to-clipboard and the detail page gallery.
// =============================================================================

use std::fmt::Write as _;

use url::form_urlencoded;

use crate::models::{ListingSource, PageInfo, PageRequest, SortMode, StockItem, StockQuery};
use crate::navigation::DetailNav;

/// Shown in place of every field when a detail key cannot be found.
pub const PLACEHOLDER: &str = "—";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Encodes `params` as a query string (without the leading `?`).
pub fn query_string<'a>(params: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        serializer.append_pair(name, &value);
    }
    serializer.finish()
}

fn listing_href(query: &StockQuery, page: u32) -> String {
    let mut params = query.link_params();
    params.push(("page", page.to_string()));
    format!("/stock?{}", query_string(params))
}

fn detail_href(query: &StockQuery, page: u32, key: &str, index: usize) -> String {
    let mut params = vec![("key", key.to_string()), ("i", index.to_string())];
    params.extend(query.link_params());
    params.push(("page", page.to_string()));
    format!("/stock/detail?{}", query_string(params))
}

// -----------------------------------------------------------------------------
// PAGE SHELL
// -----------------------------------------------------------------------------

const STYLE: &str = r#"
body{font-family:system-ui,sans-serif;margin:0;background:#f5f6f8;color:#222}
header{background:#1f3a5f;color:#fff;padding:12px 24px}
header a{color:#fff;text-decoration:none}
main{max-width:1100px;margin:0 auto;padding:16px}
.notice{background:#fff4d6;border:1px solid #e8c766;padding:8px 12px;margin-bottom:12px}
form.filters{display:flex;flex-wrap:wrap;gap:8px;margin-bottom:16px}
form.filters input,form.filters select{padding:4px 6px}
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:12px}
.card{background:#fff;border-radius:6px;padding:10px;box-shadow:0 1px 2px rgba(0,0,0,.08)}
.card img,.gallery img{max-width:100%;display:block}
.noimg{height:120px;display:flex;align-items:center;justify-content:center;background:#eee;color:#888}
.pager,.detail-nav{display:flex;justify-content:space-between;margin:16px 0}
.thumbs{display:flex;gap:6px;margin-top:6px}
.thumbs button{border:1px solid #ccc;padding:0;background:none;cursor:pointer}
.thumbs img{width:64px;height:48px;object-fit:cover}
button.copy{font-size:12px;margin-left:6px}
dl{display:grid;grid-template-columns:120px 1fr;gap:4px 12px}
"#;

const SCRIPT: &str = r#"
document.addEventListener('click', function (event) {
  var copy = event.target.closest('button.copy');
  if (copy) {
    navigator.clipboard.writeText(copy.dataset.copy).then(function () {
      var label = copy.textContent;
      copy.textContent = 'Copied';
      setTimeout(function () { copy.textContent = label; }, 1200);
    });
    return;
  }
  var thumb = event.target.closest('.thumbs button');
  if (thumb) {
    document.getElementById('gallery-main').src = thumb.dataset.src;
  }
});
"#;

fn page_shell(title: &str, canonical: Option<&str>, body: &str) -> String {
    let canonical = canonical
        .map(|href| format!(r#"<link rel="canonical" href="{}">"#, escape_html(href)))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{canonical}
<style>{STYLE}</style>
</head>
<body>
<header><a href="/stock">Parts catalog</a></header>
<main>
{body}
</main>
<script>{SCRIPT}</script>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn copy_button(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    format!(
        r#"<button type="button" class="copy" data-copy="{}">Copy</button>"#,
        escape_html(value)
    )
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        escape_html(value)
    }
}

fn sample_notice(source: ListingSource) -> &'static str {
    match source {
        ListingSource::Upstream => "",
        ListingSource::Sample => {
            r#"<div class="notice">Live stock data is unavailable. Showing sample items.</div>"#
        }
    }
}

// =============================================================================
// LISTING PAGE
// =============================================================================

pub struct ListingView<'a> {
    pub items: &'a [StockItem],
    pub query: &'a StockQuery,
    pub page: PageRequest,
    pub page_info: &'a PageInfo,
    pub source: ListingSource,
    pub canonical: Option<String>,
}

fn filter_form(query: &StockQuery) -> String {
    let value = |field: &Option<String>| escape_html(field.as_deref().unwrap_or(""));
    let current_sort = query.sort_mode();
    let mut options = String::new();
    for (mode, label) in [
        (SortMode::Default, "Default order"),
        (SortMode::PriceAsc, "Price: low to high"),
        (SortMode::PriceDesc, "Price: high to low"),
        (SortMode::NameAsc, "Name: A to Z"),
    ] {
        let selected = if mode == current_sort { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{}"{selected}>{label}</option>"#,
            mode.as_param()
        );
    }
    let has_pic = if query.criteria().has_pic { " checked" } else { "" };

    format!(
        r#"<form class="filters" method="get" action="/stock">
<input name="q" placeholder="Name, part no. or OE" value="{q}">
<input name="brand" placeholder="Make" value="{brand}">
<input name="model" placeholder="Model code" value="{model}">
<input name="minPrice" placeholder="Min price" value="{min}" size="6">
<input name="maxPrice" placeholder="Max price" value="{max}" size="6">
<label><input type="checkbox" name="hasPic" value="1"{has_pic}> With photo</label>
<select name="sort">{options}</select>
<button type="submit">Search</button>
</form>"#,
        q = value(&query.q),
        brand = value(&query.brand),
        model = value(&query.model),
        min = value(&query.min_price),
        max = value(&query.max_price),
    )
}

fn item_card(item: &StockItem, href: &str) -> String {
    let picture = if item.has_image() {
        format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape_html(&item.image),
            escape_html(&item.product)
        )
    } else {
        r#"<div class="noimg">No photo</div>"#.to_string()
    };

    format!(
        r#"<div class="card">
<a href="{href}">{picture}</a>
<h3><a href="{href}">{product}</a></h3>
<div>No. {num}{copy_num}</div>
<div>OE {oe}{copy_oe}</div>
<div>{brand} {model}</div>
<div>{price}</div>
</div>"#,
        href = escape_html(href),
        product = escape_html(&item.product),
        num = escape_html(&item.num),
        copy_num = copy_button(&item.num),
        oe = or_dash(&item.oe),
        copy_oe = copy_button(&item.oe),
        brand = escape_html(&item.brand),
        model = escape_html(&item.model),
        price = or_dash(&item.price),
    )
}

pub fn render_listing(view: &ListingView<'_>) -> String {
    let mut body = String::new();
    body.push_str(sample_notice(view.source));
    body.push_str(&filter_form(view.query));

    if view.items.is_empty() {
        body.push_str("<p>No matching parts on this page.</p>");
    } else {
        body.push_str(r#"<div class="grid">"#);
        for (index, item) in view.items.iter().enumerate() {
            let href = detail_href(view.query, view.page.page, &item.num, index);
            body.push_str(&item_card(item, &href));
        }
        body.push_str("</div>");
    }

    body.push_str(r#"<nav class="pager">"#);
    match view.page.page.checked_sub(1) {
        Some(prev) => {
            let _ = write!(
                body,
                r#"<a rel="prev" href="{}">&larr; Previous</a>"#,
                escape_html(&listing_href(view.query, prev))
            );
        }
        None => body.push_str("<span></span>"),
    }
    let _ = write!(body, "<span>Page {}</span>", u64::from(view.page.page) + 1);
    match view.page.page.checked_add(1) {
        Some(next) if !view.page_info.is_last_page_approx => {
            let _ = write!(
                body,
                r#"<a rel="next" href="{}">Next &rarr;</a>"#,
                escape_html(&listing_href(view.query, next))
            );
        }
        _ => body.push_str("<span></span>"),
    }
    body.push_str("</nav>");

    page_shell("Parts catalog", view.canonical.as_deref(), &body)
}

// =============================================================================
// DETAIL PAGE
// =============================================================================

pub struct DetailView<'a> {
    pub nav: Option<DetailNav<'a>>,
    pub query: &'a StockQuery,
    pub page: PageRequest,
    pub source: ListingSource,
    pub canonical: Option<String>,
}

fn gallery(item: &StockItem) -> String {
    let Some(main) = item.images.first().or(Some(&item.image)).filter(|url| !url.is_empty()) else {
        return r#"<div class="noimg">No photo</div>"#.to_string();
    };

    let mut html = format!(
        r#"<div class="gallery"><img id="gallery-main" src="{}" alt="{}">"#,
        escape_html(main),
        escape_html(&item.product)
    );
    if item.images.len() > 1 {
        html.push_str(r#"<div class="thumbs">"#);
        for url in &item.images {
            let url = escape_html(url);
            let _ = write!(
                html,
                r#"<button type="button" data-src="{url}"><img src="{url}" alt=""></button>"#
            );
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

fn nav_link(view: &DetailView<'_>, target: Option<(usize, &StockItem)>, rel: &str, label: &str) -> String {
    match target {
        Some((index, item)) => format!(
            r#"<a rel="{rel}" href="{}">{label}: {}</a>"#,
            escape_html(&detail_href(view.query, view.page.page, &item.num, index)),
            escape_html(&item.product)
        ),
        None => "<span></span>".to_string(),
    }
}

pub fn render_detail(view: &DetailView<'_>) -> String {
    let mut body = String::new();
    body.push_str(sample_notice(view.source));

    let title = match &view.nav {
        Some(nav) => {
            let item = nav.item;
            let _ = write!(
                body,
                r#"<h1>{product}</h1>
{gallery}
<dl>
<dt>Part no.</dt><dd>{num}{copy_num}</dd>
<dt>OE</dt><dd>{oe}{copy_oe}</dd>
<dt>Make</dt><dd>{brand}</dd>
<dt>Model</dt><dd>{model}</dd>
<dt>Year</dt><dd>{year}</dd>
<dt>Price</dt><dd>{price}</dd>
</dl>"#,
                product = or_dash(&item.product),
                gallery = gallery(item),
                num = or_dash(&item.num),
                copy_num = copy_button(&item.num),
                oe = or_dash(&item.oe),
                copy_oe = copy_button(&item.oe),
                brand = or_dash(&item.brand),
                model = or_dash(&item.model),
                year = or_dash(&item.year),
                price = or_dash(&item.price),
            );
            let _ = write!(
                body,
                r#"<nav class="detail-nav">{}{}</nav>"#,
                nav_link(view, nav.prev, "prev", "Previous"),
                nav_link(view, nav.next, "next", "Next")
            );
            item.product.clone()
        }
        None => {
            let _ = write!(
                body,
                r#"<h1>{PLACEHOLDER}</h1>
<div class="noimg">No photo</div>
<dl>
<dt>Part no.</dt><dd>{PLACEHOLDER}</dd>
<dt>OE</dt><dd>{PLACEHOLDER}</dd>
<dt>Make</dt><dd>{PLACEHOLDER}</dd>
<dt>Model</dt><dd>{PLACEHOLDER}</dd>
<dt>Year</dt><dd>{PLACEHOLDER}</dd>
<dt>Price</dt><dd>{PLACEHOLDER}</dd>
</dl>"#
            );
            "Part not found".to_string()
        }
    };

    let _ = write!(
        body,
        r#"<p><a href="{}">&larr; Back to list</a></p>"#,
        escape_html(&listing_href(view.query, view.page.page))
    );

    page_shell(&title, view.canonical.as_deref(), &body)
}
