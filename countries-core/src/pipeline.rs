//! Pure search/filter/paginate pipeline over a fetched country list.
//!
//! [`derive`] is a deterministic function of its inputs: it filters the
//! source list (preserving order), then slices out the requested page.
//! All mutable state lives in [`FilterState`], which enforces the one
//! invariant callers rely on: any change to search text, region or
//! population bracket resets the page to 1.

use crate::model::Country;

/// Fixed number of countries per page.
pub const PAGE_SIZE: usize = 12;

/// Population-size buckets used for filtering.
///
/// The three buckets partition the population axis; the boundary value
/// 10,000,000 belongs to `From10To50M`, and 50,000,000 also belongs to
/// `From10To50M` (both bounds inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopulationBracket {
    #[default]
    Any,
    Under10M,
    From10To50M,
    Over50M,
}

impl PopulationBracket {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationBracket::Any => "any",
            PopulationBracket::Under10M => "lt10",
            PopulationBracket::From10To50M => "10to50",
            PopulationBracket::Over50M => "gt50",
        }
    }

    pub const fn all() -> &'static [PopulationBracket] {
        &[
            PopulationBracket::Any,
            PopulationBracket::Under10M,
            PopulationBracket::From10To50M,
            PopulationBracket::Over50M,
        ]
    }

    fn matches(&self, population: u64) -> bool {
        match self {
            PopulationBracket::Any => true,
            PopulationBracket::Under10M => population < 10_000_000,
            PopulationBracket::From10To50M => {
                (10_000_000..=50_000_000).contains(&population)
            }
            PopulationBracket::Over50M => population > 50_000_000,
        }
    }
}

impl std::fmt::Display for PopulationBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PopulationBracket {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "any" | "" => Ok(PopulationBracket::Any),
            "lt10" => Ok(PopulationBracket::Under10M),
            "10to50" => Ok(PopulationBracket::From10To50M),
            "gt50" => Ok(PopulationBracket::Over50M),
            _ => Err(anyhow::anyhow!(
                "Unknown population bracket '{value}'. Supported brackets: lt10, 10to50, gt50."
            )),
        }
    }
}

/// Current search/filter/page selection.
///
/// Transient view state; never persisted. Setters for search, region and
/// bracket reset `page` to 1 so a page number is never carried across a
/// change of the underlying filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    search: String,
    region: Option<String>,
    bracket: PopulationBracket,
    page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self { search: String::new(), region: None, bracket: PopulationBracket::Any, page: 1 }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn bracket(&self) -> PopulationBracket {
        self.bracket
    }

    /// 1-based page number.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if self.search != search {
            self.search = search;
            self.page = 1;
        }
    }

    /// `None` (or an empty string) matches every region.
    pub fn set_region(&mut self, region: Option<String>) {
        let region = region.filter(|r| !r.is_empty());
        if self.region != region {
            self.region = region;
            self.page = 1;
        }
    }

    pub fn set_bracket(&mut self, bracket: PopulationBracket) {
        if self.bracket != bracket {
            self.bracket = bracket;
            self.page = 1;
        }
    }

    /// Jump to a page. Callers are responsible for keeping the number
    /// within the `total_pages` of the current derivation.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.page = (self.page + 1).min(total_pages.max(1));
    }

    fn matches(&self, country: &Country) -> bool {
        let matches_search = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            country.name.to_lowercase().contains(&needle)
                || country.official_name.to_lowercase().contains(&needle)
        };

        let matches_region =
            self.region.as_deref().is_none_or(|region| country.region == region);

        matches_search && matches_region && self.bracket.matches(country.population)
    }
}

/// One page of filtered results.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a> {
    /// The visible slice, at most [`PAGE_SIZE`] items, in source order.
    pub items: Vec<&'a Country>,
    /// Size of the whole filtered set.
    pub total_count: usize,
    /// Always at least 1; an empty filtered set renders as one empty page.
    pub total_pages: usize,
}

impl PageView<'_> {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Derive the visible page from the source list and the current filters.
///
/// Filtering ANDs three predicates: case-insensitive substring match on
/// common or official name, exact region equality, and the population
/// bracket. Relative order of the source list is preserved; no sort is
/// introduced. A page beyond the filtered set yields an empty slice.
pub fn derive<'a>(countries: &'a [Country], filter: &FilterState) -> PageView<'a> {
    let filtered: Vec<&Country> = countries.iter().filter(|c| filter.matches(c)).collect();

    let total_count = filtered.len();
    let total_pages = total_count.div_ceil(PAGE_SIZE).max(1);

    let start = (filter.page() - 1) * PAGE_SIZE;
    let items = if start >= total_count {
        Vec::new()
    } else {
        filtered[start..(start + PAGE_SIZE).min(total_count)].to_vec()
    };

    PageView { items, total_count, total_pages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_country;

    fn sample() -> Vec<Country> {
        vec![
            test_country("USA", "United States", "Americas", 331_000_000),
            test_country("FIN", "Finland", "Europe", 5_500_000),
        ]
    }

    fn many(n: usize) -> Vec<Country> {
        (0..n).map(|i| test_country(&format!("C{i:02}"), &format!("Country {i}"), "Europe", i as u64)).collect()
    }

    #[test]
    fn empty_filters_match_everything() {
        let countries = sample();
        let view = derive(&countries, &FilterState::new());

        assert_eq!(view.total_count, 2);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.items.len(), 2);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let countries = sample();
        let mut filter = FilterState::new();
        filter.set_search("fin");

        let view = derive(&countries, &filter);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].code, "FIN");
    }

    #[test]
    fn search_also_matches_official_name() {
        let mut countries = sample();
        countries[1].official_name = "Republic of Finland".to_string();
        countries[1].name = "Suomi".to_string();

        let mut filter = FilterState::new();
        filter.set_search("republic");

        let view = derive(&countries, &filter);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].code, "FIN");
    }

    #[test]
    fn region_filter_is_exact_match() {
        let countries = sample();
        let mut filter = FilterState::new();
        filter.set_region(Some("Americas".to_string()));

        let view = derive(&countries, &filter);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].code, "USA");

        filter.set_region(Some("Amer".to_string()));
        assert!(derive(&countries, &filter).is_empty());
    }

    #[test]
    fn population_bracket_filters() {
        let countries = sample();
        let mut filter = FilterState::new();

        filter.set_bracket(PopulationBracket::Under10M);
        let view = derive(&countries, &filter);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].code, "FIN");

        filter.set_bracket(PopulationBracket::Over50M);
        let view = derive(&countries, &filter);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].code, "USA");
    }

    #[test]
    fn brackets_partition_the_population_axis() {
        // Each population matches exactly one non-Any bracket.
        for population in
            [0, 9_999_999, 10_000_000, 25_000_000, 50_000_000, 50_000_001, u64::MAX]
        {
            let matching: Vec<_> = PopulationBracket::all()
                .iter()
                .filter(|b| **b != PopulationBracket::Any && b.matches(population))
                .collect();
            assert_eq!(matching.len(), 1, "population {population}");
        }
    }

    #[test]
    fn ten_million_belongs_to_the_middle_bracket() {
        assert!(!PopulationBracket::Under10M.matches(10_000_000));
        assert!(PopulationBracket::From10To50M.matches(10_000_000));
        assert!(PopulationBracket::From10To50M.matches(50_000_000));
        assert!(!PopulationBracket::Over50M.matches(50_000_000));
    }

    #[test]
    fn pages_are_contiguous_order_preserving_slices() {
        let countries = many(30);
        let mut filter = FilterState::new();

        let page1 = derive(&countries, &filter);
        assert_eq!(page1.total_count, 30);
        assert_eq!(page1.total_pages, 3);
        assert_eq!(page1.items.len(), PAGE_SIZE);
        assert_eq!(page1.items[0].code, "C00");
        assert_eq!(page1.items[11].code, "C11");

        filter.set_page(3);
        let page3 = derive(&countries, &filter);
        assert_eq!(page3.items.len(), 6);
        assert_eq!(page3.items[0].code, "C24");
        assert_eq!(page3.items[5].code, "C29");
    }

    #[test]
    fn page_is_never_larger_than_page_size() {
        let countries = many(100);
        let mut filter = FilterState::new();
        for page in 1..=10 {
            filter.set_page(page);
            assert!(derive(&countries, &filter).items.len() <= PAGE_SIZE);
        }
    }

    #[test]
    fn empty_filtered_set_still_has_one_page() {
        let countries = sample();
        let mut filter = FilterState::new();
        filter.set_search("no such country");

        let view = derive(&countries, &filter);
        assert!(view.is_empty());
        assert_eq!(view.total_count, 0);
        assert_eq!(view.total_pages, 1);
        assert!(view.items.is_empty());
    }

    #[test]
    fn page_beyond_filtered_set_yields_empty_slice() {
        let countries = many(5);
        let mut filter = FilterState::new();
        filter.set_page(4);

        let view = derive(&countries, &filter);
        assert!(view.items.is_empty());
        assert_eq!(view.total_count, 5);
        assert_eq!(view.total_pages, 1);
    }

    #[test]
    fn filter_changes_reset_page_to_one() {
        let mut filter = FilterState::new();
        filter.set_page(4);
        filter.set_search("fin");
        assert_eq!(filter.page(), 1);

        filter.set_page(4);
        filter.set_region(Some("Europe".to_string()));
        assert_eq!(filter.page(), 1);

        filter.set_page(4);
        filter.set_bracket(PopulationBracket::Under10M);
        assert_eq!(filter.page(), 1);
    }

    #[test]
    fn unchanged_filter_value_keeps_the_page() {
        let mut filter = FilterState::new();
        filter.set_search("fin");
        filter.set_page(3);
        filter.set_search("fin");
        assert_eq!(filter.page(), 3);
    }

    #[test]
    fn page_moves_do_not_touch_filters() {
        let mut filter = FilterState::new();
        filter.set_search("fin");
        filter.set_region(Some("Europe".to_string()));

        filter.next_page(5);
        filter.prev_page();
        filter.set_page(2);

        assert_eq!(filter.search(), "fin");
        assert_eq!(filter.region(), Some("Europe"));
    }

    #[test]
    fn prev_and_next_clamp_to_bounds() {
        let mut filter = FilterState::new();
        filter.prev_page();
        assert_eq!(filter.page(), 1);

        filter.next_page(2);
        assert_eq!(filter.page(), 2);
        filter.next_page(2);
        assert_eq!(filter.page(), 2);

        // An empty result set still has one page to sit on.
        let mut filter = FilterState::new();
        filter.next_page(0);
        assert_eq!(filter.page(), 1);
    }

    #[test]
    fn bracket_parse_roundtrip() {
        for bracket in PopulationBracket::all() {
            let parsed = PopulationBracket::try_from(bracket.as_str())
                .expect("roundtrip should succeed");
            assert_eq!(*bracket, parsed);
        }
        assert!(PopulationBracket::try_from("huge").is_err());
    }
}
