//! Interactive browse loop: paged list, filters, detail view, favorites.
//!
//! The loop owns the transient view state (filters, page) and re-derives
//! the visible page after every intent, mirroring the fetch → derive →
//! render cycle of the core pipeline.

use anyhow::{Context, Result};
use inquire::{InquireError, Select, Text};

use countries_core::{
    Config, Country, CountryCatalog, Debouncer, FavoritesStore, FetchState, FilterState, Loader,
    OpenWeatherProvider, PopulationBracket, RestCountriesCatalog, SEARCH_DEBOUNCE,
    WeatherSnapshot, derive, request_capital_weather,
};

use crate::cli::{CATALOG_FAILED, list_line, print_details};

pub(crate) async fn run() -> Result<()> {
    let countries = match load_countries_with_retry().await? {
        Some(countries) => countries,
        None => return Ok(()), // user chose to quit instead of retrying
    };

    let favorites = FavoritesStore::open_default()?;
    let weather = Config::load()?
        .resolved_weather_api_key()
        .map(OpenWeatherProvider::new);

    Browser::new(countries, favorites, weather).run().await
}

/// Fetch the catalog through a [`Loader`], offering a manual retry on
/// failure. Returns `None` when the user quits without a catalog.
async fn load_countries_with_retry() -> Result<Option<Vec<Country>>> {
    let catalog = RestCountriesCatalog::new();
    let mut loader: Loader<Vec<Country>> = Loader::new();

    loop {
        let catalog = catalog.clone();
        loader.start(async move { catalog.all_countries().await });
        println!("Loading countries...");
        loader.settle().await;

        match loader.state() {
            FetchState::Ready(countries) => return Ok(Some(countries.clone())),
            FetchState::Failed(_) => {
                println!("{CATALOG_FAILED}");
                match prompt_select("What now?", vec!["Retry", "Quit"])? {
                    Some("Retry") => continue,
                    _ => return Ok(None),
                }
            }
            // Idle/Loading cannot follow settle(); treat as quit.
            _ => return Ok(None),
        }
    }
}

struct Browser {
    countries: Vec<Country>,
    filter: FilterState,
    favorites: FavoritesStore,
    weather: Option<OpenWeatherProvider>,
}

impl Browser {
    fn new(
        countries: Vec<Country>,
        favorites: FavoritesStore,
        weather: Option<OpenWeatherProvider>,
    ) -> Self {
        Self { countries, filter: FilterState::new(), favorites, weather }
    }

    async fn run(&mut self) -> Result<()> {
        let (mut debouncer, mut committed) = Debouncer::new(SEARCH_DEBOUNCE);

        loop {
            let view = derive(&self.countries, &self.filter);
            let total_pages = view.total_pages;

            self.render(&view.items, view.total_count, total_pages);

            let mut actions = Vec::new();
            if !view.items.is_empty() {
                actions.push("Open a country");
            }
            if self.filter.page() < total_pages {
                actions.push("Next page");
            }
            if self.filter.page() > 1 {
                actions.push("Previous page");
            }
            actions.extend(["Search", "Filter by region", "Filter by population"]);
            if !self.favorites.is_empty() {
                actions.push("Show favorites");
            }
            actions.push("Quit");

            match prompt_select("Action:", actions)? {
                Some("Open a country") => {
                    let selected = {
                        let items = derive(&self.countries, &self.filter).items;
                        self.pick_country(&items)?
                    };
                    if let Some(country) = selected {
                        self.show_detail(&country).await?;
                    }
                }
                Some("Next page") => self.filter.next_page(total_pages),
                Some("Previous page") => self.filter.prev_page(),
                Some("Search") => {
                    if let Some(query) = prompt_text("Search country:")? {
                        // Commit through the debouncer so a quieter input
                        // stream (e.g. piped edits) coalesces to one query.
                        debouncer.submit(query);
                        if let Some(query) = committed.recv().await {
                            self.filter.set_search(query);
                        }
                    }
                }
                Some("Filter by region") => {
                    let mut regions = self.regions();
                    regions.insert(0, "All regions".to_string());
                    if let Some(region) = prompt_select("Region:", regions)? {
                        let region =
                            (region != "All regions").then_some(region);
                        self.filter.set_region(region);
                    }
                }
                Some("Filter by population") => {
                    let options = vec![
                        "All populations",
                        "Less than 10M",
                        "10M to 50M",
                        "More than 50M",
                    ];
                    if let Some(choice) = prompt_select("Population:", options)? {
                        let bracket = match choice {
                            "Less than 10M" => PopulationBracket::Under10M,
                            "10M to 50M" => PopulationBracket::From10To50M,
                            "More than 50M" => PopulationBracket::Over50M,
                            _ => PopulationBracket::Any,
                        };
                        self.filter.set_bracket(bracket);
                    }
                }
                Some("Show favorites") => self.show_favorites(),
                _ => return Ok(()),
            }
        }
    }

    fn render(&self, items: &[&Country], total_count: usize, total_pages: usize) {
        println!();
        if items.is_empty() {
            println!("No countries match your filters. Try adjusting your search.");
        } else {
            for country in items {
                println!("{}", list_line(country, self.favorites.is_favorite(&country.code)));
            }
        }
        println!();
        println!("Page {} of {total_pages} ({total_count} countries)", self.filter.page());
    }

    /// Let the user pick one country from the visible page.
    fn pick_country(&self, items: &[&Country]) -> Result<Option<Country>> {
        let names: Vec<String> =
            items.iter().map(|c| format!("{} ({})", c.name, c.code)).collect();

        let Some(choice) = prompt_select("Country:", names.clone())? else {
            return Ok(None);
        };
        let index = names.iter().position(|n| *n == choice).unwrap_or(0);
        Ok(Some(items[index].clone()))
    }

    /// Detail view for one country. The weather loader lives only as
    /// long as the view; leaving it drops any in-flight lookup.
    async fn show_detail(&mut self, country: &Country) -> Result<()> {
        println!();
        print_details(country, self.favorites.is_favorite(&country.code));

        let mut weather_loader: Loader<WeatherSnapshot> = Loader::new();
        match &self.weather {
            Some(provider) => {
                // No capital: no lookup is issued and no error is shown.
                request_capital_weather(&mut weather_loader, provider, country);
                weather_loader.settle().await;
            }
            None if country.capital_city().is_some() => {
                println!("Weather:       unavailable (no API key; run `countries configure`)");
            }
            None => {}
        }

        match weather_loader.state() {
            FetchState::Ready(weather) => {
                println!(
                    "Weather:       {:.1} °C, {} ({})",
                    weather.temperature_c, weather.condition, weather.description
                );
            }
            FetchState::Failed(message) => {
                println!("Weather:       unavailable ({message})");
            }
            _ => {}
        }

        let toggle_label = if self.favorites.is_favorite(&country.code) {
            "Remove from favorites"
        } else {
            "Add to favorites"
        };
        if let Some(choice) = prompt_select("Action:", vec![toggle_label, "Back"])? {
            if choice != "Back" {
                self.favorites.toggle(country).context("Failed to update favorites")?;
            }
        }

        Ok(())
    }

    fn show_favorites(&self) {
        println!();
        println!("Favorites:");
        for country in self.favorites.list() {
            println!("{}", list_line(country, true));
        }
    }

    /// Distinct regions present in the catalog, in first-seen order.
    fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();
        for country in &self.countries {
            if !country.region.is_empty() && !regions.contains(&country.region) {
                regions.push(country.region.clone());
            }
        }
        regions
    }
}

/// A select prompt where Esc means "go back" rather than an error.
fn prompt_select<T: std::fmt::Display>(prompt: &str, options: Vec<T>) -> Result<Option<T>> {
    match Select::new(prompt, options).prompt() {
        Ok(choice) => Ok(Some(choice)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Prompt failed"),
    }
}

fn prompt_text(prompt: &str) -> Result<Option<String>> {
    match Text::new(prompt).prompt() {
        Ok(text) => Ok(Some(text)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Prompt failed"),
    }
}
