use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::browse;

use countries_core::{
    Config, Country, CountryCatalog, FavoritesStore, FilterState, OpenWeatherProvider,
    PopulationBracket, RestCountriesCatalog, WeatherProvider, derive,
};

/// Message shown when the catalog cannot be loaded; retry is manual.
pub(crate) const CATALOG_FAILED: &str = "Unable to load countries. Please try again.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "countries", version, about = "Country explorer CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List countries, with optional search, filters and paging.
    List {
        /// Case-insensitive substring match on common or official name.
        #[arg(long)]
        search: Option<String>,

        /// Exact region name, e.g. "Europe" or "Americas".
        #[arg(long)]
        region: Option<String>,

        /// Population bracket: lt10, 10to50 or gt50.
        #[arg(long)]
        population: Option<String>,

        /// 1-based page number; clamped to the last page.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Show details and capital weather for one country code.
    Show {
        /// 3-letter country code, e.g. "FIN".
        code: String,
    },

    /// List favorite countries.
    Favorites,

    /// Toggle a country in the favorites list.
    Favorite {
        /// 3-letter country code, e.g. "FIN".
        code: String,
    },

    /// Browse countries interactively.
    Browse,

    /// Store the OpenWeather API key.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::List { search, region, population, page } => {
                run_list(search, region, population, page).await
            }
            Command::Show { code } => run_show(&code).await,
            Command::Favorites => run_favorites(),
            Command::Favorite { code } => run_favorite(&code).await,
            Command::Browse => browse::run().await,
            Command::Configure => run_configure(),
        }
    }
}

/// Fetch the catalog; a failure here is fatal to the command.
pub(crate) async fn load_catalog() -> Result<Vec<Country>> {
    let catalog = RestCountriesCatalog::new();
    catalog.all_countries().await.context(CATALOG_FAILED)
}

pub(crate) fn find_country<'a>(countries: &'a [Country], code: &str) -> Result<&'a Country> {
    let code = code.to_uppercase();
    countries
        .iter()
        .find(|c| c.code == code)
        .ok_or_else(|| anyhow::anyhow!("No country with code '{code}'."))
}

async fn run_list(
    search: Option<String>,
    region: Option<String>,
    population: Option<String>,
    page: usize,
) -> Result<()> {
    let countries = load_catalog().await?;
    let favorites = FavoritesStore::open_default()?;

    let mut filter = FilterState::new();
    if let Some(search) = search {
        filter.set_search(search);
    }
    filter.set_region(region);
    if let Some(bracket) = population {
        filter.set_bracket(PopulationBracket::try_from(bracket.as_str())?);
    }

    // Clamp the requested page to what the filtered set actually has.
    let total_pages = derive(&countries, &filter).total_pages;
    filter.set_page(page.min(total_pages));

    let view = derive(&countries, &filter);
    if view.is_empty() {
        println!("No countries match your filters. Try adjusting your search.");
        return Ok(());
    }

    for country in &view.items {
        println!("{}", list_line(country, favorites.is_favorite(&country.code)));
    }
    println!();
    println!(
        "Page {} of {} ({} countries)",
        filter.page(),
        view.total_pages,
        view.total_count
    );

    Ok(())
}

async fn run_show(code: &str) -> Result<()> {
    let countries = load_catalog().await?;
    let favorites = FavoritesStore::open_default()?;
    let country = find_country(&countries, code)?;

    print_details(country, favorites.is_favorite(&country.code));
    print_weather(country).await;

    Ok(())
}

fn run_favorites() -> Result<()> {
    let favorites = FavoritesStore::open_default()?;

    if favorites.is_empty() {
        println!("No favorites yet. Use `countries favorite <code>` to add one.");
        return Ok(());
    }

    for country in favorites.list() {
        println!("{}", list_line(country, true));
    }

    Ok(())
}

async fn run_favorite(code: &str) -> Result<()> {
    let countries = load_catalog().await?;
    let mut favorites = FavoritesStore::open_default()?;
    let country = find_country(&countries, code)?;

    if favorites.toggle(country)? {
        println!("Added {} to favorites.", country.name);
    } else {
        println!("Removed {} from favorites.", country.name);
    }

    Ok(())
}

fn run_configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty.");
    }

    config.set_weather_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved. Weather lookups are now enabled.");
    Ok(())
}

/// One list row: marker, code, name, region, population.
pub(crate) fn list_line(country: &Country, favorite: bool) -> String {
    let marker = if favorite { "*" } else { " " };
    format!(
        "{marker} {}  {:<32} {:<12} {:>12}",
        country.code,
        country.name,
        country.region,
        format_population(country.population),
    )
}

pub(crate) fn print_details(country: &Country, favorite: bool) {
    println!("{} ({})", country.name, country.code);
    println!("Official name: {}", country.official_name);
    match country.capital_city() {
        Some(capital) => println!("Capital:       {capital}"),
        None => println!("Capital:       n/a"),
    }
    if country.subregion.is_empty() {
        println!("Region:        {}", country.region);
    } else {
        println!("Region:        {} ({})", country.region, country.subregion);
    }
    println!("Population:    {}", format_population(country.population));

    if !country.languages.is_empty() {
        let languages: Vec<&str> = country.languages.values().map(String::as_str).collect();
        println!("Languages:     {}", languages.join(", "));
    }
    if !country.currencies.is_empty() {
        let currencies: Vec<String> = country
            .currencies
            .iter()
            .map(|(code, name)| format!("{name} ({code})"))
            .collect();
        println!("Currencies:    {}", currencies.join(", "));
    }
    if !country.timezones.is_empty() {
        println!("Timezones:     {}", country.timezones.join(", "));
    }
    if let Some(flag_url) = &country.flag_url {
        println!("Flag:          {flag_url}");
    }
    if favorite {
        println!("Favorite:      yes");
    }
}

/// Print the capital weather panel. Never fatal: any failure (including
/// a missing API key) becomes an inline message, and a country without a
/// capital gets no lookup at all.
pub(crate) async fn print_weather(country: &Country) {
    let Some(capital) = country.capital_city() else {
        return;
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            println!("Weather:       unavailable ({err})");
            return;
        }
    };
    let api_key = match config.require_weather_api_key() {
        Ok(api_key) => api_key,
        Err(err) => {
            println!("Weather:       unavailable ({err})");
            return;
        }
    };

    let provider = OpenWeatherProvider::new(api_key);
    match provider.current_weather(capital).await {
        Ok(weather) => {
            println!(
                "Weather:       {:.1} °C, {} ({}) in {capital}",
                weather.temperature_c, weather.condition, weather.description
            );
        }
        Err(err) => println!("Weather:       unavailable ({err})"),
    }
}

pub(crate) fn format_population(population: u64) -> String {
    // 331000000 -> "331,000,000"
    let digits = population.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
