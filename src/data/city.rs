//! Static city catalog
//!
//! The list of cities a user can pick from when adding to the watch list,
//! plus the city the watch list is seeded with on first run.

use super::City;

/// A catalog entry. Uses `&'static str` so the table can be a static array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCity {
    pub key: &'static str,
    pub label: &'static str,
}

impl CatalogCity {
    pub fn to_city(self) -> City {
        City::new(self.key, self.label)
    }
}

/// Key of the city seeded into an empty watch list
pub const DEFAULT_CITY_KEY: &str = "newyork";

/// Cities offered by the add command, in display order
pub static CITIES: [CatalogCity; 7] = [
    CatalogCity {
        key: "austin",
        label: "Austin, TX",
    },
    CatalogCity {
        key: "boston",
        label: "Boston, MA",
    },
    CatalogCity {
        key: "chicago",
        label: "Chicago, IL",
    },
    CatalogCity {
        key: "newyork",
        label: "New York, NY",
    },
    CatalogCity {
        key: "portland",
        label: "Portland, OR",
    },
    CatalogCity {
        key: "sanfrancisco",
        label: "San Francisco, CA",
    },
    CatalogCity {
        key: "seattle",
        label: "Seattle, WA",
    },
];

/// Returns a slice of every catalog city
pub fn all_cities() -> &'static [CatalogCity] {
    &CITIES
}

/// Finds a catalog city by key (exact, case-sensitive match)
pub fn get_city_by_key(key: &str) -> Option<&'static CatalogCity> {
    CITIES.iter().find(|city| city.key == key)
}

/// The city an empty watch list is seeded with
pub fn default_city() -> City {
    City::new(DEFAULT_CITY_KEY, "New York, NY")
}
