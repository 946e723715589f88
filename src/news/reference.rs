//! Static reference lists. These never touch the network or the cache.

use super::types::{Country, Language};

macro_rules! table {
  ($ty:ident, $($id:literal => $name:literal),+ $(,)?) => {
    &[$($ty { id: $id, name: $name }),+]
  };
}

/// Countries NewsAPI serves top headlines for
pub const COUNTRIES: &[Country] = table!(Country,
  "ae" => "United Arab Emirates",
  "ar" => "Argentina",
  "at" => "Austria",
  "au" => "Australia",
  "be" => "Belgium",
  "bg" => "Bulgaria",
  "br" => "Brazil",
  "ca" => "Canada",
  "ch" => "Switzerland",
  "cn" => "China",
  "co" => "Colombia",
  "cz" => "Czechia",
  "de" => "Germany",
  "eg" => "Egypt",
  "fr" => "France",
  "gb" => "United Kingdom",
  "gr" => "Greece",
  "hk" => "Hong Kong",
  "hu" => "Hungary",
  "id" => "Indonesia",
  "ie" => "Ireland",
  "il" => "Israel",
  "in" => "India",
  "it" => "Italy",
  "jp" => "Japan",
  "kr" => "South Korea",
  "lt" => "Lithuania",
  "lv" => "Latvia",
  "ma" => "Morocco",
  "mx" => "Mexico",
  "my" => "Malaysia",
  "ng" => "Nigeria",
  "nl" => "Netherlands",
  "no" => "Norway",
  "nz" => "New Zealand",
  "ph" => "Philippines",
  "pl" => "Poland",
  "pt" => "Portugal",
  "ro" => "Romania",
  "rs" => "Serbia",
  "ru" => "Russia",
  "sa" => "Saudi Arabia",
  "se" => "Sweden",
  "sg" => "Singapore",
  "si" => "Slovenia",
  "sk" => "Slovakia",
  "th" => "Thailand",
  "tr" => "Turkey",
  "tw" => "Taiwan",
  "ua" => "Ukraine",
  "us" => "United States",
  "ve" => "Venezuela",
  "za" => "South Africa",
);

/// Article languages NewsAPI can filter on
pub const LANGUAGES: &[Language] = table!(Language,
  "ar" => "Arabic",
  "de" => "German",
  "en" => "English",
  "es" => "Spanish",
  "fr" => "French",
  "he" => "Hebrew",
  "it" => "Italian",
  "nl" => "Dutch",
  "no" => "Norwegian",
  "pt" => "Portuguese",
  "ru" => "Russian",
  "sv" => "Swedish",
  "zh" => "Chinese",
);

pub fn find_country(id: &str) -> Option<&'static Country> {
  COUNTRIES.iter().find(|c| c.id.eq_ignore_ascii_case(id))
}

pub fn find_language(id: &str) -> Option<&'static Language> {
  LANGUAGES.iter().find(|l| l.id.eq_ignore_ascii_case(id))
}
