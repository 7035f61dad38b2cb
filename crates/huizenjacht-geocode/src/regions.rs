//! Closed lists of French administrative units used to recognise region
//! and département names in scraped text.
//!
//! Only names in these tables can be recognised; anything else is left to
//! the geocoder. Lookups are case-, accent-, hyphen-, and apostrophe-insensitive.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::text::{collapse_whitespace, fold};

/// Current régions, as the geocoder reports them in `address.state`.
pub const REGIONS: &[&str] = &[
    "Auvergne-Rhône-Alpes",
    "Bourgogne-Franche-Comté",
    "Bretagne",
    "Centre-Val de Loire",
    "Corse",
    "Grand Est",
    "Hauts-de-France",
    "Île-de-France",
    "Normandie",
    "Nouvelle-Aquitaine",
    "Occitanie",
    "Pays de la Loire",
    "Provence-Alpes-Côte d'Azur",
    "Guadeloupe",
    "Martinique",
    "Guyane",
    "La Réunion",
    "Mayotte",
];

/// Pre-2016 régions and common aliases, mapped to the current région.
const REGION_ALIASES: &[(&str, &str)] = &[
    ("Alsace", "Grand Est"),
    ("Lorraine", "Grand Est"),
    ("Champagne-Ardenne", "Grand Est"),
    ("Aquitaine", "Nouvelle-Aquitaine"),
    ("Limousin", "Nouvelle-Aquitaine"),
    ("Poitou-Charentes", "Nouvelle-Aquitaine"),
    ("Midi-Pyrénées", "Occitanie"),
    ("Languedoc-Roussillon", "Occitanie"),
    ("Rhône-Alpes", "Auvergne-Rhône-Alpes"),
    ("Auvergne", "Auvergne-Rhône-Alpes"),
    ("Bourgogne", "Bourgogne-Franche-Comté"),
    ("Franche-Comté", "Bourgogne-Franche-Comté"),
    ("Nord-Pas-de-Calais", "Hauts-de-France"),
    ("Picardie", "Hauts-de-France"),
    ("Basse-Normandie", "Normandie"),
    ("Haute-Normandie", "Normandie"),
    ("Centre", "Centre-Val de Loire"),
    ("PACA", "Provence-Alpes-Côte d'Azur"),
    ("Réunion", "La Réunion"),
];

/// Départements, as the geocoder reports them in `address.county`.
pub const COUNTIES: &[&str] = &[
    "Ain",
    "Aisne",
    "Allier",
    "Alpes-de-Haute-Provence",
    "Hautes-Alpes",
    "Alpes-Maritimes",
    "Ardèche",
    "Ardennes",
    "Ariège",
    "Aube",
    "Aude",
    "Aveyron",
    "Bouches-du-Rhône",
    "Calvados",
    "Cantal",
    "Charente",
    "Charente-Maritime",
    "Cher",
    "Corrèze",
    "Corse-du-Sud",
    "Haute-Corse",
    "Côte-d'Or",
    "Côtes-d'Armor",
    "Creuse",
    "Dordogne",
    "Doubs",
    "Drôme",
    "Eure",
    "Eure-et-Loir",
    "Finistère",
    "Gard",
    "Haute-Garonne",
    "Gers",
    "Gironde",
    "Hérault",
    "Ille-et-Vilaine",
    "Indre",
    "Indre-et-Loire",
    "Isère",
    "Jura",
    "Landes",
    "Loir-et-Cher",
    "Loire",
    "Haute-Loire",
    "Loire-Atlantique",
    "Loiret",
    "Lot",
    "Lot-et-Garonne",
    "Lozère",
    "Maine-et-Loire",
    "Manche",
    "Marne",
    "Haute-Marne",
    "Mayenne",
    "Meurthe-et-Moselle",
    "Meuse",
    "Morbihan",
    "Moselle",
    "Nièvre",
    "Nord",
    "Oise",
    "Orne",
    "Pas-de-Calais",
    "Puy-de-Dôme",
    "Pyrénées-Atlantiques",
    "Hautes-Pyrénées",
    "Pyrénées-Orientales",
    "Bas-Rhin",
    "Haut-Rhin",
    "Rhône",
    "Haute-Saône",
    "Saône-et-Loire",
    "Sarthe",
    "Savoie",
    "Haute-Savoie",
    "Paris",
    "Seine-Maritime",
    "Seine-et-Marne",
    "Yvelines",
    "Deux-Sèvres",
    "Somme",
    "Tarn",
    "Tarn-et-Garonne",
    "Var",
    "Vaucluse",
    "Vendée",
    "Vienne",
    "Haute-Vienne",
    "Vosges",
    "Yonne",
    "Territoire de Belfort",
    "Essonne",
    "Hauts-de-Seine",
    "Seine-Saint-Denis",
    "Val-de-Marne",
    "Val-d'Oise",
    "Guadeloupe",
    "Martinique",
    "Guyane",
    "La Réunion",
    "Mayotte",
];

static REGION_INDEX: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    REGIONS
        .iter()
        .map(|name| (lookup_key(name), *name))
        .chain(
            REGION_ALIASES
                .iter()
                .map(|(alias, name)| (lookup_key(alias), *name)),
        )
        .collect()
});

static COUNTY_INDEX: LazyLock<HashMap<String, &'static str>> =
    LazyLock::new(|| COUNTIES.iter().map(|name| (lookup_key(name), *name)).collect());

/// Comparison form: folded, with hyphens and apostrophes turned into spaces.
fn lookup_key(name: &str) -> String {
    let spaced: String = fold(name)
        .chars()
        .map(|c| if matches!(c, '-' | '\'' | '_') { ' ' } else { c })
        .collect();
    collapse_whitespace(&spaced)
}

/// Canonical région name for `name`, accepting former régions as aliases.
#[must_use]
pub fn lookup_region(name: &str) -> Option<&'static str> {
    REGION_INDEX.get(&lookup_key(name)).copied()
}

/// Canonical département name for `name`.
#[must_use]
pub fn lookup_county(name: &str) -> Option<&'static str> {
    COUNTY_INDEX.get(&lookup_key(name)).copied()
}
