//! Classes d'occupation du sol Impact Observatory (IO 10m annual LULC)

use crate::types::LandCoverClass;

/// Codes et libellés des classes, dans l'ordre de la nomenclature
pub const IO_LANDCOVER_CLASSES: [(i32, &str); 10] = [
    (0, "no data"),
    (1, "water"),
    (2, "trees"),
    (4, "flooded vegetation"),
    (5, "crops"),
    (7, "built area"),
    (8, "bare ground"),
    (9, "snow/ice"),
    (10, "clouds"),
    (11, "rangeland"),
];

/// Code de la classe "trees", utilisé pour détecter les perturbations forestières
pub const TREES: i32 = 2;

/// Retourne la table de référence complète
pub fn land_cover_classes() -> Vec<LandCoverClass> {
    IO_LANDCOVER_CLASSES
        .iter()
        .map(|&(value, description)| LandCoverClass {
            value,
            description: description.to_string(),
        })
        .collect()
}

/// Libellé d'un code de classe
pub fn describe(value: i32) -> Option<&'static str> {
    IO_LANDCOVER_CLASSES
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, d)| *d)
}
