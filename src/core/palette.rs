//! Purpose: Map palette and linetype scheme names to fixed command strings.
//! Exports: `palette`, `palette_names`, `linetypes`, `linetype_names`.
//! Role: Template tables; the contract is name in, exact command text out.
//! Invariants: Output strings are stable once published; new names are
//! additive-only.

use crate::core::error::{Error, ErrorKind};

const VIRIDIS: &[&str] = &[
    "#440154", "#46327e", "#365c8d", "#277f8e", "#1fa187", "#4ac16d", "#a0da39", "#fde725",
];
const MAGMA: &[&str] = &[
    "#000004", "#1c1044", "#4f127b", "#812581", "#b5367a", "#e55064", "#fb8761", "#fec287",
    "#fcfdbf",
];
const PLASMA: &[&str] = &[
    "#0d0887", "#4c02a1", "#7e03a8", "#aa2395", "#cc4778", "#e66c5c", "#f89441", "#fdc328",
    "#f0f921",
];
const JET: &[&str] = &[
    "#00007f", "#0000ff", "#007fff", "#00ffff", "#7fff7f", "#ffff00", "#ff7f00", "#ff0000",
    "#7f0000",
];
const GRAYS: &[&str] = &[
    "#000000", "#242424", "#484848", "#6d6d6d", "#919191", "#b6b6b6", "#dadada", "#ffffff",
];

const PALETTES: &[(&str, &[&str])] = &[
    ("viridis", VIRIDIS),
    ("magma", MAGMA),
    ("plasma", PLASMA),
    ("jet", JET),
    ("grays", GRAYS),
];

// Brewer Dark2 / Set1, plus the engine's stock colors under "classic".
const DARK2: &[&str] = &[
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d", "#666666",
];
const SET1: &[&str] = &[
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
];
const CLASSIC: &[&str] = &[
    "#9400d3", "#009e73", "#56b4e9", "#e69f00", "#f0e442", "#0072b2", "#e51e10", "#000000",
];

const LINETYPES: &[(&str, &[&str])] = &[("dark2", DARK2), ("set1", SET1), ("classic", CLASSIC)];

fn lookup<'a>(
    table: &[(&str, &'a [&'a str])],
    name: &str,
    what: &str,
    names: &[&str],
) -> Result<&'a [&'a str], Error> {
    table
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, colors)| *colors)
        .ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message(format!("unknown {what} {name:?}"))
                .with_hint(format!("Known names: {}.", names.join(", ")))
        })
}

/// The `set palette defined (...)` command for a named palette.
pub fn palette(name: &str) -> Result<String, Error> {
    let colors = lookup(PALETTES, name, "palette", &palette_names_vec())?;
    let stops = colors
        .iter()
        .enumerate()
        .map(|(index, color)| format!("{index} '{color}'"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("set palette defined ({stops})"))
}

pub fn palette_names() -> Vec<&'static str> {
    palette_names_vec()
}

fn palette_names_vec() -> Vec<&'static str> {
    PALETTES.iter().map(|(name, _)| *name).collect()
}

/// The `set linetype ...` command sequence for a named color scheme.
pub fn linetypes(name: &str) -> Result<Vec<String>, Error> {
    let colors = lookup(LINETYPES, name, "linetype scheme", &linetype_names())?;
    let mut commands: Vec<String> = colors
        .iter()
        .enumerate()
        .map(|(index, color)| format!("set linetype {} lc rgb '{color}' lw 1", index + 1))
        .collect();
    commands.push(format!("set linetype cycle {}", colors.len()));
    Ok(commands)
}

pub fn linetype_names() -> Vec<&'static str> {
    LINETYPES.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::{linetype_names, linetypes, palette, palette_names};
    use crate::core::error::ErrorKind;

    #[test]
    fn named_palette_maps_to_a_fixed_command() {
        assert_eq!(
            palette("viridis").expect("palette"),
            "set palette defined (0 '#440154', 1 '#46327e', 2 '#365c8d', 3 '#277f8e', \
             4 '#1fa187', 5 '#4ac16d', 6 '#a0da39', 7 '#fde725')"
        );
    }

    #[test]
    fn unknown_palette_is_not_found_with_a_hint() {
        let err = palette("sunburst").expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.hint().unwrap_or_default().contains("viridis"));
    }

    #[test]
    fn linetype_scheme_sets_colors_then_cycle() {
        let commands = linetypes("dark2").expect("scheme");
        assert_eq!(commands.len(), 9);
        assert_eq!(commands[0], "set linetype 1 lc rgb '#1b9e77' lw 1");
        assert_eq!(commands[8], "set linetype cycle 8");
    }

    #[test]
    fn name_listings_are_nonempty() {
        assert!(palette_names().contains(&"viridis"));
        assert!(linetype_names().contains(&"classic"));
    }
}
