//! S-57 attribute code tables.
//!
//! Each table maps the integer code (as text) of one S-57 attribute to a
//! readable value. Lookups never fail: unknown, empty and null codes map to
//! `None`.

/// A closed code → name table for one attribute.
#[derive(Debug)]
pub struct CodeTable {
    pub attribute: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl CodeTable {
    const fn new(attribute: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { attribute, entries }
    }

    pub fn lookup(&self, code: &str) -> Option<&'static str> {
        let code = code.trim();
        self.entries
            .iter()
            .find(|(k, _)| *k == code)
            .map(|(_, v)| *v)
    }

    /// Map an optional raw code to its owned name.
    pub fn map(&self, code: Option<&str>) -> Option<String> {
        code.and_then(|c| self.lookup(c)).map(str::to_string)
    }
}

/// COLOUR
pub static COLOURS: CodeTable = CodeTable::new(
    "colour",
    &[
        ("1", "white"),
        ("2", "black"),
        ("3", "red"),
        ("4", "green"),
        ("5", "blue"),
        ("6", "yellow"),
        ("7", "grey"),
        ("8", "brown"),
        ("9", "amber"),
        ("10", "violet"),
        ("11", "orange"),
        ("12", "magenta"),
        ("13", "pink"),
    ],
);

/// BOYSHP
pub static BUOY_SHAPES: CodeTable = CodeTable::new(
    "boyshp",
    &[
        ("1", "conical"),
        ("2", "can"),
        ("3", "spherical"),
        ("4", "pillar"),
        ("5", "spar"),
        ("6", "barrel"),
        ("7", "super-buoy"),
        ("8", "ice buoy"),
    ],
);

/// BCNSHP
pub static BEACON_SHAPES: CodeTable = CodeTable::new(
    "bcnshp",
    &[
        ("1", "stake"),
        ("2", "withy"),
        ("3", "beacon tower"),
        ("4", "lattice beacon"),
        ("5", "pile beacon"),
        ("6", "cairn"),
        ("7", "buoyant beacon"),
    ],
);

/// CATLAM
pub static LATERAL_CATEGORIES: CodeTable = CodeTable::new(
    "catlam",
    &[
        ("1", "port"),
        ("2", "starboard"),
        ("3", "preferred_channel_starboard"),
        ("4", "preferred_channel_port"),
    ],
);

/// COLPAT
pub static COLOUR_PATTERNS: CodeTable = CodeTable::new(
    "colpat",
    &[
        ("1", "horizontal"),
        ("2", "vertical"),
        ("3", "diagonal"),
        ("4", "squared"),
        ("5", "stripes"),
        ("6", "border"),
    ],
);

/// Resolve a comma-separated COLOUR list, e.g. `"3,6"` → `["red", "yellow"]`.
///
/// Unknown codes are dropped; if nothing resolves the result is `None`.
pub fn parse_colours(raw: Option<&str>) -> Option<Vec<String>> {
    let colours: Vec<String> = raw?
        .split(',')
        .filter_map(|code| COLOURS.lookup(code))
        .map(str::to_string)
        .collect();
    (!colours.is_empty()).then_some(colours)
}
