use quasar_utils::QuasarResult;

use crate::sources::row::SourceRow;
use crate::transforms::codes::{self, CodeTable};
use crate::transforms::record::NavigationAid;
use crate::transforms::schema::SchemaId;
use crate::transforms::traits::Normalizer;

/// Lateral marks (S-57 BOYLAT / BCNLAT). Buoys and beacons differ only in
/// the structure type and which shape attribute they carry.
pub struct LateralNormalizer {
    name: &'static str,
    structure_type: &'static str,
    shape_column: &'static str,
    shapes: &'static CodeTable,
}

impl LateralNormalizer {
    /// BOYLAT
    pub fn buoy() -> Self {
        Self {
            name: "boylat",
            structure_type: "buoy",
            shape_column: "boyshp",
            shapes: &codes::BUOY_SHAPES,
        }
    }

    /// BCNLAT
    pub fn beacon() -> Self {
        Self {
            name: "bcnlat",
            structure_type: "beacon",
            shape_column: "bcnshp",
            shapes: &codes::BEACON_SHAPES,
        }
    }
}

impl Normalizer for LateralNormalizer {
    fn name(&self) -> &str {
        self.name
    }

    fn normalize(&self, schema: &SchemaId, row: &SourceRow) -> QuasarResult<NavigationAid> {
        let mut aid = NavigationAid::base(schema, row, self.structure_type, "lateral")?;
        aid.lateral_side = codes::LATERAL_CATEGORIES.map(row.text("catlam").as_deref());
        aid.name = row.text("objnam");
        aid.shape = self.shapes.map(row.text(self.shape_column).as_deref());
        aid.colors = codes::parse_colours(row.text("colour").as_deref());
        aid.color_pattern = codes::COLOUR_PATTERNS.map(row.text("colpat").as_deref());
        Ok(aid)
    }
}
