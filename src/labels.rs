//! Batch-wide color table read from `labels.csv`.
//!
//! The expected layout is the one written for TotalSegmentator-style
//! datasets:
//!
//! ```text
//! LabelValue,Name,Color_R,Color_G,Color_B,Color_A
//! 1,spleen,157,108,162,255
//! ```
//!
//! Columns are located by header name (`name`, `color_r`/`r`, ...). Files
//! without a header are read positionally as `value,name,r,g,b[,a]`.
//!
//! Fields are split on plain commas. Quoting is not supported: a row with a
//! `"` is rejected, so names cannot contain commas.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::LabelTableError;
use crate::segmentation::Rgb;

#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    colors: HashMap<String, Rgb>,
}

struct Columns {
    name: usize,
    rgb: [usize; 3],
}

impl Columns {
    const POSITIONAL: Columns = Columns {
        name: 1,
        rgb: [2, 3, 4],
    };

    fn from_header(fields: &[&str]) -> Option<Self> {
        let find = |names: &[&str]| {
            fields
                .iter()
                .position(|f| names.iter().any(|n| f.eq_ignore_ascii_case(n)))
        };
        Some(Self {
            name: find(&["name", "labelname"])?,
            rgb: [
                find(&["color_r", "r", "red"])?,
                find(&["color_g", "g", "green"])?,
                find(&["color_b", "b", "blue"])?,
            ],
        })
    }
}

impl LabelTable {
    /// Load the table from `path`. Returns `Ok(None)` if the file is absent.
    pub fn load(path: &Path) -> Result<Option<Self>, LabelTableError> {
        if !path.is_file() {
            debug!("No label table at {:?}", path);
            return Ok(None);
        }
        let text = fs::read_to_string(path)?;
        let table = Self::parse(&text)?;
        debug!("Loaded {} labels from {:?}", table.len(), path);
        Ok(Some(table))
    }

    pub fn parse(text: &str) -> Result<Self, LabelTableError> {
        let mut colors = HashMap::new();
        let mut columns: Option<Columns> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.contains('"') {
                return Err(LabelTableError::InvalidRow {
                    line: line_no,
                    reason: "quoted fields are not supported".to_string(),
                });
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();

            if columns.is_none()
                && let Some(header) = Columns::from_header(&fields)
            {
                columns = Some(header);
                continue;
            }
            let cols = columns.get_or_insert(Columns::POSITIONAL);

            let field = |i: usize| {
                fields.get(i).copied().ok_or_else(|| LabelTableError::InvalidRow {
                    line: line_no,
                    reason: format!("expected at least {} columns", i + 1),
                })
            };
            let channel = |i: usize| -> Result<u8, LabelTableError> {
                let raw = field(i)?;
                raw.parse::<u8>().map_err(|_| LabelTableError::InvalidRow {
                    line: line_no,
                    reason: format!("invalid color component {:?}", raw),
                })
            };

            let name = field(cols.name)?.to_string();
            let rgb = Rgb([
                channel(cols.rgb[0])?,
                channel(cols.rgb[1])?,
                channel(cols.rgb[2])?,
            ]);
            colors.insert(name, rgb);
        }

        Ok(Self { colors })
    }

    /// Exact, case-sensitive lookup by label name
    pub fn color_for_name(&self, name: &str) -> Option<Rgb> {
        self.colors.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
