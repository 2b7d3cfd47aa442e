//! Column roles for a fragrance catalog and their YAML persistence.
//!
//! A [`DatasetSchema`] names the header used for every role the analytics need
//! (identity, categorical dimensions, numeric measures and note layers). The
//! defaults match the public Fragrantica export; a YAML file can override any of
//! them for catalogs with different headers.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Brand,
    Country,
    Gender,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Brand, Dimension::Country, Dimension::Gender];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Brand => "brand",
            Dimension::Country => "country",
            Dimension::Gender => "gender",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NoteLayer {
    Top,
    Middle,
    Base,
}

impl NoteLayer {
    pub const ALL: [NoteLayer; 3] = [NoteLayer::Top, NoteLayer::Middle, NoteLayer::Base];

    pub fn label(&self) -> &'static str {
        match self {
            NoteLayer::Top => "top",
            NoteLayer::Middle => "middle",
            NoteLayer::Base => "base",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchema {
    pub name: String,
    pub brand: String,
    pub country: String,
    pub gender: String,
    pub rating_value: String,
    pub rating_count: String,
    pub year: String,
    pub top_notes: String,
    pub middle_notes: String,
    pub base_notes: String,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            name: "Perfume".to_string(),
            brand: "Brand".to_string(),
            country: "Country".to_string(),
            gender: "Gender".to_string(),
            rating_value: "Rating Value".to_string(),
            rating_count: "Rating Count".to_string(),
            year: "Year".to_string(),
            top_notes: "Top".to_string(),
            middle_notes: "Middle".to_string(),
            base_notes: "Base".to_string(),
        }
    }
}

impl DatasetSchema {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema: DatasetSchema =
            serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing schema to YAML string")
    }

    fn validate(&self) -> Result<()> {
        for (role, column) in self.roles() {
            ensure!(
                !column.trim().is_empty(),
                "Schema role '{role}' must name a column"
            );
        }
        Ok(())
    }

    fn roles(&self) -> [(&'static str, &str); 10] {
        [
            ("name", self.name.as_str()),
            ("brand", self.brand.as_str()),
            ("country", self.country.as_str()),
            ("gender", self.gender.as_str()),
            ("rating_value", self.rating_value.as_str()),
            ("rating_count", self.rating_count.as_str()),
            ("year", self.year.as_str()),
            ("top_notes", self.top_notes.as_str()),
            ("middle_notes", self.middle_notes.as_str()),
            ("base_notes", self.base_notes.as_str()),
        ]
    }

    /// Columns coerced to numbers at load time.
    pub fn numeric_columns(&self) -> [&str; 3] {
        [
            self.rating_value.as_str(),
            self.rating_count.as_str(),
            self.year.as_str(),
        ]
    }

    pub fn kind_of(&self, column: &str) -> ColumnKind {
        if self.numeric_columns().contains(&column) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }

    pub fn dimension_column(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Brand => &self.brand,
            Dimension::Country => &self.country,
            Dimension::Gender => &self.gender,
        }
    }

    pub fn note_column(&self, layer: NoteLayer) -> &str {
        match layer {
            NoteLayer::Top => &self.top_notes,
            NoteLayer::Middle => &self.middle_notes,
            NoteLayer::Base => &self.base_notes,
        }
    }
}
