use crate::eligibility::Rule;

mod report;

/// Location of the two source tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub schema: Option<String>,
    pub images: String,
    pub attributes: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            schema: None,
            images: "alle_images_v2".to_owned(),
            attributes: "alle_image_attributes_v2".to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid SQL identifier: {0:?}")]
pub struct InvalidIdentifier(pub String);

fn validate_identifier(ident: &str) -> Result<(), InvalidIdentifier> {
    if !ident.is_empty() && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(InvalidIdentifier(ident.to_owned()))
    }
}

impl Tables {
    pub fn validate(&self) -> Result<(), InvalidIdentifier> {
        if let Some(schema) = &self.schema {
            validate_identifier(schema)?;
        }
        validate_identifier(&self.images)?;
        validate_identifier(&self.attributes)?;
        Ok(())
    }

    fn qualify(&self, table: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{table}"),
            None => table.to_owned(),
        }
    }

    pub fn images(&self) -> String {
        self.qualify(&self.images)
    }

    pub fn attributes(&self) -> String {
        self.qualify(&self.attributes)
    }
}

/// The report query: one row per ingestion batch with its latest image,
/// pivoted attributes and eligibility.
pub fn report(tables: &Tables, rule: &Rule) -> Result<String, InvalidIdentifier> {
    tables.validate()?;
    let mut out = String::new();
    report::generate(&mut out, tables, rule).unwrap();
    Ok(out)
}
