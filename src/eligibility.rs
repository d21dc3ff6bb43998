//! Eligibility rule
//!
//! The rule is evaluated by the database as part of the report query, and can
//! also be evaluated in-process. Both renderings come from the same [`Rule`].
//!
//! The hero category comparison ignores case and compares the lowercased bytes,
//! so the outcome does not depend on the collation of the source column.

use std::{fmt::Write as _, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

/// Outcome of the eligibility rule for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eligibility {
    #[serde(rename = "eligible")]
    Eligible,
    #[serde(rename = "not eligible")]
    NotEligible,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown eligibility value: {0:?}")]
pub struct UnknownEligibility(pub String);

impl Eligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible => "eligible",
            Self::NotEligible => "not eligible",
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

impl std::fmt::Display for Eligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Eligibility {
    type Err = UnknownEligibility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eligible" => Ok(Self::Eligible),
            "not eligible" => Ok(Self::NotEligible),
            other => Err(UnknownEligibility(other.to_owned())),
        }
    }
}

impl TryFrom<String> for Eligibility {
    type Error = UnknownEligibility;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The aggregated attributes the rule looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes<'a> {
    pub store_rank: Option<i64>,
    pub brisque_score: Option<f64>,
    pub syn_con_image_selection: Option<i64>,
    pub hero_category: Option<&'a str>,
    pub aspect_ratio: Option<f64>,
}

/// Thresholds of the eligibility rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selected_flag: i64,
    pub max_store_rank: i64,
    pub max_brisque_score: f64,
    pub excluded_hero_category: String,
    pub aspect_ratio: RangeInclusive<f64>,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            selected_flag: 1,
            max_store_rank: 50,
            max_brisque_score: 50.0,
            excluded_hero_category: "jeans".to_owned(),
            aspect_ratio: 0.5..=2.0,
        }
    }
}

impl Rule {
    /// Evaluate the rule with SQL null semantics: an absent numeric attribute
    /// fails its comparison, an absent hero category passes.
    pub fn evaluate(&self, attrs: &Attributes<'_>) -> Eligibility {
        let selected = attrs.syn_con_image_selection == Some(self.selected_flag);
        let ranked = attrs
            .store_rank
            .is_some_and(|rank| rank <= self.max_store_rank);
        let sharp = attrs
            .brisque_score
            .is_some_and(|score| score <= self.max_brisque_score);
        let category = attrs
            .hero_category
            .is_none_or(|category| category.to_lowercase() != self.excluded_category());
        let shaped = attrs
            .aspect_ratio
            .is_some_and(|ratio| self.aspect_ratio.contains(&ratio));
        if selected && ranked && sharp && category && shaped {
            Eligibility::Eligible
        } else {
            Eligibility::NotEligible
        }
    }

    fn excluded_category(&self) -> String {
        self.excluded_hero_category.to_lowercase()
    }

    /// Render the rule as a SQL `CASE` expression over the columns of `alias`.
    pub fn sql_case(&self, alias: &str) -> String {
        let mut out = String::new();
        self.generate(&mut out, alias).unwrap();
        out
    }

    fn generate(&self, out: &mut String, alias: &str) -> std::fmt::Result {
        writeln!(out, "CASE")?;
        writeln!(
            out,
            "    WHEN {alias}.syn_con_image_selection = {}",
            self.selected_flag
        )?;
        writeln!(out, "     AND {alias}.store_rank <= {}", self.max_store_rank)?;
        writeln!(
            out,
            "     AND {alias}.brisque_score <= {}",
            sql_real(self.max_brisque_score)
        )?;
        writeln!(
            out,
            "     AND ({alias}.hero_category IS NULL OR HEX(LOWER({alias}.hero_category)) <> HEX({}))",
            sql_string(&self.excluded_category())
        )?;
        writeln!(
            out,
            "     AND {alias}.aspect_ratio BETWEEN {} AND {}",
            sql_real(*self.aspect_ratio.start()),
            sql_real(*self.aspect_ratio.end())
        )?;
        writeln!(out, "    THEN '{}'", Eligibility::Eligible)?;
        writeln!(out, "    ELSE '{}'", Eligibility::NotEligible)?;
        write!(out, "  END")?;
        Ok(())
    }
}

// `{:?}` keeps the decimal point so both engines treat the literal as a real.
fn sql_real(value: f64) -> String {
    format!("{value:?}")
}

fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
