use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use typed_builder::TypedBuilder;

use crate::error::{HhError, Result};

/// Largest page size the listing endpoint accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Longest recency window (days) the listing endpoint accepts.
pub const MAX_PERIOD_DAYS: u32 = 30;

// ============================================================================
// Query descriptor
// ============================================================================

/// Filter set for the vacancy listing endpoint.
///
/// Built once and never mutated; every request re-serializes it through
/// [`VacancyQuery::to_params`].
///
/// ```rust,ignore
/// let query = VacancyQuery::builder()
///     .text("python")
///     .experience(Experience::Between1And3)
///     .employment(Employment::Full)
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TypedBuilder)]
pub struct VacancyQuery {
    #[builder(default = String::from("python"), setter(into))]
    text: String,
    #[builder(default, setter(into))]
    experience: Option<Experience>,
    #[builder(default, setter(into))]
    employment: Option<Employment>,
    #[builder(default, setter(into))]
    schedule: Option<Schedule>,
    #[builder(default = MAX_PERIOD_DAYS)]
    period: u32,
    #[builder(default = MAX_PER_PAGE)]
    per_page: u32,
}

impl Default for VacancyQuery {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl VacancyQuery {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn experience(&self) -> Option<Experience> {
        self.experience
    }

    pub fn employment(&self) -> Option<Employment> {
        self.employment
    }

    pub fn schedule(&self) -> Option<Schedule> {
        self.schedule
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Check the descriptor against the API bounds.
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(HhError::InvalidQuery {
                reason: format!(
                    "per_page must be between 1 and {}, got {}",
                    MAX_PER_PAGE, self.per_page
                ),
            });
        }
        if self.period == 0 || self.period > MAX_PERIOD_DAYS {
            return Err(HhError::InvalidQuery {
                reason: format!(
                    "period must be between 1 and {} days, got {}",
                    MAX_PERIOD_DAYS, self.period
                ),
            });
        }
        Ok(())
    }

    /// Query parameters for one listing request. Unset filters are omitted.
    pub fn to_params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
            ("period", self.period.to_string()),
            ("text", self.text.clone()),
        ];
        if let Some(experience) = self.experience {
            params.push(("experience", experience.as_str().to_string()));
        }
        if let Some(employment) = self.employment {
            params.push(("employment", employment.as_str().to_string()));
        }
        if let Some(schedule) = self.schedule {
            params.push(("schedule", schedule.as_str().to_string()));
        }
        params
    }

    /// Stable hex key for this descriptor. Identical descriptors always
    /// produce the same key; the page index is not part of it.
    pub fn cache_key(&self) -> String {
        let canonical = self
            .to_params(0)
            .into_iter()
            .filter(|(name, _)| *name != "page")
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}

// ============================================================================
// Filter enums
// ============================================================================

macro_rules! api_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Identifier the API expects in query strings.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = HhError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(HhError::InvalidQuery {
                        reason: format!(
                            "unknown {} '{}', expected one of: {}",
                            stringify!($name).to_lowercase(),
                            other,
                            [$($value),+].join(", ")
                        ),
                    }),
                }
            }
        }
    };
}

api_enum! {
    /// Required work experience.
    Experience {
        NoExperience => "noExperience",
        Between1And3 => "between1And3",
        Between3And6 => "between3And6",
        MoreThan6 => "moreThan6",
    }
}

api_enum! {
    /// Employment type.
    Employment {
        Full => "full",
        Part => "part",
        Project => "project",
        Volunteer => "volunteer",
        Probation => "probation",
    }
}

api_enum! {
    /// Work schedule.
    Schedule {
        FullDay => "fullDay",
        Shift => "shift",
        Flexible => "flexible",
        Remote => "remote",
        FlyInFlyOut => "flyInFlyOut",
    }
}

// ============================================================================
// Records
// ============================================================================

/// One page of the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyPage {
    pub items: Vec<VacancySummary>,
    /// Total page count for the query. Only the first page's value is trusted.
    pub pages: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub found: u64,
}

/// Sparse vacancy record from the listing endpoint.
///
/// Fields not modelled here are kept in `extra` so snapshots preserve the
/// full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancySummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VacancySummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Full vacancy record from the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancyDetail {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// HTML description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub key_skills: Vec<KeySkill>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VacancyDetail {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            key_skills: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.key_skills.push(KeySkill { name: skill.into() });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySkill {
    pub name: String,
}
