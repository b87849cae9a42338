use serde::{Deserialize, Serialize};

/// A supported streaming service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Netflix,
    DisneyPlus,
}

impl Service {
    pub const ALL: &[Service] = &[Self::Netflix, Self::DisneyPlus];

    /// The brand name as users see it.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Netflix => "Netflix",
            Self::DisneyPlus => "Disney+",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
