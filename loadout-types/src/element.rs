use crate::ids::ComboId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Kinetic,
    Fire,
    Corrosive,
    Shock,
    Cryo,
    Radiation,
}

impl Element {
    pub const ALL: [Element; 6] = [
        Element::Kinetic,
        Element::Fire,
        Element::Corrosive,
        Element::Shock,
        Element::Cryo,
        Element::Radiation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Kinetic => "Kinetic",
            Element::Fire => "Fire",
            Element::Corrosive => "Corrosive",
            Element::Shock => "Shock",
            Element::Cryo => "Cryo",
            Element::Radiation => "Radiation",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Element::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown element '{}'", s))
    }
}

/// One legal elemental configuration. The (primary, secondary, underbarrel)
/// triple is unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCombo {
    pub id: ComboId,
    pub primary_element: Element,

    #[serde(default)]
    pub secondary_element: Option<Element>,

    #[serde(default)]
    pub underbarrel: bool,
}

impl ElementCombo {
    pub fn triple(&self) -> (Element, Option<Element>, bool) {
        (self.primary_element, self.secondary_element, self.underbarrel)
    }

    pub fn is_single(&self) -> bool {
        self.secondary_element.is_none()
    }
}

impl fmt::Display for ElementCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary_element)?;
        if let Some(secondary) = self.secondary_element {
            write!(f, " + {}", secondary)?;
        }
        if self.underbarrel {
            f.write_str(" (underbarrel)")?;
        }
        Ok(())
    }
}
