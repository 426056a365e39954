use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    #[serde(alias = "digital_art", alias = "art")]
    Nft,
    #[serde(alias = "realestate", alias = "property")]
    RealEstate,
    #[default]
    #[serde(alias = "collectibles", alias = "infrastructure")]
    Other,
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetCategory::Nft => write!(f, "nft"),
            AssetCategory::RealEstate => write!(f, "real_estate"),
            AssetCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nft" | "digital_art" | "art" => Ok(AssetCategory::Nft),
            "real_estate" | "realestate" | "property" => Ok(AssetCategory::RealEstate),
            "other" | "collectibles" | "infrastructure" => Ok(AssetCategory::Other),
            _ => Err(format!("Unknown asset category: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_from_str() {
        for cat in [AssetCategory::Nft, AssetCategory::RealEstate, AssetCategory::Other] {
            assert_eq!(cat.to_string().parse::<AssetCategory>().unwrap(), cat);
        }
    }

    #[test]
    fn test_legacy_category_aliases() {
        assert_eq!("digital_art".parse::<AssetCategory>().unwrap(), AssetCategory::Nft);
        assert_eq!("Collectibles".parse::<AssetCategory>().unwrap(), AssetCategory::Other);
        assert!("spaceship".parse::<AssetCategory>().is_err());
    }
}
