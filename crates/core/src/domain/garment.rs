//! Garment catalog: the closed option sets a commission is built from and the
//! category-driven rules for which of them apply.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

/// Lowercased alphanumerics only, so `"Off-the-Shoulder"`, `"off the shoulder"`
/// and `"offtheshoulder"` compare equal.
fn option_key(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

macro_rules! catalog_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownOption;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let wanted = option_key(value);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| option_key(candidate.label()) == wanted)
                    .ok_or_else(|| UnknownOption { kind: $kind, value: value.to_string() })
            }
        }
    };
}

catalog_enum!(Category, "category" {
    Dress => "Dress",
    Top => "Top",
    Skirt => "Skirt",
    Pants => "Pants",
    Jumpsuit => "Jumpsuit",
});

catalog_enum!(Silhouette, "silhouette" {
    ALine => "A-Line",
    BallGown => "Ball Gown",
    Mermaid => "Mermaid",
    Sheath => "Sheath",
    Empire => "Empire",
    Peplum => "Peplum",
    Crop => "Crop",
    Tunic => "Tunic",
    Bodysuit => "Bodysuit",
    Blouse => "Blouse",
    Pencil => "Pencil",
    Pleated => "Pleated",
    Wrap => "Wrap",
    Maxi => "Maxi",
    Mini => "Mini",
    WideLeg => "Wide Leg",
    Straight => "Straight",
    Tapered => "Tapered",
    Culottes => "Culottes",
    Cargo => "Cargo",
});

catalog_enum!(Neckline, "neckline" {
    Sweetheart => "Sweetheart",
    VNeck => "V-Neck",
    Halter => "Halter",
    BoatNeck => "Boat Neck",
    OffTheShoulder => "Off-the-Shoulder",
    Square => "Square",
});

catalog_enum!(SleeveStyle, "sleeve style" {
    Sleeveless => "Sleeveless",
    Short => "Short",
    Cap => "Cap",
    ThreeQuarter => "Three-Quarter",
    Long => "Long",
    Bell => "Bell",
    Bishop => "Bishop",
});

catalog_enum!(Length, "length" {
    Mini => "Mini",
    KneeLength => "Knee-Length",
    Midi => "Midi",
    Maxi => "Maxi",
    FloorLength => "Floor-Length",
    TeaLength => "Tea-Length",
    Ankle => "Ankle",
});

pub const DEFAULT_NECKLINE: Neckline = Neckline::VNeck;
pub const DEFAULT_SLEEVE_STYLE: SleeveStyle = SleeveStyle::Sleeveless;
pub const DEFAULT_LENGTH: Length = Length::FloorLength;

const DRESS_SILHOUETTES: &[Silhouette] = &[
    Silhouette::ALine,
    Silhouette::BallGown,
    Silhouette::Mermaid,
    Silhouette::Sheath,
    Silhouette::Empire,
];
const TOP_SILHOUETTES: &[Silhouette] = &[
    Silhouette::Peplum,
    Silhouette::Crop,
    Silhouette::Tunic,
    Silhouette::Bodysuit,
    Silhouette::Blouse,
];
const SKIRT_SILHOUETTES: &[Silhouette] = &[
    Silhouette::Pencil,
    Silhouette::Pleated,
    Silhouette::Wrap,
    Silhouette::Maxi,
    Silhouette::Mini,
];
const LEG_SILHOUETTES: &[Silhouette] = &[
    Silhouette::WideLeg,
    Silhouette::Straight,
    Silhouette::Tapered,
    Silhouette::Culottes,
    Silhouette::Cargo,
];

/// Which attributes a category exposes. Every relevance check in the wizard and
/// the prompt builders goes through this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRequirements {
    pub silhouettes: &'static [Silhouette],
    pub neckline: bool,
    pub sleeve_style: bool,
    pub length: bool,
}

impl FieldRequirements {
    pub fn allows_silhouette(&self, silhouette: Silhouette) -> bool {
        self.silhouettes.contains(&silhouette)
    }

    pub fn default_silhouette(&self) -> Silhouette {
        self.silhouettes[0]
    }
}

pub fn field_requirements(category: Category) -> FieldRequirements {
    let silhouettes = match category {
        Category::Dress => DRESS_SILHOUETTES,
        Category::Top => TOP_SILHOUETTES,
        Category::Skirt => SKIRT_SILHOUETTES,
        Category::Pants | Category::Jumpsuit => LEG_SILHOUETTES,
    };
    let upper = is_upper_garment(category);

    FieldRequirements { silhouettes, neckline: upper, sleeve_style: upper, length: true }
}

pub fn is_upper_garment(category: Category) -> bool {
    matches!(category, Category::Dress | Category::Top | Category::Jumpsuit)
}

impl Category {
    pub fn requirements(self) -> FieldRequirements {
        field_requirements(self)
    }

    pub fn silhouettes(self) -> &'static [Silhouette] {
        self.requirements().silhouettes
    }

    pub fn default_silhouette(self) -> Silhouette {
        self.requirements().default_silhouette()
    }

    pub fn is_upper_garment(self) -> bool {
        is_upper_garment(self)
    }
}
