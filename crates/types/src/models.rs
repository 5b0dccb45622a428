//! Model and rendering options accepted by the generation backend
//!
//! The wire strings are fixed by the backend; some carry display suffixes
//! such as `(Nano Banana)` and must be sent byte-for-byte.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident {
            $( $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(TypesError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Language model used for synopsis analysis, scenes and cuts
    TextModel, "text model", default = Gpt41 {
        Gpt41 => "gpt-4.1",
        Gpt4o => "gpt-4o",
        Gpt5 => "gpt-5",
        Gpt51 => "gpt-5.1",
    }
}

wire_enum! {
    /// Image model used for entity references and cut stills
    ImageModel, "image model", default = GptImage1 {
        GptImage1 => "gpt-image-1",
        NanoBanana => "gemini-2.5-flash-imag(Nano Banana)",
        NanoBananaPro => "gemini-3-pro-image-preview(Nano Banana Pro)",
    }
}

wire_enum! {
    /// Video model used for cut clips
    VideoModel, "video model", default = Veo31FastPreview {
        Runway => "runway",
        Sora2 => "sora2",
        Veo30Fast => "veo-3.0-fast-generate-001",
        Veo30 => "veo-3.0-generate-001",
        Veo31FastPreview => "veo-3.1-fast-generate-preview",
        Veo31Preview => "veo-3.1-generate-preview",
    }
}

wire_enum! {
    ImageStyle, "image style", default = Realistic {
        Realistic => "realistic",
        Illustration => "illustration",
        Anime => "anime",
        Watercolor => "watercolor",
        OilPainting => "oil_painting",
        Comic => "comic",
        Storybook => "storybook",
        Sketch => "sketch",
        PixelArt => "pixel_art",
        Lowpoly => "lowpoly",
    }
}

wire_enum! {
    ImageQuality, "image quality", default = Low {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

wire_enum! {
    ImageSize, "image size", default = Landscape1536 {
        Square1024 => "1024x1024",
        Landscape1536 => "1536x1024",
        Square2048 => "2048x2048",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings_round_trip_through_from_str() {
        for model in ImageModel::ALL {
            assert_eq!(model.as_str().parse::<ImageModel>().unwrap(), *model);
        }
        for model in VideoModel::ALL {
            assert_eq!(model.to_string().parse::<VideoModel>().unwrap(), *model);
        }
    }

    #[test]
    fn test_serde_uses_backend_strings() {
        let json = serde_json::to_string(&ImageModel::NanoBanana).unwrap();
        assert_eq!(json, "\"gemini-2.5-flash-imag(Nano Banana)\"");

        let style: ImageStyle = serde_json::from_str("\"oil_painting\"").unwrap();
        assert_eq!(style, ImageStyle::OilPainting);
    }

    #[test]
    fn test_unknown_variant_is_reported() {
        let err = "gpt-3".parse::<TextModel>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown text model: gpt-3");
    }
}
