use std::fmt;
use std::str::FromStr;

use crate::media::ImageData;

/// Named holder roles for user-selected images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotRole {
    Garment1,
    Garment2,
    Human,
    TryOnGarment,
    Stylist,
    Chat,
}

impl SlotRole {
    pub const ALL: [SlotRole; 6] = [
        SlotRole::Garment1,
        SlotRole::Garment2,
        SlotRole::Human,
        SlotRole::TryOnGarment,
        SlotRole::Stylist,
        SlotRole::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotRole::Garment1 => "garment-1",
            SlotRole::Garment2 => "garment-2",
            SlotRole::Human => "human",
            SlotRole::TryOnGarment => "garment-for-tryon",
            SlotRole::Stylist => "stylist",
            SlotRole::Chat => "chat",
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "garment-1" | "1" | "a" => Ok(SlotRole::Garment1),
            "garment-2" | "2" | "b" => Ok(SlotRole::Garment2),
            "human" | "person" | "me" => Ok(SlotRole::Human),
            "garment-for-tryon" | "garment" | "tryon" => Ok(SlotRole::TryOnGarment),
            "stylist" | "look" => Ok(SlotRole::Stylist),
            "chat" => Ok(SlotRole::Chat),
            other => Err(format!(
                "Unknown slot '{}'. Expected one of: {}",
                other,
                SlotRole::ALL.map(|r| r.as_str()).join(", ")
            )),
        }
    }
}

/// Holds at most one image. The generation bumps on every replace or clear
/// so a response can be matched against the input it was computed from.
#[derive(Debug, Clone, Default)]
pub struct ImageSlot {
    image: Option<ImageData>,
    generation: u64,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content wholesale; returns the new generation.
    pub fn replace(&mut self, image: ImageData) -> u64 {
        self.image = Some(image);
        self.generation += 1;
        self.generation
    }

    /// Returns whether an image was present.
    pub fn clear(&mut self) -> bool {
        self.generation += 1;
        self.image.take().is_some()
    }

    pub fn image(&self) -> Option<&ImageData> {
        self.image.as_ref()
    }

    pub fn is_filled(&self) -> bool {
        self.image.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::test_image;

    #[test]
    fn test_generation_bumps_on_replace_and_clear() {
        let mut slot = ImageSlot::new();
        assert_eq!(slot.generation(), 0);
        assert!(!slot.is_filled());

        let g1 = slot.replace(test_image("a"));
        let g2 = slot.replace(test_image("b"));
        assert!(g2 > g1);
        assert_eq!(slot.image().unwrap().file_name(), "b.png");

        assert!(slot.clear());
        assert!(slot.generation() > g2);
        assert!(!slot.clear());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("garment-1".parse::<SlotRole>().unwrap(), SlotRole::Garment1);
        assert_eq!("B".parse::<SlotRole>().unwrap(), SlotRole::Garment2);
        assert_eq!("garment".parse::<SlotRole>().unwrap(), SlotRole::TryOnGarment);
        let err = "hat".parse::<SlotRole>().unwrap_err();
        assert!(err.contains("garment-for-tryon"));
    }
}
