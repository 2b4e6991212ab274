use serde::{Deserialize, Serialize};

use crate::error::{MedusaError, Result};

/// Labels of the stock MEDUSA LED board, indexed by controller channel.
pub const STOCK_LABELS: [&str; 15] = [
    "419nm", "446nm", "470nm", "502nm", "533nm", "592nm", "632nm", "660nm", "723nm", "769nm",
    "858nm", "880nm", "950nm", "NOT", "WHT",
];

/// One illumination channel of the rig.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Band {
    /// Wavelength label used in file names, e.g. `632nm`.
    pub label: String,
    /// Controller channel the LED is wired to.
    pub channel: u8,
    /// Broadband reference channel: captured in color, excluded from PCA.
    pub is_reference_white: bool,
}

impl Band {
    pub fn new(label: impl Into<String>, channel: u8) -> Self {
        Self {
            label: label.into(),
            channel,
            is_reference_white: false,
        }
    }

    pub fn white(label: impl Into<String>, channel: u8) -> Self {
        Self {
            label: label.into(),
            channel,
            is_reference_white: true,
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (ch {})", self.label, self.channel)
    }
}

/// The set of bands physically available on a rig.
#[derive(Clone, Debug)]
pub struct BandCatalog {
    bands: Vec<Band>,
}

impl BandCatalog {
    /// The stock 15-channel board. The band on `white_channel` is flagged as
    /// the reference white.
    pub fn medusa(white_channel: u8) -> Self {
        let bands = STOCK_LABELS
            .iter()
            .enumerate()
            .map(|(channel, label)| {
                let channel = channel as u8;
                Band {
                    label: (*label).to_string(),
                    channel,
                    is_reference_white: channel == white_channel,
                }
            })
            .collect();
        Self { bands }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn by_channel(&self, channel: u8) -> Option<&Band> {
        self.bands.iter().find(|b| b.channel == channel)
    }

    /// Look a band up by label (case-insensitive, `nm` suffix optional) or by
    /// channel number.
    pub fn resolve(&self, name: &str) -> Result<Band> {
        let name = name.trim();
        let wanted = name.to_ascii_lowercase();
        let with_suffix = format!("{wanted}nm");

        let found = self
            .bands
            .iter()
            .find(|b| {
                let label = b.label.to_ascii_lowercase();
                label == wanted || label == with_suffix
            })
            .or_else(|| {
                name.parse::<u8>()
                    .ok()
                    .and_then(|channel| self.by_channel(channel))
            });

        found
            .cloned()
            .ok_or_else(|| MedusaError::InvalidConfig(format!("unknown band '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_labels_and_channels() {
        let catalog = BandCatalog::medusa(14);
        assert_eq!(catalog.resolve("632nm").unwrap().channel, 6);
        assert_eq!(catalog.resolve("632").unwrap().channel, 6);
        assert_eq!(catalog.resolve("wht").unwrap().channel, 14);
        assert_eq!(catalog.resolve("3").unwrap().label, "502nm");
        assert!(catalog.resolve("999nm").is_err());
    }

    #[test]
    fn white_flag_follows_configured_channel() {
        let catalog = BandCatalog::medusa(13);
        assert!(catalog.by_channel(13).unwrap().is_reference_white);
        assert!(!catalog.by_channel(14).unwrap().is_reference_white);
    }
}
