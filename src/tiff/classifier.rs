//! IFD classifier
//!
//! Given an IFD, determines the role it plays in a pyramidal whole-slide image:
//! a tiled pyramid level, a thumbnail, the slide label, the macro overview image,
//! or something else entirely that should be passed through untouched.

use crate::tiff::constants::tags;
use crate::tiff::ifd::IFD;

/// The role an IFD plays within a pyramidal slide image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfdKind {
    /// A tiled pyramid level subject to redaction
    Tile,
    /// A reduced-resolution preview image (NewSubfileType 0)
    Thumbnail,
    /// The specimen label image (NewSubfileType 1)
    Label,
    /// The slide macro/overview image (NewSubfileType 9)
    Macro,
    /// Anything else; passed through unchanged
    Other,
}

/// Classifies an IFD by its tag contents
///
/// `TileOffsets` presence takes priority over `NewSubfileType`; an IFD with no
/// `NewSubfileType` tag at all classifies as `Other`.
pub fn classify(ifd: &IFD) -> IfdKind {
    if ifd.has_tag(tags::TILE_OFFSETS) {
        return IfdKind::Tile;
    }

    match ifd.get_tag_value(tags::NEW_SUBFILE_TYPE) {
        Some(0) => IfdKind::Thumbnail,
        Some(1) => IfdKind::Label,
        Some(9) => IfdKind::Macro,
        Some(_) => IfdKind::Other,
        None => IfdKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::ifd::IFDEntry;

    #[test]
    fn tile_ifd_classified_by_tile_offsets() {
        let mut ifd = IFD::new(0, 0);
        ifd.add_entry(IFDEntry::new(tags::TILE_OFFSETS, 16, 1, 8));
        assert_eq!(classify(&ifd), IfdKind::Tile);
    }

    #[test]
    fn thumbnail_label_macro_other_by_subfile_type() {
        let mut thumb = IFD::new(0, 0);
        thumb.add_entry(IFDEntry::new(tags::NEW_SUBFILE_TYPE, 4, 1, 0));
        assert_eq!(classify(&thumb), IfdKind::Thumbnail);

        let mut label = IFD::new(0, 0);
        label.add_entry(IFDEntry::new(tags::NEW_SUBFILE_TYPE, 4, 1, 1));
        assert_eq!(classify(&label), IfdKind::Label);

        let mut macro_ifd = IFD::new(0, 0);
        macro_ifd.add_entry(IFDEntry::new(tags::NEW_SUBFILE_TYPE, 4, 1, 9));
        assert_eq!(classify(&macro_ifd), IfdKind::Macro);

        let mut other = IFD::new(0, 0);
        other.add_entry(IFDEntry::new(tags::NEW_SUBFILE_TYPE, 4, 1, 2));
        assert_eq!(classify(&other), IfdKind::Other);
    }

    #[test]
    fn missing_subfile_type_is_other() {
        let ifd = IFD::new(0, 0);
        assert_eq!(classify(&ifd), IfdKind::Other);
    }
}
