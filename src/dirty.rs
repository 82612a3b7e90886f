use bitflags::bitflags;

bitflags! {
    /// Flags describing what aspect of an entity or component changed.
    ///
    /// Consumers test with [`Dirty::intersects`] against a mask to decide
    /// whether to react; a container, for example, only re-runs layout
    /// when the notification carries [`Dirty::SIZE`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct Dirty: u8 {
        /// Visibility or opacity changed.
        const VISIBILITY = 1;
        /// Origin moved.
        const POSITION = 2;
        /// Width or height changed.
        const SIZE = 4;
        /// Scale, angle, anchor, or flip changed.
        const TRANSFORMS = 8;
        /// Painted content changed.
        const CONTENT = 16;
        /// Styling (brush, stroke) changed.
        const STYLE = 32;
        /// Background brush changed or was replaced.
        const BACKGROUND = 64;

        /// Position or size.
        const FRAME = 2 | 4;
        /// Anything that moves the rendered bounding rect.
        const SCOPE = 2 | 4 | 8;
        /// Everything.
        const ALL = 127;
    }
}
