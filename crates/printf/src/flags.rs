use bitflags::bitflags;

bitflags! {
    /// Conversion flags for a single `%` directive.
    ///
    /// The first five map directly to the `- + space # 0` characters in a
    /// template. `SIGNED` and `LOWERCASE` are set by the conversion character
    /// itself (`d`/`i` are signed, `x`/`o` use the lowercase digit table).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormatFlags: u32 {
        /// `-`: left-align within the field width.
        const LEFT_ALIGN = 1 << 0;
        /// `+`: always emit a sign character.
        const FORCE_SIGN = 1 << 1;
        /// ` `: emit a space where the sign would go on non-negative values.
        const SPACE_SIGN = 1 << 2;
        /// `#`: alternate form (base prefix for octal and hexadecimal).
        const ALTERNATE = 1 << 3;
        /// `0`: pad to the field width with zeros instead of spaces.
        const ZERO_PAD = 1 << 4;
        /// The value is a signed quantity; negative values get a `-`.
        const SIGNED = 1 << 5;
        /// Use the lowercase digit table.
        const LOWERCASE = 1 << 6;
    }
}
