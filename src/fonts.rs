//! Font payload sniffing using `ttf-parser`.
//!
//! Used when inlining `@font-face` sources whose server did not report a
//! content type.

/// The MIME type of a font file, or `None` if the bytes are not a font.
///
/// WOFF containers are recognised by signature; bare sfnt data must parse
/// as a font face.
pub fn font_mime_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes.get(..4)? {
        b"wOF2" => Some("font/woff2"),
        b"wOFF" => Some("font/woff"),
        b"ttcf" => Some("font/collection"),
        signature => {
            let face = match ttf_parser::Face::parse(bytes, 0) {
                Ok(face) => face,
                Err(e) => {
                    log::debug!("Not a font: {e}");
                    return None;
                }
            };
            log::debug!("Sniffed font with {} glyphs", face.number_of_glyphs());
            if signature == b"OTTO" {
                Some("font/otf")
            } else {
                Some("font/ttf")
            }
        }
    }
}
