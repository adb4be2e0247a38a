//! The built-in encoding vectors and glyph-name decoding.

/// Glyph names of printable ASCII, codes 32..=126, in the ISO Latin-1
/// flavor (`quoteright`/`quoteleft` are patched for `StandardEncoding`).
const ASCII: [&str; 95] = [
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand",
    "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen",
    "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at",
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
    "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "bracketleft", "backslash",
    "bracketright", "asciicircum", "underscore", "grave", "a", "b", "c", "d", "e", "f",
    "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w",
    "x", "y", "z", "braceleft", "bar", "braceright", "asciitilde",
];

const STANDARD_UPPER: &[(u8, &str)] = &[
    (161, "exclamdown"),
    (162, "cent"),
    (163, "sterling"),
    (164, "fraction"),
    (165, "yen"),
    (166, "florin"),
    (167, "section"),
    (168, "currency"),
    (169, "quotesingle"),
    (170, "quotedblleft"),
    (171, "guillemotleft"),
    (172, "guilsinglleft"),
    (173, "guilsinglright"),
    (174, "fi"),
    (175, "fl"),
    (177, "endash"),
    (178, "dagger"),
    (179, "daggerdbl"),
    (180, "periodcentered"),
    (182, "paragraph"),
    (183, "bullet"),
    (184, "quotesinglbase"),
    (185, "quotedblbase"),
    (186, "quotedblright"),
    (187, "guillemotright"),
    (188, "ellipsis"),
    (189, "perthousand"),
    (191, "questiondown"),
    (193, "grave"),
    (194, "acute"),
    (195, "circumflex"),
    (196, "tilde"),
    (197, "macron"),
    (198, "breve"),
    (199, "dotaccent"),
    (200, "dieresis"),
    (202, "ring"),
    (203, "cedilla"),
    (205, "hungarumlaut"),
    (206, "ogonek"),
    (207, "caron"),
    (208, "emdash"),
    (225, "AE"),
    (227, "ordfeminine"),
    (232, "Lslash"),
    (233, "Oslash"),
    (234, "OE"),
    (235, "ordmasculine"),
    (241, "ae"),
    (245, "dotlessi"),
    (248, "lslash"),
    (249, "oslash"),
    (250, "oe"),
    (251, "germandbls"),
];

/// Codes 144..=159 of `ISOLatin1Encoding` (accents).
const LATIN1_ACCENTS: [&str; 16] = [
    "dotlessi", "grave", "acute", "circumflex", "tilde", "macron", "breve", "dotaccent",
    "dieresis", ".notdef", "ring", "cedilla", ".notdef", "hungarumlaut", "ogonek", "caron",
];

/// Codes 160..=255 of `ISOLatin1Encoding`; the glyph for code `c` is the
/// Unicode character U+00c.
const LATIN1_UPPER: [&str; 96] = [
    "space", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar", "section",
    "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot", "hyphen",
    "registered", "macron", "degree", "plusminus", "twosuperior", "threesuperior", "acute",
    "mu", "paragraph", "periodcentered", "cedilla", "onesuperior", "ordmasculine",
    "guillemotright", "onequarter", "onehalf", "threequarters", "questiondown", "Agrave",
    "Aacute", "Acircumflex", "Atilde", "Adieresis", "Aring", "AE", "Ccedilla", "Egrave",
    "Eacute", "Ecircumflex", "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis",
    "Eth", "Ntilde", "Ograve", "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply",
    "Oslash", "Ugrave", "Uacute", "Ucircumflex", "Udieresis", "Yacute", "Thorn",
    "germandbls", "agrave", "aacute", "acircumflex", "atilde", "adieresis", "aring", "ae",
    "ccedilla", "egrave", "eacute", "ecircumflex", "edieresis", "igrave", "iacute",
    "icircumflex", "idieresis", "eth", "ntilde", "ograve", "oacute", "ocircumflex",
    "otilde", "odieresis", "divide", "oslash", "ugrave", "uacute", "ucircumflex",
    "udieresis", "yacute", "thorn", "ydieresis",
];

/// Glyph names outside Latin-1 that still have an obvious character.
const EXTRA_GLYPHS: &[(&str, char)] = &[
    ("quoteright", '\u{2019}'),
    ("quoteleft", '\u{2018}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quotesinglbase", '\u{201A}'),
    ("quotedblbase", '\u{201E}'),
    ("guilsinglleft", '\u{2039}'),
    ("guilsinglright", '\u{203A}'),
    ("endash", '\u{2013}'),
    ("emdash", '\u{2014}'),
    ("bullet", '\u{2022}'),
    ("ellipsis", '\u{2026}'),
    ("dagger", '\u{2020}'),
    ("daggerdbl", '\u{2021}'),
    ("perthousand", '\u{2030}'),
    ("fraction", '\u{2044}'),
    ("florin", '\u{0192}'),
    ("fi", '\u{FB01}'),
    ("fl", '\u{FB02}'),
    ("minus", '\u{2212}'),
    ("Lslash", '\u{0141}'),
    ("lslash", '\u{0142}'),
    ("OE", '\u{0152}'),
    ("oe", '\u{0153}'),
    ("dotlessi", '\u{0131}'),
    ("circumflex", '\u{02C6}'),
    ("tilde", '\u{02DC}'),
    ("breve", '\u{02D8}'),
    ("dotaccent", '\u{02D9}'),
    ("ring", '\u{02DA}'),
    ("hungarumlaut", '\u{02DD}'),
    ("ogonek", '\u{02DB}'),
    ("caron", '\u{02C7}'),
];

/// `StandardEncoding`.
#[must_use]
pub fn standard_encoding() -> [&'static str; 256] {
    let mut names = [".notdef"; 256];
    names[32..127].copy_from_slice(&ASCII);
    names[39] = "quoteright";
    names[96] = "quoteleft";
    for &(code, name) in STANDARD_UPPER {
        names[usize::from(code)] = name;
    }
    names
}

/// `ISOLatin1Encoding`.
#[must_use]
pub fn iso_latin1_encoding() -> [&'static str; 256] {
    let mut names = [".notdef"; 256];
    names[32..127].copy_from_slice(&ASCII);
    names[39] = "quoteright";
    names[45] = "minus";
    names[96] = "quoteleft";
    names[144..160].copy_from_slice(&LATIN1_ACCENTS);
    names[160..256].copy_from_slice(&LATIN1_UPPER);
    names
}

/// The character a glyph name stands for, if it is a common one.
#[must_use]
pub fn glyph_char(name: &str) -> Option<char> {
    if let Some(&(_, c)) = EXTRA_GLYPHS.iter().find(|(n, _)| *n == name) {
        return Some(c);
    }
    if let Some(i) = ASCII.iter().position(|n| *n == name) {
        return u8::try_from(i + 32).ok().map(char::from);
    }
    LATIN1_UPPER
        .iter()
        .position(|n| *n == name)
        .and_then(|i| u8::try_from(i + 160).ok())
        .map(char::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_encoding_layout() {
        let e = standard_encoding();
        assert_eq!(e[65], "A");
        assert_eq!(e[39], "quoteright");
        assert_eq!(e[174], "fi");
        assert_eq!(e[0], ".notdef");
        assert_eq!(e[255], ".notdef");
    }

    #[test]
    fn latin1_layout() {
        let e = iso_latin1_encoding();
        assert_eq!(e[45], "minus");
        assert_eq!(e[144], "dotlessi");
        assert_eq!(e[233], "eacute");
        assert_eq!(e[255], "ydieresis");
    }

    #[test]
    fn glyph_chars() {
        assert_eq!(glyph_char("A"), Some('A'));
        assert_eq!(glyph_char("space"), Some(' '));
        assert_eq!(glyph_char("eacute"), Some('é'));
        assert_eq!(glyph_char("quoteright"), Some('\u{2019}'));
        assert_eq!(glyph_char("hyphen"), Some('-'));
        assert_eq!(glyph_char("nosuchglyph"), None);
    }
}
