// ============================================================
// Layer 4: Caption Tokenizer
// ============================================================
// Rewrites punctuation as standalone tags so that splitting a
// caption on whitespace yields punctuation as its own token.
//
//   "a dog, running!"  →  "a dog <COMMA>  running <EXCLAMATION_MARK> "
//
// The table is applied in order. "--" is tagged on its own;
// a single hyphen ("black-and-white") is left untouched.
//
// untokenize() applies the inverse table. The inverse looks
// for the tag with its padding spaces, so it also undoes the
// spacing tokenize() introduced. Tag text that already appears
// literally in the input is not protected against.

/// Punctuation → tag, in replacement order
const PUNCTUATION_TAGS: [(&str, &str); 10] = [
    (".",  " <PERIOD> "),
    (",",  " <COMMA> "),
    ("\"", " <QUOTATION_MARK> "),
    (";",  " <SEMICOLON> "),
    ("!",  " <EXCLAMATION_MARK> "),
    ("?",  " <QUESTION_MARK> "),
    ("(",  " <LEFT_PAREN> "),
    (")",  " <RIGHT_PAREN> "),
    ("--", " <HYPHENS> "),
    (":",  " <COLON> "),
];

/// Replace every recognised punctuation mark with its padded tag.
pub fn tokenize(text: &str) -> String {
    PUNCTUATION_TAGS
        .iter()
        .fold(text.to_string(), |acc, (mark, tag)| acc.replace(mark, tag))
}

/// Replace every padded tag with its punctuation mark.
pub fn untokenize(text: &str) -> String {
    PUNCTUATION_TAGS
        .iter()
        .fold(text.to_string(), |acc, (mark, tag)| acc.replace(tag, mark))
}
