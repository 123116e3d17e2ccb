// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for TXT quoting and chunking

#[cfg(test)]
mod tests {
    use super::super::*;

    /// Extract the payload of every quoted chunk of a rendered TXT value.
    fn rendered_chunks(rendered: &str) -> Vec<String> {
        rendered
            .split("\" \"")
            .map(|c| c.trim_matches('"').to_string())
            .collect()
    }

    #[test]
    fn test_quote_plain_text() {
        assert_eq!(quote_txt("v=spf1 -all").unwrap(), "\"v=spf1 -all\"");
    }

    #[test]
    fn test_quote_escapes_quotes_and_backslashes() {
        assert_eq!(
            quote_txt(r#"say "hi" \o/"#).unwrap(),
            r#""say \"hi\" \\o/""#
        );
    }

    #[test]
    fn test_quote_escapes_control_characters() {
        assert_eq!(quote_txt("a\tb").unwrap(), "\"a\\009b\"");
    }

    #[test]
    fn test_already_quoted_is_preserved() {
        let quoted = r#""v=DKIM1; k=rsa; " "p=MIGf""#;
        assert_eq!(quote_txt(quoted).unwrap(), quoted);
    }

    #[test]
    fn test_malformed_quoted_rejected() {
        assert!(quote_txt("\"unterminated").is_err());
        assert!(quote_txt("\"a\"\"b\"").is_err());
        assert!(quote_txt("\"bad \\1 escape\"").is_err());
        assert!(quote_txt("\"\\999\"").is_err());
    }

    #[test]
    fn test_unquote_handles_escapes() {
        assert_eq!(unquote_txt(r#""a\"b\\c""#).unwrap(), b"a\"b\\c".to_vec());
        assert_eq!(unquote_txt(r#""\065\066""#).unwrap(), b"AB".to_vec());
        assert_eq!(unquote_txt(r#""ab" "cd""#).unwrap(), b"abcd".to_vec());
    }

    #[test]
    fn test_unquote_requires_a_string() {
        assert!(unquote_txt("   ").is_err());
        assert!(unquote_txt("bare").is_err());
    }

    #[test]
    fn test_short_txt_renders_single_chunk() {
        assert_eq!(render_txt("\"hello world\""), "\"hello world\"");
    }

    #[test]
    fn test_multiple_strings_render_separately() {
        assert_eq!(render_txt("\"a\" \"b\""), "\"a\" \"b\"");
        assert_eq!(
            render_txt(r#""v=DKIM1; k=rsa; " "p=MIGf""#),
            r#""v=DKIM1; k=rsa; " "p=MIGf""#
        );
        assert_eq!(render_txt("\"\" \"x\""), "\"\" \"x\"");
    }

    #[test]
    fn test_only_long_strings_are_split() {
        let stored = format!("\"head\" \"{}\"", "z".repeat(300));
        let chunks = rendered_chunks(&render_txt(&stored));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "head");
        assert_eq!(chunks[1].len(), 255);
        assert_eq!(chunks[2].len(), 45);
    }

    #[test]
    fn test_split_strings() {
        assert_eq!(
            split_strings(r#""ab" "c\"d""#).unwrap(),
            vec![b"ab".to_vec(), b"c\"d".to_vec()]
        );
        assert!(split_strings("bare").is_err());
    }

    #[test]
    fn test_400_byte_txt_renders_two_chunks() {
        let original = "x".repeat(400);
        let stored = quote_txt(&original).unwrap();
        let rendered = render_txt(&stored);

        let chunks = rendered_chunks(&rendered);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 255);
        assert_eq!(chunks[1].len(), 145);
        assert_eq!(chunks.concat(), original);
    }

    #[test]
    fn test_exactly_255_bytes_is_one_chunk() {
        let stored = quote_txt(&"y".repeat(255)).unwrap();
        assert_eq!(rendered_chunks(&render_txt(&stored)).len(), 1);

        let stored = quote_txt(&"y".repeat(256)).unwrap();
        assert_eq!(rendered_chunks(&render_txt(&stored)).len(), 2);
    }

    #[test]
    fn test_chunks_respect_utf8_boundaries() {
        // 254 ASCII bytes followed by a 2-byte character: splitting at 255 would cut it
        let mut text = "a".repeat(254);
        text.push('é');
        text.push_str("tail");

        let payload = text.as_bytes();
        let chunks = chunk_payload(payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 254);
        assert!(std::str::from_utf8(chunks[0]).is_ok());
        assert!(std::str::from_utf8(chunks[1]).is_ok());
        assert_eq!(chunks.concat(), payload);
    }

    #[test]
    fn test_chunk_concatenation_preserves_escaped_payload() {
        // Quotes near a chunk boundary must survive escaping in both chunks
        let mut text = "q".repeat(254);
        text.push_str("\"\"\"");
        let stored = quote_txt(&text).unwrap();
        let rendered = render_txt(&stored);

        let mut reparsed = Vec::new();
        for part in rendered.split("\" \"") {
            let quoted = format!("\"{}\"", part.trim_matches('"'));
            reparsed.extend(unquote_txt(&quoted).unwrap());
        }
        assert_eq!(reparsed, text.as_bytes());
    }

    #[test]
    fn test_render_txt_is_total_for_unquoted_content() {
        assert_eq!(render_txt("raw text"), "\"raw text\"");
        assert_eq!(render_txt("\"\""), "\"\"");
    }
}
