/// Tag lookup over the tracker endpoint's response body.
///
/// The body is XML-shaped but not strict XML: tag case varies and elements
/// carry stray attributes. We only ever need "text of the nth `<tag>`", so
/// this scans the raw text instead of building a tree.
pub struct Document {
    body: String,
    // ASCII-lowercased copy, byte offsets identical to `body`.
    lower: String,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            body: body.to_string(),
            lower: body.to_ascii_lowercase(),
        }
    }

    /// Text content of the first element named `tag`, case-insensitive.
    /// `None` when no such element exists.
    pub fn tag_text(&self, tag: &str) -> Option<&str> {
        self.nth_tag_text(tag, 0)
    }

    /// Text content of the nth (0-based) element named `tag`.
    pub fn nth_tag_text(&self, tag: &str, n: usize) -> Option<&str> {
        let tag = tag.to_ascii_lowercase();
        let open = format!("<{tag}");
        let close = format!("</{tag}>");

        let mut from = 0;
        let mut remaining = n;
        while let Some(pos) = self.lower[from..].find(&open) {
            let start = from + pos;
            let after = start + open.len();

            // Reject prefix matches like <orderstatusdetail> for "orderstatus".
            match self.lower.as_bytes().get(after) {
                Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') | Some(b'/') => {}
                _ => {
                    from = after;
                    continue;
                }
            }

            let gt = start + self.lower[start..].find('>')?;

            if self.lower.as_bytes()[gt - 1] == b'/' {
                // Self-closing element: empty text.
                if remaining == 0 {
                    return Some("");
                }
                remaining -= 1;
                from = gt + 1;
                continue;
            }

            let content_start = gt + 1;
            let content_end = content_start + self.lower[content_start..].find(&close)?;
            if remaining == 0 {
                return Some(&self.body[content_start..content_end]);
            }
            remaining -= 1;
            from = content_end + close.len();
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_tag_text() {
        let doc = Document::parse("<root><phone>555-0100</phone></root>");
        assert_eq!(doc.tag_text("phone"), Some("555-0100"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let doc = Document::parse("<OrderID>123</OrderID>");
        assert_eq!(doc.tag_text("orderid"), Some("123"));
        assert_eq!(doc.tag_text("ORDERID"), Some("123"));
    }

    #[test]
    fn tolerates_attributes() {
        let doc = Document::parse(r#"<OrderStatus xsi:nil="false">Baking</OrderStatus>"#);
        assert_eq!(doc.tag_text("orderstatus"), Some("Baking"));
    }

    #[test]
    fn nth_occurrence() {
        let doc = Document::parse(
            "<orderstatus>Preparing</orderstatus><orderstatus>Baking</orderstatus>",
        );
        assert_eq!(doc.nth_tag_text("orderstatus", 0), Some("Preparing"));
        assert_eq!(doc.nth_tag_text("orderstatus", 1), Some("Baking"));
        assert_eq!(doc.nth_tag_text("orderstatus", 2), None);
    }

    #[test]
    fn prefix_tag_names_do_not_match() {
        let doc = Document::parse("<orderstatusdetail>X</orderstatusdetail><orderstatus>Y</orderstatus>");
        assert_eq!(doc.tag_text("orderstatus"), Some("Y"));
    }

    #[test]
    fn self_closing_is_empty_text() {
        let doc = Document::parse("<StartTime/>");
        assert_eq!(doc.tag_text("starttime"), Some(""));
    }

    #[test]
    fn missing_tag_is_none() {
        let doc = Document::parse("<root></root>");
        assert_eq!(doc.tag_text("phone"), None);
    }
}
